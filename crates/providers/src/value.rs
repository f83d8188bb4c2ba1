/// A value as returned by a provider, before the resolver's field-level deserialization pass.
///
/// Providers deal in two shapes: a raw string (the common case -- environment variables,
/// `.ini`-style files) or a structured JSON value (a provider backed by a JSON/YAML document, or
/// one returning a whole native-representation blob such as a service account key).
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderValue {
    String(String),
    Json(serde_json::Value),
}

impl ProviderValue {
    pub fn as_mapping(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        match self {
            ProviderValue::Json(serde_json::Value::Object(map)) => Some(map),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ProviderValue::String(s) => Some(s.as_str()),
            ProviderValue::Json(serde_json::Value::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn into_json(self) -> serde_json::Value {
        match self {
            ProviderValue::String(s) => serde_json::Value::String(s),
            ProviderValue::Json(v) => v,
        }
    }
}

impl From<&str> for ProviderValue {
    fn from(s: &str) -> Self {
        ProviderValue::String(s.to_string())
    }
}

impl From<String> for ProviderValue {
    fn from(s: String) -> Self {
        ProviderValue::String(s)
    }
}

impl From<serde_json::Value> for ProviderValue {
    fn from(v: serde_json::Value) -> Self {
        ProviderValue::Json(v)
    }
}
