use providers::ProviderValue;

/// A single provider probe, kept around for diagnostics and for the trace list attached to a
/// [`crate::errors::ConfigError::FieldMissing`] error.
///
/// One `LookupTrace` is recorded per probe, even when the probe came back empty -- the absence
/// of a trace for a provider is itself meaningful (it means the provider was skipped, typically
/// because serving the value would have leaked a secret through a provider that cannot hold
/// one; see [`providers::ConfigProvider::supports_secrets`]).
#[derive(Debug, Clone, PartialEq)]
pub struct LookupTrace {
    pub provider_name: String,
    pub sections_tried: Vec<String>,
    pub effective_key: String,
    pub value: Option<ProviderValue>,
}

impl LookupTrace {
    pub fn new(
        provider_name: impl Into<String>,
        sections_tried: Vec<String>,
        effective_key: impl Into<String>,
        value: Option<ProviderValue>,
    ) -> Self {
        LookupTrace {
            provider_name: provider_name.into(),
            sections_tried,
            effective_key: effective_key.into(),
            value,
        }
    }

    pub fn hit(&self) -> bool {
        self.value.is_some()
    }
}
