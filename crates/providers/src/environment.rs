use crate::{ConfigProvider, FieldHint, ProviderValue};

/// Reads configuration from process environment variables.
///
/// Sections and key are joined with a double underscore and upper-cased, so section path
/// `("myapp", "db")` and key `host` probe the environment variable `MYAPP__DB__HOST`. Does not
/// support secrets: environment variables are routinely dumped into logs, process listings and
/// CI output, so a field hinted as secret must never be satisfied from here.
pub struct EnvironmentProvider;

impl EnvironmentProvider {
    pub fn new() -> Self {
        EnvironmentProvider
    }

    fn effective_key(key: &str, sections: &[&str]) -> String {
        let mut parts: Vec<String> = sections.iter().map(|s| s.to_uppercase()).collect();
        parts.push(key.to_uppercase());
        parts.join("__")
    }
}

impl Default for EnvironmentProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigProvider for EnvironmentProvider {
    fn name(&self) -> &str {
        "env"
    }

    fn supports_sections(&self) -> bool {
        true
    }

    fn supports_secrets(&self) -> bool {
        false
    }

    fn get_value(
        &self,
        key: &str,
        _hint: FieldHint,
        sections: &[&str],
    ) -> (Option<ProviderValue>, String) {
        let effective_key = Self::effective_key(key, sections);
        let value = std::env::var(&effective_key).ok().map(ProviderValue::String);
        (value, effective_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn effective_key_joins_and_upper_cases() {
        assert_eq!(
            EnvironmentProvider::effective_key("host", &["myapp", "db"]),
            "MYAPP__DB__HOST"
        );
        assert_eq!(EnvironmentProvider::effective_key("host", &[]), "HOST");
    }

    #[test]
    #[serial]
    fn reads_from_process_environment() {
        std::env::set_var("CONDUIT_TEST__HOST", "h1");
        let provider = EnvironmentProvider::new();
        let (value, effective_key) = provider.get_value("host", FieldHint::Scalar, &["conduit_test"]);
        assert_eq!(effective_key, "CONDUIT_TEST__HOST");
        assert_eq!(value, Some(ProviderValue::String("h1".into())));
        std::env::remove_var("CONDUIT_TEST__HOST");
    }
}
