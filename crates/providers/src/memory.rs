use std::collections::HashMap;

use crate::{ConfigProvider, FieldHint, ProviderValue};

/// An in-memory provider with configurable capability flags.
///
/// Used in place of the concrete vault/file-style backends this crate deliberately does not
/// ship (see the out-of-scope note in the top-level spec): tests construct one with
/// `supports_secrets(false)` to stand in for a provider that must never see a secret field, or
/// `supports_secrets(true)` to stand in for a vault.
pub struct MemoryProvider {
    name: String,
    supports_sections: bool,
    supports_secrets: bool,
    values: HashMap<String, ProviderValue>,
}

impl MemoryProvider {
    pub fn new(name: impl Into<String>) -> Self {
        MemoryProvider {
            name: name.into(),
            supports_sections: true,
            supports_secrets: false,
            values: HashMap::new(),
        }
    }

    pub fn supports_secrets(mut self, supports: bool) -> Self {
        self.supports_secrets = supports;
        self
    }

    pub fn supports_sections(mut self, supports: bool) -> Self {
        self.supports_sections = supports;
        self
    }

    pub fn with_value(mut self, path: impl Into<String>, value: impl Into<ProviderValue>) -> Self {
        self.values.insert(path.into(), value.into());
        self
    }

    fn effective_key(key: &str, sections: &[&str]) -> String {
        if sections.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", sections.join("."), key)
        }
    }
}

impl ConfigProvider for MemoryProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_sections(&self) -> bool {
        self.supports_sections
    }

    fn supports_secrets(&self) -> bool {
        self.supports_secrets
    }

    fn get_value(
        &self,
        key: &str,
        _hint: FieldHint,
        sections: &[&str],
    ) -> (Option<ProviderValue>, String) {
        let effective_key = Self::effective_key(key, sections);
        let value = self.values.get(&effective_key).cloned();
        (value, effective_key)
    }
}
