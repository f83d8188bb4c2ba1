use providers::{FieldHint, ProviderValue};

use crate::errors::ConfigError;

/// Metadata for one resolvable field of a [`Configuration`], replacing the dynamic type hints
/// of the system this crate is modeled on with a small closed set of concrete variants (see the
/// "dynamic typing" design note in the top-level spec).
#[derive(Clone, Copy)]
pub struct FieldSpec {
    pub key: &'static str,
    pub kind: FieldKind,
    /// A missing optional field never blocks resolution and is never reported as missing.
    pub optional: bool,
    /// A final field may only ever be set once; a second, different value raises
    /// [`ConfigError::FinalFieldConflict`].
    pub is_final: bool,
}

#[derive(Clone, Copy)]
pub enum FieldKind {
    /// A plain scalar value.
    Scalar,
    /// A scalar that must come from a secret-capable provider.
    Secret,
    /// Ambient context, served only by the registry's context provider.
    Context,
    /// An embedded sub-configuration, resolved recursively.
    SubConfiguration(fn() -> Box<dyn Configuration>),
    /// One of several possible embedded sub-configuration types, tried in order.
    UnionOfSubConfigurations(&'static [fn() -> Box<dyn Configuration>]),
}

impl FieldKind {
    pub fn provider_hint(&self) -> FieldHint {
        match self {
            FieldKind::Scalar => FieldHint::Scalar,
            FieldKind::Secret => FieldHint::Secret,
            FieldKind::Context => FieldHint::Context,
            FieldKind::SubConfiguration(_) => FieldHint::SubConfiguration,
            FieldKind::UnionOfSubConfigurations(_) => FieldHint::UnionOfSubConfigurations,
        }
    }
}

/// A type whose instances can be reconstructed field-by-field by the resolver.
///
/// Implementors are expected to be small structs that store their own fields natively and
/// expose them through `get_field`/`set_field` using `serde_json::Value` as a common currency --
/// the resolver never needs to know the concrete Rust type of a field, only how to read and
/// write it generically. This mirrors how the system this crate is modeled on treats
/// configurations as a restricted mapping type rather than an opaque struct.
pub trait Configuration: std::fmt::Debug {
    /// Name of the concrete type, used in error messages.
    fn type_name(&self) -> &'static str;

    /// The section this configuration's fields are scoped under, if any. `None` means the
    /// configuration contributes no section of its own to the lookup path (its fields are
    /// resolved directly under whatever section the caller already has active).
    fn section(&self) -> Option<&str> {
        None
    }

    /// All declared fields, in declaration order. Declaration order matters: it is the order
    /// fields are resolved in, and for unions of sub-configurations, the order alternatives are
    /// attempted in.
    fn fields(&self) -> &'static [FieldSpec];

    /// Current value of a scalar/secret field, used to detect no-op writes and as the value
    /// returned when nothing resolves it.
    fn get_field(&self, key: &str) -> Option<serde_json::Value>;

    /// Stores a resolved scalar/secret value onto the matching field.
    fn set_field(&mut self, key: &str, value: serde_json::Value) -> Result<(), ConfigError>;

    /// Stores a fully (or partially, if accepted) resolved sub-configuration or union-resolved
    /// alternative onto the matching field.
    fn set_child(
        &mut self,
        key: &'static str,
        _value: Box<dyn Configuration>,
    ) -> Result<(), ConfigError> {
        Err(ConfigError::UnsupportedChild(key))
    }

    fn is_resolved(&self) -> bool;
    fn set_resolved(&mut self, resolved: bool);

    fn exception(&self) -> Option<&ConfigError>;
    fn set_exception(&mut self, err: Option<ConfigError>);

    /// Attempts to parse a single native-representation value (e.g. a connection string or a
    /// serialized credentials blob) covering every field at once. Types with no native
    /// representation simply leave this as a no-op (the default); the resolver treats the
    /// value as consumed either way and falls back to field-by-field resolution only when the
    /// value was itself a mapping (handled by the caller before this is ever invoked). Returning
    /// `Err` aborts resolution with [`ConfigError::InvalidNativeValue`]-shaped context supplied
    /// by the caller.
    fn parse_native_representation(&mut self, _native: &ProviderValue) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Renders this configuration back to its native string representation, if it has one.
    /// Implementations that support `parse_native_representation` should make this round-trip.
    fn to_native_representation(&self) -> Option<String> {
        None
    }

    /// Called once, most-derived-first, when the configuration is fully resolved.
    fn on_resolved(&mut self) {}

    /// Called once, most-derived-first, when required fields remain unresolved. May side-effect
    /// the configuration (e.g. supply an ambient default) and mark it resolved via
    /// `set_resolved(true)`; the resolver re-checks `is_resolved()` afterwards.
    fn on_partial(&mut self) {}

    /// Additional lifecycle hooks mixed into this configuration, invoked after the primary
    /// `on_resolved`/`on_partial` above, in composition order. Models the cooperative
    /// multi-inheritance hook chain of the system this crate is based on without requiring
    /// Rust trait objects to support multiple inheritance.
    fn composed_hooks(&mut self) -> Vec<&mut dyn ConfigurationHook> {
        Vec::new()
    }

    /// Whether this configuration carries credentials, i.e. whether its native representation
    /// must be treated as a secret.
    fn is_credentials(&self) -> bool {
        false
    }
}

/// An additional lifecycle participant a [`Configuration`] can compose via `composed_hooks`.
/// Mirrors a mixin class contributing its own `on_resolved`/`on_partial` in the cooperative
/// multi-inheritance model this crate's resolver is based on.
pub trait ConfigurationHook {
    fn on_resolved(&mut self) {}
    fn on_partial(&mut self) {}
}

/// Coerces a raw provider value into the JSON shape a field expects. Mirrors
/// `deserialize_value` in the resolver this crate is modeled on: strings are tried as JSON
/// first (so `"123"` becomes a number and `"true"` becomes a bool when the field is not itself
/// string-typed), falling back to the raw string.
pub fn deserialize_value(
    _key: &str,
    value: ProviderValue,
    kind: FieldKind,
) -> Result<serde_json::Value, ConfigError> {
    match kind {
        FieldKind::SubConfiguration(_) | FieldKind::UnionOfSubConfigurations(_) => {
            Ok(value.into_json())
        }
        _ => match value {
            ProviderValue::Json(v) => Ok(v),
            ProviderValue::String(s) => match serde_json::from_str::<serde_json::Value>(&s) {
                Ok(serde_json::Value::String(_)) | Err(_) => Ok(serde_json::Value::String(s)),
                Ok(parsed) => Ok(parsed),
            },
        },
    }
}
