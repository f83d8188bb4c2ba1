use std::collections::BTreeMap;

use crate::trace::LookupTrace;

/// Errors raised while resolving a [`crate::model::Configuration`].
///
/// Resolution failures are also stashed on the configuration instance itself
/// (`Configuration::set_exception`) so lifecycle hooks can inspect why resolution failed even
/// when the caller passed `accept_partial = true` and the error was swallowed.
#[derive(thiserror::Error, Debug, Clone)]
pub enum ConfigError {
    /// Kept for parity with the error taxonomy this crate is modeled on. `resolve_configuration`
    /// takes `&mut dyn Configuration`, so the type system already rules this case out at compile
    /// time; nothing in this crate constructs it.
    #[error("{0:?} is not a resolvable configuration type")]
    WrongType(&'static str),

    #[error("native representation for {type_name} was rejected: {message}")]
    InvalidNativeValue {
        type_name: &'static str,
        message: String,
    },

    #[error("{type_name} has {} unresolved required field(s)", .missing.len())]
    FieldMissing {
        type_name: &'static str,
        missing: BTreeMap<String, Vec<LookupTrace>>,
    },

    #[error("field {field} of {type_name} resolved to a value from provider {provider:?}, which does not support secrets (effective key {effective_key:?})")]
    ValueNotSecret {
        type_name: &'static str,
        field: &'static str,
        provider: String,
        effective_key: String,
    },

    #[error("field {field} of {type_name} is final and cannot be overwritten with a different value")]
    FinalFieldConflict {
        type_name: &'static str,
        field: &'static str,
    },

    #[error("field {0} does not accept nested configuration values on this type")]
    UnsupportedChild(&'static str),
}
