//! Hierarchical configuration resolution.
//!
//! Reconstructs typed configuration and credential objects by probing a stack of
//! [`providers::ConfigProvider`]s with progressively less specific section paths, recursing
//! through embedded sub-configurations, and preserving a full audit trail of every probe. See
//! the crate-level data model in [`model`] and the cascade algorithm in [`resolve`].

pub mod credentials;
mod errors;
mod model;
mod resolve;
mod section;
mod trace;

pub use errors::ConfigError;
pub use model::{deserialize_value, Configuration, ConfigurationHook, FieldKind, FieldSpec};
pub use resolve::resolve_configuration;
pub use section::{ContextGuard, ContextStack, SectionContext};
pub use trace::LookupTrace;

pub use providers::{ConfigProvider, ContextProvider, EmptyContextProvider, EnvironmentProvider, FieldHint, MemoryProvider, ProviderValue, Registry};
