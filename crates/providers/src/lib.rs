//! Ordered configuration providers and the registry that holds them.
//!
//! A provider answers a single question -- "what value, if any, do you hold for this key under
//! these sections" -- and reports the literal key it probed so resolution can be audited. The
//! [`config`](https://docs.rs/config-resolver) crate built on top of this one owns the cascade
//! logic; this crate only owns the provider contract and the handful of concrete providers
//! needed to exercise it.

mod environment;
mod memory;
mod value;

pub use environment::EnvironmentProvider;
pub use memory::MemoryProvider;
pub use value::ProviderValue;

/// The shape of value a resolver field expects, as reported to a provider so it can decide
/// whether it is even allowed to answer (see [`ConfigProvider::supports_secrets`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldHint {
    /// A plain, non-secret scalar (string, number, bool).
    Scalar,
    /// A scalar that must never be served from a provider without secret support.
    Secret,
    /// An embedded sub-configuration; resolved recursively, never directly.
    SubConfiguration,
    /// One of several possible sub-configuration types; resolved recursively.
    UnionOfSubConfigurations,
    /// Ambient process context (e.g. the active pipeline name), served only by the
    /// context provider.
    Context,
}

impl FieldHint {
    pub fn is_secret(&self) -> bool {
        matches!(self, FieldHint::Secret)
    }
}

/// A single configuration provider.
///
/// Implementations must be side-effect free and safe to call repeatedly with the same
/// arguments within one resolution: the resolver may probe a provider many times per field as
/// it peels section prefixes.
pub trait ConfigProvider: Send + Sync {
    /// Stable, human-readable provider name, reported in lookup traces.
    fn name(&self) -> &str;

    /// Whether this provider can be scoped by a section path at all. Providers that return
    /// `false` are only ever probed with an empty section list.
    fn supports_sections(&self) -> bool;

    /// Whether this provider is an acceptable source for secret-hinted fields. A provider
    /// that returns `false` here must never be allowed to satisfy a [`FieldHint::Secret`]
    /// field -- the resolver turns such a hit into a hard error rather than silently using it.
    fn supports_secrets(&self) -> bool;

    /// Look up `key` under the given (possibly empty) section path, returning the value found
    /// (if any) and the effective key this provider actually queried, so that key can be
    /// reported in a lookup trace regardless of whether anything was found.
    fn get_value(
        &self,
        key: &str,
        hint: FieldHint,
        sections: &[&str],
    ) -> (Option<ProviderValue>, String);
}

/// A distinguished provider for ambient, non-secret process context (e.g. the pipeline name).
/// Kept separate from [`ConfigProvider`] because context fields are served exclusively by it and
/// never fall through the ordinary provider cascade.
pub trait ContextProvider: Send + Sync {
    fn get_value(&self, key: &str) -> Option<ProviderValue>;
}

/// An ordered stack of providers plus the distinguished context provider.
///
/// Order matters: the resolver stops at the first provider that returns a value for a given
/// section prefix, so providers earlier in the registry take precedence.
pub struct Registry {
    providers: Vec<Box<dyn ConfigProvider>>,
    context_provider: Box<dyn ContextProvider>,
}

impl Registry {
    pub fn new(context_provider: Box<dyn ContextProvider>) -> Self {
        Registry {
            providers: Vec::new(),
            context_provider,
        }
    }

    /// Appends a provider; providers added earlier are consulted first.
    pub fn with_provider(mut self, provider: Box<dyn ConfigProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn providers(&self) -> &[Box<dyn ConfigProvider>] {
        &self.providers
    }

    pub fn context_provider(&self) -> &dyn ContextProvider {
        self.context_provider.as_ref()
    }
}

/// A context provider with no bindings, used by callers that have no ambient context to offer
/// (e.g. most unit tests).
#[derive(Default)]
pub struct EmptyContextProvider;

impl ContextProvider for EmptyContextProvider {
    fn get_value(&self, _key: &str) -> Option<ProviderValue> {
        None
    }
}
