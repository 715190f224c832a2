//! Providers, lifecycles and registration options
//!
//! A provider is the strategy a registration uses to produce a value for its
//! token; the lifecycle decides whether and where that value is cached.

use crate::class::{Class, Constructor};
use crate::{Container, Result, Token};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Marker trait for types that can be injected via the DI container.
///
/// This is automatically implemented for all types that are `Send + Sync + 'static`.
/// You never need to implement this manually.
pub trait Injectable: Send + Sync + 'static {}

// Blanket implementation - everything that's Send + Sync + 'static is Injectable
impl<T: Send + Sync + 'static> Injectable for T {}

/// A resolved, type-erased value
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Type-erased factory function
pub type FactoryFn = Arc<dyn Fn(&Container) -> Result<Instance> + Send + Sync>;

/// Strategy for producing a value for a token.
#[derive(Clone)]
pub enum Provider {
    /// Pre-supplied instance, returned verbatim
    Value(Instance),
    /// Function invoked with the container on every resolution
    Factory(FactoryFn),
    /// Alias that redirects resolution to another token
    Token(Token),
    /// Constructor resolved through its parameter descriptors
    Class(Class),
}

impl Provider {
    /// Value provider owning `value`
    #[inline]
    pub fn value<T: Injectable>(value: T) -> Self {
        Provider::Value(Arc::new(value))
    }

    /// Value provider over an existing shared instance
    #[inline]
    pub fn shared<T: Injectable>(value: Arc<T>) -> Self {
        Provider::Value(value)
    }

    /// Factory provider producing a `T`
    pub fn factory<T, F>(factory: F) -> Self
    where
        T: Injectable,
        F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
    {
        Provider::Factory(Arc::new(move |container: &Container| {
            factory(container).map(|value| Arc::new(value) as Instance)
        }))
    }

    /// Factory provider producing already-erased instances
    #[inline]
    pub fn raw_factory<F>(factory: F) -> Self
    where
        F: Fn(&Container) -> Result<Instance> + Send + Sync + 'static,
    {
        Provider::Factory(Arc::new(factory))
    }

    /// Alias provider
    #[inline]
    pub fn token(token: impl Into<Token>) -> Self {
        Provider::Token(token.into())
    }

    /// Class provider for `T`
    #[inline]
    pub fn class<T: Constructor>() -> Self {
        Provider::Class(Class::of::<T>())
    }

    #[inline]
    pub fn is_value(&self) -> bool {
        matches!(self, Provider::Value(_))
    }

    #[inline]
    pub fn is_factory(&self) -> bool {
        matches!(self, Provider::Factory(_))
    }

    #[inline]
    pub fn is_token(&self) -> bool {
        matches!(self, Provider::Token(_))
    }

    #[inline]
    pub fn is_class(&self) -> bool {
        matches!(self, Provider::Class(_))
    }

    /// Provider kind, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Provider::Value(_) => "ValueProvider",
            Provider::Factory(_) => "FactoryProvider",
            Provider::Token(_) => "TokenProvider",
            Provider::Class(_) => "ClassProvider",
        }
    }
}

impl From<Class> for Provider {
    /// A bare constructor is an implicit class provider
    #[inline]
    fn from(class: Class) -> Self {
        Provider::Class(class)
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Value(_) => f.write_str("Value(..)"),
            Provider::Factory(_) => f.write_str("Factory(..)"),
            Provider::Token(token) => f.debug_tuple("Token").field(token).finish(),
            Provider::Class(class) => f.debug_tuple("Class").field(&class.name()).finish(),
        }
    }
}

/// Service lifetime specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifecycle {
    /// New instance on every resolve
    #[default]
    Transient,

    /// One instance for the registering container and all its descendants
    Singleton,

    /// One instance per container; children get their own
    ContainerScoped,

    /// One instance per top-level resolve call
    ResolutionScoped,
}

impl Lifecycle {
    /// Whether the engine memoizes results for this lifecycle
    #[inline]
    pub fn is_cached(&self) -> bool {
        !matches!(self, Lifecycle::Transient)
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Lifecycle::Transient => "Transient",
            Lifecycle::Singleton => "Singleton",
            Lifecycle::ContainerScoped => "ContainerScoped",
            Lifecycle::ResolutionScoped => "ResolutionScoped",
        })
    }
}

/// Options attached to a registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistrationOptions {
    pub lifecycle: Lifecycle,
}

impl RegistrationOptions {
    #[inline]
    pub fn new(lifecycle: Lifecycle) -> Self {
        Self { lifecycle }
    }
}

impl From<Lifecycle> for RegistrationOptions {
    #[inline]
    fn from(lifecycle: Lifecycle) -> Self {
        Self { lifecycle }
    }
}

/// One entry for bulk registration via [`Container::registry`].
#[derive(Clone, Debug)]
pub struct RegistryEntry {
    pub token: Token,
    pub provider: Provider,
    pub options: RegistrationOptions,
}

impl RegistryEntry {
    #[inline]
    pub fn new(
        token: impl Into<Token>,
        provider: impl Into<Provider>,
        options: impl Into<RegistrationOptions>,
    ) -> Self {
        Self {
            token: token.into(),
            provider: provider.into(),
            options: options.into(),
        }
    }
}

/// Helper macro to build a [`RegistryEntry`]
#[macro_export]
macro_rules! entry {
    ($token:expr => $provider:expr) => {
        $crate::RegistryEntry::new($token, $provider, $crate::Lifecycle::Transient)
    };
    ($token:expr => $provider:expr, $lifecycle:expr) => {
        $crate::RegistryEntry::new($token, $provider, $lifecycle)
    };
}
