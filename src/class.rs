//! Constructors and their type-erased identity
//!
//! Parameter discovery is explicit: each constructible type implements
//! [`Constructor`], declaring its arity and (optionally) its ordered
//! parameter descriptors. [`Class`] erases the type so constructors can be
//! stored in registrations and used as tokens.

use crate::lazy::Delayed;
use crate::param::{Args, Param};
use crate::token::TypeKey;
use crate::{Container, Disposable, Injectable, Instance, ResolutionContext, Result};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A type the container can construct.
///
/// # Examples
///
/// ```rust
/// use di_engine::{Args, Constructor, Container, Param, Result, Token};
/// use std::sync::Arc;
///
/// struct Config { url: String }
///
/// impl Constructor for Config {
///     fn construct(_: Args) -> Result<Self> {
///         Ok(Config { url: "postgres://localhost".into() })
///     }
/// }
///
/// struct Repository { config: Arc<Config> }
///
/// impl Constructor for Repository {
///     const ARITY: usize = 1;
///
///     fn parameters() -> Option<Vec<Param>> {
///         Some(vec![Param::of::<Config>()])
///     }
///
///     fn construct(args: Args) -> Result<Self> {
///         Ok(Repository { config: args.get(0)? })
///     }
/// }
///
/// let container = Container::new();
/// let repo = container.get::<Repository>().unwrap();
/// assert_eq!(repo.config.url, "postgres://localhost");
/// ```
pub trait Constructor: Injectable + Sized {
    /// Number of declared constructor arguments
    const ARITY: usize = 0;

    /// Ordered parameter descriptors, `None` when no type information exists
    fn parameters() -> Option<Vec<Param>> {
        None
    }

    /// Build an instance from positionally resolved arguments
    fn construct(args: Args) -> Result<Self>;

    /// Teardown capability. Types implementing [`Disposable`] return `Some(self)`.
    fn into_disposable(self: Arc<Self>) -> Option<Arc<dyn Disposable>> {
        None
    }
}

/// Freshly built instance plus its teardown handle
pub(crate) struct Constructed {
    pub(crate) instance: Instance,
    pub(crate) disposable: Option<Arc<dyn Disposable>>,
}

#[derive(Clone, Copy)]
pub(crate) enum ClassKind {
    Eager {
        arity: usize,
        parameters: fn() -> Option<Vec<Param>>,
        build: fn(Args) -> Result<Constructed>,
    },
    Delayed {
        target: TypeKey,
        proxy: fn(&Container, &ResolutionContext) -> Instance,
    },
}

/// Type-erased constructor identity.
#[derive(Clone, Copy)]
pub struct Class {
    key: TypeKey,
    kind: ClassKind,
}

impl Class {
    /// Class for constructor `T`
    #[inline]
    pub fn of<T: Constructor>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            kind: ClassKind::Eager {
                arity: T::ARITY,
                parameters: T::parameters,
                build: build_erased::<T>,
            },
        }
    }

    /// Deferred-construction placeholder for `T`.
    ///
    /// Constructing it yields a [`Delayed<T>`] bound to the constructing
    /// container and resolution context.
    #[inline]
    pub fn delayed<T: Constructor>() -> Self {
        Self {
            key: TypeKey::of::<Delayed<T>>(),
            kind: ClassKind::Delayed {
                target: TypeKey::of::<T>(),
                proxy: proxy_erased::<T>,
            },
        }
    }

    /// Type name of the constructed value
    #[inline]
    pub fn name(&self) -> &'static str {
        self.key.name()
    }

    #[inline]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Declared argument count (zero for delayed placeholders)
    #[inline]
    pub fn arity(&self) -> usize {
        match self.kind {
            ClassKind::Eager { arity, .. } => arity,
            ClassKind::Delayed { .. } => 0,
        }
    }

    /// Whether this is a deferred-construction placeholder
    #[inline]
    pub fn is_delayed(&self) -> bool {
        matches!(self.kind, ClassKind::Delayed { .. })
    }

    /// The real constructor behind a delayed placeholder
    #[inline]
    pub fn delayed_target(&self) -> Option<TypeKey> {
        match self.kind {
            ClassKind::Delayed { target, .. } => Some(target),
            ClassKind::Eager { .. } => None,
        }
    }

    #[inline]
    pub(crate) fn kind(&self) -> ClassKind {
        self.kind
    }
}

fn build_erased<T: Constructor>(args: Args) -> Result<Constructed> {
    let instance = Arc::new(T::construct(args)?);
    let disposable = T::into_disposable(Arc::clone(&instance));
    Ok(Constructed {
        instance,
        disposable,
    })
}

fn proxy_erased<T: Constructor>(container: &Container, context: &ResolutionContext) -> Instance {
    Arc::new(Delayed::<T>::new(container, context.clone()))
}

impl PartialEq for Class {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Class {}

impl Hash for Class {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name())
            .field("arity", &self.arity())
            .field("delayed", &self.is_delayed())
            .finish()
    }
}
