//! Deferred construction
//!
//! [`Delayed<T>`] stands in for a `T` that has not been resolved yet. It is
//! produced when a [`Class::delayed`](crate::Class::delayed) placeholder is
//! constructed and materializes the real instance on first access, through
//! the same container and resolution context that created it. Two types that
//! need each other in their constructors resolve as long as one side takes
//! the other as `Delayed`.

use crate::class::Constructor;
use crate::{Container, DiError, ResolutionContext, Result, Token};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::ops::Deref;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::debug;

/// Lazy proxy for a `T` resolved on first access.
///
/// Keeps its container alive until the first access and releases it once the
/// real instance is in place, so the proxy stays usable after every other
/// handle to the container is gone.
///
/// # Examples
///
/// ```rust
/// use di_engine::{Args, Constructor, Container, Delayed, Param, Result};
/// use std::sync::Arc;
///
/// struct Engine { car: Arc<Delayed<Car>> }
/// struct Car { engine: Arc<Engine> }
///
/// impl Constructor for Engine {
///     const ARITY: usize = 1;
///     fn parameters() -> Option<Vec<Param>> {
///         Some(vec![Param::delayed::<Car>()])
///     }
///     fn construct(args: Args) -> Result<Self> {
///         Ok(Engine { car: args.get(0)? })
///     }
/// }
///
/// impl Car {
///     fn wheels(&self) -> u8 { 4 }
/// }
///
/// impl Constructor for Car {
///     const ARITY: usize = 1;
///     fn parameters() -> Option<Vec<Param>> {
///         Some(vec![Param::of::<Engine>()])
///     }
///     fn construct(args: Args) -> Result<Self> {
///         Ok(Car { engine: args.get(0)? })
///     }
/// }
///
/// let container = Container::new();
/// let car = container.get::<Car>().unwrap();
/// assert_eq!(car.engine.car.wheels(), 4);
/// ```
pub struct Delayed<T: Constructor> {
    container: Mutex<Option<Container>>,
    context: ResolutionContext,
    target: OnceCell<Arc<T>>,
}

impl<T: Constructor> Delayed<T> {
    pub(crate) fn new(container: &Container, context: ResolutionContext) -> Self {
        Self {
            container: Mutex::new(Some(container.clone())),
            context,
            target: OnceCell::new(),
        }
    }

    /// Materialize (once) and return the real instance.
    pub fn get(&self) -> Result<Arc<T>> {
        self.materialize().cloned()
    }

    /// Whether the real instance has been resolved
    #[inline]
    pub fn is_materialized(&self) -> bool {
        self.target.get().is_some()
    }

    fn materialize(&self) -> Result<&Arc<T>> {
        self.target.get_or_try_init(|| {
            // Only taken after a successful resolve, which also fills `target`
            let container = self.container.lock().clone().ok_or_else(|| {
                DiError::creation_failed::<T>("delayed proxy has already released its container")
            })?;

            #[cfg(feature = "logging")]
            debug!(
                target: "di_engine",
                service = std::any::type_name::<T>(),
                context = self.context.id(),
                "Materializing delayed instance on first access"
            );

            let target = container.resolve_as_with::<T>(Token::of::<T>(), &self.context)?;
            self.container.lock().take();
            Ok(target)
        })
    }
}

impl<T: Constructor> Deref for Delayed<T> {
    type Target = T;

    /// # Panics
    ///
    /// Panics if the target cannot be resolved; use [`Delayed::get`] to
    /// handle the error instead.
    fn deref(&self) -> &T {
        match self.materialize() {
            Ok(target) => target,
            Err(err) => panic!(
                "failed to materialize delayed {}: {err}",
                std::any::type_name::<T>()
            ),
        }
    }
}

impl<T: Constructor> std::fmt::Debug for Delayed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delayed")
            .field("target", &std::any::type_name::<T>())
            .field("materialized", &self.is_materialized())
            .finish()
    }
}
