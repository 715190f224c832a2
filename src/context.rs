//! Resolution context
//!
//! Carries resolution-scoped instances through one top-level resolve call.

use crate::Instance;
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "logging")]
use tracing::trace;

/// Per-call cache keyed by registration identity.
///
/// Cloning shares the same cache; a fresh context is created for every
/// top-level `resolve`/`resolve_all` and threaded through the recursion.
///
/// # Examples
///
/// ```rust
/// use di_engine::{Args, Constructor, Container, Lifecycle, Provider, ResolutionContext, Result};
/// use std::sync::Arc;
///
/// struct Unit;
///
/// impl Constructor for Unit {
///     fn construct(_: Args) -> Result<Self> {
///         Ok(Unit)
///     }
/// }
///
/// let container = Container::new();
/// container
///     .register_with("unit", Provider::class::<Unit>(), Lifecycle::ResolutionScoped)
///     .unwrap();
///
/// let context = ResolutionContext::new();
/// let a = container.resolve_with("unit", &context).unwrap();
/// let b = container.resolve_with("unit", &context).unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
#[derive(Clone)]
pub struct ResolutionContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    id: u64,
    scoped: DashMap<u64, Instance, RandomState>,
}

impl ResolutionContext {
    /// Create an empty context with a unique id.
    #[inline]
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self {
            inner: Arc::new(ContextInner {
                id: COUNTER.fetch_add(1, Ordering::Relaxed),
                scoped: DashMap::with_capacity_and_hasher_and_shard_amount(
                    0,
                    RandomState::new(),
                    4,
                ),
            }),
        }
    }

    /// Get the raw ID value.
    #[inline]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Instance already resolved for `registration` in this call tree
    #[inline]
    pub fn get(&self, registration: u64) -> Option<Instance> {
        self.inner
            .scoped
            .get(&registration)
            .map(|instance| Arc::clone(instance.value()))
    }

    #[inline]
    pub fn insert(&self, registration: u64, instance: Instance) {
        #[cfg(feature = "logging")]
        trace!(
            target: "di_engine",
            context = self.inner.id,
            registration = registration,
            "Caching resolution-scoped instance"
        );

        self.inner.scoped.insert(registration, instance);
    }

    #[inline]
    pub fn contains(&self, registration: u64) -> bool {
        self.inner.scoped.contains_key(&registration)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.scoped.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.scoped.is_empty()
    }
}

impl Default for ResolutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ResolutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "resolution-{}", self.inner.id)
    }
}

impl std::fmt::Debug for ResolutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionContext")
            .field("id", &self.inner.id)
            .field("scoped", &self.len())
            .finish()
    }
}
