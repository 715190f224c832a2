//! Resolution interceptors
//!
//! Pre- and post-resolution callbacks keyed by token. They observe the
//! request (pre) or the resolved value (post) and never influence caching.

use crate::{Instance, Token};
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::Arc;

/// How often an interceptor fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Frequency {
    /// Fires on every resolution
    #[default]
    Always,
    /// Fires on the next resolution only, then is removed
    Once,
}

/// Which entry point triggered the interceptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionType {
    Single,
    All,
}

/// Value handed to post-resolution interceptors.
///
/// `resolve_all` passes the whole sequence, not each element.
#[derive(Clone, Copy)]
pub enum Resolved<'a> {
    Single(&'a Instance),
    All(&'a [Instance]),
}

impl Resolved<'_> {
    #[inline]
    pub fn resolution_type(&self) -> ResolutionType {
        match self {
            Resolved::Single(_) => ResolutionType::Single,
            Resolved::All(_) => ResolutionType::All,
        }
    }

    /// Downcast a single resolved value
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        match self {
            Resolved::Single(instance) => instance.downcast_ref::<T>(),
            Resolved::All(_) => None,
        }
    }
}

impl std::fmt::Debug for Resolved<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolved::Single(_) => f.write_str("Single(..)"),
            Resolved::All(items) => write!(f, "All({} items)", items.len()),
        }
    }
}

/// Interceptor registration options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InterceptorOptions {
    pub frequency: Frequency,
}

impl InterceptorOptions {
    #[inline]
    pub fn once() -> Self {
        Self {
            frequency: Frequency::Once,
        }
    }

    #[inline]
    pub fn always() -> Self {
        Self {
            frequency: Frequency::Always,
        }
    }
}

impl From<Frequency> for InterceptorOptions {
    #[inline]
    fn from(frequency: Frequency) -> Self {
        Self { frequency }
    }
}

pub type PreResolutionCallback = Arc<dyn Fn(&Token, ResolutionType) + Send + Sync>;
pub type PostResolutionCallback = Arc<dyn Fn(&Token, Resolved<'_>) + Send + Sync>;

pub(crate) struct Interceptor<C> {
    pub(crate) callback: C,
    pub(crate) options: InterceptorOptions,
}

/// Ordered token-to-interceptors multimap
pub(crate) struct InterceptorMap<C> {
    entries: DashMap<Token, Vec<Arc<Interceptor<C>>>, RandomState>,
}

impl<C> InterceptorMap<C> {
    fn new() -> Self {
        Self {
            entries: DashMap::with_capacity_and_hasher_and_shard_amount(
                0,
                RandomState::new(),
                4,
            ),
        }
    }

    pub(crate) fn add(&self, token: Token, callback: C, options: InterceptorOptions) {
        self.entries
            .entry(token)
            .or_default()
            .push(Arc::new(Interceptor { callback, options }));
    }

    /// Snapshot the interceptors to run for `token`, pruning `Once` entries.
    ///
    /// Pruning happens before any callback runs, so a callback that resolves
    /// the same token again cannot re-trigger a `Once` interceptor, and
    /// interceptors added by a callback are kept.
    pub(crate) fn take_for_execution(&self, token: &Token) -> Vec<Arc<Interceptor<C>>> {
        match self.entries.get_mut(token) {
            Some(mut interceptors) => {
                let snapshot = interceptors.clone();
                interceptors.retain(|i| i.options.frequency != Frequency::Once);
                snapshot
            }
            None => Vec::new(),
        }
    }

    #[cfg(test)]
    fn len(&self, token: &Token) -> usize {
        self.entries.get(token).map_or(0, |interceptors| interceptors.len())
    }

    #[inline]
    pub(crate) fn clear(&self) {
        self.entries.clear();
    }
}

/// Both interceptor tables of a container
pub(crate) struct Interceptors {
    pub(crate) pre: InterceptorMap<PreResolutionCallback>,
    pub(crate) post: InterceptorMap<PostResolutionCallback>,
}

impl Interceptors {
    pub(crate) fn new() -> Self {
        Self {
            pre: InterceptorMap::new(),
            post: InterceptorMap::new(),
        }
    }

    pub(crate) fn clear(&self) {
        self.pre.clear();
        self.post.clear();
    }
}
