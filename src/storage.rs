//! Registration storage
//!
//! Uses DashMap for lock-free concurrent access. Each token maps to an
//! ordered sequence of registrations; `get` returns the last one.

use crate::{Instance, Lifecycle, Provider, RegistrationOptions, Token};
use ahash::RandomState;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A provider bound to a token, with its cached-instance slot.
///
/// Identity is the registration id: copies made for child containers get a
/// fresh id and an empty slot.
pub struct Registration {
    id: u64,
    provider: Provider,
    options: RegistrationOptions,
    instance: RwLock<Option<Instance>>,
}

impl Registration {
    pub(crate) fn new(provider: Provider, options: RegistrationOptions) -> Arc<Self> {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Arc::new(Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            provider,
            options,
            instance: RwLock::new(None),
        })
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    #[inline]
    pub fn options(&self) -> RegistrationOptions {
        self.options
    }

    #[inline]
    pub fn lifecycle(&self) -> Lifecycle {
        self.options.lifecycle
    }

    /// Whether a cached instance is held
    #[inline]
    pub fn has_instance(&self) -> bool {
        self.instance.read().is_some()
    }

    #[inline]
    pub(crate) fn instance(&self) -> Option<Instance> {
        self.instance.read().clone()
    }

    /// Store `instance` unless another one won the race; returns the cached one.
    pub(crate) fn cache(&self, instance: Instance) -> Instance {
        let mut slot = self.instance.write();
        Arc::clone(slot.get_or_insert(instance))
    }

    #[inline]
    pub(crate) fn clear_instance(&self) {
        self.instance.write().take();
    }

    /// Same provider and options, new identity, no cached instance
    pub(crate) fn detached(&self) -> Arc<Self> {
        Self::new(self.provider.clone(), self.options)
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("provider", &self.provider)
            .field("lifecycle", &self.options.lifecycle)
            .field("has_instance", &self.has_instance())
            .finish()
    }
}

/// Token to ordered registrations multimap.
///
/// Lookups clone the registration handles out so no shard lock outlives the
/// call; resolution re-enters the registry recursively.
pub struct Registry {
    entries: DashMap<Token, Vec<Arc<Registration>>, RandomState>,
}

impl Registry {
    /// Create new empty storage.
    ///
    /// Uses 8 shards; typical containers hold a few dozen tokens.
    #[inline]
    pub fn new() -> Self {
        Self {
            entries: DashMap::with_capacity_and_hasher_and_shard_amount(
                0,
                RandomState::new(),
                8,
            ),
        }
    }

    /// Append a registration
    #[inline]
    pub fn set(&self, token: Token, registration: Arc<Registration>) {
        self.entries.entry(token).or_default().push(registration);
    }

    /// Replace the whole sequence for `token`
    #[inline]
    pub fn set_all(&self, token: Token, registrations: Vec<Arc<Registration>>) {
        self.entries.insert(token, registrations);
    }

    /// Most recently registered entry
    #[inline]
    pub fn get(&self, token: &Token) -> Option<Arc<Registration>> {
        self.entries
            .get(token)
            .and_then(|registrations| registrations.last().cloned())
    }

    /// Every entry in registration order
    #[inline]
    pub fn get_all(&self, token: &Token) -> Option<Vec<Arc<Registration>>> {
        self.entries.get(token).map(|registrations| registrations.clone())
    }

    #[inline]
    pub fn has(&self, token: &Token) -> bool {
        self.entries.contains_key(token)
    }

    #[inline]
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Snapshot of every (token, sequence) pair
    pub fn entries(&self) -> Vec<(Token, Vec<Arc<Registration>>)> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Number of tokens
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("count", &self.len())
            .finish()
    }
}
