//! Caching factory helpers
//!
//! Factory providers run on every resolution and cannot take a cached
//! lifecycle. These helpers wrap a factory so that it memoizes its result
//! itself, either once for its whole lifetime or once per container.

use crate::class::Constructor;
use crate::container::ContainerInner;
use crate::{Container, Injectable, Instance, Provider, Result, Token};
use ahash::RandomState;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Factory that runs `factory` on first resolution and returns that
/// instance afterwards, whichever container asks.
///
/// # Examples
///
/// ```rust
/// use di_engine::{instance_caching_factory, Container};
/// use std::sync::Arc;
///
/// let container = Container::new();
/// container
///     .register("config", instance_caching_factory(|_| Ok(String::from("loaded"))))
///     .unwrap();
///
/// let a = container.resolve("config").unwrap();
/// let b = container.resolve("config").unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
pub fn instance_caching_factory<T, F>(factory: F) -> Provider
where
    T: Injectable,
    F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
{
    let cached: OnceCell<Instance> = OnceCell::new();
    Provider::raw_factory(move |container: &Container| {
        if let Some(instance) = cached.get() {
            #[cfg(feature = "logging")]
            trace!(
                target: "di_engine",
                service = std::any::type_name::<T>(),
                "Caching factory already initialized, returning cached instance"
            );
            return Ok(Arc::clone(instance));
        }

        cached
            .get_or_try_init(|| {
                #[cfg(feature = "logging")]
                debug!(
                    target: "di_engine",
                    service = std::any::type_name::<T>(),
                    "Caching factory initializing on first resolution"
                );

                factory(container).map(|value| Arc::new(value) as Instance)
            })
            .map(Arc::clone)
    })
}

/// Factory that memoizes one instance per resolving container.
///
/// Entries are keyed by container identity and hold the container weakly;
/// entries of dropped containers are pruned on the next miss.
///
/// # Examples
///
/// ```rust
/// use di_engine::{instance_per_container_caching_factory, Container};
/// use std::sync::Arc;
///
/// let root = Container::new();
/// root.register("cache", instance_per_container_caching_factory(|_| Ok(Vec::<u8>::new())))
///     .unwrap();
/// let child = root.create_child_container().unwrap();
///
/// let a = root.resolve("cache").unwrap();
/// let b = child.resolve("cache").unwrap();
/// assert!(Arc::ptr_eq(&a, &root.resolve("cache").unwrap()));
/// assert!(!Arc::ptr_eq(&a, &b));
/// ```
pub fn instance_per_container_caching_factory<T, F>(factory: F) -> Provider
where
    T: Injectable,
    F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
{
    let cache: DashMap<u64, (Weak<ContainerInner>, Instance), RandomState> =
        DashMap::with_hasher(RandomState::new());

    Provider::raw_factory(move |container: &Container| {
        if let Some(entry) = cache.get(&container.id()) {
            return Ok(Arc::clone(&entry.1));
        }

        // Runs without holding a shard lock; the factory may resolve through us.
        let instance = factory(container).map(|value| Arc::new(value) as Instance)?;

        cache.retain(|_, (owner, _)| owner.strong_count() > 0);
        let stored = cache
            .entry(container.id())
            .or_insert_with(|| (container.downgrade(), instance));

        #[cfg(feature = "logging")]
        debug!(
            target: "di_engine",
            service = std::any::type_name::<T>(),
            container = container.id(),
            depth = container.depth(),
            "Per-container factory cached instance"
        );

        Ok(Arc::clone(&stored.1))
    })
}

/// Factory resolving `A` when `predicate` holds and `B` otherwise.
///
/// With `use_caching` the last instance is reused for as long as the
/// predicate keeps returning the same answer; without it every resolution
/// asks the container again.
///
/// # Examples
///
/// ```rust
/// use di_engine::{predicate_aware_class_factory, Args, Constructor, Container, Result};
///
/// struct Sqlite;
/// struct Postgres;
///
/// impl Constructor for Sqlite {
///     fn construct(_: Args) -> Result<Self> { Ok(Sqlite) }
/// }
///
/// impl Constructor for Postgres {
///     fn construct(_: Args) -> Result<Self> { Ok(Postgres) }
/// }
///
/// let container = Container::new();
/// container.register_instance("embedded", true).unwrap();
/// container
///     .register(
///         "store",
///         predicate_aware_class_factory::<Sqlite, Postgres, _>(
///             |c| c.resolve_as::<bool>("embedded").map(|b| *b).unwrap_or(false),
///             true,
///         ),
///     )
///     .unwrap();
///
/// assert!(container.resolve_as::<Sqlite>("store").is_ok());
/// ```
pub fn predicate_aware_class_factory<A, B, P>(predicate: P, use_caching: bool) -> Provider
where
    A: Constructor,
    B: Constructor,
    P: Fn(&Container) -> bool + Send + Sync + 'static,
{
    let last: Mutex<Option<(bool, Instance)>> = Mutex::new(None);

    Provider::raw_factory(move |container: &Container| {
        let current = predicate(container);

        if use_caching {
            if let Some((previous, instance)) = last.lock().as_ref() {
                if *previous == current {
                    return Ok(Arc::clone(instance));
                }
            }
        }

        #[cfg(feature = "logging")]
        trace!(
            target: "di_engine",
            predicate = current,
            chosen = if current {
                std::any::type_name::<A>()
            } else {
                std::any::type_name::<B>()
            },
            "Predicate-aware factory resolving"
        );

        let instance = if current {
            container.resolve(Token::of::<A>())?
        } else {
            container.resolve(Token::of::<B>())?
        };

        if use_caching {
            *last.lock() = Some((current, Arc::clone(&instance)));
        }
        Ok(instance)
    })
}
