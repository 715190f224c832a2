//! Dependency resolution engine
//!
//! The `Container` owns a registry of token registrations, resolves tokens
//! into fully wired object graphs, caches instances according to each
//! registration's lifecycle and tracks disposable instances it constructs.

use crate::class::{Class, ClassKind};
use crate::interceptor::{
    InterceptorOptions, Interceptors, PostResolutionCallback, PreResolutionCallback,
    ResolutionType, Resolved,
};
use crate::param::{Args, Argument, Param};
use crate::storage::{Registration, Registry};
use crate::{
    DiError, Disposable, Injectable, Instance, Lifecycle, Provider, RegistrationOptions,
    RegistryEntry, ResolutionContext, Result, Token,
};
use futures::future::join_all;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

#[cfg(feature = "logging")]
use tracing::{debug, trace};

pub(crate) struct ContainerInner {
    id: u64,
    registry: Registry,
    interceptors: Interceptors,
    disposables: Mutex<Vec<Arc<dyn Disposable>>>,
    parent: Option<Container>,
    disposed: AtomicBool,
    depth: u32,
}

/// Dependency injection container.
///
/// Cloning is cheap and yields a handle to the same container. Child
/// containers delegate lookups to their parent, except for container-scoped
/// registrations which every child re-instantiates for itself.
///
/// # Examples
///
/// ```rust
/// use di_engine::{Args, Constructor, Container, Lifecycle, Param, Provider, Result};
/// use std::sync::Arc;
///
/// struct Database { url: String }
///
/// impl Constructor for Database {
///     fn construct(_: Args) -> Result<Self> {
///         Ok(Database { url: "postgres://localhost".into() })
///     }
/// }
///
/// struct UserService { db: Arc<Database> }
///
/// impl Constructor for UserService {
///     const ARITY: usize = 1;
///     fn parameters() -> Option<Vec<Param>> {
///         Some(vec![Param::token("db")])
///     }
///     fn construct(args: Args) -> Result<Self> {
///         Ok(UserService { db: args.get(0)? })
///     }
/// }
///
/// let container = Container::new();
/// container
///     .register_with("db", Provider::class::<Database>(), Lifecycle::Singleton)
///     .unwrap();
///
/// let users = container.get::<UserService>().unwrap();
/// assert_eq!(users.db.url, "postgres://localhost");
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    /// Create a new root container.
    #[inline]
    pub fn new() -> Self {
        #[cfg(feature = "logging")]
        debug!(
            target: "di_engine",
            depth = 0,
            "Creating new root DI container"
        );

        Self::build(None, 0)
    }

    fn build(parent: Option<Container>, depth: u32) -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self {
            inner: Arc::new(ContainerInner {
                id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
                registry: Registry::new(),
                interceptors: Interceptors::new(),
                disposables: Mutex::new(Vec::new()),
                parent,
                disposed: AtomicBool::new(false),
                depth,
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> Weak<ContainerInner> {
        Arc::downgrade(&self.inner)
    }

    /// Create a child container that inherits from this one.
    ///
    /// Tokens with at least one container-scoped registration are copied
    /// into the child: container-scoped entries without their cached
    /// instance, the other entries of that token as shared handles. Every
    /// other token is found through parent delegation, so a singleton
    /// registered only here stays a single instance across descendants.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use di_engine::{Args, Constructor, Container, Lifecycle, Provider, Result};
    /// use std::sync::Arc;
    ///
    /// struct Session;
    ///
    /// impl Constructor for Session {
    ///     fn construct(_: Args) -> Result<Self> {
    ///         Ok(Session)
    ///     }
    /// }
    ///
    /// let root = Container::new();
    /// root.register_with("session", Provider::class::<Session>(), Lifecycle::ContainerScoped)
    ///     .unwrap();
    ///
    /// let child = root.create_child_container().unwrap();
    /// let a = root.resolve("session").unwrap();
    /// let b = child.resolve("session").unwrap();
    /// assert!(!Arc::ptr_eq(&a, &b));
    /// ```
    pub fn create_child_container(&self) -> Result<Container> {
        self.ensure_not_disposed()?;

        let child = Self::build(Some(self.clone()), self.inner.depth + 1);
        let mut copied = 0usize;

        for (token, registrations) in self.inner.registry.entries() {
            if registrations
                .iter()
                .any(|r| r.lifecycle() == Lifecycle::ContainerScoped)
            {
                let inherited = registrations
                    .iter()
                    .map(|r| {
                        if r.lifecycle() == Lifecycle::ContainerScoped {
                            r.detached()
                        } else {
                            Arc::clone(r)
                        }
                    })
                    .collect();
                child.inner.registry.set_all(token, inherited);
                copied += 1;
            }
        }

        #[cfg(feature = "logging")]
        debug!(
            target: "di_engine",
            parent_depth = self.inner.depth,
            child_depth = child.inner.depth,
            container_scoped_tokens = copied,
            "Creating child container from parent container"
        );
        #[cfg(not(feature = "logging"))]
        let _ = copied;

        Ok(child)
    }

    /// Alias for `create_child_container()`.
    #[inline]
    pub fn scope(&self) -> Result<Container> {
        self.create_child_container()
    }

    // =========================================================================
    // Registration Methods
    // =========================================================================

    /// Register a provider (or bare [`Class`]) with the default Transient lifecycle.
    #[inline]
    pub fn register(
        &self,
        token: impl Into<Token>,
        provider: impl Into<Provider>,
    ) -> Result<&Self> {
        self.register_with(token, provider, RegistrationOptions::default())
    }

    /// Register a provider with explicit options.
    ///
    /// Alias chains are checked here, so a cyclic alias never reaches
    /// resolution. Value and factory providers only accept the Transient
    /// lifecycle.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use di_engine::{Container, DiError, Provider};
    ///
    /// let container = Container::new();
    /// container.register("a", Provider::token("b")).unwrap();
    /// container.register("b", Provider::token("c")).unwrap();
    ///
    /// let err = container.register("c", Provider::token("a")).unwrap_err();
    /// assert!(matches!(err, DiError::RegistrationCycle { .. }));
    /// assert_eq!(
    ///     err.to_string(),
    ///     "Token registration cycle detected! a -> b -> c -> a"
    /// );
    /// ```
    pub fn register_with(
        &self,
        token: impl Into<Token>,
        provider: impl Into<Provider>,
        options: impl Into<RegistrationOptions>,
    ) -> Result<&Self> {
        self.ensure_not_disposed()?;

        let token = token.into();
        let provider = provider.into();
        let options = options.into();

        if let Provider::Token(target) = &provider {
            self.check_alias_chain(&token, target)?;
        }

        if options.lifecycle.is_cached() && (provider.is_value() || provider.is_factory()) {
            return Err(DiError::configuration(format!(
                "Cannot use lifecycle \"{}\" with ValueProviders or FactoryProviders",
                options.lifecycle
            )));
        }

        #[cfg(feature = "logging")]
        debug!(
            target: "di_engine",
            token = %token,
            provider = provider.kind(),
            lifecycle = %options.lifecycle,
            depth = self.inner.depth,
            "Registering provider"
        );

        self.inner
            .registry
            .set(token, Registration::new(provider, options));
        Ok(self)
    }

    /// Walk the alias chain starting at `target`, failing if it returns to a
    /// token already on the path.
    ///
    /// Links are followed the way resolution follows them, through parents.
    fn check_alias_chain(&self, token: &Token, target: &Token) -> Result<()> {
        let mut path = vec![token.clone()];
        let mut next = Some(target.clone());

        while let Some(current) = next {
            if let Some(start) = path.iter().position(|t| *t == current) {
                let mut cycle: Vec<Token> = path[start..].to_vec();
                // List the loop from the alias target: a -> b -> c -> a
                if start == 0 && cycle.len() > 1 {
                    cycle.rotate_left(1);
                    cycle.push(cycle[0].clone());
                } else {
                    cycle.push(current);
                }
                return Err(DiError::RegistrationCycle {
                    chain: cycle.iter().map(ToString::to_string).collect(),
                });
            }

            next = self
                .get_registration(&current)
                .and_then(|registration| match registration.provider() {
                    Provider::Token(alias) => Some(alias.clone()),
                    _ => None,
                });
            path.push(current);
        }

        Ok(())
    }

    /// Register `from` as `to`: an alias when `to` is a name, a class otherwise.
    pub fn register_type(&self, from: impl Into<Token>, to: impl Into<Token>) -> Result<&Self> {
        let to: Token = to.into();
        match to {
            Token::Class(class) => self.register(from, Provider::Class(class)),
            name => self.register(from, Provider::Token(name)),
        }
    }

    /// Register a pre-built instance.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use di_engine::Container;
    ///
    /// let container = Container::new();
    /// container.register_instance("port", 8080u16).unwrap();
    /// assert_eq!(*container.resolve_as::<u16>("port").unwrap(), 8080);
    /// ```
    #[inline]
    pub fn register_instance<T: Injectable>(&self, token: impl Into<Token>, value: T) -> Result<&Self> {
        self.register(token, Provider::value(value))
    }

    /// Register with the Singleton lifecycle.
    ///
    /// A named `from` needs a `to`: a name becomes an alias, a class is
    /// constructed. A class `from` is constructed as `to` when `to` is a
    /// class, else as itself.
    pub fn register_singleton(&self, from: impl Into<Token>, to: Option<Token>) -> Result<&Self> {
        let from = from.into();
        let provider = match (&from, to) {
            (Token::Name(_), Some(Token::Class(class))) => Provider::Class(class),
            (Token::Name(_), Some(alias)) => Provider::Token(alias),
            (Token::Name(_), None) => {
                return Err(DiError::configuration(
                    "Cannot register a type name as a singleton without a \"to\" token",
                ));
            }
            (Token::Class(own), to) => match to {
                Some(Token::Class(class)) => Provider::Class(class),
                _ => Provider::Class(*own),
            },
        };
        self.register_with(from, provider, Lifecycle::Singleton)
    }

    /// Register several entries at once, in order.
    pub fn registry(&self, entries: impl IntoIterator<Item = RegistryEntry>) -> Result<&Self> {
        for entry in entries {
            self.register_with(entry.token, entry.provider, entry.options)?;
        }
        Ok(self)
    }

    // =========================================================================
    // Resolution Methods
    // =========================================================================

    /// Resolve the most recent registration of `token` in a fresh context.
    #[inline]
    pub fn resolve(&self, token: impl Into<Token>) -> Result<Instance> {
        self.resolve_token(&token.into(), &ResolutionContext::new())
    }

    /// Resolve within an existing resolution context.
    #[inline]
    pub fn resolve_with(&self, token: impl Into<Token>, context: &ResolutionContext) -> Result<Instance> {
        self.resolve_token(&token.into(), context)
    }

    /// Resolve and downcast to `T`.
    #[inline]
    pub fn resolve_as<T: Injectable>(&self, token: impl Into<Token>) -> Result<Arc<T>> {
        self.resolve_as_with(token, &ResolutionContext::new())
    }

    /// Resolve within `context` and downcast to `T`.
    pub fn resolve_as_with<T: Injectable>(
        &self,
        token: impl Into<Token>,
        context: &ResolutionContext,
    ) -> Result<Arc<T>> {
        let token = token.into();
        self.resolve_token(&token, context)?
            .downcast::<T>()
            .map_err(|_| DiError::type_mismatch::<T>(&token))
    }

    /// Resolve `T` using the type itself as token.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use di_engine::{Args, Constructor, Container, Result};
    ///
    /// struct Clock;
    ///
    /// impl Constructor for Clock {
    ///     fn construct(_: Args) -> Result<Self> {
    ///         Ok(Clock)
    ///     }
    /// }
    ///
    /// // Unregistered classes construct themselves
    /// let container = Container::new();
    /// assert!(container.get::<Clock>().is_ok());
    /// ```
    #[inline]
    pub fn get<T: crate::Constructor>(&self) -> Result<Arc<T>> {
        self.resolve_as::<T>(Token::of::<T>())
    }

    /// Resolve every registration of `token`, in registration order.
    #[inline]
    pub fn resolve_all(&self, token: impl Into<Token>) -> Result<Vec<Instance>> {
        self.resolve_all_token(&token.into(), &ResolutionContext::new())
    }

    /// Resolve every registration within an existing context.
    #[inline]
    pub fn resolve_all_with(
        &self,
        token: impl Into<Token>,
        context: &ResolutionContext,
    ) -> Result<Vec<Instance>> {
        self.resolve_all_token(&token.into(), context)
    }

    /// Resolve every registration and downcast each to `T`.
    pub fn resolve_all_as<T: Injectable>(&self, token: impl Into<Token>) -> Result<Vec<Arc<T>>> {
        let token = token.into();
        self.resolve_all_token(&token, &ResolutionContext::new())?
            .into_iter()
            .map(|instance| {
                instance
                    .downcast::<T>()
                    .map_err(|_| DiError::type_mismatch::<T>(&token))
            })
            .collect()
    }

    fn resolve_token(&self, token: &Token, context: &ResolutionContext) -> Result<Instance> {
        self.ensure_not_disposed()?;
        self.execute_pre_resolution(token, ResolutionType::Single);

        let resolved = match self.get_registration(token) {
            Some(registration) => self.resolve_registration(&registration, context)?,
            None => match token {
                Token::Class(class) => {
                    #[cfg(feature = "logging")]
                    trace!(
                        target: "di_engine",
                        token = %token,
                        depth = self.inner.depth,
                        "No registration, constructing class as its own provider"
                    );
                    self.construct(class, context)?
                }
                Token::Name(_) => {
                    #[cfg(feature = "logging")]
                    debug!(
                        target: "di_engine",
                        token = %token,
                        depth = self.inner.depth,
                        "Token not found in container or parent chain"
                    );
                    return Err(DiError::UnresolvedToken {
                        token: token.to_string(),
                    });
                }
            },
        };

        self.execute_post_resolution(token, Resolved::Single(&resolved));
        Ok(resolved)
    }

    fn resolve_all_token(&self, token: &Token, context: &ResolutionContext) -> Result<Vec<Instance>> {
        self.ensure_not_disposed()?;
        self.execute_pre_resolution(token, ResolutionType::All);

        let resolved = match self.get_all_registrations(token) {
            Some(registrations) => registrations
                .iter()
                .map(|registration| self.resolve_registration(registration, context))
                .collect::<Result<Vec<_>>>()?,
            None => match token {
                Token::Class(class) => vec![self.construct(class, context)?],
                Token::Name(_) => {
                    return Err(DiError::UnresolvedToken {
                        token: token.to_string(),
                    });
                }
            },
        };

        self.execute_post_resolution(token, Resolved::All(&resolved));
        Ok(resolved)
    }

    /// Local registration, else the nearest ancestor's.
    fn get_registration(&self, token: &Token) -> Option<Arc<Registration>> {
        if self.inner.registry.has(token) {
            return self.inner.registry.get(token);
        }
        self.inner
            .parent
            .as_ref()
            .and_then(|parent| parent.get_registration(token))
    }

    fn get_all_registrations(&self, token: &Token) -> Option<Vec<Arc<Registration>>> {
        if self.inner.registry.has(token) {
            return self.inner.registry.get_all(token);
        }
        self.inner
            .parent
            .as_ref()
            .and_then(|parent| parent.get_all_registrations(token))
    }

    fn resolve_registration(
        &self,
        registration: &Registration,
        context: &ResolutionContext,
    ) -> Result<Instance> {
        self.ensure_not_disposed()?;

        let lifecycle = registration.lifecycle();
        if lifecycle == Lifecycle::ResolutionScoped {
            if let Some(instance) = context.get(registration.id()) {
                #[cfg(feature = "logging")]
                trace!(
                    target: "di_engine",
                    registration = registration.id(),
                    context = context.id(),
                    "Resolution-scoped instance reused"
                );
                return Ok(instance);
            }
        }

        let memoized = matches!(lifecycle, Lifecycle::Singleton | Lifecycle::ContainerScoped);

        let resolved = match registration.provider() {
            Provider::Value(value) => Arc::clone(value),
            Provider::Factory(factory) => factory(self)?,
            Provider::Token(alias) if memoized => {
                self.cached_or_else(registration, || self.resolve_token(alias, context))?
            }
            Provider::Token(alias) => self.resolve_token(alias, context)?,
            Provider::Class(class) if memoized => {
                self.cached_or_else(registration, || self.construct(class, context))?
            }
            Provider::Class(class) => self.construct(class, context)?,
        };

        if lifecycle == Lifecycle::ResolutionScoped {
            context.insert(registration.id(), Arc::clone(&resolved));
        }

        Ok(resolved)
    }

    /// Registration's cached instance, or the result of `create` stored in it.
    ///
    /// No lock is held while `create` runs; it recurses into the engine.
    fn cached_or_else(
        &self,
        registration: &Registration,
        create: impl FnOnce() -> Result<Instance>,
    ) -> Result<Instance> {
        if let Some(instance) = registration.instance() {
            #[cfg(feature = "logging")]
            trace!(
                target: "di_engine",
                registration = registration.id(),
                lifecycle = %registration.lifecycle(),
                "Returning cached instance"
            );
            return Ok(instance);
        }
        Ok(registration.cache(create()?))
    }

    /// Build `class`, resolving its parameters positionally.
    fn construct(&self, class: &Class, context: &ResolutionContext) -> Result<Instance> {
        let (arity, parameters, build) = match class.kind() {
            ClassKind::Delayed { proxy, .. } => {
                #[cfg(feature = "logging")]
                trace!(
                    target: "di_engine",
                    class = class.name(),
                    "Creating delayed proxy"
                );
                return Ok(proxy(self, context));
            }
            ClassKind::Eager {
                arity,
                parameters,
                build,
            } => (arity, parameters, build),
        };

        let args = match parameters() {
            Some(params) if !params.is_empty() => {
                let mut values = Vec::with_capacity(params.len());
                for (index, param) in params.iter().enumerate() {
                    let value = self
                        .resolve_param(param, context)
                        .map_err(|err| DiError::parameter(class.name(), index, err))?;
                    values.push(value);
                }
                Args::new(class.name(), values)
            }
            _ if arity == 0 => Args::new(class.name(), Vec::new()),
            _ => {
                return Err(DiError::MissingTypeInfo {
                    class: class.name(),
                });
            }
        };

        let constructed = build(args)?;

        #[cfg(feature = "logging")]
        trace!(
            target: "di_engine",
            class = class.name(),
            depth = self.inner.depth,
            disposable = constructed.disposable.is_some(),
            "Constructed instance"
        );

        if let Some(disposable) = constructed.disposable {
            self.inner.disposables.lock().push(disposable);
        }

        Ok(constructed.instance)
    }

    fn resolve_param(&self, param: &Param, context: &ResolutionContext) -> Result<Argument> {
        match param {
            Param::Token(token) => self.resolve_token(token, context).map(Argument::Single),
            Param::All(token) => self.resolve_all_token(token, context).map(Argument::Multiple),
            Param::Transform(descriptor) => {
                let transformer = self.resolve_token(descriptor.transform_token(), context)?;
                let incoming = if descriptor.is_multiple() {
                    Argument::Multiple(self.resolve_all_token(descriptor.token(), context)?)
                } else {
                    Argument::Single(self.resolve_token(descriptor.token(), context)?)
                };
                descriptor.apply(&transformer, incoming).map(Argument::Single)
            }
        }
    }

    // =========================================================================
    // Interceptors
    // =========================================================================

    /// Run `callback` before each resolution of `token`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use di_engine::{Container, InterceptorOptions};
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicU32, Ordering};
    ///
    /// let container = Container::new();
    /// container.register_instance("answer", 42u32).unwrap();
    ///
    /// let seen = Arc::new(AtomicU32::new(0));
    /// let counter = Arc::clone(&seen);
    /// container
    ///     .before_resolution(
    ///         "answer",
    ///         move |_, _| {
    ///             counter.fetch_add(1, Ordering::SeqCst);
    ///         },
    ///         InterceptorOptions::once(),
    ///     )
    ///     .unwrap();
    ///
    /// container.resolve("answer").unwrap();
    /// container.resolve("answer").unwrap();
    /// assert_eq!(seen.load(Ordering::SeqCst), 1);
    /// ```
    pub fn before_resolution<F>(
        &self,
        token: impl Into<Token>,
        callback: F,
        options: InterceptorOptions,
    ) -> Result<()>
    where
        F: Fn(&Token, ResolutionType) + Send + Sync + 'static,
    {
        self.ensure_not_disposed()?;
        let callback: PreResolutionCallback = Arc::new(callback);
        self.inner
            .interceptors
            .pre
            .add(token.into(), callback, options);
        Ok(())
    }

    /// Run `callback` after each resolution of `token`, with the resolved value.
    pub fn after_resolution<F>(
        &self,
        token: impl Into<Token>,
        callback: F,
        options: InterceptorOptions,
    ) -> Result<()>
    where
        F: Fn(&Token, Resolved<'_>) + Send + Sync + 'static,
    {
        self.ensure_not_disposed()?;
        let callback: PostResolutionCallback = Arc::new(callback);
        self.inner
            .interceptors
            .post
            .add(token.into(), callback, options);
        Ok(())
    }

    fn execute_pre_resolution(&self, token: &Token, resolution: ResolutionType) {
        for interceptor in self.inner.interceptors.pre.take_for_execution(token) {
            (interceptor.callback)(token, resolution);
        }
    }

    fn execute_post_resolution(&self, token: &Token, resolved: Resolved<'_>) {
        for interceptor in self.inner.interceptors.post.take_for_execution(token) {
            (interceptor.callback)(token, resolved);
        }
    }

    // =========================================================================
    // Query Methods
    // =========================================================================

    /// Check if `token` is registered here, or anywhere up the chain when `recursive`.
    pub fn is_registered(&self, token: impl Into<Token>, recursive: bool) -> Result<bool> {
        self.ensure_not_disposed()?;
        Ok(self.is_registered_token(&token.into(), recursive))
    }

    fn is_registered_token(&self, token: &Token, recursive: bool) -> bool {
        if self.inner.registry.has(token) {
            return true;
        }
        recursive
            && self
                .inner
                .parent
                .as_ref()
                .is_some_and(|parent| parent.is_registered_token(token, true))
    }

    // Plain inspection accessors below stay usable after `dispose()`; they
    // never read a registration or construct anything.

    /// Number of tokens registered in this container (not including parents).
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.registry.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.registry.is_empty()
    }

    /// Get the container depth (0 = root).
    #[inline]
    pub fn depth(&self) -> u32 {
        self.inner.depth
    }

    /// Unique container identity
    #[inline]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Parent container, if this is a child
    #[inline]
    pub fn parent(&self) -> Option<&Container> {
        self.inner.parent.as_ref()
    }

    /// Number of tracked disposable instances, zero once disposed
    #[inline]
    pub fn disposable_count(&self) -> usize {
        self.inner.disposables.lock().len()
    }

    // =========================================================================
    // Lifecycle Methods
    // =========================================================================

    /// Drop every registration and interceptor of this container.
    pub fn reset(&self) -> Result<()> {
        self.ensure_not_disposed()?;

        #[cfg(feature = "logging")]
        debug!(
            target: "di_engine",
            depth = self.inner.depth,
            tokens_removed = self.inner.registry.len(),
            "Container reset - registrations and interceptors removed"
        );

        self.inner.registry.clear();
        self.inner.interceptors.clear();
        Ok(())
    }

    /// Forget cached instances and evict value registrations.
    ///
    /// Cached slots are shared with child containers that inherited the
    /// registration by handle, so those are cleared too.
    pub fn clear_instances(&self) -> Result<()> {
        self.ensure_not_disposed()?;

        for (token, registrations) in self.inner.registry.entries() {
            let kept: Vec<Arc<Registration>> = registrations
                .into_iter()
                .filter(|r| !r.provider().is_value())
                .inspect(|r| r.clear_instance())
                .collect();
            self.inner.registry.set_all(token, kept);
        }

        #[cfg(feature = "logging")]
        debug!(
            target: "di_engine",
            depth = self.inner.depth,
            "Cleared cached instances"
        );

        Ok(())
    }

    /// Whether `dispose()` has been called.
    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    /// Mark the container disposed and tear down every tracked instance.
    ///
    /// All teardowns are started before any is awaited; one failing does not
    /// stop the others. Failures are reported together once all complete.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use di_engine::{Container, DiError};
    ///
    /// let container = Container::new();
    /// futures::executor::block_on(container.dispose()).unwrap();
    /// assert!(matches!(container.resolve("x"), Err(DiError::DisposedContainer)));
    /// ```
    pub async fn dispose(&self) -> Result<()> {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return Err(DiError::DisposedContainer);
        }

        let disposables = std::mem::take(&mut *self.inner.disposables.lock());

        #[cfg(feature = "logging")]
        debug!(
            target: "di_engine",
            depth = self.inner.depth,
            disposables = disposables.len(),
            "Disposing container"
        );

        let pending: Vec<_> = disposables.iter().map(|d| d.dispose()).collect();
        let failures: Vec<Arc<dyn std::error::Error + Send + Sync>> = join_all(pending)
            .await
            .into_iter()
            .filter_map(|outcome| outcome.err())
            .map(Arc::from)
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            #[cfg(feature = "logging")]
            debug!(
                target: "di_engine",
                failed = failures.len(),
                "Teardown failures during dispose"
            );
            Err(DiError::Disposal { failures })
        }
    }

    #[inline]
    fn ensure_not_disposed(&self) -> Result<()> {
        if self.is_disposed() {
            return Err(DiError::DisposedContainer);
        }
        Ok(())
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.inner.id)
            .field("token_count", &self.len())
            .field("depth", &self.inner.depth)
            .field("has_parent", &self.inner.parent.is_some())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BoxError, Constructor, Frequency, Transform};
    use futures::future::{BoxFuture, FutureExt};
    use std::sync::atomic::AtomicU32;

    // -------------------------------------------------------------------------
    // Fixtures
    // -------------------------------------------------------------------------

    struct Leaf {
        serial: u32,
    }

    static LEAF_SERIAL: AtomicU32 = AtomicU32::new(0);

    impl Constructor for Leaf {
        fn construct(_: Args) -> Result<Self> {
            Ok(Leaf {
                serial: LEAF_SERIAL.fetch_add(1, Ordering::SeqCst),
            })
        }
    }

    /// Two parameters resolving the same token
    struct Pair {
        left: Arc<Leaf>,
        right: Arc<Leaf>,
    }

    impl Constructor for Pair {
        const ARITY: usize = 2;

        fn parameters() -> Option<Vec<Param>> {
            Some(vec![Param::token("leaf"), Param::token("leaf")])
        }

        fn construct(args: Args) -> Result<Self> {
            Ok(Pair {
                left: args.get(0)?,
                right: args.get(1)?,
            })
        }
    }

    #[derive(Debug)]
    struct Untyped;

    impl Constructor for Untyped {
        const ARITY: usize = 1;

        fn construct(_: Args) -> Result<Self> {
            Ok(Untyped)
        }
    }

    struct NeedsMissing;

    impl Constructor for NeedsMissing {
        const ARITY: usize = 2;

        fn parameters() -> Option<Vec<Param>> {
            Some(vec![Param::of::<Leaf>(), Param::token("missing")])
        }

        fn construct(_: Args) -> Result<Self> {
            Ok(NeedsMissing)
        }
    }

    #[derive(Debug)]
    struct Outer;

    impl Constructor for Outer {
        const ARITY: usize = 1;

        fn parameters() -> Option<Vec<Param>> {
            Some(vec![Param::of::<NeedsMissing>()])
        }

        fn construct(_: Args) -> Result<Self> {
            Ok(Outer)
        }
    }

    struct Plugins {
        names: Vec<Arc<String>>,
    }

    impl Constructor for Plugins {
        const ARITY: usize = 1;

        fn parameters() -> Option<Vec<Param>> {
            Some(vec![Param::all("plugin")])
        }

        fn construct(args: Args) -> Result<Self> {
            Ok(Plugins {
                names: args.all(0)?,
            })
        }
    }

    struct Joiner;

    impl Transform for Joiner {
        fn transform(&self, incoming: Argument, args: &[Instance]) -> Result<Instance> {
            let separator = args
                .first()
                .and_then(|a| a.downcast_ref::<&'static str>())
                .copied()
                .unwrap_or(",");
            let joined = match &incoming {
                Argument::Single(_) => incoming.expect_single::<String>("subject")?.to_string(),
                Argument::Multiple(_) => incoming
                    .expect_multiple::<String>("subject")?
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(separator),
            };
            Ok(Arc::new(joined))
        }
    }

    impl Constructor for Joiner {
        fn construct(_: Args) -> Result<Self> {
            Ok(Joiner)
        }
    }

    struct Banner {
        text: Arc<String>,
        single: Arc<String>,
    }

    impl Constructor for Banner {
        const ARITY: usize = 2;

        fn parameters() -> Option<Vec<Param>> {
            Some(vec![
                Param::transform_all::<Joiner>(
                    "plugin",
                    Token::of::<Joiner>(),
                    vec![Arc::new(" + ") as Instance],
                ),
                Param::transform::<Joiner>("greeting", Token::of::<Joiner>(), Vec::new()),
            ])
        }

        fn construct(args: Args) -> Result<Self> {
            Ok(Banner {
                text: args.get(0)?,
                single: args.get(1)?,
            })
        }
    }

    // Mutual dependency, broken on the Husband side
    struct Wife {
        husband: Arc<Husband>,
    }

    struct Husband {
        wife: Arc<crate::Delayed<Wife>>,
    }

    impl Wife {
        fn name(&self) -> &'static str {
            "wife"
        }
    }

    impl Constructor for Wife {
        const ARITY: usize = 1;

        fn parameters() -> Option<Vec<Param>> {
            Some(vec![Param::of::<Husband>()])
        }

        fn construct(args: Args) -> Result<Self> {
            Ok(Wife {
                husband: args.get(0)?,
            })
        }
    }

    impl Constructor for Husband {
        const ARITY: usize = 1;

        fn parameters() -> Option<Vec<Param>> {
            Some(vec![Param::delayed::<Wife>()])
        }

        fn construct(args: Args) -> Result<Self> {
            Ok(Husband {
                wife: args.get(0)?,
            })
        }
    }

    struct Resource {
        closed: Arc<AtomicU32>,
        fail: bool,
        delay_ms: u64,
    }

    impl Disposable for Resource {
        fn dispose(&self) -> BoxFuture<'_, std::result::Result<(), BoxError>> {
            async move {
                tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
                self.closed.fetch_add(1, Ordering::SeqCst);
                if self.fail {
                    Err::<(), BoxError>("teardown failed".into())
                } else {
                    Ok(())
                }
            }
            .boxed()
        }
    }

    static CLOSED: once_cell::sync::Lazy<Arc<AtomicU32>> =
        once_cell::sync::Lazy::new(|| Arc::new(AtomicU32::new(0)));

    impl Constructor for Resource {
        fn construct(_: Args) -> Result<Self> {
            Ok(Resource {
                closed: Arc::clone(&CLOSED),
                fail: false,
                delay_ms: 20,
            })
        }

        fn into_disposable(self: Arc<Self>) -> Option<Arc<dyn Disposable>> {
            Some(self)
        }
    }

    // -------------------------------------------------------------------------
    // Lifecycles
    // -------------------------------------------------------------------------

    #[test]
    fn test_singleton_is_identical_across_calls() {
        let container = Container::new();
        container
            .register_with("leaf", Provider::class::<Leaf>(), Lifecycle::Singleton)
            .unwrap();

        let a = container.resolve("leaf").unwrap();
        let b = container.resolve("leaf").unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let pair = container.get::<Pair>().unwrap();
        assert!(Arc::ptr_eq(&pair.left, &pair.right));
    }

    #[test]
    fn test_transient_is_distinct() {
        let container = Container::new();
        container.register("leaf", Provider::class::<Leaf>()).unwrap();

        let a = container.resolve_as::<Leaf>("leaf").unwrap();
        let b = container.resolve_as::<Leaf>("leaf").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_ne!(a.serial, b.serial);
    }

    #[test]
    fn test_value_provider_is_identity_stable() {
        let container = Container::new();
        container.register_instance("config", String::from("cfg")).unwrap();

        let a = container.resolve("config").unwrap();
        let b = container.resolve("config").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_resolution_scoped_shared_within_one_call() {
        let container = Container::new();
        container
            .register_with("leaf", Provider::class::<Leaf>(), Lifecycle::ResolutionScoped)
            .unwrap();

        let first = container.get::<Pair>().unwrap();
        assert!(Arc::ptr_eq(&first.left, &first.right));

        let second = container.get::<Pair>().unwrap();
        assert!(!Arc::ptr_eq(&first.left, &second.left));
    }

    #[test]
    fn test_container_scoped_per_container() {
        let root = Container::new();
        root.register_with("leaf", Provider::class::<Leaf>(), Lifecycle::ContainerScoped)
            .unwrap();

        let child = root.create_child_container().unwrap();
        let root_a = root.resolve("leaf").unwrap();
        let root_b = root.resolve("leaf").unwrap();
        let child_a = child.resolve("leaf").unwrap();
        let child_b = child.resolve("leaf").unwrap();

        assert!(Arc::ptr_eq(&root_a, &root_b));
        assert!(Arc::ptr_eq(&child_a, &child_b));
        assert!(!Arc::ptr_eq(&root_a, &child_a));
    }

    #[test]
    fn test_value_and_factory_reject_cached_lifecycles() {
        let container = Container::new();
        for lifecycle in [
            Lifecycle::Singleton,
            Lifecycle::ContainerScoped,
            Lifecycle::ResolutionScoped,
        ] {
            let err = container
                .register_with("v", Provider::value(1u8), lifecycle)
                .unwrap_err();
            assert!(matches!(err, DiError::Configuration(_)));
            assert!(err.to_string().contains(&lifecycle.to_string()));

            assert!(matches!(
                container.register_with("f", Provider::factory(|_| Ok(1u8)), lifecycle),
                Err(DiError::Configuration(_))
            ));
        }
        assert!(!container.is_registered("v", false).unwrap());
    }

    #[test]
    fn test_factory_receives_container_and_is_not_cached() {
        let container = Container::new();
        container.register_instance("base", 10u32).unwrap();
        container
            .register(
                "derived",
                Provider::factory(|c: &Container| Ok(*c.resolve_as::<u32>("base")? + 1)),
            )
            .unwrap();

        let a = container.resolve_as::<u32>("derived").unwrap();
        let b = container.resolve_as::<u32>("derived").unwrap();
        assert_eq!(*a, 11);
        assert!(!Arc::ptr_eq(&a, &b));
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    #[test]
    fn test_alias_cycle_names_full_chain() {
        let container = Container::new();
        container.register("A", Provider::token("B")).unwrap();
        container.register("B", Provider::token("C")).unwrap();

        let err = container.register("C", Provider::token("A")).unwrap_err();
        match err {
            DiError::RegistrationCycle { chain } => {
                assert_eq!(chain, vec!["A", "B", "C", "A"]);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(!container.is_registered("C", false).unwrap());
    }

    #[test]
    fn test_self_alias_is_a_cycle() {
        let container = Container::new();
        assert!(matches!(
            container.register("A", Provider::token("A")),
            Err(DiError::RegistrationCycle { .. })
        ));
    }

    #[test]
    fn test_alias_cycle_through_parent_rejected() {
        let root = Container::new();
        root.register("a", Provider::token("b")).unwrap();

        let child = root.create_child_container().unwrap();
        let err = child.register("b", Provider::token("a")).unwrap_err();
        match err {
            DiError::RegistrationCycle { chain } => assert_eq!(chain, vec!["a", "b", "a"]),
            other => panic!("unexpected error {other:?}"),
        }
        assert!(!child.is_registered("b", false).unwrap());
        assert!(matches!(
            child.resolve("b"),
            Err(DiError::UnresolvedToken { .. })
        ));
    }

    #[test]
    fn test_alias_resolves_through_chain() {
        let container = Container::new();
        container.register_instance("C", 3u8).unwrap();
        container.register_type("B", "C").unwrap();
        container.register_type("A", "B").unwrap();

        assert_eq!(*container.resolve_as::<u8>("A").unwrap(), 3);
    }

    #[test]
    fn test_register_type_with_class_target() {
        let container = Container::new();
        container.register_type("leaf", Token::of::<Leaf>()).unwrap();
        assert!(container.resolve_as::<Leaf>("leaf").is_ok());
    }

    #[test]
    fn test_register_singleton_variants() {
        let container = Container::new();

        let err = container.register_singleton("named", None).unwrap_err();
        assert!(matches!(err, DiError::Configuration(_)));

        container
            .register_singleton("named", Some(Token::of::<Leaf>()))
            .unwrap();
        let a = container.resolve("named").unwrap();
        let b = container.resolve("named").unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        container
            .register_singleton("alias", Some(Token::from("named")))
            .unwrap();
        let c = container.resolve("alias").unwrap();
        assert!(Arc::ptr_eq(&a, &c));

        container.register_singleton(Token::of::<Leaf>(), None).unwrap();
        let d = container.get::<Leaf>().unwrap();
        let e = container.get::<Leaf>().unwrap();
        assert!(Arc::ptr_eq(&d, &e));
    }

    #[test]
    fn test_bulk_registry() {
        let container = Container::new();
        container
            .registry(vec![
                crate::entry!("one" => Provider::value(1u8)),
                crate::entry!("leaf" => Class::of::<Leaf>(), Lifecycle::Singleton),
            ])
            .unwrap();

        assert!(container.is_registered("one", false).unwrap());
        assert!(container.is_registered("leaf", false).unwrap());
    }

    // -------------------------------------------------------------------------
    // Resolution
    // -------------------------------------------------------------------------

    #[test]
    fn test_resolve_picks_last_registration() {
        let container = Container::new();
        container.register_instance("n", 1u8).unwrap();
        container.register_instance("n", 2u8).unwrap();
        assert_eq!(*container.resolve_as::<u8>("n").unwrap(), 2);
    }

    #[test]
    fn test_resolve_all_in_registration_order() {
        let container = Container::new();
        container.register_instance("n", 1u8).unwrap();
        container.register_instance("n", 2u8).unwrap();
        container.register_instance("n", 3u8).unwrap();

        let all: Vec<u8> = container
            .resolve_all_as::<u8>("n")
            .unwrap()
            .iter()
            .map(|v| **v)
            .collect();
        assert_eq!(all, vec![1, 2, 3]);
    }

    #[test]
    fn test_resolve_all_unregistered_class_yields_one() {
        let container = Container::new();
        assert_eq!(container.resolve_all(Token::of::<Leaf>()).unwrap().len(), 1);
        assert!(matches!(
            container.resolve_all("nothing"),
            Err(DiError::UnresolvedToken { .. })
        ));
    }

    #[test]
    fn test_unregistered_name_fails() {
        let container = Container::new();
        let err = container.resolve("nothing").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Attempted to resolve unregistered dependency token: \"nothing\""
        );
    }

    #[test]
    fn test_type_mismatch_on_downcast() {
        let container = Container::new();
        container.register_instance("n", 1u8).unwrap();
        assert!(matches!(
            container.resolve_as::<String>("n"),
            Err(DiError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_type_info() {
        let container = Container::new();
        let err = container.get::<Untyped>().unwrap_err();
        assert!(matches!(err, DiError::MissingTypeInfo { .. }));
    }

    #[test]
    fn test_parameter_failure_is_annotated() {
        let container = Container::new();
        let err = container.get::<Outer>().unwrap_err();

        match &err {
            DiError::ParameterResolution { class, index, source } => {
                assert!(class.ends_with("Outer"));
                assert_eq!(*index, 0);
                match source.as_ref() {
                    DiError::ParameterResolution { class, index, .. } => {
                        assert!(class.ends_with("NeedsMissing"));
                        assert_eq!(*index, 1);
                    }
                    other => panic!("unexpected inner error {other:?}"),
                }
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(matches!(err.root_cause(), DiError::UnresolvedToken { .. }));
    }

    #[test]
    fn test_failed_construction_caches_nothing() {
        let container = Container::new();
        container
            .register_with("outer", Provider::class::<NeedsMissing>(), Lifecycle::Singleton)
            .unwrap();
        assert!(container.resolve("outer").is_err());

        container.register_instance("missing", 0u8).unwrap();
        assert!(container.resolve("outer").is_ok());
    }

    #[test]
    fn test_multiple_param_injects_sequence() {
        let container = Container::new();
        container.register_instance("plugin", String::from("auth")).unwrap();
        container.register_instance("plugin", String::from("cache")).unwrap();

        let plugins = container.get::<Plugins>().unwrap();
        let names: Vec<&str> = plugins.names.iter().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["auth", "cache"]);
    }

    #[test]
    fn test_transform_params() {
        let container = Container::new();
        container.register_instance("plugin", String::from("auth")).unwrap();
        container.register_instance("plugin", String::from("cache")).unwrap();
        container.register_instance("greeting", String::from("hello")).unwrap();

        let banner = container.get::<Banner>().unwrap();
        assert_eq!(banner.text.as_str(), "auth + cache");
        assert_eq!(banner.single.as_str(), "hello");
    }

    #[test]
    fn test_resolution_context_threads_through_multiple_params() {
        struct Batch {
            leaves: Vec<Arc<Leaf>>,
            one: Arc<Leaf>,
        }

        impl Constructor for Batch {
            const ARITY: usize = 2;

            fn parameters() -> Option<Vec<Param>> {
                Some(vec![Param::all("leaf"), Param::token("leaf")])
            }

            fn construct(args: Args) -> Result<Self> {
                Ok(Batch {
                    leaves: args.all(0)?,
                    one: args.get(1)?,
                })
            }
        }

        let container = Container::new();
        container
            .register_with("leaf", Provider::class::<Leaf>(), Lifecycle::ResolutionScoped)
            .unwrap();

        let batch = container.get::<Batch>().unwrap();
        assert_eq!(batch.leaves.len(), 1);
        assert!(Arc::ptr_eq(&batch.leaves[0], &batch.one));
    }

    #[test]
    fn test_delayed_breaks_constructor_cycle() {
        let container = Container::new();

        let wife = container.get::<Wife>().unwrap();
        assert!(!wife.husband.wife.is_materialized());
        assert_eq!(wife.husband.wife.name(), "wife");
        assert!(wife.husband.wife.is_materialized());

        let husband = container.get::<Husband>().unwrap();
        assert_eq!(husband.wife.name(), wife.name());
    }

    #[test]
    fn test_delayed_with_singletons_closes_the_loop() {
        let container = Container::new();
        container.register_singleton(Token::of::<Wife>(), None).unwrap();
        container.register_singleton(Token::of::<Husband>(), None).unwrap();

        let wife = container.get::<Wife>().unwrap();
        let husband = container.get::<Husband>().unwrap();
        assert!(Arc::ptr_eq(&wife.husband, &husband));
        assert!(Arc::ptr_eq(&husband.wife.get().unwrap(), &wife));
    }

    #[test]
    fn test_registered_delayed_placeholder() {
        let container = Container::new();
        container.register("lazy-leaf", Class::delayed::<Leaf>()).unwrap();

        let proxy = container
            .resolve_as::<crate::Delayed<Leaf>>("lazy-leaf")
            .unwrap();
        assert!(!proxy.is_materialized());
        let _ = proxy.serial;
        assert!(proxy.is_materialized());
    }

    // -------------------------------------------------------------------------
    // Child containers
    // -------------------------------------------------------------------------

    #[test]
    fn test_parent_singleton_shared_with_child() {
        let root = Container::new();
        root.register_with("leaf", Provider::class::<Leaf>(), Lifecycle::Singleton)
            .unwrap();

        let child = root.create_child_container().unwrap();
        let grandchild = child.create_child_container().unwrap();

        let a = root.resolve("leaf").unwrap();
        let b = child.resolve("leaf").unwrap();
        let c = grandchild.resolve("leaf").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &c));
        assert_eq!(grandchild.depth(), 2);
    }

    #[test]
    fn test_container_scoped_copy_keeps_siblings() {
        let root = Container::new();
        root.register_with("leaf", Provider::class::<Leaf>(), Lifecycle::Singleton)
            .unwrap();
        root.register_with("leaf", Provider::class::<Leaf>(), Lifecycle::ContainerScoped)
            .unwrap();

        let root_all = root.resolve_all("leaf").unwrap();
        let child = root.create_child_container().unwrap();
        assert!(child.is_registered("leaf", false).unwrap());

        let child_all = child.resolve_all("leaf").unwrap();
        assert_eq!(child_all.len(), 2);
        assert!(Arc::ptr_eq(&root_all[0], &child_all[0]));
        assert!(!Arc::ptr_eq(&root_all[1], &child_all[1]));
    }

    #[test]
    fn test_child_registrations_do_not_leak_upwards() {
        let root = Container::new();
        let child = root.create_child_container().unwrap();
        child.register_instance("local", 1u8).unwrap();

        assert!(child.is_registered("local", false).unwrap());
        assert!(!root.is_registered("local", true).unwrap());
        assert!(root.resolve("local").is_err());

        root.register_instance("shared", 2u8).unwrap();
        assert!(!child.is_registered("shared", false).unwrap());
        assert!(child.is_registered("shared", true).unwrap());
    }

    #[test]
    fn test_child_override() {
        let root = Container::new();
        root.register_instance("db", String::from("production")).unwrap();

        let child = root.create_child_container().unwrap();
        child.register_instance("db", String::from("test")).unwrap();

        assert_eq!(root.resolve_as::<String>("db").unwrap().as_str(), "production");
        assert_eq!(child.resolve_as::<String>("db").unwrap().as_str(), "test");
    }

    // -------------------------------------------------------------------------
    // Reset and clear
    // -------------------------------------------------------------------------

    #[test]
    fn test_clear_instances() {
        let container = Container::new();
        container
            .register_with("leaf", Provider::class::<Leaf>(), Lifecycle::Singleton)
            .unwrap();
        container.register_instance("value", 1u8).unwrap();

        let before = container.resolve("leaf").unwrap();
        container.clear_instances().unwrap();
        let after = container.resolve("leaf").unwrap();

        assert!(!Arc::ptr_eq(&before, &after));
        assert!(container.is_registered("value", false).unwrap());
        assert!(container.resolve("value").is_err());
    }

    #[test]
    fn test_reset_clears_registry_and_interceptors() {
        let container = Container::new();
        container.register_instance("value", 1u8).unwrap();

        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        container
            .before_resolution(
                Token::of::<Leaf>(),
                move |_, _| {
                    counter.fetch_add(1, Ordering::SeqCst);
                },
                InterceptorOptions::default(),
            )
            .unwrap();

        container.reset().unwrap();
        assert!(container.is_empty());
        assert!(!container.is_registered("value", true).unwrap());

        container.get::<Leaf>().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    // -------------------------------------------------------------------------
    // Interceptors
    // -------------------------------------------------------------------------

    #[test]
    fn test_interceptors_run_in_order_with_frequency() {
        let container = Container::new();
        container.register_instance("n", 5u32).unwrap();

        let log = Arc::new(Mutex::new(Vec::<String>::new()));

        let l = Arc::clone(&log);
        container
            .before_resolution(
                "n",
                move |token, kind| l.lock().push(format!("pre-once {token} {kind:?}")),
                Frequency::Once.into(),
            )
            .unwrap();
        let l = Arc::clone(&log);
        container
            .before_resolution(
                "n",
                move |_, _| l.lock().push("pre-always".into()),
                InterceptorOptions::always(),
            )
            .unwrap();
        let l = Arc::clone(&log);
        container
            .after_resolution(
                "n",
                move |_, resolved| {
                    let value = resolved.downcast_ref::<u32>().copied().unwrap_or_default();
                    l.lock().push(format!("post {value}"));
                },
                InterceptorOptions::always(),
            )
            .unwrap();

        container.resolve("n").unwrap();
        container.resolve("n").unwrap();

        assert_eq!(
            *log.lock(),
            vec![
                "pre-once n Single",
                "pre-always",
                "post 5",
                "pre-always",
                "post 5",
            ]
        );
    }

    #[test]
    fn test_post_interceptor_sees_whole_sequence_for_resolve_all() {
        let container = Container::new();
        container.register_instance("n", 1u8).unwrap();
        container.register_instance("n", 2u8).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        container
            .after_resolution(
                "n",
                move |_, resolved| {
                    if let Resolved::All(items) = resolved {
                        s.lock().push(items.len());
                    }
                },
                InterceptorOptions::default(),
            )
            .unwrap();

        container.resolve_all("n").unwrap();
        assert_eq!(*seen.lock(), vec![2]);
    }

    #[test]
    fn test_once_interceptor_not_retriggered_by_reentrant_resolve() {
        let container = Container::new();
        container.register_instance("n", 1u8).unwrap();

        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let inner = container.clone();
        container
            .before_resolution(
                "n",
                move |_, _| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    let _ = inner.resolve("n");
                },
                InterceptorOptions::once(),
            )
            .unwrap();

        container.resolve("n").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    // -------------------------------------------------------------------------
    // Disposal
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_dispose_tears_down_constructed_disposables() {
        let container = Container::new();
        container
            .register_with("res", Provider::class::<Resource>(), Lifecycle::Singleton)
            .unwrap();
        container.get::<Leaf>().unwrap();
        container.resolve("res").unwrap();
        container.resolve("res").unwrap();
        assert_eq!(container.disposable_count(), 1);

        let before = CLOSED.load(Ordering::SeqCst);
        container.dispose().await.unwrap();
        assert_eq!(CLOSED.load(Ordering::SeqCst), before + 1);
        assert!(container.is_disposed());
    }

    #[tokio::test]
    async fn test_operations_fail_after_dispose() {
        let container = Container::new();
        container.register_instance("n", 1u8).unwrap();
        container.dispose().await.unwrap();

        assert!(matches!(container.resolve("n"), Err(DiError::DisposedContainer)));
        assert!(matches!(container.resolve_all("n"), Err(DiError::DisposedContainer)));
        assert!(matches!(
            container.register_instance("m", 2u8),
            Err(DiError::DisposedContainer)
        ));
        assert!(matches!(
            container.is_registered("n", true),
            Err(DiError::DisposedContainer)
        ));
        assert!(matches!(container.reset(), Err(DiError::DisposedContainer)));
        assert!(matches!(
            container.clear_instances(),
            Err(DiError::DisposedContainer)
        ));
        assert!(matches!(
            container.create_child_container(),
            Err(DiError::DisposedContainer)
        ));
        assert!(matches!(
            container.before_resolution("n", |_, _| {}, InterceptorOptions::default()),
            Err(DiError::DisposedContainer)
        ));
        assert!(matches!(
            container.dispose().await,
            Err(DiError::DisposedContainer)
        ));
    }

    #[tokio::test]
    async fn test_inspection_accessors_work_after_dispose() {
        let root = Container::new();
        let child = root.create_child_container().unwrap();
        child.register_instance("res", 1u8).unwrap();

        let closed = Arc::new(AtomicU32::new(0));
        child.inner.disposables.lock().push(Arc::new(Resource {
            closed: Arc::clone(&closed),
            fail: false,
            delay_ms: 1,
        }));
        assert_eq!(child.disposable_count(), 1);

        child.dispose().await.unwrap();

        assert!(child.is_disposed());
        assert_eq!(child.len(), 1);
        assert!(!child.is_empty());
        assert_eq!(child.depth(), 1);
        assert_eq!(child.parent().map(Container::id), Some(root.id()));
        assert_eq!(child.disposable_count(), 0);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
        assert!(matches!(child.resolve("res"), Err(DiError::DisposedContainer)));
        assert!(!root.is_disposed());
    }

    #[tokio::test]
    async fn test_failing_teardown_does_not_stop_others() {
        let closed = Arc::new(AtomicU32::new(0));
        let container = Container::new();

        for fail in [true, false, false] {
            let resource: Arc<dyn Disposable> = Arc::new(Resource {
                closed: Arc::clone(&closed),
                fail,
                delay_ms: 5,
            });
            container.inner.disposables.lock().push(resource);
        }

        let err = container.dispose().await.unwrap_err();
        match err {
            DiError::Disposal { failures } => assert_eq!(failures.len(), 1),
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(closed.load(Ordering::SeqCst), 3);
    }
}
