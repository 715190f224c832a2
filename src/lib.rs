//! # di-engine - Token-Based Dependency Injection for Rust
//!
//! A resolution engine that maps tokens to providers and builds object
//! graphs on demand.
//!
//! ## Features
//!
//! - **Tokens** - request dependencies by name or by constructor identity
//! - **Providers** - pre-built values, factories, aliases and constructors
//! - **Lifecycles** - transient, singleton, container-scoped and resolution-scoped caching
//! - **Child containers** - hierarchical lookup with per-container overrides
//! - **Interceptors** - observe resolutions before and after they happen
//! - **Deferred construction** - break constructor cycles with [`Delayed<T>`]
//! - **Async dispose** - tear down every disposable instance a container built
//! - **Observable** - optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use di_engine::prelude::*;
//!
//! struct Database {
//!     url: String,
//! }
//!
//! impl Constructor for Database {
//!     fn construct(_: Args) -> Result<Self> {
//!         Ok(Database { url: "postgres://localhost".into() })
//!     }
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! impl Constructor for UserService {
//!     const ARITY: usize = 1;
//!
//!     fn parameters() -> Option<Vec<Param>> {
//!         Some(vec![Param::of::<Database>()])
//!     }
//!
//!     fn construct(args: Args) -> Result<Self> {
//!         Ok(UserService { db: args.get(0)? })
//!     }
//! }
//!
//! let container = Container::new();
//! container.register_singleton(Token::of::<Database>(), None).unwrap();
//!
//! let users = container.get::<UserService>().unwrap();
//! let db = container.get::<Database>().unwrap();
//! assert!(Arc::ptr_eq(&users.db, &db));
//! assert_eq!(db.url, "postgres://localhost");
//! ```
//!
//! ## Lifecycles
//!
//! ```rust
//! use di_engine::prelude::*;
//!
//! struct RequestId;
//!
//! impl Constructor for RequestId {
//!     fn construct(_: Args) -> Result<Self> {
//!         Ok(RequestId)
//!     }
//! }
//!
//! let container = Container::new();
//!
//! // Transient - new instance every time
//! container.register("transient", Class::of::<RequestId>()).unwrap();
//! let a = container.resolve("transient").unwrap();
//! let b = container.resolve("transient").unwrap();
//! assert!(!Arc::ptr_eq(&a, &b));
//!
//! // Singleton - one instance for this container and its children
//! container
//!     .register_with("singleton", Class::of::<RequestId>(), Lifecycle::Singleton)
//!     .unwrap();
//! let a = container.resolve("singleton").unwrap();
//! let b = container.resolve("singleton").unwrap();
//! assert!(Arc::ptr_eq(&a, &b));
//!
//! // Values are returned verbatim and accept no cached lifecycle
//! assert!(container
//!     .register_with("value", Provider::value(1u8), Lifecycle::Singleton)
//!     .is_err());
//! ```
//!
//! ## Child Containers
//!
//! ```rust
//! use di_engine::prelude::*;
//!
//! let root = Container::new();
//! root.register_instance("app", String::from("MyApp")).unwrap();
//!
//! // Per-request container - inherits from root
//! let request = root.create_child_container().unwrap();
//! request.register_instance("request-id", String::from("req-123")).unwrap();
//!
//! assert!(request.is_registered("app", true).unwrap());
//! assert!(!request.is_registered("app", false).unwrap());
//! assert!(!root.is_registered("request-id", true).unwrap());
//! ```

mod class;
mod container;
mod context;
mod disposable;
mod error;
mod factory;
mod interceptor;
mod lazy;
#[cfg(feature = "logging")]
pub mod logging;
mod param;
mod provider;
mod storage;
mod token;

pub use class::*;
pub use container::*;
pub use context::*;
pub use disposable::*;
pub use error::*;
pub use factory::*;
pub use interceptor::*;
pub use lazy::*;
pub use param::*;
pub use provider::*;
pub use storage::*;
pub use token::*;

// Re-export tracing macros for convenience when logging feature is enabled
#[cfg(feature = "logging")]
pub use tracing::{debug, error, info, trace, warn};

// Re-export for convenience
pub use std::sync::Arc;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Args, Argument, Class, Constructor, Container, Delayed, DiError, Disposable, Frequency,
        Injectable, Instance, InterceptorOptions, Lifecycle, Param, Provider,
        RegistrationOptions, ResolutionContext, Result, Token, Transform,
    };
    pub use std::sync::Arc;
}
