//! Example demonstrating the engine's structured logging
//!
//! Run with JSON logging (production):
//! ```bash
//! cargo run --example logging --features logging-json
//! ```
//!
//! Run with pretty logging (development):
//! ```bash
//! cargo run --example logging --features logging-pretty
//! ```

use di_engine::{
    Args, BoxError, Constructor, Container, Disposable, InterceptorOptions, Lifecycle, Param,
    Provider, Result, Token,
};
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;

#[allow(dead_code)]
struct Database {
    url: String,
}

impl Constructor for Database {
    fn construct(_: Args) -> Result<Self> {
        Ok(Database {
            url: "postgres://localhost/mydb".into(),
        })
    }

    fn into_disposable(self: Arc<Self>) -> Option<Arc<dyn Disposable>> {
        Some(self)
    }
}

impl Disposable for Database {
    fn dispose(&self) -> BoxFuture<'_, std::result::Result<(), BoxError>> {
        async move {
            println!("  [App] Closing connection to {}", self.url);
            Ok(())
        }
        .boxed()
    }
}

#[allow(dead_code)]
struct RequestContext {
    request_id: Arc<String>,
}

impl Constructor for RequestContext {
    const ARITY: usize = 1;

    fn parameters() -> Option<Vec<Param>> {
        Some(vec![Param::token("request-id")])
    }

    fn construct(args: Args) -> Result<Self> {
        Ok(RequestContext {
            request_id: args.get(0)?,
        })
    }
}

#[allow(dead_code)]
struct UserService {
    db: Arc<Database>,
    request: Arc<RequestContext>,
}

impl Constructor for UserService {
    const ARITY: usize = 2;

    fn parameters() -> Option<Vec<Param>> {
        Some(vec![Param::of::<Database>(), Param::of::<RequestContext>()])
    }

    fn construct(args: Args) -> Result<Self> {
        Ok(UserService {
            db: args.get(0)?,
            request: args.get(1)?,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // JSON with logging-json, pretty with logging-pretty, nothing otherwise
    di_engine::logging::init();

    println!("=== di-engine Logging Demo ===\n");

    // logs: "Creating new root DI container"
    let container = Container::new();

    // logs: "Registering provider"
    container.register_singleton(Token::of::<Database>(), None)?;
    container.register_instance("request-id", String::from("default"))?;
    container.register_with(
        Token::of::<RequestContext>(),
        Provider::class::<RequestContext>(),
        Lifecycle::ContainerScoped,
    )?;

    container.after_resolution(
        Token::of::<UserService>(),
        |token, _| println!("  [App] Resolved {token}"),
        InterceptorOptions::always(),
    )?;

    // logs: "Constructed instance" for each class in the graph
    let users = container.get::<UserService>()?;
    println!("  [App] Request id: {}", users.request.request_id);

    // logs: "Token not found in container or parent chain"
    assert!(container.resolve("missing").is_err());

    // logs: "Creating child container from parent container"
    let request = container.create_child_container()?;
    request.register_instance("request-id", String::from("req-12345"))?;

    // Container-scoped RequestContext is rebuilt for the child; Database is shared
    let scoped = request.get::<UserService>()?;
    println!("  [App] Request id: {}", scoped.request.request_id);
    assert!(Arc::ptr_eq(&users.db, &scoped.db));

    // logs: "Cleared cached instances"
    request.clear_instances()?;

    // logs: "Disposing container"
    container.dispose().await?;

    println!("\n=== Demo Complete ===");
    println!("\nTip: Use --features logging-json for production (JSON output)");
    println!("     Use --features logging-pretty for development (colorful output)");
    Ok(())
}
