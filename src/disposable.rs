//! Teardown capability for constructed instances

use crate::BoxError;
use futures::future::BoxFuture;

/// An instance that must be torn down when its container is disposed.
///
/// Implement this and return `Some(self)` from
/// [`Constructor::into_disposable`](crate::Constructor::into_disposable) so the
/// container tracks instances it constructs.
///
/// # Examples
///
/// ```rust
/// use di_engine::{Args, BoxError, Constructor, Disposable, Result};
/// use futures::future::{BoxFuture, FutureExt};
/// use std::sync::Arc;
///
/// struct Pool;
///
/// impl Disposable for Pool {
///     fn dispose(&self) -> BoxFuture<'_, std::result::Result<(), BoxError>> {
///         async { Ok(()) }.boxed()
///     }
/// }
///
/// impl Constructor for Pool {
///     fn construct(_: Args) -> Result<Self> {
///         Ok(Pool)
///     }
///
///     fn into_disposable(self: Arc<Self>) -> Option<Arc<dyn Disposable>> {
///         Some(self)
///     }
/// }
/// ```
pub trait Disposable: Send + Sync {
    /// Release resources; may complete asynchronously
    fn dispose(&self) -> BoxFuture<'_, std::result::Result<(), BoxError>>;
}
