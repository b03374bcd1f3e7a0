//! The connection capability driven by the controller.

use std::future::Future;
use std::sync::Arc;

/// A stateful connection that can be brought up, watched, and torn down.
///
/// The controller is the only caller of [`connect`](Connection::connect) and
/// [`wait`](Connection::wait). [`close`](Connection::close) is called from
/// [`Reconnect::close`](crate::Reconnect::close), usually on another task
/// while a `connect` or `wait` is still in flight, so implementations must
/// tolerate that overlap.
///
/// # Examples
///
/// ```rust
/// use relink::Connection;
/// use tokio::sync::Notify;
///
/// struct Link {
///     shutdown: Notify,
/// }
///
/// impl Connection for Link {
///     type Error = std::io::Error;
///
///     async fn connect(&self) -> Result<(), Self::Error> {
///         Ok(())
///     }
///
///     async fn wait(&self) -> Result<(), Self::Error> {
///         self.shutdown.notified().await;
///         Ok(())
///     }
///
///     async fn close(&self) -> Result<(), Self::Error> {
///         self.shutdown.notify_one();
///         Ok(())
///     }
/// }
/// ```
pub trait Connection: Send + Sync {
    /// Error produced by any of the three operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Attempts to establish the connection.
    fn connect(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Resolves when the connection drops.
    ///
    /// `Ok(())` is a clean disconnect; `Err` is a connection failure. Must
    /// resolve promptly once [`close`](Connection::close) has been called.
    fn wait(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Tears the connection down.
    fn close(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

impl<C> Connection for Arc<C>
where
    C: Connection,
{
    type Error = C::Error;

    fn connect(&self) -> impl Future<Output = Result<(), Self::Error>> + Send {
        (**self).connect()
    }

    fn wait(&self) -> impl Future<Output = Result<(), Self::Error>> + Send {
        (**self).wait()
    }

    fn close(&self) -> impl Future<Output = Result<(), Self::Error>> + Send {
        (**self).close()
    }
}
