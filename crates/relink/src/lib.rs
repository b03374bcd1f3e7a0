//! Automatic reconnection for stateful connections.
//!
//! `relink` wraps anything that can be connected, waited on until it drops,
//! and closed (a [`Connection`]) in a [`Reconnect`] controller that keeps it
//! up: every drop or failure is followed by an immediate reconnect, bounded by
//! configurable limits on consecutive failures.
//!
//! # Features
//!
//! - **Bounded retries**: separate limits for failures while connecting and
//!   failures while connected
//! - **Error veto**: an error hook can stop all retries on errors it deems fatal
//! - **Lifecycle observability**: state hook, event listeners, and a shared
//!   [`ReconnectState`] snapshot
//! - **Prompt shutdown**: [`Reconnect::close`] unblocks a pending `wait` and
//!   returns only once the loop has exited
//!
//! # Lifecycle
//!
//! ```text
//! Connecting   -> Connected | Failing
//! Failing      -> Failed | Reconnecting
//! Connected    -> Disconnected
//! Disconnected -> Reconnecting | Closed
//! Reconnecting -> Connecting (top of the loop)
//! ```
//!
//! `Closed` and `Failed` are terminal.
//!
//! # Examples
//!
//! ```rust
//! use relink::{ConnState, ReconnectConfig};
//! use std::io;
//!
//! let config = ReconnectConfig::builder()
//!     .name("upstream")
//!     .max_connect_attempts(5)
//!     .max_connection_errors(3)
//!     .on_error(|error: &io::Error| {
//!         // Stop retrying if the peer refuses us for good
//!         (error.kind() == io::ErrorKind::PermissionDenied)
//!             .then(|| io::Error::new(error.kind(), "access revoked"))
//!     })
//!     .on_state_change(|state| {
//!         if state == ConnState::Failed {
//!             eprintln!("upstream is gone");
//!         }
//!     })
//!     .build();
//! # let _ = config;
//! ```
//!
//! # Feature flags
//!
//! - `tracing`: log transitions and failures with the `tracing` crate
//! - `metrics`: export counters and a connected gauge with the `metrics` crate

mod config;
mod connection;
mod controller;
mod error;
mod events;
mod state;

pub use config::{ErrorHook, ReconnectConfig, ReconnectConfigBuilder, StateHook};
pub use connection::Connection;
pub use controller::Reconnect;
pub use error::ReconnectError;
pub use events::ReconnectEvent;
pub use state::{ConnState, ReconnectState};
