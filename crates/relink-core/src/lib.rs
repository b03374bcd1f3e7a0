//! Core infrastructure for relink.
//!
//! This crate holds the pieces shared by every relink component:
//! - The [`RelinkEvent`] trait implemented by lifecycle events
//! - Listener registration and panic-isolated dispatch

pub mod events;

pub use events::{EventListener, EventListeners, FnListener, RelinkEvent};
