//! Events emitted by the reconnection controller.

use crate::state::ConnState;
use relink_core::events::RelinkEvent;
use std::time::Instant;

/// Lifecycle events of a [`Reconnect`](crate::Reconnect) instance.
#[derive(Debug, Clone)]
pub enum ReconnectEvent {
    /// The controller moved to `state`.
    StateTransition {
        name: String,
        timestamp: Instant,
        state: ConnState,
    },
    /// `connect` failed with `error`; `attempt` is the consecutive failure count.
    ConnectFailed {
        name: String,
        timestamp: Instant,
        attempt: u32,
        error: String,
    },
    /// `wait` failed with `error`; `errors` is the consecutive failure count.
    ConnectionFailed {
        name: String,
        timestamp: Instant,
        errors: u32,
        error: String,
    },
    /// The error hook stopped the controller.
    Vetoed { name: String, timestamp: Instant },
    /// `close` was called.
    CloseRequested { name: String, timestamp: Instant },
}

impl RelinkEvent for ReconnectEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ReconnectEvent::StateTransition { .. } => "state_transition",
            ReconnectEvent::ConnectFailed { .. } => "connect_failed",
            ReconnectEvent::ConnectionFailed { .. } => "connection_failed",
            ReconnectEvent::Vetoed { .. } => "vetoed",
            ReconnectEvent::CloseRequested { .. } => "close_requested",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            ReconnectEvent::StateTransition { timestamp, .. }
            | ReconnectEvent::ConnectFailed { timestamp, .. }
            | ReconnectEvent::ConnectionFailed { timestamp, .. }
            | ReconnectEvent::Vetoed { timestamp, .. }
            | ReconnectEvent::CloseRequested { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            ReconnectEvent::StateTransition { name, .. }
            | ReconnectEvent::ConnectFailed { name, .. }
            | ReconnectEvent::ConnectionFailed { name, .. }
            | ReconnectEvent::Vetoed { name, .. }
            | ReconnectEvent::CloseRequested { name, .. } => name,
        }
    }
}
