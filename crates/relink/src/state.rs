//! Lifecycle states and the shared state snapshot.

use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

/// Lifecycle state of a reconnecting connection.
///
/// States are purely observational. The controller emits them in a fixed
/// order; see [`Reconnect::start`](crate::Reconnect::start).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnState {
    /// Emitted once when the controller starts.
    Connecting,
    /// About to re-enter the connect loop after a drop or a failure.
    Reconnecting,
    /// `connect` succeeded.
    Connected,
    /// `wait` returned cleanly.
    Disconnected,
    /// `connect` or `wait` failed; a retry may follow.
    Failing,
    /// Terminal: a limit was exhausted or the error hook vetoed.
    Failed,
    /// Terminal: a close request was observed.
    Closed,
}

impl ConnState {
    /// Every state, in declaration order.
    pub const ALL: [ConnState; 7] = [
        ConnState::Connecting,
        ConnState::Reconnecting,
        ConnState::Connected,
        ConnState::Disconnected,
        ConnState::Failing,
        ConnState::Failed,
        ConnState::Closed,
    ];

    /// Lowercase display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnState::Connecting => "connecting",
            ConnState::Reconnecting => "reconnecting",
            ConnState::Connected => "connected",
            ConnState::Disconnected => "disconnected",
            ConnState::Failing => "failing",
            ConnState::Failed => "failed",
            ConnState::Closed => "closed",
        }
    }

    /// Returns true for `Closed` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnState::Closed | ConnState::Failed)
    }

    fn encode(self) -> u8 {
        match self {
            ConnState::Connecting => 0,
            ConnState::Reconnecting => 1,
            ConnState::Connected => 2,
            ConnState::Disconnected => 3,
            ConnState::Failing => 4,
            ConnState::Failed => 5,
            ConnState::Closed => 6,
        }
    }

    fn decode(encoded: u8) -> ConnState {
        match encoded {
            0 => ConnState::Connecting,
            1 => ConnState::Reconnecting,
            2 => ConnState::Connected,
            3 => ConnState::Disconnected,
            4 => ConnState::Failing,
            5 => ConnState::Failed,
            6 => ConnState::Closed,
            other => unreachable!("invalid encoded connection state {other}"),
        }
    }
}

impl fmt::Display for ConnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared view of a controller's progress.
///
/// Cheap to clone; all clones observe the same controller. Only the
/// controller writes to it.
#[derive(Clone)]
pub struct ReconnectState {
    /// Last emitted state
    state: Arc<AtomicU8>,

    /// Consecutive `connect` failures
    connect_attempts: Arc<AtomicU32>,

    /// Consecutive `wait` failures
    connection_errors: Arc<AtomicU32>,

    /// Successful connects since construction
    total_connects: Arc<AtomicU64>,
}

impl ReconnectState {
    /// Creates a snapshot in the `Connecting` state with zeroed counters.
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(ConnState::Connecting.encode())),
            connect_attempts: Arc::new(AtomicU32::new(0)),
            connection_errors: Arc::new(AtomicU32::new(0)),
            total_connects: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The last state the controller emitted.
    pub fn current(&self) -> ConnState {
        ConnState::decode(self.state.load(Ordering::Acquire))
    }

    /// Current run of consecutive `connect` failures.
    pub fn connect_attempts(&self) -> u32 {
        self.connect_attempts.load(Ordering::Acquire)
    }

    /// Current run of consecutive `wait` failures.
    pub fn connection_errors(&self) -> u32 {
        self.connection_errors.load(Ordering::Acquire)
    }

    /// Number of successful connects so far.
    pub fn total_connects(&self) -> u64 {
        self.total_connects.load(Ordering::Acquire)
    }

    /// Returns true once the controller reached `Closed` or `Failed`.
    pub fn is_terminal(&self) -> bool {
        self.current().is_terminal()
    }

    pub(crate) fn set(&self, state: ConnState) {
        self.state.store(state.encode(), Ordering::Release);
    }

    pub(crate) fn record_connect_failure(&self) -> u32 {
        self.connect_attempts.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn record_connected(&self) {
        self.connect_attempts.store(0, Ordering::Release);
        self.total_connects.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn record_connection_error(&self) -> u32 {
        self.connection_errors.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn record_clean_drop(&self) {
        self.connection_errors.store(0, Ordering::Release);
    }
}

impl Default for ReconnectState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReconnectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconnectState")
            .field("state", &self.current())
            .field("connect_attempts", &self.connect_attempts())
            .field("connection_errors", &self.connection_errors())
            .field("total_connects", &self.total_connects())
            .finish()
    }
}
