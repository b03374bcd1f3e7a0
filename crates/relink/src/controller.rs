use std::time::Instant;

use tokio::sync::watch;

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

use crate::config::ReconnectConfig;
use crate::connection::Connection;
use crate::error::ReconnectError;
use crate::events::ReconnectEvent;
use crate::state::{ConnState, ReconnectState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Run {
    Idle,
    Running,
    Exited,
}

/// Stop request and loop progress, updated together under the watch lock.
#[derive(Debug, Clone, Copy)]
struct Control {
    stop_requested: bool,
    run: Run,
}

/// Marks the loop as exited when `start` returns or its future is dropped.
struct ExitGuard<'a>(&'a watch::Sender<Control>);

impl Drop for ExitGuard<'_> {
    fn drop(&mut self) {
        self.0.send_modify(|control| control.run = Run::Exited);
    }
}

/// Keeps a [`Connection`] up by reconnecting whenever it drops or fails.
///
/// `start` drives the loop and is meant to run on its own task; `close` is
/// called from another task to shut it down. Share the controller between
/// the two with an [`Arc`](std::sync::Arc).
///
/// # Examples
///
/// ```rust
/// use relink::{Connection, Reconnect, ReconnectConfig};
/// use std::sync::Arc;
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
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ReconnectConfig::builder()
///     .max_connect_attempts(3)
///     .on_state_change(|state| println!("link is {}", state))
///     .build();
///
/// let reconnect = Arc::new(Reconnect::new(Link { shutdown: Notify::new() }, config));
///
/// let runner = Arc::clone(&reconnect);
/// let handle = tokio::spawn(async move { runner.start().await });
///
/// reconnect.close().await?;
/// assert!(handle.await?.is_ok());
/// # Ok(())
/// # }
/// ```
pub struct Reconnect<C: Connection> {
    conn: C,
    config: ReconnectConfig<C::Error>,
    state: ReconnectState,
    control: watch::Sender<Control>,
}

impl<C: Connection> Reconnect<C> {
    /// Wraps `conn`. Nothing happens until [`start`](Self::start) is called.
    pub fn new(conn: C, config: ReconnectConfig<C::Error>) -> Self {
        let (control, _) = watch::channel(Control {
            stop_requested: false,
            run: Run::Idle,
        });
        Self {
            conn,
            config,
            state: ReconnectState::new(),
            control,
        }
    }

    /// Shared view of the controller's state and counters.
    pub fn state(&self) -> &ReconnectState {
        &self.state
    }

    /// The configuration this controller runs with.
    pub fn config(&self) -> &ReconnectConfig<C::Error> {
        &self.config
    }

    /// The wrapped connection.
    pub fn connection(&self) -> &C {
        &self.conn
    }

    /// Returns true once [`close`](Self::close) has been called.
    pub fn is_stop_requested(&self) -> bool {
        self.control.borrow().stop_requested
    }

    /// Runs the reconnection loop until it closes or fails.
    ///
    /// Emits `Connecting`, then repeats:
    ///
    /// 1. If a close was requested, emit `Closed` and return `Ok(())`.
    /// 2. `connect`. On success emit `Connected` and reset the attempt
    ///    counter. On failure consult the error hook, emit `Failing` and
    ///    count the attempt; a veto emits `Failed` and returns
    ///    [`ReconnectError::Vetoed`], a reached limit emits `Failed` and
    ///    returns [`ReconnectError::ConnectAttemptsExhausted`], otherwise
    ///    emit `Reconnecting` and go back to 1.
    /// 3. `wait`. A clean drop emits `Disconnected` and resets the error
    ///    counter. A failure is handled like a connect failure, counted
    ///    against `max_connection_errors` and ending in
    ///    [`ReconnectError::ConnectionErrorsExhausted`].
    /// 4. Emit `Reconnecting` unless a close was requested meanwhile, then
    ///    go back to 1.
    ///
    /// Retries are immediate. A controller runs once; calling `start` again
    /// returns [`ReconnectError::AlreadyStarted`].
    pub async fn start(&self) -> Result<(), ReconnectError<C::Error>> {
        let mut fresh = false;
        self.control.send_if_modified(|control| {
            fresh = control.run == Run::Idle;
            if fresh {
                control.run = Run::Running;
            }
            fresh
        });
        if !fresh {
            return Err(ReconnectError::AlreadyStarted);
        }
        let _exit = ExitGuard(&self.control);

        self.transition(ConnState::Connecting);
        loop {
            if self.is_stop_requested() {
                self.transition(ConnState::Closed);

                #[cfg(feature = "tracing")]
                tracing::info!(reconnect = %self.config.name, "connection closed");

                #[cfg(feature = "metrics")]
                self.record_termination("closed");

                return Ok(());
            }

            if let Err(error) = self.conn.connect().await {
                let veto = self.config.veto(&error);
                self.transition(ConnState::Failing);
                let attempts = self.state.record_connect_failure();

                #[cfg(feature = "tracing")]
                tracing::warn!(
                    reconnect = %self.config.name,
                    attempt = attempts,
                    max_attempts = self.config.max_connect_attempts,
                    error = %error,
                    "connect failed"
                );

                #[cfg(feature = "metrics")]
                counter!("reconnect_connect_failures_total", "reconnect" => self.config.name.clone())
                    .increment(1);

                self.emit(|name, timestamp| ReconnectEvent::ConnectFailed {
                    name,
                    timestamp,
                    attempt: attempts,
                    error: error.to_string(),
                });

                if let Some(veto) = veto {
                    return Err(self.vetoed(veto));
                }
                if self.config.connect_limit_reached(attempts) {
                    self.fail();
                    return Err(ReconnectError::ConnectAttemptsExhausted {
                        attempts,
                        source: error,
                    });
                }
                self.transition(ConnState::Reconnecting);
                continue;
            }

            self.transition(ConnState::Connected);
            self.state.record_connected();

            #[cfg(feature = "metrics")]
            counter!("reconnect_connections_total", "reconnect" => self.config.name.clone())
                .increment(1);

            match self.conn.wait().await {
                Ok(()) => {
                    self.transition(ConnState::Disconnected);
                    self.state.record_clean_drop();
                }
                Err(error) => {
                    let veto = self.config.veto(&error);
                    self.transition(ConnState::Failing);
                    let errors = self.state.record_connection_error();

                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        reconnect = %self.config.name,
                        errors,
                        max_errors = self.config.max_connection_errors,
                        error = %error,
                        "connection failed"
                    );

                    #[cfg(feature = "metrics")]
                    counter!("reconnect_connection_errors_total", "reconnect" => self.config.name.clone())
                        .increment(1);

                    self.emit(|name, timestamp| ReconnectEvent::ConnectionFailed {
                        name,
                        timestamp,
                        errors,
                        error: error.to_string(),
                    });

                    if let Some(veto) = veto {
                        return Err(self.vetoed(veto));
                    }
                    if self.config.connection_limit_reached(errors) {
                        self.fail();
                        return Err(ReconnectError::ConnectionErrorsExhausted {
                            errors,
                            source: error,
                        });
                    }
                }
            }

            // Shutting down: the top of the loop emits Closed instead.
            if !self.is_stop_requested() {
                self.transition(ConnState::Reconnecting);
            }
        }
    }

    /// Requests shutdown and tears the connection down.
    ///
    /// Marks the stop request, calls the connection's `close` (which must
    /// unblock an in-flight `wait`), then waits until a running
    /// [`start`](Self::start) has returned. Returns the result of the
    /// connection's `close`, whatever the outcome of `start`.
    ///
    /// Calling `close` again, or after `start` has finished, only repeats
    /// the connection's `close`. If `start` was never called it will observe
    /// the stop request as soon as it runs and return without touching the
    /// connection.
    pub async fn close(&self) -> Result<(), C::Error> {
        let mut run = Run::Idle;
        self.control.send_modify(|control| {
            control.stop_requested = true;
            run = control.run;
        });

        #[cfg(feature = "tracing")]
        tracing::debug!(reconnect = %self.config.name, "close requested");

        self.emit(|name, timestamp| ReconnectEvent::CloseRequested { name, timestamp });

        let result = self.conn.close().await;

        #[cfg(feature = "tracing")]
        if let Err(ref error) = result {
            tracing::warn!(reconnect = %self.config.name, error = %error, "close failed");
        }

        if run != Run::Idle {
            let mut exited = self.control.subscribe();
            // The sender lives in `self`, so this only completes on exit.
            let _ = exited.wait_for(|control| control.run == Run::Exited).await;
        }
        result
    }

    fn transition(&self, state: ConnState) {
        self.state.set(state);

        #[cfg(feature = "tracing")]
        tracing::debug!(reconnect = %self.config.name, state = %state, "state transition");

        #[cfg(feature = "metrics")]
        {
            counter!(
                "reconnect_state_transitions_total",
                "reconnect" => self.config.name.clone(),
                "state" => state.as_str()
            )
            .increment(1);
            let connected = if state == ConnState::Connected { 1.0 } else { 0.0 };
            gauge!("reconnect_connected", "reconnect" => self.config.name.clone()).set(connected);
        }

        if let Some(hook) = &self.config.on_state_change {
            hook(state);
        }
        self.emit(|name, timestamp| ReconnectEvent::StateTransition {
            name,
            timestamp,
            state,
        });
    }

    fn emit<F>(&self, event: F)
    where
        F: FnOnce(String, Instant) -> ReconnectEvent,
    {
        if self.config.event_listeners.is_empty() {
            return;
        }
        let event = event(self.config.name.clone(), Instant::now());
        self.config.event_listeners.emit(&event);
    }

    fn vetoed(&self, veto: C::Error) -> ReconnectError<C::Error> {
        #[cfg(feature = "tracing")]
        tracing::error!(reconnect = %self.config.name, error = %veto, "reconnection vetoed");

        #[cfg(feature = "metrics")]
        self.record_termination("vetoed");

        self.emit(|name, timestamp| ReconnectEvent::Vetoed { name, timestamp });
        self.transition(ConnState::Failed);
        ReconnectError::Vetoed(veto)
    }

    fn fail(&self) {
        #[cfg(feature = "tracing")]
        tracing::error!(
            reconnect = %self.config.name,
            connect_attempts = self.state.connect_attempts(),
            connection_errors = self.state.connection_errors(),
            "retry limit reached"
        );

        #[cfg(feature = "metrics")]
        self.record_termination("exhausted");

        self.transition(ConnState::Failed);
    }

    #[cfg(feature = "metrics")]
    fn record_termination(&self, reason: &'static str) {
        counter!(
            "reconnect_terminations_total",
            "reconnect" => self.config.name.clone(),
            "reason" => reason
        )
        .increment(1);
    }
}

impl<C: Connection> std::fmt::Debug for Reconnect<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconnect")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("stop_requested", &self.is_stop_requested())
            .finish()
    }
}
