use crate::events::ReconnectEvent;
use crate::state::ConnState;
use relink_core::events::{EventListeners, FnListener};
use std::sync::Arc;

/// Inspects every `connect`/`wait` failure.
///
/// Returning `Some(error)` stops the controller immediately with that error,
/// regardless of the configured limits. Returning `None` lets the limits
/// decide.
pub type ErrorHook<E> = Arc<dyn Fn(&E) -> Option<E> + Send + Sync>;

/// Observes every state transition, synchronously, on the controller's task.
pub type StateHook = Arc<dyn Fn(ConnState) + Send + Sync>;

/// Configuration for a [`Reconnect`](crate::Reconnect) controller.
///
/// `E` is the error type of the wrapped connection.
pub struct ReconnectConfig<E> {
    /// Consecutive `connect` failures tolerated. 0 means unlimited.
    pub(crate) max_connect_attempts: u32,

    /// Consecutive `wait` failures tolerated. 0 means unlimited.
    pub(crate) max_connection_errors: u32,

    /// Instance name used in events, logs and metric labels.
    pub(crate) name: String,

    /// Optional veto hook for connection errors.
    pub(crate) on_error: Option<ErrorHook<E>>,

    /// Optional state transition hook.
    pub(crate) on_state_change: Option<StateHook>,

    pub(crate) event_listeners: EventListeners<ReconnectEvent>,
}

impl<E> Clone for ReconnectConfig<E> {
    fn clone(&self) -> Self {
        Self {
            max_connect_attempts: self.max_connect_attempts,
            max_connection_errors: self.max_connection_errors,
            name: self.name.clone(),
            on_error: self.on_error.clone(),
            on_state_change: self.on_state_change.clone(),
            event_listeners: self.event_listeners.clone(),
        }
    }
}

impl<E> std::fmt::Debug for ReconnectConfig<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconnectConfig")
            .field("max_connect_attempts", &self.max_connect_attempts)
            .field("max_connection_errors", &self.max_connection_errors)
            .field("name", &self.name)
            .field("on_error", &self.on_error.is_some())
            .field("on_state_change", &self.on_state_change.is_some())
            .field("event_listeners", &self.event_listeners.len())
            .finish()
    }
}

impl<E> ReconnectConfig<E> {
    /// Creates a new builder for configuring reconnection behavior.
    pub fn builder() -> ReconnectConfigBuilder<E> {
        ReconnectConfigBuilder::default()
    }

    /// Consecutive `connect` failures tolerated (0 = unlimited).
    pub fn max_connect_attempts(&self) -> u32 {
        self.max_connect_attempts
    }

    /// Consecutive `wait` failures tolerated (0 = unlimited).
    pub fn max_connection_errors(&self) -> u32 {
        self.max_connection_errors
    }

    /// Instance name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn connect_limit_reached(&self, attempts: u32) -> bool {
        self.max_connect_attempts > 0 && attempts >= self.max_connect_attempts
    }

    pub(crate) fn connection_limit_reached(&self, errors: u32) -> bool {
        self.max_connection_errors > 0 && errors >= self.max_connection_errors
    }

    /// Runs the error hook. `None` when no hook is set.
    pub(crate) fn veto(&self, error: &E) -> Option<E> {
        match &self.on_error {
            Some(hook) => hook(error),
            None => None,
        }
    }
}

impl<E> Default for ReconnectConfig<E> {
    fn default() -> Self {
        ReconnectConfigBuilder::default().build()
    }
}

/// Builder for constructing a [`ReconnectConfig`].
///
/// Setters may be called in any order; a later call overrides an earlier
/// one, except [`on_event`](Self::on_event), which accumulates listeners.
pub struct ReconnectConfigBuilder<E> {
    max_connect_attempts: u32,
    max_connection_errors: u32,
    name: String,
    on_error: Option<ErrorHook<E>>,
    on_state_change: Option<StateHook>,
    event_listeners: EventListeners<ReconnectEvent>,
}

impl<E> std::fmt::Debug for ReconnectConfigBuilder<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconnectConfigBuilder")
            .field("max_connect_attempts", &self.max_connect_attempts)
            .field("max_connection_errors", &self.max_connection_errors)
            .field("name", &self.name)
            .field("on_error", &self.on_error.is_some())
            .field("on_state_change", &self.on_state_change.is_some())
            .finish()
    }
}

impl<E> ReconnectConfigBuilder<E> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how many consecutive `connect` failures are tolerated before
    /// the controller fails. `0` means unlimited.
    ///
    /// Default: unlimited
    ///
    /// # Examples
    ///
    /// ```
    /// use relink::ReconnectConfig;
    ///
    /// let config = ReconnectConfig::<std::io::Error>::builder()
    ///     .max_connect_attempts(5)
    ///     .build();
    /// assert_eq!(config.max_connect_attempts(), 5);
    /// ```
    pub fn max_connect_attempts(mut self, attempts: u32) -> Self {
        self.max_connect_attempts = attempts;
        self
    }

    /// Removes the limit on consecutive `connect` failures.
    pub fn unlimited_connect_attempts(mut self) -> Self {
        self.max_connect_attempts = 0;
        self
    }

    /// Sets how many consecutive `wait` failures are tolerated before the
    /// controller fails. `0` means unlimited.
    ///
    /// Default: unlimited
    pub fn max_connection_errors(mut self, errors: u32) -> Self {
        self.max_connection_errors = errors;
        self
    }

    /// Removes the limit on consecutive `wait` failures.
    pub fn unlimited_connection_errors(mut self) -> Self {
        self.max_connection_errors = 0;
        self
    }

    /// Sets the instance name used in events, logs and metrics.
    ///
    /// Default: "reconnect"
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the error hook, called with every `connect` and `wait` failure.
    ///
    /// Returning `Some(error)` aborts the controller with
    /// [`ReconnectError::Vetoed`](crate::ReconnectError::Vetoed) carrying
    /// that error, even if the retry limits would allow another attempt.
    ///
    /// # Examples
    ///
    /// ```
    /// use relink::ReconnectConfig;
    /// use std::io::{Error, ErrorKind};
    ///
    /// let config = ReconnectConfig::builder()
    ///     .on_error(|error: &Error| {
    ///         // Give up on authentication problems, keep retrying the rest
    ///         (error.kind() == ErrorKind::PermissionDenied)
    ///             .then(|| Error::new(ErrorKind::PermissionDenied, error.to_string()))
    ///     })
    ///     .build();
    /// ```
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&E) -> Option<E> + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }

    /// Sets the state hook, called synchronously on every state transition.
    ///
    /// # Examples
    ///
    /// ```
    /// use relink::ReconnectConfig;
    ///
    /// let config = ReconnectConfig::<std::io::Error>::builder()
    ///     .on_state_change(|state| println!("connection is {}", state))
    ///     .build();
    /// ```
    pub fn on_state_change<F>(mut self, hook: F) -> Self
    where
        F: Fn(ConnState) + Send + Sync + 'static,
    {
        self.on_state_change = Some(Arc::new(hook));
        self
    }

    /// Registers an event listener. Listeners accumulate, and a panicking
    /// listener does not prevent the others from running.
    pub fn on_event<F>(mut self, listener: F) -> Self
    where
        F: Fn(&ReconnectEvent) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(listener));
        self
    }

    /// Builds the `ReconnectConfig`.
    pub fn build(self) -> ReconnectConfig<E> {
        ReconnectConfig {
            max_connect_attempts: self.max_connect_attempts,
            max_connection_errors: self.max_connection_errors,
            name: self.name,
            on_error: self.on_error,
            on_state_change: self.on_state_change,
            event_listeners: self.event_listeners,
        }
    }
}

impl<E> Default for ReconnectConfigBuilder<E> {
    fn default() -> Self {
        Self {
            max_connect_attempts: 0,
            max_connection_errors: 0,
            name: "reconnect".to_string(),
            on_error: None,
            on_state_change: None,
            event_listeners: EventListeners::new(),
        }
    }
}
