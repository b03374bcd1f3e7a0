//! Error types returned by the reconnection controller.

/// Why [`Reconnect::start`](crate::Reconnect::start) gave up.
///
/// A clean, externally requested close is not an error; `start` returns
/// `Ok(())` in that case.
#[derive(Debug, thiserror::Error)]
pub enum ReconnectError<E> {
    /// `connect` failed `attempts` times in a row, reaching the limit.
    #[error("connect failed {attempts} consecutive times: {source}")]
    ConnectAttemptsExhausted {
        /// Consecutive failures observed.
        attempts: u32,
        /// Error from the last `connect` call.
        source: E,
    },

    /// `wait` failed `errors` times in a row, reaching the limit.
    #[error("connection failed {errors} consecutive times: {source}")]
    ConnectionErrorsExhausted {
        /// Consecutive failures observed.
        errors: u32,
        /// Error from the last `wait` call.
        source: E,
    },

    /// The error hook returned this error, stopping all retries.
    #[error("reconnection vetoed: {0}")]
    Vetoed(#[source] E),

    /// `start` was called on a controller that has already run.
    #[error("reconnect controller already started")]
    AlreadyStarted,
}

impl<E> ReconnectError<E> {
    /// Returns true if the error hook stopped the controller.
    pub fn is_vetoed(&self) -> bool {
        matches!(self, Self::Vetoed(_))
    }

    /// Returns true if a retry limit was reached.
    pub fn is_exhausted(&self) -> bool {
        matches!(
            self,
            Self::ConnectAttemptsExhausted { .. } | Self::ConnectionErrorsExhausted { .. }
        )
    }

    /// The connection or hook error behind this failure, if any.
    pub fn inner(&self) -> Option<&E> {
        match self {
            Self::ConnectAttemptsExhausted { source, .. }
            | Self::ConnectionErrorsExhausted { source, .. }
            | Self::Vetoed(source) => Some(source),
            Self::AlreadyStarted => None,
        }
    }

    /// Consumes the error, returning the wrapped connection or hook error.
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::ConnectAttemptsExhausted { source, .. }
            | Self::ConnectionErrorsExhausted { source, .. }
            | Self::Vetoed(source) => Some(source),
            Self::AlreadyStarted => None,
        }
    }
}
