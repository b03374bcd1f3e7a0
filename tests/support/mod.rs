//! Scripted connection shared by the integration test suites.

#![allow(dead_code)]

use relink::{ConnState, Connection};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct LinkError(pub String);

impl LinkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub fn fail(message: &str) -> Result<(), LinkError> {
    Err(LinkError::new(message))
}

/// What the mock does once a script runs dry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhenDry {
    /// `connect` succeeds, `wait` blocks until `close`.
    Idle,
    /// `connect` blocks until `close` and then fails.
    BlockConnect,
    /// `connect` succeeds, `wait` fails immediately.
    FailWait,
}

/// A connection that replays scripted `connect` and `wait` outcomes.
pub struct MockLink {
    connects: Mutex<VecDeque<Result<(), LinkError>>>,
    waits: Mutex<VecDeque<Result<(), LinkError>>>,
    close_error: Option<LinkError>,
    when_dry: WhenDry,
    unwind_delay: Duration,
    shutdown: Notify,
    pub connect_calls: AtomicUsize,
    pub wait_calls: AtomicUsize,
    pub close_calls: AtomicUsize,
}

impl MockLink {
    pub fn new() -> Self {
        Self {
            connects: Mutex::new(VecDeque::new()),
            waits: Mutex::new(VecDeque::new()),
            close_error: None,
            when_dry: WhenDry::Idle,
            unwind_delay: Duration::ZERO,
            shutdown: Notify::new(),
            connect_calls: AtomicUsize::new(0),
            wait_calls: AtomicUsize::new(0),
            close_calls: AtomicUsize::new(0),
        }
    }

    pub fn connects(self, outcomes: impl IntoIterator<Item = Result<(), LinkError>>) -> Self {
        self.connects.lock().unwrap().extend(outcomes);
        self
    }

    pub fn waits(self, outcomes: impl IntoIterator<Item = Result<(), LinkError>>) -> Self {
        self.waits.lock().unwrap().extend(outcomes);
        self
    }

    pub fn close_error(mut self, message: &str) -> Self {
        self.close_error = Some(LinkError::new(message));
        self
    }

    pub fn when_dry(mut self, when_dry: WhenDry) -> Self {
        self.when_dry = when_dry;
        self
    }

    /// Delay between being released by `close` and returning from a
    /// blocked call.
    pub fn unwind_delay(mut self, delay: Duration) -> Self {
        self.unwind_delay = delay;
        self
    }

    pub fn connects_made(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn waits_made(&self) -> usize {
        self.wait_calls.load(Ordering::SeqCst)
    }

    pub fn closes_made(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    /// Resolves once the controller has entered `wait` `n` times.
    pub async fn waiting(&self, n: usize) {
        while self.waits_made() < n {
            tokio::task::yield_now().await;
        }
    }

    /// Resolves once the controller has entered `connect` `n` times.
    pub async fn connecting(&self, n: usize) {
        while self.connects_made() < n {
            tokio::task::yield_now().await;
        }
    }

    async fn released(&self) {
        self.shutdown.notified().await;
        if !self.unwind_delay.is_zero() {
            tokio::time::sleep(self.unwind_delay).await;
        }
    }
}

impl Default for MockLink {
    fn default() -> Self {
        Self::new()
    }
}

impl Connection for MockLink {
    type Error = LinkError;

    async fn connect(&self) -> Result<(), LinkError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.connects.lock().unwrap().pop_front();
        match (next, self.when_dry) {
            (Some(outcome), _) => outcome,
            (None, WhenDry::BlockConnect) => {
                self.released().await;
                fail("closed while connecting")
            }
            (None, _) => Ok(()),
        }
    }

    async fn wait(&self) -> Result<(), LinkError> {
        self.wait_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.waits.lock().unwrap().pop_front();
        match (next, self.when_dry) {
            (Some(outcome), _) => outcome,
            (None, WhenDry::FailWait) => fail("dropped"),
            (None, _) => {
                self.released().await;
                Ok(())
            }
        }
    }

    async fn close(&self) -> Result<(), LinkError> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.shutdown.notify_one();
        match &self.close_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

/// Collects emitted states in order.
#[derive(Clone, Default)]
pub struct StateLog {
    states: Arc<Mutex<Vec<ConnState>>>,
}

impl StateLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hook(&self) -> impl Fn(ConnState) + Send + Sync + use<> {
        let states = Arc::clone(&self.states);
        move |state| states.lock().unwrap().push(state)
    }

    pub fn states(&self) -> Vec<ConnState> {
        self.states.lock().unwrap().clone()
    }
}

/// Upper bound for anything that is expected to finish promptly.
pub const PROMPTLY: Duration = Duration::from_secs(5);
