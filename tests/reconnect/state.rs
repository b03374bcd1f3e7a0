use crate::support::{MockLink, PROMPTLY, fail};
use relink::{ConnState, Reconnect, ReconnectConfig, ReconnectError, ReconnectState};
use std::sync::Arc;

#[test]
fn snapshot_starts_in_connecting() {
    let reconnect = Reconnect::new(MockLink::new(), ReconnectConfig::default());
    let state = reconnect.state();

    assert_eq!(state.current(), ConnState::Connecting);
    assert_eq!(state.connect_attempts(), 0);
    assert_eq!(state.connection_errors(), 0);
    assert_eq!(state.total_connects(), 0);
    assert!(!reconnect.is_stop_requested());
}

#[tokio::test]
async fn snapshot_reflects_exhausted_connects() {
    let link = MockLink::new().connects([fail("a"), fail("b"), fail("c")]);
    let config = ReconnectConfig::builder().max_connect_attempts(3).build();
    let reconnect = Reconnect::new(link, config);
    let view: ReconnectState = reconnect.state().clone();

    let _ = reconnect.start().await;

    assert_eq!(view.current(), ConnState::Failed);
    assert_eq!(view.connect_attempts(), 3);
    assert_eq!(view.total_connects(), 0);
    assert!(view.is_terminal());
}

#[tokio::test]
async fn snapshot_is_readable_while_running() {
    let link = MockLink::new()
        .connects([fail("a"), Ok(())])
        .waits([fail("w")]);
    let reconnect = Arc::new(Reconnect::new(link, ReconnectConfig::default()));

    let runner = Arc::clone(&reconnect);
    let handle = tokio::spawn(async move { runner.start().await });

    reconnect.connection().waiting(2).await;

    let state = reconnect.state();
    assert_eq!(state.current(), ConnState::Connected);
    assert_eq!(state.connect_attempts(), 0);
    assert_eq!(state.connection_errors(), 1);
    assert_eq!(state.total_connects(), 2);

    reconnect.close().await.unwrap();
    tokio::time::timeout(PROMPTLY, handle).await.unwrap().unwrap().unwrap();

    assert_eq!(reconnect.state().current(), ConnState::Closed);
    assert_eq!(reconnect.state().connection_errors(), 0);
}

#[tokio::test]
async fn start_runs_only_once() {
    let link = MockLink::new().connects([fail("x")]);
    let config = ReconnectConfig::builder().max_connect_attempts(1).build();
    let reconnect = Reconnect::new(link, config);

    assert!(reconnect.start().await.is_err());
    let second = reconnect.start().await;

    assert!(matches!(second, Err(ReconnectError::AlreadyStarted)));
    assert_eq!(reconnect.connection().connects_made(), 1);
}

#[test]
fn debug_output_names_the_instance() {
    let config = ReconnectConfig::builder().name("billing-db").build();
    let reconnect = Reconnect::new(MockLink::new(), config);

    let debug = format!("{:?}", reconnect);
    assert!(debug.contains("billing-db"));
    assert!(debug.contains("stop_requested: false"));
}
