//! Retry scheduling across failed sessions

mod common;

use std::time::Duration;

use pretty_assertions::assert_eq;

use common::*;
use cwmp_core::prelude::*;

fn secs(values: &[u64]) -> Vec<Duration> {
    values.iter().map(|s| Duration::from_secs(*s)).collect()
}

#[tokio::test]
async fn test_consecutive_failures_back_off_linearly() {
    let mut harness = Harness::new().await;
    harness.transport.fail_init(true);

    for _ in 0..4 {
        assert!(harness.orchestrator.inform().await.is_err());
    }

    assert_eq!(harness.timers.delays(TimerId::Retry), secs(&[10, 20, 30, 40]));
    assert_eq!(harness.orchestrator.state().retry_count, 4);
}

#[tokio::test]
async fn test_backoff_saturates_at_twenty_minutes() {
    let mut harness = Harness::new().await;
    harness.transport.fail_init(true);

    for _ in 0..102 {
        assert!(harness.orchestrator.inform().await.is_err());
    }

    let delays = harness.timers.delays(TimerId::Retry);
    assert_eq!(delays[99], Duration::from_millis(1_000_000));
    assert_eq!(delays[100], Duration::from_millis(1_200_000));
    assert_eq!(delays[101], Duration::from_millis(1_200_000));
    assert_eq!(harness.orchestrator.state().retry_count, 100);
}

#[tokio::test]
async fn test_inform_reports_failures_so_far() {
    let mut harness = Harness::new().await;
    harness.transport.reply(BAD_INFORM_RESPONSE).reply(BAD_INFORM_RESPONSE);

    assert!(harness.orchestrator.inform().await.is_err());
    assert!(harness.orchestrator.inform().await.is_err());
    harness.orchestrator.inform().await.unwrap();

    let counts: Vec<_> = harness.codec.informs().iter().map(|i| i.retry_count).collect();
    assert_eq!(counts, vec![0, 1, 2]);
    assert_eq!(harness.orchestrator.state().retry_count, 0);
}

#[tokio::test]
async fn test_failure_after_inform_response_restarts_backoff() {
    let mut harness = Harness::new().await;
    harness.transport.fail_init(true);
    for _ in 0..3 {
        assert!(harness.orchestrator.inform().await.is_err());
    }
    assert_eq!(harness.orchestrator.state().retry_count, 3);

    // InformResponse accepted, then the RPC exchange breaks
    harness.transport.fail_init(false);
    harness
        .transport
        .reply(INFORM_RESPONSE)
        .reply(b"<cwmp:GetParameterValues/>");
    harness.codec.step(CodecStep::Fail);

    assert!(harness.orchestrator.inform().await.is_err());

    assert_eq!(harness.timers.delays(TimerId::Retry), secs(&[10, 20, 30, 10]));
    assert_eq!(harness.orchestrator.state().retry_count, 1);
}

#[tokio::test]
async fn test_retry_fire_runs_a_session() {
    let mut harness = Harness::new().await;
    harness.transport.fail_init(true);
    assert!(harness.orchestrator.inform().await.is_err());

    harness.transport.fail_init(false);
    harness.orchestrator.on_timer(TimerId::Retry).await;

    assert_eq!(harness.codec.informs().len(), 1);
    assert_eq!(harness.orchestrator.state().retry_count, 0);
    assert_eq!(harness.timers.delays(TimerId::Retry).len(), 1);
}
