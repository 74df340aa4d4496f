//! Management-server parameter side effects

mod common;

use std::time::Duration;

use pretty_assertions::assert_eq;

use common::*;
use cwmp_core::parameters::ManagementParameter;
use cwmp_core::prelude::*;

fn name(parameter: ManagementParameter) -> &'static str {
    parameter.name()
}

#[tokio::test]
async fn test_credentials_mark_reload_pending() {
    let mut harness = Harness::new().await;

    harness
        .orchestrator
        .set_parameter_value(name(ManagementParameter::Username), "cpe-42")
        .await
        .unwrap();

    let state = harness.orchestrator.state();
    assert!(state.config_reload_pending);
    assert_eq!(state.event, EventCode::Boot);
    assert_eq!(
        harness.store.value(name(ManagementParameter::Username)).as_deref(),
        Some("cpe-42")
    );
}

#[tokio::test]
async fn test_url_write_also_sets_value_change() {
    let mut harness = Harness::new().await;

    harness
        .orchestrator
        .set_parameter_value(name(ManagementParameter::Url), "https://acs.example.net/cwmp")
        .await
        .unwrap();

    let state = harness.orchestrator.state();
    assert!(state.config_reload_pending);
    assert_eq!(state.event, EventCode::ValueChange);
}

#[tokio::test]
async fn test_interval_write_restarts_periodic_timer() {
    let mut harness = Harness::new().await;

    harness
        .orchestrator
        .set_parameter_value(name(ManagementParameter::PeriodicInformInterval), "300")
        .await
        .unwrap();

    assert_eq!(
        harness.timers.last(TimerId::Periodic),
        Some(Duration::from_secs(300))
    );
    assert_eq!(harness.orchestrator.state().periodic.interval_seconds, 300);
    assert!(!harness.orchestrator.state().config_reload_pending);
}

#[tokio::test]
async fn test_enable_write_toggles_periodic_informs() {
    let mut harness = Harness::new().await;
    let enable = name(ManagementParameter::PeriodicInformEnable);

    harness.orchestrator.set_parameter_value(enable, "1").await.unwrap();
    assert!(harness.orchestrator.state().periodic.enabled);

    harness.orchestrator.set_parameter_value(enable, "0").await.unwrap();
    assert!(!harness.orchestrator.state().periodic.enabled);
}

#[tokio::test]
async fn test_other_parameters_have_no_side_effects() {
    let mut harness = Harness::new().await;
    let before = harness.orchestrator.state();

    harness
        .orchestrator
        .set_parameter_value("InternetGatewayDevice.ManagementServer.url", "x")
        .await
        .unwrap();
    harness
        .orchestrator
        .set_parameter_value("InternetGatewayDevice.LANDevice.1.Hosts.HostNumberOfEntries", "3")
        .await
        .unwrap();

    assert_eq!(harness.orchestrator.state(), before);
    assert!(harness.timers.arms().is_empty());
}

#[tokio::test]
async fn test_side_effects_apply_even_when_store_rejects_write() {
    let mut harness = Harness::new().await;
    harness
        .store
        .set_failing(Some(StoreError::fault(StoreError::INTERNAL_ERROR, "commit failed")));

    let err = harness
        .orchestrator
        .set_parameter_value(name(ManagementParameter::Password), "hunter2")
        .await
        .unwrap_err();

    assert_eq!(err.fault_code(), 9002);
    assert!(harness.orchestrator.state().config_reload_pending);
}

#[tokio::test]
async fn test_batch_of_writes_reloads_once() {
    let mut harness = Harness::new().await;
    harness.transport.reply(INFORM_RESPONSE).reply(b"<cwmp:SetParameterValues/>");
    harness.codec.step(CodecStep::Write(vec![
        (name(ManagementParameter::Username), "cpe"),
        (name(ManagementParameter::Password), "secret"),
        (name(ManagementParameter::Url), "https://acs.example.net/cwmp"),
    ]));

    harness.orchestrator.inform().await.unwrap();

    assert_eq!(harness.loader.reloads(), 1);
    assert!(!harness.orchestrator.state().config_reload_pending);
    assert!(harness.codec.write_results().iter().all(|r| r.is_ok()));
    assert_eq!(
        harness.store.value(name(ManagementParameter::Url)).as_deref(),
        Some("https://acs.example.net/cwmp")
    );

    // Nothing pending any more
    assert!(!harness.orchestrator.reload_changes().await.unwrap());
    assert_eq!(harness.loader.reloads(), 1);
}

#[tokio::test]
async fn test_failed_reload_stays_pending() {
    let mut harness = Harness::new().await;
    harness
        .orchestrator
        .set_parameter_value(name(ManagementParameter::Username), "cpe")
        .await
        .unwrap();
    harness.loader.set_failing(true);

    let err = harness.orchestrator.reload_changes().await.unwrap_err();
    assert!(matches!(err, CwmpError::Config(ConfigError::Reload(_))));
    assert!(harness.orchestrator.state().config_reload_pending);

    harness.loader.set_failing(false);
    assert!(harness.orchestrator.reload_changes().await.unwrap());
    assert!(!harness.orchestrator.state().config_reload_pending);
    assert_eq!(harness.loader.reloads(), 1);
}

#[tokio::test]
async fn test_url_write_during_exchange_updates_event() {
    let mut harness = Harness::new().await;
    harness
        .transport
        .reply(INFORM_RESPONSE)
        .reply(b"<cwmp:SetParameterValues/>")
        .reply(b"<cwmp:GetParameterValues/>");
    harness
        .codec
        .step(CodecStep::Write(vec![(name(ManagementParameter::Url), "https://acs2/")]));

    harness.orchestrator.inform().await.unwrap();

    // The Write step terminates, so only the first request was handled
    assert_eq!(harness.codec.host_events(), vec![EventCode::Boot]);
    assert_eq!(harness.orchestrator.event().current(), EventCode::ValueChange);
}
