//! End-to-end flow against an in-process instance of the service simulator:
//! login, summary refresh, detail windows, transport variants, logout.

use dashboard::alarm::classify;
use dashboard::client::{RemoteClient, Transport};
use dashboard::errors::Error;
use dashboard::model::{AlarmLevel, ConnectionStatus};
use dashboard::poller::PollingController;
use dashboard::session::SessionStore;
use simulator::{router, SimState, SimulatorConfig};
use std::net::SocketAddr;

async fn spawn_simulator(config: SimulatorConfig) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(SimState::new(config));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn temp_session(name: &str) -> SessionStore {
    let path = std::env::temp_dir().join(format!("flow-test-{}-{}.json", std::process::id(), name));
    let _ = std::fs::remove_file(&path);
    SessionStore::new(path)
}

fn direct_client(addr: SocketAddr, name: &str) -> RemoteClient {
    RemoteClient::new(
        Transport::Direct { base_url: format!("http://{}/api/v1", addr) },
        temp_session(name),
    )
    .unwrap()
}

#[tokio::test]
async fn test_bad_credentials_are_rejected() {
    let addr = spawn_simulator(SimulatorConfig::default()).await;
    let client = direct_client(addr, "bad-credentials");

    let result = client.authenticate("u", "bad").await;
    assert!(matches!(result, Err(Error::Auth(_))));
    assert!(client.session().load().is_none());

    // Without a session the dashboard cannot be populated.
    let mut controller = PollingController::new(client);
    assert!(!controller.refresh_all().await);
    assert_eq!(controller.snapshot().connection_status, ConnectionStatus::Error);
}

#[tokio::test]
async fn test_login_refresh_and_details() {
    let addr = spawn_simulator(SimulatorConfig { points: 3, ..Default::default() }).await;
    let client = direct_client(addr, "full-flow");
    let mut controller = PollingController::new(client);

    controller.login("demo", "demo").await.unwrap();
    assert!(controller.has_session());

    assert!(controller.refresh_all().await);
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.connection_status, ConnectionStatus::Connected);
    assert_eq!(snapshot.points.len(), 3);
    for summary in &snapshot.points {
        assert!(summary.last_ppv >= 0.0);
        assert_eq!(summary.alarm_level, classify(summary.point.category, summary.last_ppv));
    }

    let records = controller.load_details(1, 1).await.unwrap();
    assert!(!records.is_empty());
    assert!(records.len() <= 100);
    for record in &records {
        assert!(record.timestamp.is_some());
        let expected_max = record.ppv_x.max(record.ppv_y).max(record.ppv_z);
        assert_eq!(record.ppv_max, expected_max);
    }
    // Most recent record last, as received.
    let timestamps: Vec<_> = records.iter().map(|r| r.timestamp.unwrap()).collect();
    let mut sorted = timestamps.clone();
    sorted.sort();
    assert_eq!(timestamps, sorted);
}

#[tokio::test]
async fn test_back_to_back_refreshes_are_identical() {
    let addr = spawn_simulator(SimulatorConfig { points: 2, ..Default::default() }).await;
    let client = direct_client(addr, "idempotent");
    let mut controller = PollingController::new(client);
    controller.login("demo", "demo").await.unwrap();

    assert!(controller.refresh_all().await);
    let first = controller.snapshot();
    assert!(controller.refresh_all().await);
    let second = controller.snapshot();

    assert_eq!(first.points, second.points);
    assert!(second.last_update >= first.last_update);
}

#[tokio::test]
async fn test_single_point_failure_does_not_abort_refresh() {
    let config = SimulatorConfig { points: 2, fail_point: Some(2), ..Default::default() };
    let addr = spawn_simulator(config).await;
    let client = direct_client(addr, "partial-failure");
    let mut controller = PollingController::new(client);
    controller.login("demo", "demo").await.unwrap();

    assert!(controller.refresh_all().await);
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.connection_status, ConnectionStatus::Connected);
    assert_eq!(snapshot.points.len(), 2);

    let failing = snapshot.points.iter().find(|s| s.point.id == 2).unwrap();
    assert_eq!(failing.last_ppv, 0.0);
    assert_eq!(failing.alarm_level, AlarmLevel::Normal);

    let healthy = snapshot.points.iter().find(|s| s.point.id == 1).unwrap();
    assert!(healthy.last_ppv >= 0.0);
}

#[tokio::test]
async fn test_alternate_wire_spellings_are_tolerated() {
    let config = SimulatorConfig {
        samples_envelope: true,
        long_frequency_names: true,
        timestamps_in_millis: true,
        ..Default::default()
    };
    let addr = spawn_simulator(config).await;
    let client = direct_client(addr, "aliases");
    let mut controller = PollingController::new(client);
    controller.login("demo", "demo").await.unwrap();

    assert!(controller.refresh_all().await);
    assert_eq!(controller.snapshot().points.len(), 3);

    let records = controller.load_details(1, 6).await.unwrap();
    assert!(!records.is_empty());
    for record in &records {
        assert!(record.timestamp.is_some());
        assert!(record.freq_x > 0.0 || record.freq_y > 0.0 || record.freq_z > 0.0);
    }
}

#[tokio::test]
async fn test_proxied_transport() {
    let addr = spawn_simulator(SimulatorConfig::default()).await;
    let client = RemoteClient::new(
        Transport::Proxied { proxy_url: format!("http://{}/proxy", addr) },
        temp_session("proxied"),
    )
    .unwrap();
    let mut controller = PollingController::new(client);

    controller.login("demo", "demo").await.unwrap();
    assert!(controller.refresh_all().await);
    assert_eq!(controller.snapshot().connection_status, ConnectionStatus::Connected);
    assert!(!controller.load_details(1, 24).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_logout_invalidates_further_calls() {
    let addr = spawn_simulator(SimulatorConfig::default()).await;
    let client = direct_client(addr, "logout-flow");
    let mut controller = PollingController::new(client);
    controller.login("demo", "demo").await.unwrap();
    assert!(controller.refresh_all().await);

    controller.logout();
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.connection_status, ConnectionStatus::Disconnected);
    assert!(snapshot.points.is_empty());

    // The next refresh fails fast with no token.
    assert!(!controller.refresh_all().await);
    assert_eq!(controller.snapshot().connection_status, ConnectionStatus::Error);
}

#[tokio::test]
async fn test_stored_session_is_reusable() {
    let addr = spawn_simulator(SimulatorConfig::default()).await;
    let session = temp_session("resume");

    let first = RemoteClient::new(
        Transport::Direct { base_url: format!("http://{}/api/v1", addr) },
        session.clone(),
    )
    .unwrap();
    first.authenticate("demo", "demo").await.unwrap();
    assert!(session.is_valid());

    // A fresh client over the same store needs no new login.
    let second = RemoteClient::new(
        Transport::Direct { base_url: format!("http://{}/api/v1", addr) },
        session.clone(),
    )
    .unwrap();
    let points = second.list_measuring_points().await.unwrap();
    assert_eq!(points.len(), 3);

    session.clear();
}
