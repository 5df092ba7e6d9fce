use crate::alarm::classify;
use crate::client::RemoteClient;
use crate::errors::Result;
use crate::model::{
    AlarmLevel, Category, ConnectionStatus, MeasuringPoint, PeakRecord, PointSummary, SensorInfo,
    Snapshot,
};
use crate::normalize::normalize;
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, info, warn};

/// Records fetched per detail view.
const DETAIL_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Live,
    Demo,
}

/// Owns the dashboard state and drives periodic refreshes. All access runs
/// on one logical task; the only concurrency is the fan-out of per-point
/// latest-record fetches inside a single refresh, which are joined before
/// any state becomes visible.
pub struct PollingController {
    client: RemoteClient,
    mode: Mode,
    points: Vec<PointSummary>,
    connection_status: ConnectionStatus,
    last_update: DateTime<Utc>,
    is_refreshing: bool,
    auto_refresh_enabled: bool,
    last_error: Option<String>,
}

impl PollingController {
    pub fn new(client: RemoteClient) -> Self {
        Self {
            client,
            mode: Mode::Live,
            points: Vec::new(),
            connection_status: ConnectionStatus::Disconnected,
            last_update: Utc::now(),
            is_refreshing: false,
            auto_refresh_enabled: true,
            last_error: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn auto_refresh_enabled(&self) -> bool {
        self.auto_refresh_enabled
    }

    /// Pauses or resumes the periodic refresh driven by the caller's timer.
    pub fn set_auto_refresh(&mut self, enabled: bool) {
        self.auto_refresh_enabled = enabled;
        info!("Auto-refresh {}", if enabled { "resumed" } else { "paused" });
    }

    pub fn has_session(&self) -> bool {
        self.client.session().is_valid()
    }

    /// Authenticates against the remote service and stores the session.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        self.connection_status = ConnectionStatus::Connecting;
        match self.client.authenticate(username, password).await {
            Ok(_) => {
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                self.connection_status = ConnectionStatus::Error;
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Clears the session and resets the dashboard to its logged-out state.
    pub fn logout(&mut self) {
        self.client.logout();
        self.points.clear();
        self.mode = Mode::Live;
        self.connection_status = ConnectionStatus::Disconnected;
        self.last_error = None;
    }

    /// Switches to the offline demo dataset. Never contacts the network;
    /// only an explicit logout leaves this mode.
    pub fn set_demo_mode(&mut self) {
        self.mode = Mode::Demo;
        self.points = demo_points();
        self.connection_status = ConnectionStatus::Demo;
        self.last_update = Utc::now();
        self.last_error = None;
        info!("Demo mode enabled with {} sample points", self.points.len());
    }

    /// Refreshes every point summary. In demo mode only the last-update
    /// timestamp moves. In live mode the points list is replaced wholesale
    /// after all per-point fetches resolve; a failed fetch for one point
    /// contributes ppv 0 / normal instead of failing the refresh. Returns
    /// whether the summary list was updated.
    pub async fn refresh_all(&mut self) -> bool {
        if self.is_refreshing {
            debug!("Refresh already in flight, skipping");
            return false;
        }
        if self.mode == Mode::Demo {
            self.last_update = Utc::now();
            return true;
        }

        self.is_refreshing = true;
        self.connection_status = ConnectionStatus::Connecting;
        let result = self.fetch_summaries().await;
        self.is_refreshing = false;

        match result {
            Ok(points) => {
                debug!("Refreshed {} measuring points", points.len());
                self.points = points;
                self.connection_status = ConnectionStatus::Connected;
                self.last_update = Utc::now();
                self.last_error = None;
                true
            }
            Err(e) => {
                // Keep the last-known-good list; the next tick retries.
                warn!("Refresh failed: {}", e);
                self.connection_status = ConnectionStatus::Error;
                self.last_error = Some(e.to_string());
                false
            }
        }
    }

    async fn fetch_summaries(&self) -> Result<Vec<PointSummary>> {
        let points = self.client.list_measuring_points().await?;

        let mut fetches = Vec::with_capacity(points.len());
        for point in &points {
            let client = self.client.clone();
            let point_id = point.id;
            fetches.push(tokio::spawn(async move { client.latest_peak(point_id).await }));
        }

        let mut summaries = Vec::with_capacity(points.len());
        for (point, fetch) in points.into_iter().zip(fetches) {
            let (last_ppv, alarm_level) = match fetch.await {
                Ok(Ok(Some(raw))) => {
                    let record = normalize(&raw);
                    (round2(record.ppv_max), classify(point.category, record.ppv_max))
                }
                Ok(Ok(None)) => (0.0, AlarmLevel::Normal),
                Ok(Err(e)) => {
                    warn!("Latest record fetch failed for point {}: {}", point.id, e);
                    (0.0, AlarmLevel::Normal)
                }
                Err(e) => {
                    warn!("Latest record task for point {} did not complete: {}", point.id, e);
                    (0.0, AlarmLevel::Normal)
                }
            };
            summaries.push(PointSummary { point, last_ppv, alarm_level });
        }
        Ok(summaries)
    }

    /// Peak records for one point over the trailing `window_hours`, ordered
    /// as received (most recent last).
    pub async fn load_details(&self, point_id: i64, window_hours: i64) -> Result<Vec<PeakRecord>> {
        if self.mode == Mode::Demo {
            return Ok(demo_records());
        }

        let end = Utc::now().timestamp();
        let start = end - window_hours * 3600;
        let raw = self
            .client
            .list_peak_records(point_id, start, end, DETAIL_LIMIT)
            .await?;
        Ok(raw.iter().map(normalize).collect())
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            connection_status: self.connection_status,
            points: self.points.clone(),
            last_update: self.last_update,
            is_refreshing: self.is_refreshing,
            last_error: self.last_error.clone(),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn demo_points() -> Vec<PointSummary> {
    let fixtures = [
        (1, "Demo - Sensor 1", Category::Cat2, "DEMO-001", 78.0, -62.0, 4.8),
        (2, "Demo - Sensor 2", Category::Cat1, "DEMO-002", 45.0, -75.0, 9.3),
    ];

    fixtures
        .into_iter()
        .map(|(id, name, category, serial, battery, signal, ppv)| PointSummary {
            point: MeasuringPoint {
                id,
                name: name.to_string(),
                active: true,
                category,
                guide_line: "DS_38_2011".to_string(),
                sensor: Some(SensorInfo {
                    serial: serial.to_string(),
                    battery_level: battery,
                    signal_strength: signal,
                }),
            },
            last_ppv: ppv,
            alarm_level: classify(category, ppv),
        })
        .collect()
}

fn demo_records() -> Vec<PeakRecord> {
    [
        json!({
            "timestamp": "2026-01-16T14:23:18Z",
            "ppv_x": 1.8, "ppv_y": 2.1, "ppv_z": 4.8,
            "freq_x": 12.0, "freq_y": 15.0, "freq_z": 18.0
        }),
        json!({
            "timestamp": "2026-01-16T14:28:45Z",
            "ppv_x": 2.3, "ppv_y": 3.2, "ppv_z": 3.9,
            "freq_x": 16.0, "freq_y": 19.0, "freq_z": 17.0
        }),
    ]
    .iter()
    .map(normalize)
    .collect()
}
