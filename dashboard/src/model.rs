use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Regulatory vibration-sensitivity category of a measuring point.
/// Each category carries its own alarm thresholds (see `alarm`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "CAT1")]
    Cat1,
    #[serde(rename = "CAT2")]
    Cat2,
    #[serde(rename = "CAT3")]
    Cat3,
    /// Anything the remote service sends that we do not recognize.
    #[default]
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Category::Cat1 => "CAT1",
            Category::Cat2 => "CAT2",
            Category::Cat3 => "CAT3",
            Category::Unknown => "N/A",
        };
        f.pad(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmLevel {
    #[default]
    Normal,
    Warning,
    Alert,
}

impl std::fmt::Display for AlarmLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AlarmLevel::Normal => "normal",
            AlarmLevel::Warning => "warning",
            AlarmLevel::Alert => "alert",
        };
        f.pad(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::X => f.pad("X"),
            Axis::Y => f.pad("Y"),
            Axis::Z => f.pad("Z"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SensorInfo {
    #[serde(default)]
    pub serial: String,
    /// Percent, 0-100.
    #[serde(default)]
    pub battery_level: f64,
    /// dBm, typically negative.
    #[serde(default)]
    pub signal_strength: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MeasuringPoint {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub guide_line: String,
    #[serde(default)]
    pub sensor: Option<SensorInfo>,
}

/// One triaxial measurement event in canonical form. Immutable once built;
/// see `normalize` for the conversion from the wire shape.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakRecord {
    pub timestamp: Option<DateTime<Utc>>,
    pub ppv_x: f64,
    pub ppv_y: f64,
    pub ppv_z: f64,
    pub freq_x: f64,
    pub freq_y: f64,
    pub freq_z: f64,
    pub ppv_max: f64,
    pub max_axis: Axis,
    /// Frequency on the dominant axis, nearest integer Hz.
    pub dominant_freq: i64,
}

impl PeakRecord {
    pub fn date_string(&self) -> String {
        match self.timestamp {
            Some(t) => t.format("%d-%m-%Y").to_string(),
            None => "unknown".to_string(),
        }
    }

    pub fn time_string(&self) -> String {
        match self.timestamp {
            Some(t) => t.format("%H:%M:%S").to_string(),
            None => "unknown".to_string(),
        }
    }
}

/// Dashboard row: a measuring point plus its latest derived reading.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSummary {
    pub point: MeasuringPoint,
    /// Latest peak velocity in mm/s, rounded to 2 decimals.
    pub last_ppv: f64,
    pub alarm_level: AlarmLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Error,
    Demo,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Error => "error",
            ConnectionStatus::Demo => "demo",
        };
        f.pad(s)
    }
}

/// Plain state snapshot handed to whatever renders the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub connection_status: ConnectionStatus,
    pub points: Vec<PointSummary>,
    pub last_update: DateTime<Utc>,
    pub is_refreshing: bool,
    /// Message from the most recent failure, cleared on the next success.
    pub last_error: Option<String>,
}

// Wire envelopes. The remote service wraps every response in an `ok` flag
// with an optional human message instead of using HTTP status codes.

#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub ok: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PointsResponse {
    pub ok: bool,
    #[serde(default)]
    pub measuring_points: Vec<MeasuringPoint>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Peak-record listings arrive under either `records` or `samples`
/// depending on the service version. Individual records are kept as raw
/// JSON here; `normalize` turns them into `PeakRecord`s.
#[derive(Debug, Deserialize)]
pub struct PeakRecordsResponse {
    pub ok: bool,
    #[serde(default, alias = "samples")]
    pub records: Vec<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}
