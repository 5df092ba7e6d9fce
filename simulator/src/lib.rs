//! HTTP stand-in for the remote vibration-monitoring service. Serves the
//! same three endpoints the dashboard consumes, both directly and through
//! the `?endpoint=` proxy layout, with synthetic triaxial data. Used as a
//! binary for local development and as a library by integration tests.

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Spacing between generated records.
const RECORD_STEP_SECS: i64 = 300;
const MAX_RECORDS: usize = 100;

#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub username: String,
    pub password: String,
    /// Number of measuring points served.
    pub points: usize,
    /// Name the record array `samples` instead of `records`.
    pub samples_envelope: bool,
    /// Emit `frequency_*` field names instead of `freq_*`.
    pub long_frequency_names: bool,
    /// Emit timestamps in milliseconds instead of seconds.
    pub timestamps_in_millis: bool,
    /// Point id whose record queries always fail, for exercising the
    /// dashboard's partial-failure path.
    pub fail_point: Option<i64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            username: "demo".to_string(),
            password: "demo".to_string(),
            points: 3,
            samples_envelope: false,
            long_frequency_names: false,
            timestamps_in_millis: false,
            fail_point: None,
        }
    }
}

#[derive(Clone)]
pub struct SimState {
    config: Arc<SimulatorConfig>,
    points: Arc<Vec<Value>>,
    tokens: Arc<Mutex<HashSet<String>>>,
}

impl SimState {
    pub fn new(config: SimulatorConfig) -> Self {
        let points = (0..config.points).map(|i| point_fixture(i as i64)).collect();
        Self {
            config: Arc::new(config),
            points: Arc::new(points),
            tokens: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    fn token_known(&self, token: Option<&str>) -> bool {
        match token {
            Some(t) => self.tokens.lock().unwrap().contains(t),
            None => false,
        }
    }
}

fn point_fixture(index: i64) -> Value {
    let mut rng = StdRng::seed_from_u64(index as u64);
    let category = match index % 3 {
        0 => "CAT1",
        1 => "CAT2",
        _ => "CAT3",
    };
    json!({
        "id": index + 1,
        "name": format!("MP-{:02}", index + 1),
        "active": true,
        "category": category,
        "guide_line": "DS_38_2011",
        "sensor": {
            "serial": format!("SWARM-{}", 1000 + index),
            "battery_level": rng.gen_range(20.0..100.0_f64).round(),
            "signal_strength": -rng.gen_range(50.0..90.0_f64).round(),
        }
    })
}

pub fn router(state: SimState) -> Router {
    Router::new()
        .route("/api/v1/user/authenticate", post(authenticate))
        .route("/api/v1/list_measuring_points", get(list_points))
        .route("/api/v1/get_peak_records", get(peak_records))
        .route("/proxy", get(proxy_get).post(proxy_post))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

async fn authenticate(State(state): State<SimState>, Json(body): Json<AuthRequest>) -> Json<Value> {
    Json(authenticate_inner(&state, &body))
}

fn authenticate_inner(state: &SimState, body: &AuthRequest) -> Value {
    if body.username == state.config.username && body.password == state.config.password {
        let token = uuid::Uuid::new_v4().to_string();
        state.tokens.lock().unwrap().insert(token.clone());
        info!("Issued token for {}", body.username);
        json!({ "ok": true, "token": token })
    } else {
        warn!("Rejected credentials for {}", body.username);
        json!({ "ok": false, "message": "Invalid username or password" })
    }
}

async fn list_points(
    State(state): State<SimState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    Json(list_points_inner(&state, &params))
}

fn list_points_inner(state: &SimState, params: &HashMap<String, String>) -> Value {
    if !state.token_known(params.get("token").map(String::as_str)) {
        return json!({ "ok": false, "message": "Invalid token" });
    }
    json!({ "ok": true, "measuring_points": &*state.points })
}

async fn peak_records(
    State(state): State<SimState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    Json(peak_records_inner(&state, &params))
}

fn peak_records_inner(state: &SimState, params: &HashMap<String, String>) -> Value {
    if !state.token_known(params.get("token").map(String::as_str)) {
        return json!({ "ok": false, "message": "Invalid token" });
    }

    let point_id: i64 = match params.get("measuring_point_id").and_then(|v| v.parse().ok()) {
        Some(id) => id,
        None => return json!({ "ok": false, "message": "measuring_point_id required" }),
    };
    if state.config.fail_point == Some(point_id) {
        return json!({ "ok": false, "message": "Point temporarily unavailable" });
    }

    let now = Utc::now().timestamp();
    let end: i64 = params.get("end_time").and_then(|v| v.parse().ok()).unwrap_or(now);
    let start: i64 = params
        .get("start_time")
        .and_then(|v| v.parse().ok())
        .unwrap_or(end - 24 * 3600);
    let limit: usize = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(20);

    let records = generate_records(&state.config, point_id, start, end, limit);
    debug!("Serving {} records for point {}", records.len(), point_id);

    let key = if state.config.samples_envelope { "samples" } else { "records" };
    json!({ "ok": true, (key): records })
}

/// Synthetic triaxial records walking back from `end` in fixed steps.
/// Values are seeded by point and step index so repeated queries over the
/// same window agree with each other.
fn generate_records(config: &SimulatorConfig, point_id: i64, start: i64, end: i64, limit: usize) -> Vec<Value> {
    let window_slots = ((end - start) / RECORD_STEP_SECS + 1).max(0) as usize;
    let count = limit.min(window_slots).min(MAX_RECORDS);

    let mut records = Vec::with_capacity(count);
    // Oldest first, so the most recent record arrives last.
    for i in (0..count).rev() {
        let ts = end - i as i64 * RECORD_STEP_SECS;
        let mut rng = StdRng::seed_from_u64((point_id as u64) << 32 | i as u64);

        // Mostly quiet with occasional spikes past the alarm thresholds.
        let base: f64 = if rng.gen_bool(0.15) {
            rng.gen_range(6.0..22.0)
        } else {
            rng.gen_range(0.1..5.0)
        };
        let ppv = |rng: &mut StdRng| (base * rng.gen_range(0.4..1.0) * 100.0).round() / 100.0;
        let freq = |rng: &mut StdRng| rng.gen_range(5.0..40.0_f64).round();

        let timestamp = if config.timestamps_in_millis { ts * 1000 } else { ts };
        let (fx, fy, fz) = if config.long_frequency_names {
            ("frequency_x", "frequency_y", "frequency_z")
        } else {
            ("freq_x", "freq_y", "freq_z")
        };

        records.push(json!({
            "timestamp": timestamp,
            "ppv_x": ppv(&mut rng),
            "ppv_y": ppv(&mut rng),
            "ppv_z": ppv(&mut rng),
            (fx): freq(&mut rng),
            (fy): freq(&mut rng),
            (fz): freq(&mut rng),
        }));
    }
    records
}

// Proxy layout: the target endpoint rides in the query string and the rest
// of the parameters pass through unchanged.

async fn proxy_get(
    State(state): State<SimState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let response = match params.get("endpoint").map(String::as_str) {
        Some("list_measuring_points") => list_points_inner(&state, &params),
        Some("get_peak_records") => peak_records_inner(&state, &params),
        Some(other) => json!({ "ok": false, "message": format!("Unknown endpoint {}", other) }),
        None => json!({ "ok": false, "message": "Endpoint required" }),
    };
    Json(response)
}

async fn proxy_post(
    State(state): State<SimState>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<AuthRequest>,
) -> Json<Value> {
    let response = match params.get("endpoint").map(String::as_str) {
        Some("user/authenticate") => authenticate_inner(&state, &body),
        _ => json!({ "ok": false, "message": "Endpoint required" }),
    };
    Json(response)
}
