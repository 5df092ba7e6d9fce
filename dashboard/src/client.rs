use crate::errors::{Error, Result};
use crate::model::{AuthResponse, MeasuringPoint, PeakRecordsResponse, PointsResponse};
use crate::session::SessionStore;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Window scanned backwards from now when asking for the single most
/// recent record.
const LATEST_WINDOW_SECS: i64 = 24 * 3600;

/// How the remote API is reached. `Direct` talks to the service itself;
/// `Proxied` goes through a forwarding proxy that takes the target endpoint
/// as a query parameter (the layout used to sidestep CORS restrictions).
#[derive(Debug, Clone)]
pub enum Transport {
    Direct { base_url: String },
    Proxied { proxy_url: String },
}

impl Transport {
    fn url(&self, endpoint: &str) -> String {
        match self {
            Transport::Direct { base_url } => {
                format!("{}/{}", base_url.trim_end_matches('/'), endpoint)
            }
            Transport::Proxied { proxy_url } => proxy_url.clone(),
        }
    }

    /// The proxied layout carries the target endpoint as a query parameter.
    fn endpoint_param(&self, endpoint: &str) -> Option<(&'static str, String)> {
        match self {
            Transport::Direct { .. } => None,
            Transport::Proxied { .. } => Some(("endpoint", endpoint.to_string())),
        }
    }
}

/// Async client for the vibration-monitoring service. Reads and writes the
/// auth token only through the session store. Every failure comes back as a
/// typed error value; this layer never retries and never panics.
///
/// Cloning is cheap and shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    transport: Transport,
    session: SessionStore,
}

impl RemoteClient {
    pub fn new(transport: Transport, session: SessionStore) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { http, transport, session })
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Logs in against the remote service. A granted token is persisted
    /// before returning. Rejected credentials come back as `Error::Auth`,
    /// transport problems as `Error::Connection`.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<String> {
        let endpoint = "user/authenticate";
        let mut request = self.http.post(self.transport.url(endpoint));
        if let Some(param) = self.transport.endpoint_param(endpoint) {
            request = request.query(&[param]);
        }

        let response = request
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?
            .error_for_status()?;
        let auth: AuthResponse = response.json().await?;

        match (auth.ok, auth.token) {
            (true, Some(token)) => {
                self.session.save(&token, username)?;
                info!("Authenticated as {}", username);
                Ok(token)
            }
            _ => Err(Error::Auth(
                auth.message.unwrap_or_else(|| "invalid credentials".to_string()),
            )),
        }
    }

    /// Lists the account's measuring points. Fails fast with
    /// `Error::NoToken`, without touching the network, when no session is
    /// stored.
    pub async fn list_measuring_points(&self) -> Result<Vec<MeasuringPoint>> {
        let token = self.session.token().ok_or(Error::NoToken)?;
        let response: PointsResponse = self
            .get("list_measuring_points", &[("token", token)])
            .await?;

        if response.ok {
            debug!("Listed {} measuring points", response.measuring_points.len());
            Ok(response.measuring_points)
        } else {
            Err(Error::Api(
                response.message.unwrap_or_else(|| "list_measuring_points failed".to_string()),
            ))
        }
    }

    /// Fetches raw peak records for one point over an inclusive epoch-second
    /// window. The service may return fewer than `limit` records and may
    /// name the array `records` or `samples`.
    pub async fn list_peak_records(
        &self,
        point_id: i64,
        start_time: i64,
        end_time: i64,
        limit: usize,
    ) -> Result<Vec<Value>> {
        let token = self.session.token().ok_or(Error::NoToken)?;
        let params = [
            ("token", token),
            ("measuring_point_id", point_id.to_string()),
            ("start_time", start_time.to_string()),
            ("end_time", end_time.to_string()),
            ("limit", limit.to_string()),
        ];
        let response: PeakRecordsResponse = self.get("get_peak_records", &params).await?;

        if response.ok {
            Ok(response.records)
        } else {
            Err(Error::Api(
                response.message.unwrap_or_else(|| "get_peak_records failed".to_string()),
            ))
        }
    }

    /// The most recent record for a point, if any. Scans the trailing
    /// 24-hour window with a 1-record limit.
    pub async fn latest_peak(&self, point_id: i64) -> Result<Option<Value>> {
        let now = Utc::now().timestamp();
        let mut records = self
            .list_peak_records(point_id, now - LATEST_WINDOW_SECS, now, 1)
            .await?;
        if records.is_empty() {
            warn!("No recent peak records for point {}", point_id);
            return Ok(None);
        }
        Ok(Some(records.swap_remove(0)))
    }

    /// Forgets the stored session.
    pub fn logout(&self) {
        self.session.clear();
        info!("Logged out");
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str, params: &[(&str, String)]) -> Result<T> {
        let mut request = self.http.get(self.transport.url(endpoint));
        if let Some(param) = self.transport.endpoint_param(endpoint) {
            request = request.query(&[param]);
        }
        let response = request.query(params).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }
}
