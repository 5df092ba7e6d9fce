use crate::errors::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Tokens are accepted by the remote service for 14 days from issuance.
const TOKEN_LIFETIME_DAYS: i64 = 14;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    /// ISO-8601 issue time, written when the token was obtained.
    pub token_date: DateTime<Utc>,
    #[serde(default)]
    pub username: Option<String>,
}

/// File-backed session store. The session lives in a small JSON file so a
/// valid login survives restarts; validity is checked lazily on read and
/// nothing ever expires the token proactively.
///
/// Cloning a store yields another handle to the same file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn save(&self, token: &str, username: &str) -> Result<()> {
        let session = Session {
            token: token.to_string(),
            token_date: Utc::now(),
            username: Some(username.to_string()),
        };
        fs::write(&self.path, serde_json::to_vec_pretty(&session)?)?;
        debug!("Session saved to {}", self.path.display());
        Ok(())
    }

    /// Returns the stored session if a token exists, regardless of expiry.
    /// A missing or corrupt file reads as "no session".
    pub fn load(&self) -> Option<Session> {
        let bytes = fs::read(&self.path).ok()?;
        match serde_json::from_slice::<Session>(&bytes) {
            Ok(session) if !session.token.is_empty() => Some(session),
            Ok(_) => None,
            Err(e) => {
                warn!("Ignoring unreadable session file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    pub fn token(&self) -> Option<String> {
        self.load().map(|s| s.token)
    }

    pub fn username(&self) -> Option<String> {
        self.load().and_then(|s| s.username)
    }

    pub fn is_valid(&self) -> bool {
        self.valid_at(Utc::now())
    }

    /// True iff a token exists and was issued strictly less than 14 days
    /// before `now`. Split out so tests can pin the clock.
    pub fn valid_at(&self, now: DateTime<Utc>) -> bool {
        match self.load() {
            Some(session) => now - session.token_date < Duration::days(TOKEN_LIFETIME_DAYS),
            None => false,
        }
    }

    /// Removes the stored session. Idempotent.
    pub fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Session cleared"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove session file {}: {}", self.path.display(), e),
        }
    }
}
