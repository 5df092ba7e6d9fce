use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("connection error: {0}")]
    Connection(#[from] reqwest::Error),

    #[error("no auth token")]
    NoToken,

    #[error("remote service error: {0}")]
    Api(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
