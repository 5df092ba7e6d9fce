//! Core of a client dashboard for a remote vibration-monitoring service:
//! session/token lifecycle, API client, triaxial record normalization,
//! threshold-based alarm classification, and the polling controller that
//! ties them together. Rendering is left to whatever consumes `Snapshot`.

pub mod alarm;
pub mod client;
pub mod errors;
pub mod model;
pub mod normalize;
pub mod poller;
pub mod session;
