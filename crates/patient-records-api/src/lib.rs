//! HTTP API for patient records.
//!
//! Thin axum layer over [`patient_records_core::PatientRegistry`]: handlers
//! translate requests into registry calls and registry errors into status
//! codes with a `{"detail": ...}` body.

pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod routes;

pub use config::{Cli, Command, Config};
pub use error::{ApiError, ApiResult};
pub use routes::{router, AppState};
