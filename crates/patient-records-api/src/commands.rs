//! Entry points for each CLI subcommand.

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use patient_records_core::{ImportMode, ImportReport, PatientDocument, PatientRegistry};
use tokio::net::TcpListener;
use tokio::signal;

use crate::config::Config;
use crate::routes::{router, AppState};

/// Open the registry described by `config`.
pub fn open_registry(config: &Config) -> Result<PatientRegistry> {
    PatientRegistry::open(&config.database, config.verdict_policy)
        .with_context(|| format!("failed to open database {}", config.database.display()))
}

/// Run the HTTP server until Ctrl+C.
pub async fn serve(config: &Config, bind: SocketAddr) -> Result<()> {
    let registry = open_registry(config)?;
    let app = router(AppState::new(registry));

    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {}", bind))?;
    tracing::info!(
        addr = %bind,
        database = %config.database.display(),
        verdict_policy = config.verdict_policy.as_str(),
        "patient records API listening"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
}

/// Load a JSON document from `file` into the configured database.
pub fn import(config: &Config, file: &Path, skip_existing: bool) -> Result<ImportReport> {
    let registry = open_registry(config)?;
    let document = PatientDocument::read(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let mode = if skip_existing {
        ImportMode::SkipExisting
    } else {
        ImportMode::Fail
    };
    let report = registry
        .import_document(document, mode)
        .with_context(|| format!("failed to import {}", file.display()))?;
    Ok(report)
}

/// Write the configured database out to `file`.
pub fn export(config: &Config, file: &Path) -> Result<usize> {
    let registry = open_registry(config)?;
    let document = registry.export_document().context("failed to read patients")?;
    document
        .write(file)
        .with_context(|| format!("failed to write {}", file.display()))?;
    tracing::info!(patients = document.len(), file = %file.display(), "document exported");
    Ok(document.len())
}
