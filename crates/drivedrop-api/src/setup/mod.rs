//! Application setup and initialization
//!
//! This module contains all application initialization logic extracted from main.rs
//! for better organization and testability.

pub mod routes;
pub mod server;
pub mod storage;
pub mod validation;

use crate::constants::SERVICE_NAME;
use crate::state::AppState;
use anyhow::{Context, Result};
use drivedrop_core::Config;
use drivedrop_infra::{init_telemetry, LogFormat, TelemetryOptions};
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    validation::validate_config(&config).context("Configuration validation failed")?;

    let format: LogFormat = config
        .log_format()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid LOG_FORMAT: {}", e))?;
    init_telemetry(&TelemetryOptions::new(SERVICE_NAME, config.environment()).with_format(format))
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!("Configuration loaded and validated successfully");

    let uploader = storage::setup_storage(&config)?;
    let state = Arc::new(AppState::new(config.clone(), uploader));

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
