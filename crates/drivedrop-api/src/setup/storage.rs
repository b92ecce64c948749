//! Drive client setup

use anyhow::{Context, Result};
use drivedrop_core::Config;
use drivedrop_storage::{create_uploader, DriveUploader};

/// Build the Graph-backed uploader. Missing drive variables are logged, not fatal:
/// diagnostics must keep working and each upload reports them instead.
pub fn setup_storage(config: &Config) -> Result<DriveUploader> {
    tracing::info!("Initializing drive client...");
    let uploader = create_uploader(&config.drive).context("Failed to build drive client")?;

    let missing = config.drive.missing();
    if missing.is_empty() {
        tracing::info!(
            graph_base_url = %config.drive.graph_base_url,
            direct_upload_max_bytes = config.drive.transfer.direct_upload_max_bytes,
            chunk_size_bytes = config.drive.transfer.chunk_size_bytes,
            ensure_folders = config.drive.transfer.ensure_folders,
            "Drive client initialized"
        );
    } else {
        tracing::warn!(
            missing = %missing.join(","),
            "Drive configuration incomplete; uploads will fail until it is set"
        );
    }

    Ok(uploader)
}
