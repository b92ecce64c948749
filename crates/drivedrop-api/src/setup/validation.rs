//! Configuration validation
//!
//! Validates critical configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use drivedrop_core::constants::DEFAULT_DIRECT_UPLOAD_MAX_BYTES;
use drivedrop_core::Config;

/// Validate critical configuration values
///
/// Drive variables are not required here; their absence is
/// reported per request and by the diagnostics endpoint.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    // Validate CORS configuration in production
    if config.is_production() && config.cors_origins().iter().any(|o| o == "*") {
        return Err(anyhow::anyhow!(
            "CORS configured to allow all origins (*) in production - this is a security risk. \
            Please set specific allowed origins via CORS_ORIGINS environment variable."
        ));
    }

    let direct_max = config.drive.transfer.direct_upload_max_bytes;
    if direct_max > DEFAULT_DIRECT_UPLOAD_MAX_BYTES {
        tracing::warn!(
            direct_upload_max_bytes = direct_max,
            "DIRECT_UPLOAD_MAX_BYTES is above the drive's single-request ceiling"
        );
    }

    Ok(())
}
