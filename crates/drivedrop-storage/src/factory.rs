use crate::graph::GraphDrive;
use crate::token::ClientCredentialsProvider;
use crate::{DriveError, DriveResult, DriveUploader};
use drivedrop_core::DriveSettings;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Create the Graph-backed uploader from configuration.
///
/// Missing drive variables are not an error here; they surface on the
/// first upload so the server can start and report them.
pub fn create_uploader(settings: &DriveSettings) -> DriveResult<DriveUploader> {
    let http_client = Client::builder()
        .timeout(Duration::from_secs(settings.http_timeout_secs))
        .build()
        .map_err(|e| DriveError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))?;

    let drive = GraphDrive::new(http_client.clone(), &settings.graph_base_url);
    let tokens =
        ClientCredentialsProvider::new(http_client, &settings.login_base_url, &settings.scope);

    tracing::debug!(
        graph_base_url = %settings.graph_base_url,
        missing = ?settings.missing(),
        "Drive uploader created"
    );

    Ok(DriveUploader::new(
        Arc::new(drive),
        Arc::new(tokens),
        settings.clone(),
    ))
}
