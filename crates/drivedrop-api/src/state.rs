//! Application state

use drivedrop_core::Config;
use drivedrop_storage::DriveUploader;
use tokio_util::sync::CancellationToken;

/// Shared by every handler through `State<Arc<AppState>>`.
pub struct AppState {
    pub config: Config,
    pub uploader: DriveUploader,
    /// Cancelled when the server begins shutting down; each request works
    /// under a child token.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: Config, uploader: DriveUploader) -> Self {
        Self {
            config,
            uploader,
            shutdown: CancellationToken::new(),
        }
    }
}
