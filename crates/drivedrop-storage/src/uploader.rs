//! Upload orchestration.
//!
//! Order of work for one file: configuration check, token, folder
//! hierarchy, then a direct or chunked transfer. Configuration problems are
//! reported before any network call. One token is fetched per
//! [`UploadScope`] and reused for every file written through it.

use bytes::Bytes;
use drivedrop_core::DriveSettings;
use std::collections::HashSet;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::cancel::guard;
use crate::folders::ensure_folders;
use crate::path::{FolderPath, TargetPath};
use crate::session::ChunkedUploadSession;
use crate::strategy::{strategy_for, TransferStrategy};
use crate::traits::{DriveAccess, DriveResult, RemoteDrive, RemoteItem, TokenProvider};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Outcome of one file upload.
#[derive(Debug, Clone)]
pub struct UploadResult {
    pub remote_path: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub strategy: TransferStrategy,
    pub remote_item: RemoteItem,
}

#[derive(Clone)]
pub struct DriveUploader {
    drive: Arc<dyn RemoteDrive>,
    tokens: Arc<dyn TokenProvider>,
    settings: DriveSettings,
}

impl Debug for DriveUploader {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("DriveUploader")
            .field("settings", &self.settings)
            .finish()
    }
}

impl DriveUploader {
    pub fn new(
        drive: Arc<dyn RemoteDrive>,
        tokens: Arc<dyn TokenProvider>,
        settings: DriveSettings,
    ) -> Self {
        Self {
            drive,
            tokens,
            settings,
        }
    }

    pub fn settings(&self) -> &DriveSettings {
        &self.settings
    }

    /// Wall-clock budget for all drive work of one inbound request.
    pub fn upload_deadline(&self) -> Duration {
        Duration::from_secs(self.settings.upload_deadline_secs)
    }

    /// Resolve the drive target and fetch the token shared by every upload in the scope.
    pub async fn authorize(&self, cancel: &CancellationToken) -> DriveResult<UploadScope<'_>> {
        let target = self.settings.target()?;
        let token = guard(cancel, self.tokens.fetch_token(&target.credentials)).await?;
        Ok(UploadScope {
            uploader: self,
            access: DriveAccess {
                user_upn: target.user_upn,
                token,
            },
            root_folder: target.root_folder,
            ensured: Mutex::new(HashSet::new()),
        })
    }

    /// Token round-trip only; used by diagnostics.
    pub async fn check_token(&self) -> DriveResult<()> {
        let credentials = self.settings.credentials()?;
        self.tokens.fetch_token(&credentials).await.map(|_| ())
    }
}

/// Authorized upload context for one inbound request.
pub struct UploadScope<'a> {
    uploader: &'a DriveUploader,
    access: DriveAccess,
    root_folder: String,
    ensured: Mutex<HashSet<FolderPath>>,
}

impl Debug for UploadScope<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("UploadScope")
            .field("user_upn", &self.access.user_upn)
            .field("root_folder", &self.root_folder)
            .finish()
    }
}

impl UploadScope<'_> {
    /// Configured root folder, unsanitized.
    pub fn root_folder(&self) -> &str {
        &self.root_folder
    }

    async fn ensure(&self, folder: &FolderPath, cancel: &CancellationToken) -> DriveResult<()> {
        if folder.is_root() {
            return Ok(());
        }
        let known = self
            .ensured
            .lock()
            .map(|set| set.contains(folder))
            .unwrap_or(false);
        if known {
            return Ok(());
        }

        let transfer = &self.uploader.settings.transfer;
        let report = guard(
            cancel,
            ensure_folders(
                self.uploader.drive.as_ref(),
                &self.access,
                folder,
                transfer.conflict_behavior,
            ),
        )
        .await?;
        tracing::debug!(
            folder = %folder,
            checked = report.checked,
            created = report.created,
            "Folders ensured"
        );

        if let Ok(mut set) = self.ensured.lock() {
            set.insert(folder.clone());
        }
        Ok(())
    }

    /// Write `payload` to `path`, picking direct or chunked transfer by size.
    pub async fn upload(
        &self,
        path: &TargetPath,
        payload: Bytes,
        content_type: &str,
        cancel: &CancellationToken,
    ) -> DriveResult<UploadResult> {
        let start = Instant::now();
        let transfer = &self.uploader.settings.transfer;
        let drive = self.uploader.drive.as_ref();

        if transfer.ensure_folders {
            self.ensure(path.folder(), cancel).await?;
        }

        let remote_path = path.to_string();
        let size_bytes = payload.len() as u64;
        let mime_type = if content_type.trim().is_empty() {
            DEFAULT_CONTENT_TYPE.to_string()
        } else {
            content_type.to_string()
        };
        let strategy = strategy_for(transfer, size_bytes);

        let remote_item = match strategy {
            TransferStrategy::Direct => {
                guard(
                    cancel,
                    drive.put_content(
                        &self.access,
                        &remote_path,
                        &mime_type,
                        payload,
                        transfer.conflict_behavior,
                    ),
                )
                .await?
            }
            TransferStrategy::Chunked => {
                ChunkedUploadSession::new(&remote_path, size_bytes, transfer.chunk_size_bytes)?
                    .run(
                        drive,
                        &self.access,
                        payload,
                        transfer.conflict_behavior,
                        cancel,
                    )
                    .await?
            }
        };

        tracing::info!(
            path = %remote_path,
            size_bytes = size_bytes,
            strategy = ?strategy,
            item_id = remote_item.item.id.as_deref().unwrap_or(""),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "File uploaded to drive"
        );

        Ok(UploadResult {
            remote_path,
            size_bytes,
            mime_type,
            strategy,
            remote_item,
        })
    }
}
