//! Remote drive abstraction traits
//!
//! [`RemoteDrive`] is the set of calls the upload pipeline makes against the
//! drive; [`TokenProvider`] obtains the bearer token those calls carry.
//! The Graph implementations live in `graph` and `token`; in-memory fakes
//! live in `test_helpers`.

use async_trait::async_trait;
use bytes::Bytes;
use drivedrop_core::{AppError, ConfigError, ConflictBehavior, Credentials};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;
use thiserror::Error;

use crate::session::ByteRange;

/// Drive operation errors
#[derive(Debug, Clone, Error)]
pub enum DriveError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Token request failed{}: {body}", status_suffix(.status))]
    Auth { status: Option<u16>, body: String },

    #[error("{operation} failed{}: {body}", status_suffix(.status))]
    Remote {
        operation: &'static str,
        status: Option<u16>,
        body: String,
    },

    #[error("Transport error during {operation}: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upload cancelled")]
    Cancelled,

    #[error("Upload timed out after {0:?}")]
    TimedOut(Duration),
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|s| format!(" (status {})", s))
        .unwrap_or_default()
}

impl DriveError {
    /// HTTP status returned by the upstream service, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            DriveError::Auth { status, .. } | DriveError::Remote { status, .. } => *status,
            _ => None,
        }
    }

    /// `true` for a remote 409, which folder creation reads as "already there".
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            DriveError::Remote {
                status: Some(409),
                ..
            }
        )
    }
}

impl From<DriveError> for AppError {
    fn from(err: DriveError) -> Self {
        match err {
            DriveError::Config(e) => AppError::from(e),
            DriveError::Auth { status, body } => AppError::Auth { status, body },
            DriveError::Remote {
                operation,
                status,
                body,
            } => AppError::Remote {
                operation: operation.to_string(),
                status,
                body,
            },
            DriveError::Transport { operation, message } => AppError::Remote {
                operation: operation.to_string(),
                status: None,
                body: message,
            },
            DriveError::InvalidRequest(msg) => AppError::InvalidInput(msg),
            DriveError::Cancelled => AppError::Cancelled("upload interrupted".to_string()),
            DriveError::TimedOut(deadline) => AppError::Timeout(format!(
                "upload did not finish within {}s",
                deadline.as_secs()
            )),
        }
    }
}

/// Result type for drive operations
pub type DriveResult<T> = Result<T, DriveError>;

/// Bearer token for drive calls. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl Debug for AccessToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Authorization for one request's worth of drive calls: whose drive, and the token.
#[derive(Debug, Clone)]
pub struct DriveAccess {
    pub user_upn: String,
    pub token: AccessToken,
}

/// Subset of a driveItem the service reports back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default, rename = "webUrl")]
    pub web_url: Option<String>,
}

/// A created or replaced item, with the drive's full JSON body kept alongside.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteItem {
    pub item: DriveItem,
    pub raw: serde_json::Value,
}

impl RemoteItem {
    pub fn from_json(raw: serde_json::Value) -> Self {
        let item = serde_json::from_value(raw.clone()).unwrap_or_default();
        Self { item, raw }
    }
}

/// Drive's answer to one chunk PUT.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkAck {
    /// More bytes expected (HTTP 202).
    Accepted { next_expected_ranges: Vec<String> },
    /// Last byte received; the drive returned the finished item (HTTP 200/201).
    Completed(RemoteItem),
}

/// Remote drive abstraction trait
///
/// Paths are relative to the drive root, `/`-separated, already sanitized
/// (see `path::TargetPath`). Implementations translate non-success statuses
/// into [`DriveError::Remote`] carrying the status and a truncated body.
#[async_trait]
pub trait RemoteDrive: Send + Sync {
    /// `true` when an item exists at `path`, `false` on 404.
    async fn item_exists(&self, access: &DriveAccess, path: &str) -> DriveResult<bool>;

    /// Create folder `name` under `parent` (`None` for the drive root).
    async fn create_folder(
        &self,
        access: &DriveAccess,
        parent: Option<&str>,
        name: &str,
        conflict: ConflictBehavior,
    ) -> DriveResult<()>;

    /// Single-request write of a whole file.
    async fn put_content(
        &self,
        access: &DriveAccess,
        path: &str,
        content_type: &str,
        data: Bytes,
        conflict: ConflictBehavior,
    ) -> DriveResult<RemoteItem>;

    /// Open a resumable upload session and return its upload URL.
    async fn create_upload_session(
        &self,
        access: &DriveAccess,
        path: &str,
        conflict: ConflictBehavior,
    ) -> DriveResult<String>;

    /// Send one byte range to a session URL. The URL is pre-authorized;
    /// no bearer token is attached.
    async fn put_chunk(
        &self,
        upload_url: &str,
        range: ByteRange,
        total_size: u64,
        data: Bytes,
    ) -> DriveResult<ChunkAck>;
}

/// Obtains bearer tokens for drive calls.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn fetch_token(&self, credentials: &Credentials) -> DriveResult<AccessToken>;
}
