//! In-memory drive and token fakes.
//!
//! Enabled for this crate's unit tests and, through the `test-helpers`
//! feature, for downstream crates' tests.

use async_trait::async_trait;
use bytes::Bytes;
use drivedrop_core::{ConflictBehavior, Credentials, DriveSettings};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::session::ByteRange;
use crate::traits::{
    AccessToken, ChunkAck, DriveAccess, DriveError, DriveResult, RemoteDrive, RemoteItem,
    TokenProvider,
};

pub const TEST_USER_UPN: &str = "marketing@example.com";
pub const TEST_ROOT_FOLDER: &str = "Uploads";
pub const TEST_TOKEN: &str = "test-token";

pub fn test_access() -> DriveAccess {
    DriveAccess {
        user_upn: TEST_USER_UPN.to_string(),
        token: AccessToken::new(TEST_TOKEN),
    }
}

/// Complete drive settings with default transfer policy.
pub fn test_settings() -> DriveSettings {
    DriveSettings::new(
        Credentials::new("tenant", "client", "secret"),
        TEST_USER_UPN,
        TEST_ROOT_FOLDER,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FakeOp {
    ItemExists,
    CreateFolder,
    PutContent,
    CreateUploadSession,
    PutChunk,
}

/// Calls received per operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub item_exists: usize,
    pub create_folder: usize,
    pub put_content: usize,
    pub create_upload_session: usize,
    pub put_chunk: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.item_exists
            + self.create_folder
            + self.put_content
            + self.create_upload_session
            + self.put_chunk
    }
}

#[derive(Debug)]
struct FakeSession {
    path: String,
    buffer: Vec<u8>,
}

#[derive(Debug, Default)]
struct FakeState {
    folders: BTreeSet<String>,
    files: BTreeMap<String, Vec<u8>>,
    sessions: HashMap<String, FakeSession>,
    failures: HashMap<FakeOp, (u16, String)>,
    content_ranges: Vec<String>,
    content_types: BTreeMap<String, String>,
    withhold_final_item: bool,
    next_id: usize,
    calls: CallCounts,
}

impl FakeState {
    fn check_failure(&self, op: FakeOp, operation: &'static str) -> DriveResult<()> {
        match self.failures.get(&op) {
            Some((status, body)) => Err(DriveError::Remote {
                operation,
                status: Some(*status),
                body: body.clone(),
            }),
            None => Ok(()),
        }
    }

    fn store_file(&mut self, path: &str, data: Vec<u8>) -> RemoteItem {
        self.next_id += 1;
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        let raw = serde_json::json!({
            "id": format!("fake-{}", self.next_id),
            "name": name,
            "size": data.len(),
            "webUrl": format!("https://drive.example.test/{}", path),
        });
        self.files.insert(path.to_string(), data);
        RemoteItem::from_json(raw)
    }
}

/// Drive kept in memory. Records every call and validates chunk ordering.
#[derive(Debug, Default)]
pub struct FakeDrive {
    state: Mutex<FakeState>,
}

impl FakeDrive {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake drive state poisoned")
    }

    /// Pre-create `path` and all of its prefixes.
    pub fn add_folder(&self, path: &str) {
        let mut state = self.state();
        let mut prefix = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);
            state.folders.insert(prefix.clone());
        }
    }

    pub fn has_folder(&self, path: &str) -> bool {
        self.state().folders.contains(path)
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.state().files.get(path).cloned()
    }

    pub fn file_paths(&self) -> Vec<String> {
        self.state().files.keys().cloned().collect()
    }

    pub fn content_type(&self, path: &str) -> Option<String> {
        self.state().content_types.get(path).cloned()
    }

    pub fn calls(&self) -> CallCounts {
        self.state().calls.clone()
    }

    /// `Content-Range` values received, in order.
    pub fn content_ranges(&self) -> Vec<String> {
        self.state().content_ranges.clone()
    }

    /// Every call of `op` fails with `status` and `body` from now on.
    pub fn fail_with(&self, op: FakeOp, status: u16, body: &str) {
        self.state().failures.insert(op, (status, body.to_string()));
    }

    /// Answer the final chunk with 202 instead of the finished item.
    pub fn withhold_final_item(&self) {
        self.state().withhold_final_item = true;
    }
}

#[async_trait]
impl RemoteDrive for FakeDrive {
    async fn item_exists(&self, _access: &DriveAccess, path: &str) -> DriveResult<bool> {
        let mut state = self.state();
        state.calls.item_exists += 1;
        state.check_failure(FakeOp::ItemExists, "check folder")?;
        Ok(state.folders.contains(path) || state.files.contains_key(path))
    }

    async fn create_folder(
        &self,
        _access: &DriveAccess,
        parent: Option<&str>,
        name: &str,
        _conflict: ConflictBehavior,
    ) -> DriveResult<()> {
        let mut state = self.state();
        state.calls.create_folder += 1;
        state.check_failure(FakeOp::CreateFolder, "create folder")?;
        let path = match parent {
            Some(parent) => {
                if !state.folders.contains(parent) {
                    return Err(DriveError::Remote {
                        operation: "create folder",
                        status: Some(404),
                        body: format!("parent '{}' not found", parent),
                    });
                }
                format!("{}/{}", parent, name)
            }
            None => name.to_string(),
        };
        state.folders.insert(path);
        Ok(())
    }

    async fn put_content(
        &self,
        _access: &DriveAccess,
        path: &str,
        content_type: &str,
        data: Bytes,
        _conflict: ConflictBehavior,
    ) -> DriveResult<RemoteItem> {
        let mut state = self.state();
        state.calls.put_content += 1;
        state.check_failure(FakeOp::PutContent, "direct upload")?;
        state
            .content_types
            .insert(path.to_string(), content_type.to_string());
        Ok(state.store_file(path, data.to_vec()))
    }

    async fn create_upload_session(
        &self,
        _access: &DriveAccess,
        path: &str,
        _conflict: ConflictBehavior,
    ) -> DriveResult<String> {
        let mut state = self.state();
        state.calls.create_upload_session += 1;
        state.check_failure(FakeOp::CreateUploadSession, "create upload session")?;
        state.next_id += 1;
        let url = format!("https://upload.example.test/session/{}", state.next_id);
        state.sessions.insert(
            url.clone(),
            FakeSession {
                path: path.to_string(),
                buffer: Vec::new(),
            },
        );
        Ok(url)
    }

    async fn put_chunk(
        &self,
        upload_url: &str,
        range: ByteRange,
        total_size: u64,
        data: Bytes,
    ) -> DriveResult<ChunkAck> {
        let mut state = self.state();
        state.calls.put_chunk += 1;
        state.content_ranges.push(range.content_range(total_size));
        state.check_failure(FakeOp::PutChunk, "upload chunk")?;
        let withhold = state.withhold_final_item;

        let session = state
            .sessions
            .get_mut(upload_url)
            .ok_or_else(|| DriveError::Remote {
                operation: "upload chunk",
                status: Some(404),
                body: "itemNotFound".to_string(),
            })?;

        if range.start != session.buffer.len() as u64 || data.len() as u64 != range.byte_count() {
            return Err(DriveError::Remote {
                operation: "upload chunk",
                status: Some(416),
                body: format!(
                    "expected range starting at {}, got {}",
                    session.buffer.len(),
                    range
                ),
            });
        }
        session.buffer.extend_from_slice(&data);

        let received = session.buffer.len() as u64;
        if received < total_size || withhold {
            return Ok(ChunkAck::Accepted {
                next_expected_ranges: vec![format!("{}-", received)],
            });
        }

        let finished = state
            .sessions
            .remove(upload_url)
            .ok_or_else(|| DriveError::InvalidRequest("session vanished".to_string()))?;
        Ok(ChunkAck::Completed(
            state.store_file(&finished.path, finished.buffer),
        ))
    }
}

/// Returns a fixed token and counts requests.
#[derive(Debug)]
pub struct StaticTokenProvider {
    token: String,
    calls: AtomicUsize,
}

impl StaticTokenProvider {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for StaticTokenProvider {
    fn default() -> Self {
        Self::new(TEST_TOKEN)
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn fetch_token(&self, credentials: &Credentials) -> DriveResult<AccessToken> {
        credentials.validate()?;
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(AccessToken::new(self.token.clone()))
    }
}

/// Always rejects, like an identity endpoint refusing the client secret.
#[derive(Debug)]
pub struct RejectingTokenProvider {
    status: u16,
    body: String,
}

impl RejectingTokenProvider {
    pub fn new(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }
}

#[async_trait]
impl TokenProvider for RejectingTokenProvider {
    async fn fetch_token(&self, _credentials: &Credentials) -> DriveResult<AccessToken> {
        Err(DriveError::Auth {
            status: Some(self.status),
            body: self.body.clone(),
        })
    }
}
