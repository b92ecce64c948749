//! Resumable upload sessions.
//!
//! A session moves `Created -> Transferring -> Completed`, or to `Failed`
//! from either earlier state. Chunks go out strictly in order; each one
//! covers `[offset, min(offset + chunk, total) - 1]` and the last one must
//! come back with the finished item.

use bytes::Bytes;
use drivedrop_core::ConflictBehavior;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::cancel::guard;
use crate::traits::{ChunkAck, DriveAccess, DriveError, DriveResult, RemoteDrive, RemoteItem};

/// Inclusive byte range of one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn byte_count(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` header value, e.g. `bytes 0-5242879/10485760`.
    pub fn content_range(&self, total_size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, total_size)
    }
}

impl Display for ByteRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Ordered chunk ranges for a payload of `total_size` bytes.
pub fn chunk_ranges(total_size: u64, chunk_size: u64) -> Vec<ByteRange> {
    if chunk_size == 0 {
        return Vec::new();
    }
    let mut ranges = Vec::with_capacity(total_size.div_ceil(chunk_size) as usize);
    let mut start = 0;
    while start < total_size {
        let end = (start + chunk_size).min(total_size) - 1;
        ranges.push(ByteRange { start, end });
        start = end + 1;
    }
    ranges
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Transferring,
    Completed,
    Failed,
}

#[derive(Debug)]
pub struct ChunkedUploadSession {
    path: String,
    upload_url: Option<String>,
    total_size: u64,
    chunk_size: u64,
    bytes_sent: u64,
    chunks_sent: usize,
    state: SessionState,
}

impl ChunkedUploadSession {
    pub fn new(path: &str, total_size: u64, chunk_size: u64) -> DriveResult<Self> {
        if total_size == 0 {
            return Err(DriveError::InvalidRequest(
                "chunked upload requires a non-empty payload".to_string(),
            ));
        }
        if chunk_size == 0 {
            return Err(DriveError::InvalidRequest(
                "chunk size must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            path: path.to_string(),
            upload_url: None,
            total_size,
            chunk_size,
            bytes_sent: 0,
            chunks_sent: 0,
            state: SessionState::Created,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    pub fn chunks_sent(&self) -> usize {
        self.chunks_sent
    }

    /// Range of the next chunk, `None` once every byte has been sent.
    pub fn next_range(&self) -> Option<ByteRange> {
        if self.bytes_sent >= self.total_size {
            return None;
        }
        let end = (self.bytes_sent + self.chunk_size).min(self.total_size) - 1;
        Some(ByteRange {
            start: self.bytes_sent,
            end,
        })
    }

    fn fail(&mut self, err: DriveError) -> DriveError {
        self.state = SessionState::Failed;
        err
    }

    /// Request the session handle from the drive.
    pub async fn open(
        &mut self,
        drive: &dyn RemoteDrive,
        access: &DriveAccess,
        conflict: ConflictBehavior,
    ) -> DriveResult<()> {
        if self.state != SessionState::Created {
            return Err(DriveError::InvalidRequest(format!(
                "upload session for '{}' already opened",
                self.path
            )));
        }
        match drive
            .create_upload_session(access, &self.path, conflict)
            .await
        {
            Ok(url) => {
                self.upload_url = Some(url);
                self.state = SessionState::Transferring;
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Send the next chunk of `payload`. Returns the finished item after the last chunk.
    pub async fn send_next(
        &mut self,
        drive: &dyn RemoteDrive,
        payload: &Bytes,
    ) -> DriveResult<Option<RemoteItem>> {
        if self.state != SessionState::Transferring {
            return Err(DriveError::InvalidRequest(format!(
                "upload session for '{}' is {:?}",
                self.path, self.state
            )));
        }
        if payload.len() as u64 != self.total_size {
            return Err(self.fail(DriveError::InvalidRequest(format!(
                "payload is {} bytes, session expects {}",
                payload.len(),
                self.total_size
            ))));
        }
        let (Some(range), Some(url)) = (self.next_range(), self.upload_url.clone()) else {
            return Err(DriveError::InvalidRequest(format!(
                "upload session for '{}' has nothing left to send",
                self.path
            )));
        };

        let data = payload.slice(range.start as usize..=range.end as usize);
        let is_last = range.end + 1 == self.total_size;

        let ack = match drive.put_chunk(&url, range, self.total_size, data).await {
            Ok(ack) => ack,
            Err(e) => return Err(self.fail(e)),
        };

        self.bytes_sent = range.end + 1;
        self.chunks_sent += 1;

        match (ack, is_last) {
            (ChunkAck::Accepted { .. }, false) => Ok(None),
            (ChunkAck::Completed(item), true) => {
                self.state = SessionState::Completed;
                Ok(Some(item))
            }
            (ChunkAck::Accepted { .. }, true) => Err(self.fail(DriveError::Remote {
                operation: "upload chunk",
                status: Some(202),
                body: format!(
                    "final range {} accepted without returning the item",
                    range
                ),
            })),
            (ChunkAck::Completed(_), false) => Err(self.fail(DriveError::Remote {
                operation: "upload chunk",
                status: None,
                body: format!(
                    "drive reported completion after range {} of {} bytes",
                    range, self.total_size
                ),
            })),
        }
    }

    /// Open the session and send every chunk in order.
    pub async fn run(
        mut self,
        drive: &dyn RemoteDrive,
        access: &DriveAccess,
        payload: Bytes,
        conflict: ConflictBehavior,
        cancel: &CancellationToken,
    ) -> DriveResult<RemoteItem> {
        let start = Instant::now();
        if let Err(e) = guard(cancel, self.open(drive, access, conflict)).await {
            self.state = SessionState::Failed;
            return Err(e);
        }
        tracing::debug!(path = %self.path, total_bytes = self.total_size, "Upload session created");

        loop {
            let sent = guard(cancel, self.send_next(drive, &payload)).await;
            match sent {
                Ok(Some(item)) => {
                    tracing::info!(
                        path = %self.path,
                        size_bytes = self.total_size,
                        chunks = self.chunks_sent,
                        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                        "Chunked upload completed"
                    );
                    return Ok(item);
                }
                Ok(None) => {
                    tracing::debug!(
                        path = %self.path,
                        bytes_sent = self.bytes_sent,
                        total_bytes = self.total_size,
                        "Chunk accepted"
                    );
                }
                Err(e) => {
                    self.state = SessionState::Failed;
                    tracing::error!(
                        path = %self.path,
                        bytes_sent = self.bytes_sent,
                        total_bytes = self.total_size,
                        error = %e,
                        "Chunked upload failed"
                    );
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    #[test]
    fn test_chunk_ranges_scenario() {
        let ranges = chunk_ranges(10 * MIB, 5 * MIB);
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].content_range(10 * MIB), "bytes 0-5242879/10485760");
        assert_eq!(
            ranges[1].content_range(10 * MIB),
            "bytes 5242880-10485759/10485760"
        );
    }

    #[test]
    fn test_chunk_count_is_ceiling() {
        for (total, chunk) in [(1, 5), (5, 5), (6, 5), (11, 5), (10 * MIB + 1, 5 * MIB)] {
            let ranges = chunk_ranges(total, chunk);
            assert_eq!(ranges.len() as u64, total.div_ceil(chunk));
            assert_eq!(ranges.first().unwrap().start, 0);
            assert_eq!(ranges.last().unwrap().end, total - 1);
            for pair in ranges.windows(2) {
                assert_eq!(pair[0].end + 1, pair[1].start);
            }
            assert_eq!(ranges.iter().map(ByteRange::byte_count).sum::<u64>(), total);
        }
    }

    #[test]
    fn test_session_rejects_empty_payload() {
        assert!(ChunkedUploadSession::new("a/b.bin", 0, 5).is_err());
        assert!(ChunkedUploadSession::new("a/b.bin", 10, 0).is_err());
    }

    #[test]
    fn test_next_range_follows_progress() {
        let mut session = ChunkedUploadSession::new("a/b.bin", 12, 5).unwrap();
        assert_eq!(session.state(), SessionState::Created);
        assert_eq!(session.next_range(), Some(ByteRange { start: 0, end: 4 }));
        session.bytes_sent = 10;
        assert_eq!(session.next_range(), Some(ByteRange { start: 10, end: 11 }));
        session.bytes_sent = 12;
        assert_eq!(session.next_range(), None);
    }
}
