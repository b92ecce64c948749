//! Microsoft Graph drive backend.
//!
//! Items are addressed by path under a user's drive root:
//! `{base}/users/{upn}/drive/root:/{path}`. Writes pass
//! `@microsoft.graph.conflictBehavior` so repeated uploads to the same path
//! behave as configured.

use async_trait::async_trait;
use bytes::Bytes;
use drivedrop_core::{truncate_chars, ConflictBehavior, MAX_ERROR_BODY_CHARS};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::{CONTENT_RANGE, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use serde_json::json;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Instant;

use crate::response::ParsedResponse;
use crate::session::ByteRange;
use crate::traits::{ChunkAck, DriveAccess, DriveError, DriveResult, RemoteDrive, RemoteItem};

/// Everything but RFC 3986 unreserved characters is escaped inside a path segment.
pub(crate) const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const CONFLICT_BEHAVIOR_KEY: &str = "@microsoft.graph.conflictBehavior";

#[derive(Clone)]
pub struct GraphDrive {
    http_client: Client,
    base_url: String,
}

impl Debug for GraphDrive {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("GraphDrive")
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| utf8_percent_encode(s, PATH_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn transport(operation: &'static str) -> impl FnOnce(reqwest::Error) -> DriveError {
    move |e| DriveError::Transport {
        operation,
        message: truncate_chars(&e.to_string(), MAX_ERROR_BODY_CHARS),
    }
}

impl GraphDrive {
    pub fn new(http_client: Client, base_url: &str) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn drive_url(&self, user_upn: &str) -> String {
        format!(
            "{}/users/{}/drive",
            self.base_url,
            utf8_percent_encode(user_upn, PATH_SEGMENT)
        )
    }

    /// `.../drive/root:/{path}`
    fn item_url(&self, user_upn: &str, path: &str) -> String {
        format!("{}/root:/{}", self.drive_url(user_upn), encode_path(path))
    }

    fn children_url(&self, user_upn: &str, parent: Option<&str>) -> String {
        match parent {
            Some(parent) => format!("{}:/children", self.item_url(user_upn, parent)),
            None => format!("{}/root/children", self.drive_url(user_upn)),
        }
    }

    fn authorized(&self, builder: RequestBuilder, access: &DriveAccess) -> RequestBuilder {
        builder.bearer_auth(access.token.secret())
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        operation: &'static str,
    ) -> DriveResult<ParsedResponse> {
        let response = builder.send().await.map_err(transport(operation))?;
        Ok(ParsedResponse::read(response).await)
    }
}

#[async_trait]
impl RemoteDrive for GraphDrive {
    async fn item_exists(&self, access: &DriveAccess, path: &str) -> DriveResult<bool> {
        let url = self.item_url(&access.user_upn, path);
        let request = self.authorized(self.http_client.get(url), access);
        let parsed = self.send(request, "check folder").await?;

        match parsed.status {
            404 => Ok(false),
            _ if parsed.is_success() => Ok(true),
            _ => Err(parsed.remote_error("check folder")),
        }
    }

    async fn create_folder(
        &self,
        access: &DriveAccess,
        parent: Option<&str>,
        name: &str,
        conflict: ConflictBehavior,
    ) -> DriveResult<()> {
        let url = self.children_url(&access.user_upn, parent);
        let body = json!({
            "name": name,
            "folder": {},
            "@microsoft.graph.conflictBehavior": conflict.as_str(),
        });
        let request = self.authorized(self.http_client.post(url), access).json(&body);
        let parsed = self.send(request, "create folder").await?;

        if parsed.is_success() {
            Ok(())
        } else {
            Err(parsed.remote_error("create folder"))
        }
    }

    async fn put_content(
        &self,
        access: &DriveAccess,
        path: &str,
        content_type: &str,
        data: Bytes,
        conflict: ConflictBehavior,
    ) -> DriveResult<RemoteItem> {
        let start = Instant::now();
        let size = data.len();
        let url = format!("{}:/content", self.item_url(&access.user_upn, path));
        let request = self
            .authorized(self.http_client.put(url), access)
            .query(&[(CONFLICT_BEHAVIOR_KEY, conflict.as_str())])
            .header(CONTENT_TYPE, content_type)
            .body(data);
        let parsed = self.send(request, "direct upload").await?;

        if !parsed.is_success() {
            return Err(parsed.remote_error("direct upload"));
        }
        tracing::debug!(
            path = %path,
            size_bytes = size,
            status = parsed.status,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Direct PUT accepted"
        );
        parsed.into_remote_item("direct upload")
    }

    async fn create_upload_session(
        &self,
        access: &DriveAccess,
        path: &str,
        conflict: ConflictBehavior,
    ) -> DriveResult<String> {
        let url = format!(
            "{}:/createUploadSession",
            self.item_url(&access.user_upn, path)
        );
        let body = json!({ "item": { "@microsoft.graph.conflictBehavior": conflict.as_str() } });
        let request = self.authorized(self.http_client.post(url), access).json(&body);
        let parsed = self.send(request, "create upload session").await?;

        if !parsed.is_success() {
            return Err(parsed.remote_error("create upload session"));
        }
        parsed
            .require_str("create upload session", "uploadUrl")
            .map(str::to_string)
    }

    async fn put_chunk(
        &self,
        upload_url: &str,
        range: ByteRange,
        total_size: u64,
        data: Bytes,
    ) -> DriveResult<ChunkAck> {
        // The upload URL carries its own authorization; a bearer header is rejected.
        let request = self
            .http_client
            .put(upload_url)
            .header(CONTENT_RANGE, range.content_range(total_size))
            .body(data);
        let parsed = self.send(request, "upload chunk").await?;

        match parsed.status {
            200 | 201 => parsed.into_remote_item("upload chunk").map(ChunkAck::Completed),
            _ if parsed.is_success() => {
                let next_expected_ranges = parsed
                    .parsed
                    .as_ref()
                    .and_then(|v| v.get("nextExpectedRanges"))
                    .and_then(|v| v.as_array())
                    .map(|ranges| {
                        ranges
                            .iter()
                            .filter_map(|r| r.as_str().map(str::to_string))
                            .collect()
                    })
                    .unwrap_or_default();
                Ok(ChunkAck::Accepted {
                    next_expected_ranges,
                })
            }
            _ => Err(parsed.remote_error("upload chunk")),
        }
    }
}
