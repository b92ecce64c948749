//! Upstream response normalization.
//!
//! Every call to the identity or drive endpoint ends up as a
//! [`ParsedResponse`]: status code, the raw body text, and the body as JSON
//! when it parses as JSON. Callers never re-read a response body.

use drivedrop_core::{truncate_chars, MAX_ERROR_BODY_CHARS};

use crate::traits::{DriveError, DriveResult, RemoteItem};

#[derive(Debug, Clone)]
pub struct ParsedResponse {
    pub status: u16,
    pub raw_body: String,
    pub parsed: Option<serde_json::Value>,
}

impl ParsedResponse {
    pub fn new(status: u16, raw_body: String) -> Self {
        let parsed = if raw_body.trim().is_empty() {
            None
        } else {
            serde_json::from_str(&raw_body).ok()
        };
        Self {
            status,
            raw_body,
            parsed,
        }
    }

    /// Drain a reqwest response. A body that cannot be read is treated as empty.
    #[cfg(feature = "graph")]
    pub async fn read(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let raw_body = response.text().await.unwrap_or_else(|e| {
            tracing::debug!(error = %e, status = status, "Failed to read response body");
            String::new()
        });
        Self::new(status, raw_body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body text bounded for logs and error payloads.
    pub fn truncated_body(&self) -> String {
        truncate_chars(&self.raw_body, MAX_ERROR_BODY_CHARS)
    }

    /// String field of a JSON object body.
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.parsed
            .as_ref()
            .and_then(|v| v.get(field))
            .and_then(|v| v.as_str())
            .filter(|v| !v.is_empty())
    }

    /// Remote failure for `operation` with this response's status and body.
    pub fn remote_error(&self, operation: &'static str) -> DriveError {
        DriveError::Remote {
            operation,
            status: Some(self.status),
            body: self.truncated_body(),
        }
    }

    /// Like [`str_field`](Self::str_field), but a missing field is a remote failure.
    pub fn require_str(&self, operation: &'static str, field: &str) -> DriveResult<&str> {
        self.str_field(field)
            .ok_or_else(|| self.remote_error(operation))
    }

    /// The body as a driveItem; a success response must carry a JSON object.
    pub fn into_remote_item(self, operation: &'static str) -> DriveResult<RemoteItem> {
        match self.parsed {
            Some(raw @ serde_json::Value::Object(_)) => Ok(RemoteItem::from_json(raw)),
            _ => Err(DriveError::Remote {
                operation,
                status: Some(self.status),
                body: truncate_chars(&self.raw_body, MAX_ERROR_BODY_CHARS),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_json_body_is_kept_raw() {
        let resp = ParsedResponse::new(502, "<html>Bad gateway</html>".to_string());
        assert!(resp.parsed.is_none());
        assert!(!resp.is_success());
        assert_eq!(resp.truncated_body(), "<html>Bad gateway</html>");
    }

    #[test]
    fn test_require_str_missing_field_is_remote_error() {
        let resp = ParsedResponse::new(200, r#"{"expirationDateTime":"x"}"#.to_string());
        let err = resp
            .require_str("create upload session", "uploadUrl")
            .unwrap_err();
        assert!(matches!(
            err,
            DriveError::Remote {
                operation: "create upload session",
                status: Some(200),
                ..
            }
        ));
    }

    #[test]
    fn test_require_str_present() {
        let resp = ParsedResponse::new(
            200,
            r#"{"uploadUrl":"https://up.example.com/s/1"}"#.to_string(),
        );
        assert_eq!(
            resp.require_str("create upload session", "uploadUrl").unwrap(),
            "https://up.example.com/s/1"
        );
    }

    #[test]
    fn test_long_body_is_truncated_in_errors() {
        let resp = ParsedResponse::new(500, "e".repeat(5000));
        match resp.remote_error("direct upload") {
            DriveError::Remote { body, .. } => assert_eq!(body.len(), MAX_ERROR_BODY_CHARS),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_into_remote_item_requires_object() {
        let resp = ParsedResponse::new(201, String::new());
        assert!(resp.into_remote_item("direct upload").is_err());

        let resp = ParsedResponse::new(201, r#"{"id":"1","name":"a.pdf"}"#.to_string());
        let item = resp.into_remote_item("direct upload").unwrap();
        assert_eq!(item.item.name.as_deref(), Some("a.pdf"));
    }
}
