//! Shared constants and small text helpers.

/// Upper bound on upstream response text carried in errors and diagnostics.
pub const MAX_ERROR_BODY_CHARS: usize = 400;

/// Vendor single-request upload ceiling; payloads up to this size go out in one PUT.
pub const DEFAULT_DIRECT_UPLOAD_MAX_BYTES: u64 = 4 * 1024 * 1024;

/// Chunk size for resumable upload sessions.
pub const DEFAULT_CHUNK_SIZE_BYTES: u64 = 5 * 1024 * 1024;

/// Upload session chunks must be a multiple of this many bytes.
pub const CHUNK_ALIGNMENT_BYTES: u64 = 320 * 1024;

pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";
pub const DEFAULT_LOGIN_BASE_URL: &str = "https://login.microsoftonline.com";
pub const DEFAULT_GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Truncate `text` to at most `max` characters without splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_is_unchanged() {
        let body = r#"{"error":"invalid_client"}"#;
        assert_eq!(truncate_chars(body, MAX_ERROR_BODY_CHARS), body);
    }

    #[test]
    fn test_truncate_long_text() {
        let body = "x".repeat(1000);
        assert_eq!(truncate_chars(&body, MAX_ERROR_BODY_CHARS).len(), 400);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let body = "é".repeat(10);
        let out = truncate_chars(&body, 3);
        assert_eq!(out, "ééé");
    }

    #[test]
    fn test_default_chunk_size_is_aligned() {
        assert_eq!(DEFAULT_CHUNK_SIZE_BYTES % CHUNK_ALIGNMENT_BYTES, 0);
    }
}
