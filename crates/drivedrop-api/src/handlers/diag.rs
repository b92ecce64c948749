//! Diagnostics endpoint
//!
//! Reports which drive variables are present and whether a token can be
//! obtained. Values are never echoed, only booleans and the identity
//! endpoint's (truncated) answer.

use std::sync::Arc;

use axum::{extract::State, Json};
use drivedrop_core::models::DiagnosticsReport;
use drivedrop_core::{truncate_chars, MAX_ERROR_BODY_CHARS};
use drivedrop_storage::DriveError;

use crate::state::AppState;

const MISSING_ENV: &str = "Missing ENV";

/// `GET /api/diag`. Always 200; failures land in `tokenError`.
pub async fn diagnostics(State(state): State<Arc<AppState>>) -> Json<DiagnosticsReport> {
    let settings = state.uploader.settings();
    let mut report = DiagnosticsReport::new(settings.presence());

    if settings.credentials().is_err() {
        report.token_error = Some(MISSING_ENV.to_string());
        return Json(report);
    }

    let cancel = state.shutdown.child_token();
    match drivedrop_storage::cancel::guard(&cancel, state.uploader.check_token()).await {
        Ok(()) => report.token_ok = true,
        Err(e) => {
            tracing::warn!(error = %e, "Diagnostics token check failed");
            report.token_error = Some(token_error_text(&e));
        }
    }

    Json(report)
}

/// The identity endpoint's body when it answered, otherwise the error text.
fn token_error_text(err: &DriveError) -> String {
    let text = match err {
        DriveError::Auth { body, .. } => body.clone(),
        other => other.to_string(),
    };
    truncate_chars(&text, MAX_ERROR_BODY_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_error_prefers_upstream_body() {
        let err = DriveError::Auth {
            status: Some(400),
            body: r#"{"error":"invalid_client"}"#.to_string(),
        };
        assert_eq!(token_error_text(&err), r#"{"error":"invalid_client"}"#);

        let err = DriveError::Transport {
            operation: "token request",
            message: "x".repeat(1000),
        };
        assert_eq!(token_error_text(&err).chars().count(), MAX_ERROR_BODY_CHARS);
    }
}
