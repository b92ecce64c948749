//! Diagnostics endpoint integration tests.
//!
//! Run with: `cargo test -p drivedrop-api --test diag_test`

mod helpers;

use std::sync::Arc;

use drivedrop_storage::test_helpers::RejectingTokenProvider;
use helpers::{api_path, full_env, setup_test_app, setup_test_app_with, setup_test_app_with_env};
use serde_json::Value;

#[tokio::test]
async fn test_diag_reports_presence_and_token() {
    let (app, tokens) = setup_test_app();

    let response = app.client().get(&api_path("/diag")).await;
    response.assert_status_ok();

    let body: Value = response.json();
    for name in ["TENANT_ID", "CLIENT_ID", "CLIENT_SECRET", "ONEDRIVE_USER_UPN", "ROOT_FOLDER"] {
        assert_eq!(body["envPresent"][name], true, "{}", name);
    }
    assert_eq!(body["tokenOk"], true);
    assert!(body["tokenError"].is_null());
    assert_eq!(tokens.calls(), 1);
}

#[tokio::test]
async fn test_diag_missing_credentials_skips_token_request() {
    let env: Vec<_> = full_env()
        .into_iter()
        .filter(|(k, _)| *k != "CLIENT_SECRET")
        .collect();
    let (app, tokens) = setup_test_app_with_env(&env);

    let response = app.client().get(&api_path("/diag")).await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["envPresent"]["CLIENT_SECRET"], false);
    assert_eq!(body["envPresent"]["TENANT_ID"], true);
    assert_eq!(body["tokenOk"], false);
    assert_eq!(body["tokenError"], "Missing ENV");
    assert_eq!(tokens.calls(), 0);
}

#[tokio::test]
async fn test_diag_missing_upn_still_checks_token() {
    let env: Vec<_> = full_env()
        .into_iter()
        .filter(|(k, _)| *k != "ONEDRIVE_USER_UPN")
        .collect();
    let (app, tokens) = setup_test_app_with_env(&env);

    let body: Value = app.client().get(&api_path("/diag")).await.json();
    assert_eq!(body["envPresent"]["ONEDRIVE_USER_UPN"], false);
    assert_eq!(body["tokenOk"], true);
    assert_eq!(tokens.calls(), 1);
}

#[tokio::test]
async fn test_diag_rejected_token_reports_body_not_secrets() {
    let app = setup_test_app_with(
        &full_env(),
        Arc::new(RejectingTokenProvider::new(
            401,
            r#"{"error":"invalid_client","error_description":"AADSTS7000215"}"#,
        )),
    );

    let response = app.client().get(&api_path("/diag")).await;
    response.assert_status_ok();

    let text = response.text();
    assert!(!text.contains("s3cr3t-value"));
    let body: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(body["tokenOk"], false);
    assert!(body["tokenError"]
        .as_str()
        .unwrap()
        .contains("invalid_client"));
}
