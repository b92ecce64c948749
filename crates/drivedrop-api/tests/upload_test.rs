//! Upload endpoint integration tests.
//!
//! Run with: `cargo test -p drivedrop-api --test upload_test`

mod helpers;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use drivedrop_storage::test_helpers::FakeOp;
use helpers::{api_path, full_env, setup_test_app, setup_test_app_with_env};
use serde_json::Value;

fn pdf_part(name: &str, len: usize) -> Part {
    Part::bytes(vec![b'%'; len])
        .file_name(name)
        .mime_type("application/pdf")
}

/// Checks `uploads/{owner}/{yyyy}/{mmdd}/{serial}`; the date comes from the server clock.
fn assert_order_folder(folder: &str, owner: &str, serial: &str) {
    let segments: Vec<&str> = folder.split('/').collect();
    assert_eq!(segments.len(), 5, "unexpected folder {}", folder);
    assert_eq!(segments[0], "uploads");
    assert_eq!(segments[1], owner);
    for date_part in &segments[2..4] {
        assert_eq!(date_part.len(), 4, "unexpected folder {}", folder);
        assert!(date_part.chars().all(|c| c.is_ascii_digit()));
    }
    assert_eq!(segments[4], serial);
}

#[tokio::test]
async fn test_upload_files_and_manifest() {
    let (app, tokens) = setup_test_app();

    let form = MultipartForm::new()
        .add_text("customerEmail", "Jane.Doe@Example.com")
        .add_text("serial", "A12")
        .add_text("pageUrl", "https://shop.example.com/checkout")
        .add_text("userAgent", "Mozilla/5.0")
        .add_text("cartJson", r#"{"total":42}"#)
        .add_part("pdf", pdf_part("Quote.pdf", 1024))
        .add_part(
            "xlsx",
            Part::bytes(vec![1u8; 2048])
                .file_name("Quote.xlsx")
                .mime_type("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        );

    let response = app.client().post(&api_path("/upload")).multipart(form).await;
    response.assert_status_ok();

    let body: Value = response.json();
    let folder = body["folder"].as_str().unwrap().to_string();
    assert_order_folder(&folder, "jane.doe-example.com", "a12");
    assert_eq!(body["ok"], true);
    assert_eq!(body["meta"], format!("{}/metadata.json", folder));
    assert_eq!(body["files"][0]["path"], format!("{}/quote.pdf", folder));
    assert_eq!(body["files"][0]["size"], 1024);
    assert_eq!(body["files"][0]["mime"], "application/pdf");
    assert_eq!(body["files"][1]["filename"], "quote.xlsx");
    assert!(body["files"][0]["item_id"].is_string());

    assert_eq!(tokens.calls(), 1);
    assert_eq!(app.drive.file(&format!("{}/quote.pdf", folder)).unwrap().len(), 1024);

    let manifest: Value =
        serde_json::from_slice(&app.drive.file(&format!("{}/metadata.json", folder)).unwrap())
            .unwrap();
    assert_eq!(manifest["serial"], "A12");
    assert_eq!(manifest["userAgent"], "Mozilla/5.0");
    assert_eq!(manifest["cart"]["total"], 42);
    assert_eq!(manifest["version"], "v1");
    assert_eq!(manifest["files"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_large_file_goes_through_upload_session() {
    let (app, _tokens) = setup_test_app();
    let size = 5 * 1024 * 1024 + 10;

    let form = MultipartForm::new()
        .add_text("serial", "BIG-1")
        .add_part("pdf", pdf_part("catalog.pdf", size));

    let response = app.client().post(&api_path("/upload")).multipart(form).await;
    response.assert_status_ok();
    let body: Value = response.json();
    let folder = body["folder"].as_str().unwrap();
    assert_order_folder(folder, "guest", "big-1");

    let calls = app.drive.calls();
    assert_eq!(calls.create_upload_session, 1);
    assert_eq!(calls.put_chunk, 2);
    // Only the small metadata document goes out as a direct PUT.
    assert_eq!(calls.put_content, 1);
    assert_eq!(
        app.drive.content_ranges(),
        vec![
            format!("bytes 0-5242879/{}", size),
            format!("bytes 5242880-{}/{}", size - 1, size),
        ]
    );
    let path = format!("{}/catalog.pdf", folder);
    assert_eq!(app.drive.file(&path).unwrap().len(), size);
}

#[tokio::test]
async fn test_colliding_names_are_stored_separately() {
    let (app, _tokens) = setup_test_app();

    let form = MultipartForm::new()
        .add_text("serial", "A12")
        .add_part(
            "file",
            Part::bytes(vec![b'{'; 11])
                .file_name("Metadata.JSON")
                .mime_type("application/json"),
        )
        .add_part("pdf", pdf_part("quote.pdf", 22))
        .add_part("file", pdf_part("QUOTE.pdf", 33));

    let response = app.client().post(&api_path("/upload")).multipart(form).await;
    response.assert_status_ok();

    let body: Value = response.json();
    let files = body["files"].as_array().unwrap();
    let names: Vec<_> = files.iter().map(|f| f["filename"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["metadata-2.json", "quote.pdf", "quote-2.pdf"]);
    for file in files {
        let stored = app.drive.file(file["path"].as_str().unwrap()).unwrap();
        assert_eq!(stored.len() as u64, file["size"].as_u64().unwrap());
    }
    // Three customer files plus the manifest.
    assert_eq!(app.drive.file_paths().len(), 4);
    let manifest: Value =
        serde_json::from_slice(&app.drive.file(body["meta"].as_str().unwrap()).unwrap()).unwrap();
    assert_eq!(manifest["files"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_upload_after_shutdown_is_cancelled() {
    let (app, tokens) = setup_test_app();
    app.state.shutdown.cancel();

    let form = MultipartForm::new().add_part("pdf", pdf_part("a.pdf", 10));
    let response = app.client().post(&api_path("/upload")).multipart(form).await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["code"], "CANCELLED");
    assert_eq!(tokens.calls(), 0);
    assert_eq!(app.drive.calls().total(), 0);
}

#[tokio::test]
async fn test_missing_drive_config_fails_before_any_call() {
    let env: Vec<_> = full_env()
        .into_iter()
        .filter(|(k, _)| *k != "ROOT_FOLDER")
        .collect();
    let (app, tokens) = setup_test_app_with_env(&env);

    let form = MultipartForm::new().add_part("pdf", pdf_part("a.pdf", 10));
    let response = app.client().post(&api_path("/upload")).multipart(form).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["ok"], false);
    assert_eq!(body["code"], "CONFIG_ERROR");
    assert!(body["error"].as_str().unwrap().contains("ROOT_FOLDER"));
    assert_eq!(tokens.calls(), 0);
    assert_eq!(app.drive.calls().total(), 0);
}

#[tokio::test]
async fn test_remote_failure_reports_upstream_status() {
    let (app, _tokens) = setup_test_app();
    app.drive.fail_with(FakeOp::PutContent, 503, "serviceNotAvailable");

    let form = MultipartForm::new().add_part("pdf", pdf_part("a.pdf", 10));
    let response = app.client().post(&api_path("/upload")).multipart(form).await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["code"], "REMOTE_ERROR");
    assert_eq!(body["upstream_status"], 503);
    assert_eq!(body["recoverable"], true);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("serviceNotAvailable"));
}

#[tokio::test]
async fn test_form_without_files_is_rejected() {
    let (app, tokens) = setup_test_app();

    let form = MultipartForm::new().add_text("serial", "A12");
    let response = app.client().post(&api_path("/upload")).multipart(form).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "PARSE_ERROR");
    assert_eq!(tokens.calls(), 0);
}

#[tokio::test]
async fn test_non_multipart_body_is_parse_error() {
    let (app, _tokens) = setup_test_app();

    let response = app
        .client()
        .post(&api_path("/upload"))
        .json(&serde_json::json!({"serial": "A12"}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["ok"], false);
    assert_eq!(body["code"], "PARSE_ERROR");
}

#[tokio::test]
async fn test_get_is_method_not_allowed() {
    let (app, _tokens) = setup_test_app();

    let response = app.client().get(&api_path("/upload")).await;

    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    let body: Value = response.json();
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"], "Use POST");
}

#[tokio::test]
async fn test_body_over_limit_is_rejected() {
    let mut env = full_env();
    env.push(("MAX_REQUEST_BYTES", "4096"));
    let (app, _tokens) = setup_test_app_with_env(&env);

    let form = MultipartForm::new().add_part("pdf", pdf_part("a.pdf", 64 * 1024));
    let response = app.client().post(&api_path("/upload")).multipart(form).await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(app.drive.calls().total(), 0);
}

#[tokio::test]
async fn test_responses_carry_request_id_and_security_headers() {
    let (app, _tokens) = setup_test_app();

    let response = app
        .client()
        .get("/health")
        .add_header("X-Request-ID", "order-a12")
        .await;

    response.assert_status_ok();
    assert_eq!(response.header("x-request-id"), "order-a12");
    assert_eq!(response.header("x-content-type-options"), "nosniff");
    let body: Value = response.json();
    assert_eq!(body["status"], "alive");
}
