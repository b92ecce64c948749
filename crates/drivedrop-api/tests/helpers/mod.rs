//! Test helpers: build AppState and router for integration tests.
//!
//! The drive and the identity endpoint are replaced by the in-memory fakes
//! from `drivedrop_storage::test_helpers`; no network is involved.
//! Run with `cargo test -p drivedrop-api`.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum_test::TestServer;
use drivedrop_api::constants;
use drivedrop_api::setup::routes;
use drivedrop_api::state::AppState;
use drivedrop_core::Config;
use drivedrop_storage::test_helpers::{FakeDrive, StaticTokenProvider, TEST_ROOT_FOLDER, TEST_USER_UPN};
use drivedrop_storage::{DriveUploader, TokenProvider};

/// API path prefix for tests (e.g. `/api`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// All five drive variables set.
pub fn full_env() -> Vec<(&'static str, &'static str)> {
    vec![
        ("TENANT_ID", "tenant-1"),
        ("CLIENT_ID", "client-1"),
        ("CLIENT_SECRET", "s3cr3t-value"),
        ("ONEDRIVE_USER_UPN", TEST_USER_UPN),
        ("ROOT_FOLDER", TEST_ROOT_FOLDER),
    ]
}

pub fn config_from(pairs: &[(&str, &str)]) -> Config {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(move |name| map.get(name).cloned()).expect("test config")
}

/// Test application: server plus handles on the fakes behind it.
pub struct TestApp {
    pub server: TestServer,
    pub drive: Arc<FakeDrive>,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

/// App with complete drive configuration and a token source that always succeeds.
pub fn setup_test_app() -> (TestApp, Arc<StaticTokenProvider>) {
    setup_test_app_with_env(&full_env())
}

pub fn setup_test_app_with_env(env: &[(&str, &str)]) -> (TestApp, Arc<StaticTokenProvider>) {
    let tokens = Arc::new(StaticTokenProvider::default());
    let app = setup_test_app_with(env, tokens.clone());
    (app, tokens)
}

pub fn setup_test_app_with(env: &[(&str, &str)], tokens: Arc<dyn TokenProvider>) -> TestApp {
    let config = config_from(env);
    let drive = Arc::new(FakeDrive::new());
    let uploader = DriveUploader::new(drive.clone(), tokens, config.drive.clone());
    let state = Arc::new(AppState::new(config.clone(), uploader));

    let router = routes::setup_routes(&config, state.clone()).expect("router");
    let server = TestServer::new(router.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        drive,
        state,
    }
}
