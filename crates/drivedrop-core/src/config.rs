//! Configuration module
//!
//! Configuration is read from the environment once at startup and passed by
//! reference from there on; business logic never consults the environment.
//!
//! The five drive variables (`TENANT_ID`, `CLIENT_ID`, `CLIENT_SECRET`,
//! `ONEDRIVE_USER_UPN`, `ROOT_FOLDER`) are captured as optional values so the
//! server can start and report their presence through the diagnostics
//! endpoint. Operations that need them call [`DriveSettings::target`] or
//! [`DriveSettings::credentials`], which fail with [`ConfigError::Missing`]
//! before any network call is attempted.

use std::env;
use std::fmt::{Debug, Formatter, Result as FmtResult};

use crate::constants::{
    CHUNK_ALIGNMENT_BYTES, DEFAULT_CHUNK_SIZE_BYTES, DEFAULT_DIRECT_UPLOAD_MAX_BYTES,
    DEFAULT_GRAPH_BASE_URL, DEFAULT_GRAPH_SCOPE, DEFAULT_LOGIN_BASE_URL,
};
use crate::drive_types::ConflictBehavior;

// Common constants
const SERVER_PORT: u16 = 3000;
const MAX_REQUEST_BYTES: usize = 64 * 1024 * 1024;
const HTTP_TIMEOUT_SECS: u64 = 60;
const UPLOAD_DEADLINE_SECS: u64 = 300;

pub const TENANT_ID: &str = "TENANT_ID";
pub const CLIENT_ID: &str = "CLIENT_ID";
pub const CLIENT_SECRET: &str = "CLIENT_SECRET";
pub const ONEDRIVE_USER_UPN: &str = "ONEDRIVE_USER_UPN";
pub const ROOT_FOLDER: &str = "ROOT_FOLDER";

/// Variables an upload needs, in reporting order.
pub const REQUIRED_DRIVE_VARS: [&str; 5] = [
    TENANT_ID,
    CLIENT_ID,
    CLIENT_SECRET,
    ONEDRIVE_USER_UPN,
    ROOT_FOLDER,
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Service-principal credentials for the client-credentials grant.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Fails when any part of the triple is empty or whitespace.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let missing: Vec<&'static str> = [
            (TENANT_ID, &self.tenant_id),
            (CLIENT_ID, &self.client_id),
            (CLIENT_SECRET, &self.client_secret),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Missing(missing))
        }
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Credentials")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Fully resolved drive destination: who we authenticate as and where we write.
#[derive(Clone, Debug)]
pub struct DriveTarget {
    pub credentials: Credentials,
    pub user_upn: String,
    pub root_folder: String,
}

/// Transfer policy values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferSettings {
    /// Payloads at or below this size use a single PUT.
    pub direct_upload_max_bytes: u64,
    pub chunk_size_bytes: u64,
    /// Create missing folders before writing.
    pub ensure_folders: bool,
    pub conflict_behavior: ConflictBehavior,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            direct_upload_max_bytes: DEFAULT_DIRECT_UPLOAD_MAX_BYTES,
            chunk_size_bytes: DEFAULT_CHUNK_SIZE_BYTES,
            ensure_folders: true,
            conflict_behavior: ConflictBehavior::Replace,
        }
    }
}

/// Remote drive configuration.
#[derive(Clone)]
pub struct DriveSettings {
    tenant_id: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    user_upn: Option<String>,
    root_folder: Option<String>,
    pub graph_base_url: String,
    pub login_base_url: String,
    pub scope: String,
    pub http_timeout_secs: u64,
    pub upload_deadline_secs: u64,
    pub transfer: TransferSettings,
}

impl Debug for DriveSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("DriveSettings")
            .field("present", &self.presence())
            .field("graph_base_url", &self.graph_base_url)
            .field("login_base_url", &self.login_base_url)
            .field("scope", &self.scope)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("upload_deadline_secs", &self.upload_deadline_secs)
            .field("transfer", &self.transfer)
            .finish()
    }
}

impl DriveSettings {
    /// Settings with every drive variable supplied and default policy values.
    pub fn new(credentials: Credentials, user_upn: &str, root_folder: &str) -> Self {
        Self {
            tenant_id: Some(credentials.tenant_id),
            client_id: Some(credentials.client_id),
            client_secret: Some(credentials.client_secret),
            user_upn: Some(user_upn.to_string()),
            root_folder: Some(root_folder.to_string()),
            graph_base_url: DEFAULT_GRAPH_BASE_URL.to_string(),
            login_base_url: DEFAULT_LOGIN_BASE_URL.to_string(),
            scope: DEFAULT_GRAPH_SCOPE.to_string(),
            http_timeout_secs: HTTP_TIMEOUT_SECS,
            upload_deadline_secs: UPLOAD_DEADLINE_SECS,
            transfer: TransferSettings::default(),
        }
    }

    fn value(&self, name: &str) -> Option<&str> {
        let value = match name {
            TENANT_ID => &self.tenant_id,
            CLIENT_ID => &self.client_id,
            CLIENT_SECRET => &self.client_secret,
            ONEDRIVE_USER_UPN => &self.user_upn,
            ROOT_FOLDER => &self.root_folder,
            _ => return None,
        };
        value.as_deref()
    }

    /// Presence of each drive variable, in reporting order. Values are never exposed.
    pub fn presence(&self) -> Vec<(&'static str, bool)> {
        REQUIRED_DRIVE_VARS
            .iter()
            .map(|name| (*name, self.value(name).is_some()))
            .collect()
    }

    pub fn missing(&self) -> Vec<&'static str> {
        self.presence()
            .into_iter()
            .filter(|(_, present)| !present)
            .map(|(name, _)| name)
            .collect()
    }

    /// Credential triple only; enough for a token request.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        match (&self.tenant_id, &self.client_id, &self.client_secret) {
            (Some(tenant_id), Some(client_id), Some(client_secret)) => Ok(Credentials::new(
                tenant_id.clone(),
                client_id.clone(),
                client_secret.clone(),
            )),
            _ => Err(ConfigError::Missing(
                self.missing()
                    .into_iter()
                    .filter(|name| [TENANT_ID, CLIENT_ID, CLIENT_SECRET].contains(name))
                    .collect(),
            )),
        }
    }

    /// All five drive variables; required before any upload starts.
    pub fn target(&self) -> Result<DriveTarget, ConfigError> {
        let missing = self.missing();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }
        let credentials = self.credentials()?;
        match (&self.user_upn, &self.root_folder) {
            (Some(user_upn), Some(root_folder)) => Ok(DriveTarget {
                credentials,
                user_upn: user_upn.clone(),
                root_folder: root_folder.clone(),
            }),
            _ => Err(ConfigError::Missing(self.missing())),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.transfer.direct_upload_max_bytes == 0 {
            return Err(ConfigError::Invalid {
                name: "DIRECT_UPLOAD_MAX_BYTES",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.transfer.chunk_size_bytes == 0
            || self.transfer.chunk_size_bytes % CHUNK_ALIGNMENT_BYTES != 0
        {
            return Err(ConfigError::Invalid {
                name: "UPLOAD_CHUNK_SIZE_BYTES",
                reason: format!("must be a non-zero multiple of {}", CHUNK_ALIGNMENT_BYTES),
            });
        }
        if self.http_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "HTTP_TIMEOUT_SECS",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.upload_deadline_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "UPLOAD_DEADLINE_SECS",
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub max_request_bytes: usize,
    /// `compact` or `json`.
    pub log_format: String,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub drive: DriveSettings,
}

impl Config {
    /// Load from the process environment (and `.env`, when present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let environment = get("ENVIRONMENT")
            .or_else(|| get("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins = get("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let server = ServerConfig {
            port: parse_or(get("SERVER_PORT").or_else(|| get("PORT")), "SERVER_PORT", SERVER_PORT)?,
            cors_origins,
            environment,
            max_request_bytes: parse_or(
                get("MAX_REQUEST_BYTES"),
                "MAX_REQUEST_BYTES",
                MAX_REQUEST_BYTES,
            )?,
            log_format: get("LOG_FORMAT").unwrap_or_else(|| "compact".to_string()),
        };

        let transfer = TransferSettings {
            direct_upload_max_bytes: parse_or(
                get("DIRECT_UPLOAD_MAX_BYTES"),
                "DIRECT_UPLOAD_MAX_BYTES",
                DEFAULT_DIRECT_UPLOAD_MAX_BYTES,
            )?,
            chunk_size_bytes: parse_or(
                get("UPLOAD_CHUNK_SIZE_BYTES"),
                "UPLOAD_CHUNK_SIZE_BYTES",
                DEFAULT_CHUNK_SIZE_BYTES,
            )?,
            ensure_folders: parse_or(get("ENSURE_FOLDERS"), "ENSURE_FOLDERS", true)?,
            conflict_behavior: match get("CONFLICT_BEHAVIOR") {
                Some(raw) => raw.parse().map_err(|reason| ConfigError::Invalid {
                    name: "CONFLICT_BEHAVIOR",
                    reason,
                })?,
                None => ConflictBehavior::Replace,
            },
        };

        let drive = DriveSettings {
            tenant_id: get(TENANT_ID),
            client_id: get(CLIENT_ID),
            client_secret: get(CLIENT_SECRET),
            user_upn: get(ONEDRIVE_USER_UPN),
            root_folder: get(ROOT_FOLDER),
            graph_base_url: get("GRAPH_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GRAPH_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            login_base_url: get("LOGIN_BASE_URL")
                .unwrap_or_else(|| DEFAULT_LOGIN_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            scope: get("GRAPH_SCOPE").unwrap_or_else(|| DEFAULT_GRAPH_SCOPE.to_string()),
            http_timeout_secs: parse_or(get("HTTP_TIMEOUT_SECS"), "HTTP_TIMEOUT_SECS", HTTP_TIMEOUT_SECS)?,
            upload_deadline_secs: parse_or(
                get("UPLOAD_DEADLINE_SECS"),
                "UPLOAD_DEADLINE_SECS",
                UPLOAD_DEADLINE_SECS,
            )?,
            transfer,
        };

        let config = Config { server, drive };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.max_request_bytes == 0 {
            return Err(ConfigError::Invalid {
                name: "MAX_REQUEST_BYTES",
                reason: "must be greater than 0".to_string(),
            });
        }
        self.drive.validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.server.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.server.port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.server.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.server.environment
    }

    pub fn max_request_bytes(&self) -> usize {
        self.server.max_request_bytes
    }

    pub fn log_format(&self) -> &str {
        &self.server.log_format
    }
}

fn parse_or<T: std::str::FromStr>(
    raw: Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
            name,
            reason: format!("could not parse '{}'", raw),
        }),
        None => Ok(default),
    }
}
