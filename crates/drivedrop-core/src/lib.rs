//! Drivedrop Core Library
//!
//! This crate provides the configuration, error taxonomy and shared models
//! used by the upload client (`drivedrop-storage`) and the HTTP surface
//! (`drivedrop-api`).

pub mod config;
pub mod constants;
pub mod drive_types;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{
    Config, ConfigError, Credentials, DriveSettings, DriveTarget, ServerConfig, TransferSettings,
};
pub use constants::{truncate_chars, MAX_ERROR_BODY_CHARS};
pub use drive_types::ConflictBehavior;
pub use error::{AppError, ErrorMetadata, LogLevel};
