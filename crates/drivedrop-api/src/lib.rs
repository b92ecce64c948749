//! DriveDrop API Library
//!
//! This crate provides the HTTP handlers, the upload service and application
//! setup for the DriveDrop server.

pub mod constants;
pub mod error;
pub mod handlers;
pub mod services;
pub mod setup;
pub mod state;
pub mod utils;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use services::upload::UploadService;
pub use state::AppState;
