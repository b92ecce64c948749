//! Data models for the application
//!
//! Records exchanged between the upload pipeline and the HTTP surface.

mod diagnostics;
mod upload;

pub use diagnostics::*;
pub use upload::*;
