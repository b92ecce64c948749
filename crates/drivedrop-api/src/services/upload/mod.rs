//! Order upload pipeline

mod service;

pub use service::UploadService;
