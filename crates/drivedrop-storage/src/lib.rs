//! DriveDrop Storage Library
//!
//! Remote drive access for DriveDrop: the [`RemoteDrive`] and
//! [`TokenProvider`] traits, the Microsoft Graph implementation, path
//! sanitization, folder creation and the direct/chunked upload pipeline.
//!
//! # Drive path layout
//!
//! Files land at `{root}/{subpath...}/{owner}/{yyyy}/{mmdd}/{serial}/{file}`.
//! Every segment is lowercased and reduced to `[a-z0-9._-]`; path
//! construction is centralized in the `path` module.

pub mod cancel;
#[cfg(feature = "graph")]
pub mod factory;
pub mod folders;
#[cfg(feature = "graph")]
pub mod graph;
pub mod path;
pub mod response;
pub mod session;
pub mod strategy;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
#[cfg(feature = "graph")]
pub mod token;
pub mod traits;
pub mod uploader;

// Re-export commonly used types
#[cfg(feature = "graph")]
pub use factory::create_uploader;
#[cfg(feature = "graph")]
pub use graph::GraphDrive;
pub use path::{build_path, sanitize_segment, FolderPath, PathBuilder, TargetPath};
pub use session::{ByteRange, ChunkedUploadSession, SessionState};
pub use strategy::{select_strategy, TransferStrategy};
#[cfg(feature = "graph")]
pub use token::ClientCredentialsProvider;
pub use traits::{
    AccessToken, ChunkAck, DriveAccess, DriveError, DriveItem, DriveResult, RemoteDrive,
    RemoteItem, TokenProvider,
};
pub use uploader::{DriveUploader, UploadResult, UploadScope};
