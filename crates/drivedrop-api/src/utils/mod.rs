//! Request parsing helpers

pub mod multipart;
