//! Drive path construction.
//!
//! Layout: `{root}/{subpath...}/{owner}/{yyyy}/{mmdd}/{serial}/{file}`.
//! Every segment, whether configured or caller supplied, goes through
//! [`sanitize_segment`] so a path can never escape the configured root.

use chrono::{Datelike, NaiveDate};
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::traits::{DriveError, DriveResult};

/// File name used when the caller supplies none, or one that sanitizes away.
pub const DEFAULT_FILE_NAME: &str = "file.bin";

/// Normalize one path segment.
///
/// Lowercases, replaces every run of characters outside `[a-z0-9._-]` with a
/// single `-`, collapses repeated `-`, and trims `-` from both ends. A result
/// made only of dots is rejected (returned empty). Idempotent.
pub fn sanitize_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars().flat_map(char::to_lowercase) {
        let keep = ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '.' | '_' | '-');
        if keep && ch != '-' {
            out.push(ch);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }

    let trimmed = out.trim_matches('-');
    if trimmed.chars().all(|c| c == '.') {
        return String::new();
    }
    trimmed.to_string()
}

/// Split on `/` or `\`, sanitize each piece, drop the empty ones.
pub fn sanitize_segments(raw: &str) -> Vec<String> {
    raw.split(['/', '\\'])
        .map(sanitize_segment)
        .filter(|s| !s.is_empty())
        .collect()
}

/// A sanitized folder path relative to the drive root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FolderPath {
    segments: Vec<String>,
}

impl FolderPath {
    pub fn parse(raw: &str) -> Self {
        Self {
            segments: sanitize_segments(raw),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append `name` as the file segment, falling back to [`DEFAULT_FILE_NAME`].
    pub fn file(&self, name: &str) -> TargetPath {
        let name = sanitize_segment(name);
        TargetPath {
            folder: self.clone(),
            file_name: if name.is_empty() {
                DEFAULT_FILE_NAME.to_string()
            } else {
                name
            },
        }
    }
}

impl Display for FolderPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.segments.join("/"))
    }
}

/// Full drive path of one file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetPath {
    folder: FolderPath,
    file_name: String,
}

impl TargetPath {
    /// Parse a free-form path; the last non-empty segment is the file name.
    pub fn parse(raw: &str) -> DriveResult<Self> {
        let mut segments = sanitize_segments(raw);
        let file_name = segments
            .pop()
            .ok_or_else(|| DriveError::InvalidRequest(format!("empty drive path '{}'", raw)))?;
        Ok(Self {
            folder: FolderPath { segments },
            file_name,
        })
    }

    pub fn folder(&self) -> &FolderPath {
        &self.folder
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Same folder, `-{n}` before the extension: `quote.pdf` becomes `quote-2.pdf`.
    pub fn numbered(&self, n: usize) -> Self {
        let file_name = match self.file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => format!("{}-{}.{}", stem, n, ext),
            _ => format!("{}-{}", self.file_name, n),
        };
        Self {
            folder: self.folder.clone(),
            file_name,
        }
    }
}

impl Display for TargetPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.folder.is_root() {
            f.write_str(&self.file_name)
        } else {
            write!(f, "{}/{}", self.folder, self.file_name)
        }
    }
}

/// Builds the per-order folder and the file paths inside it.
#[derive(Debug, Clone)]
pub struct PathBuilder {
    root: String,
    subpath: Option<String>,
    owner: String,
    date: NaiveDate,
    serial: String,
}

impl PathBuilder {
    pub fn new(root: &str, owner: &str, date: NaiveDate, serial: &str) -> Self {
        Self {
            root: root.to_string(),
            subpath: None,
            owner: owner.to_string(),
            date,
            serial: serial.to_string(),
        }
    }

    /// Extra folders between the root and the owner segment.
    pub fn subpath(mut self, subpath: Option<&str>) -> Self {
        self.subpath = subpath.map(str::to_string);
        self
    }

    /// `{root}/{subpath...}/{owner}/{yyyy}/{mmdd}/{serial}`
    pub fn folder(&self) -> FolderPath {
        let mut segments = sanitize_segments(&self.root);
        if let Some(subpath) = &self.subpath {
            segments.extend(sanitize_segments(subpath));
        }
        let year = format!("{:04}", self.date.year());
        let mmdd = format!("{:02}{:02}", self.date.month(), self.date.day());
        for raw in [self.owner.as_str(), &year, &mmdd, self.serial.as_str()] {
            let segment = sanitize_segment(raw);
            if !segment.is_empty() {
                segments.push(segment);
            }
        }
        FolderPath { segments }
    }

    pub fn build(&self, file_name: Option<&str>) -> TargetPath {
        self.folder().file(file_name.unwrap_or_default())
    }
}

/// One-shot form of [`PathBuilder`].
pub fn build_path(
    root: &str,
    owner: &str,
    date: NaiveDate,
    serial: &str,
    file_name: Option<&str>,
) -> TargetPath {
    PathBuilder::new(root, owner, date, serial).build(file_name)
}
