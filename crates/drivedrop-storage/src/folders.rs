//! Folder hierarchy creation.

use drivedrop_core::ConflictBehavior;

use crate::path::FolderPath;
use crate::traits::{DriveAccess, DriveResult, RemoteDrive};

/// What [`ensure_folders`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderReport {
    /// Prefixes probed for existence.
    pub checked: usize,
    /// Folders created by this call.
    pub created: usize,
}

/// Make sure every prefix of `folder` exists, creating the missing ones top-down.
///
/// Once a prefix had to be created its descendants cannot exist, so they are
/// created without probing. A 409 from the drive counts as "already exists".
/// Safe to call repeatedly for the same path.
pub async fn ensure_folders(
    drive: &dyn RemoteDrive,
    access: &DriveAccess,
    folder: &FolderPath,
    conflict: ConflictBehavior,
) -> DriveResult<FolderReport> {
    let mut report = FolderReport::default();
    let mut parent: Option<String> = None;
    let mut creating = false;

    for segment in folder.segments() {
        let current = match &parent {
            Some(p) => format!("{}/{}", p, segment),
            None => segment.clone(),
        };

        if !creating {
            report.checked += 1;
            if drive.item_exists(access, &current).await? {
                parent = Some(current);
                continue;
            }
            creating = true;
        }

        match drive
            .create_folder(access, parent.as_deref(), segment, conflict)
            .await
        {
            Ok(()) => {
                report.created += 1;
                tracing::debug!(folder = %current, "Created folder");
            }
            Err(e) if e.is_conflict() => {
                tracing::debug!(folder = %current, "Folder already exists");
            }
            Err(e) => return Err(e),
        }
        parent = Some(current);
    }

    Ok(report)
}
