//! Order upload service
//!
//! Turns one parsed upload form into drive writes:
//! defaults → authorize → per-order folder → files in part order → `metadata.json`.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use drivedrop_core::models::{
    UploadManifest, UploadResponse, UploadedFile, DEFAULT_OWNER, DEFAULT_SERIAL,
    MANIFEST_FILE_NAME, MANIFEST_VERSION,
};
use drivedrop_core::AppError;
use drivedrop_storage::path::DEFAULT_FILE_NAME;
use drivedrop_storage::{
    sanitize_segment, DriveUploader, FolderPath, PathBuilder, TargetPath, UploadScope,
};
use std::collections::HashSet;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::constants::fields;
use crate::utils::multipart::{FilePart, UploadForm};

const MANIFEST_CONTENT_TYPE: &str = "application/json";

/// Upload pipeline for one inbound request.
pub struct UploadService<'a> {
    uploader: &'a DriveUploader,
}

impl<'a> UploadService<'a> {
    pub fn new(uploader: &'a DriveUploader) -> Self {
        Self { uploader }
    }

    /// Upload every file part of `form`, then the metadata document.
    ///
    /// `now` fixes the date segments of the folder and the manifest timestamp.
    /// Stops at the first failing file; earlier writes are left in place.
    pub async fn process(
        &self,
        form: UploadForm,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<UploadResponse, AppError> {
        let start = Instant::now();

        if form.files.is_empty() {
            return Err(AppError::Parse("No file provided".to_string()));
        }
        let filename_override = form.field(fields::FILENAME);
        if filename_override.is_some() && form.files.len() != 1 {
            return Err(AppError::InvalidInput(format!(
                "'{}' can only be used with exactly one file, got {}",
                fields::FILENAME,
                form.files.len()
            )));
        }

        let owner = form.field(fields::CUSTOMER_EMAIL).unwrap_or_else(|| {
            tracing::info!(default = DEFAULT_OWNER, "No customerEmail; using default owner");
            DEFAULT_OWNER
        });
        let serial = form.field(fields::SERIAL).unwrap_or_else(|| {
            tracing::info!(default = DEFAULT_SERIAL, "No serial; using default serial");
            DEFAULT_SERIAL
        });
        let cart = parse_cart(form.field(fields::CART_JSON));

        let scope = self.uploader.authorize(cancel).await?;

        let folder = PathBuilder::new(scope.root_folder(), owner, now.date_naive(), serial)
            .subpath(form.field(fields::SUBPATH))
            .folder();

        // The manifest's name is reserved so a customer file never gets replaced by it.
        let mut taken = HashSet::from([MANIFEST_FILE_NAME.to_string()]);
        let mut files = Vec::with_capacity(form.files.len());
        for part in &form.files {
            let file_name = filename_override
                .map(str::to_string)
                .or_else(|| part.file_name.clone())
                .unwrap_or_else(|| {
                    let name = default_file_name(serial, &part.field_name);
                    tracing::info!(
                        field = %part.field_name,
                        file_name = %name,
                        "Part has no file name; using default"
                    );
                    name
                });
            let target = claim_target(&folder, &file_name, &mut taken);
            files.push(upload_part(&scope, &target, part, cancel).await?);
        }

        let manifest = UploadManifest {
            serial: serial.to_string(),
            customer_email: owner.to_string(),
            when: now,
            page_url: form.field(fields::PAGE_URL).unwrap_or_default().to_string(),
            user_agent: form.field(fields::USER_AGENT).unwrap_or_default().to_string(),
            files: files
                .iter()
                .map(|file| UploadedFile {
                    item_id: None,
                    web_url: None,
                    ..file.clone()
                })
                .collect(),
            cart,
            version: MANIFEST_VERSION.to_string(),
        };
        let meta_target = folder.file(MANIFEST_FILE_NAME);
        scope
            .upload(
                &meta_target,
                Bytes::from(manifest.to_bytes()?),
                MANIFEST_CONTENT_TYPE,
                cancel,
            )
            .await?;

        tracing::info!(
            folder = %folder,
            file_count = files.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Order upload completed"
        );

        Ok(UploadResponse {
            ok: true,
            folder: folder.to_string(),
            files,
            meta: meta_target.to_string(),
        })
    }
}

async fn upload_part(
    scope: &UploadScope<'_>,
    target: &TargetPath,
    part: &FilePart,
    cancel: &CancellationToken,
) -> Result<UploadedFile, AppError> {
    let result = scope
        .upload(
            target,
            part.data.clone(),
            part.content_type.as_deref().unwrap_or_default(),
            cancel,
        )
        .await?;

    Ok(UploadedFile {
        path: result.remote_path,
        filename: target.file_name().to_string(),
        size: result.size_bytes,
        mime: result.mime_type,
        item_id: result.remote_item.item.id,
        web_url: result.remote_item.item.web_url,
    })
}

/// Target for `file_name` inside `folder` whose sanitized name is not yet
/// in `taken`; repeats get `-2`, `-3`, ... before the extension.
fn claim_target(
    folder: &FolderPath,
    file_name: &str,
    taken: &mut HashSet<String>,
) -> TargetPath {
    let requested = folder.file(file_name);
    let mut target = requested.clone();
    let mut n = 1;
    while taken.contains(target.file_name()) {
        n += 1;
        target = requested.numbered(n);
    }
    if n > 1 {
        tracing::info!(
            requested = requested.file_name(),
            stored_as = target.file_name(),
            "File name already used in this order; renamed"
        );
    }
    taken.insert(target.file_name().to_string());
    target
}

/// `nd-{serial}.{field}`, e.g. `nd-a12.pdf`. Sanitized later with the rest of the path.
fn default_file_name(serial: &str, field_name: &str) -> String {
    if sanitize_segment(field_name).is_empty() {
        DEFAULT_FILE_NAME.to_string()
    } else {
        format!("nd-{}.{}", serial, field_name)
    }
}

/// Unparseable cart JSON is recorded as `{}`.
fn parse_cart(raw: Option<&str>) -> serde_json::Value {
    let Some(raw) = raw else {
        return serde_json::json!({});
    };
    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "cartJson is not valid JSON; recording {{}}");
            serde_json::json!({})
        }
    }
}
