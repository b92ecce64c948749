//! Multipart form reading for the upload endpoint

use std::collections::HashMap;

use axum::extract::Multipart;
use bytes::Bytes;

use crate::constants::FILE_FIELD_NAMES;
use crate::error::HttpAppError;

/// One file part, buffered.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub field_name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Every file part in arrival order plus the text fields.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub files: Vec<FilePart>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    pub fn with_field(mut self, name: &str, value: &str) -> Self {
        self.fields.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_file(mut self, part: FilePart) -> Self {
        self.files.push(part);
        self
    }

    /// Trimmed text field; blank counts as absent.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }
}

fn is_file_part(field_name: &str, file_name: Option<&str>) -> bool {
    file_name.is_some() || FILE_FIELD_NAMES.contains(&field_name)
}

/// Drain the form. A repeated text field keeps its last value.
pub async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, HttpAppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);

        if is_file_part(&field_name, file_name.as_deref()) {
            let content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await?;

            // An untouched <input type="file"> posts an empty, unnamed part.
            let file_name = file_name.filter(|name| !name.trim().is_empty());
            if file_name.is_none() && data.is_empty() {
                tracing::debug!(field = %field_name, "Skipping empty file part");
                continue;
            }

            form.files.push(FilePart {
                field_name,
                file_name,
                content_type,
                data,
            });
        } else {
            let value = field.text().await?;
            form.fields.insert(field_name, value);
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_part_detection() {
        assert!(is_file_part("attachment", Some("quote.pdf")));
        assert!(is_file_part("pdf", None));
        assert!(is_file_part("xlsx", None));
        assert!(!is_file_part("serial", None));
    }

    #[test]
    fn test_blank_field_is_absent() {
        let form = UploadForm::default()
            .with_field("serial", "  ")
            .with_field("customerEmail", " jane@example.com ");
        assert_eq!(form.field("serial"), None);
        assert_eq!(form.field("customerEmail"), Some("jane@example.com"));
        assert_eq!(form.field("pageUrl"), None);
    }
}
