use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Owner identifier used when the storefront sends no customer email.
pub const DEFAULT_OWNER: &str = "guest";
/// Serial used when the storefront sends no order/serial number.
pub const DEFAULT_SERIAL: &str = "GUEST-0000";
/// Name of the metadata document written next to the uploaded files.
pub const MANIFEST_FILE_NAME: &str = "metadata.json";
pub const MANIFEST_VERSION: &str = "v1";

/// One file written to the remote drive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Drive path relative to the drive root.
    pub path: String,
    pub filename: String,
    pub size: u64,
    pub mime: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,
}

/// Metadata document stored as `metadata.json` alongside an order's files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadManifest {
    pub serial: String,
    pub customer_email: String,
    #[serde(with = "millis_timestamp")]
    pub when: DateTime<Utc>,
    pub page_url: String,
    pub user_agent: String,
    pub files: Vec<UploadedFile>,
    /// Free-form cart payload from the storefront; `{}` when absent or unparseable.
    pub cart: serde_json::Value,
    pub version: String,
}

impl UploadManifest {
    /// Pretty-printed JSON bytes, as written to the drive.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }
}

/// RFC3339 in UTC with exactly three fractional digits, e.g. `2024-03-09T12:00:00.000Z`.
mod millis_timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(when: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&when.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|when| when.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Successful response of the upload endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub ok: bool,
    /// Base folder every file of this request was written to.
    pub folder: String,
    pub files: Vec<UploadedFile>,
    /// Path of the metadata document.
    pub meta: String,
}
