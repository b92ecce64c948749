//! API constants

/// Prefix for every API route.
pub const API_PREFIX: &str = "/api";

/// Service name reported in logs.
pub const SERVICE_NAME: &str = "drivedrop";

/// Server-wide cap on in-flight requests. Uploads are buffered in memory,
/// so this bounds peak usage at roughly this many times `MAX_REQUEST_BYTES`.
pub const HTTP_CONCURRENCY_LIMIT: usize = 32;

/// Multipart field names treated as file parts even without a file name.
pub const FILE_FIELD_NAMES: [&str; 3] = ["pdf", "xlsx", "file"];

/// Text fields read from the upload form.
pub mod fields {
    pub const CUSTOMER_EMAIL: &str = "customerEmail";
    pub const SERIAL: &str = "serial";
    pub const SUBPATH: &str = "subpath";
    pub const FILENAME: &str = "filename";
    pub const PAGE_URL: &str = "pageUrl";
    pub const USER_AGENT: &str = "userAgent";
    pub const CART_JSON: &str = "cartJson";
}
