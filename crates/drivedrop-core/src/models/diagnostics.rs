use serde::Serialize;
use std::collections::BTreeMap;

/// Result of the diagnostics probe.
///
/// `env_present` only ever carries booleans; configuration values are never echoed.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsReport {
    pub env_present: BTreeMap<&'static str, bool>,
    pub token_ok: bool,
    pub token_error: Option<String>,
}

impl DiagnosticsReport {
    pub fn new(presence: impl IntoIterator<Item = (&'static str, bool)>) -> Self {
        Self {
            env_present: presence.into_iter().collect(),
            token_ok: false,
            token_error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_camel_case_with_null_error() {
        let report = DiagnosticsReport::new([("TENANT_ID", true), ("ROOT_FOLDER", false)]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["envPresent"]["TENANT_ID"], true);
        assert_eq!(json["envPresent"]["ROOT_FOLDER"], false);
        assert_eq!(json["tokenOk"], false);
        assert!(json["tokenError"].is_null());
    }
}
