use drivedrop_core::TransferSettings;
use serde::Serialize;

/// How a payload is written to the drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStrategy {
    /// One PUT of the whole body.
    Direct,
    /// Upload session plus sequential range PUTs.
    Chunked,
}

/// Direct when `size_bytes <= direct_max_bytes`, otherwise chunked.
/// Empty payloads are always direct.
pub fn select_strategy(size_bytes: u64, direct_max_bytes: u64) -> TransferStrategy {
    if size_bytes <= direct_max_bytes {
        TransferStrategy::Direct
    } else {
        TransferStrategy::Chunked
    }
}

pub fn strategy_for(settings: &TransferSettings, size_bytes: u64) -> TransferStrategy {
    select_strategy(size_bytes, settings.direct_upload_max_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOUR_MIB: u64 = 4 * 1024 * 1024;

    #[test]
    fn test_threshold_is_inclusive() {
        assert_eq!(select_strategy(0, FOUR_MIB), TransferStrategy::Direct);
        assert_eq!(select_strategy(FOUR_MIB - 1, FOUR_MIB), TransferStrategy::Direct);
        assert_eq!(select_strategy(FOUR_MIB, FOUR_MIB), TransferStrategy::Direct);
        assert_eq!(select_strategy(FOUR_MIB + 1, FOUR_MIB), TransferStrategy::Chunked);
    }

    #[test]
    fn test_strategy_uses_configured_threshold() {
        let settings = TransferSettings {
            direct_upload_max_bytes: 10,
            ..TransferSettings::default()
        };
        assert_eq!(strategy_for(&settings, 10), TransferStrategy::Direct);
        assert_eq!(strategy_for(&settings, 11), TransferStrategy::Chunked);
    }
}
