//! Bridge configuration.

use serde::{Deserialize, Serialize};
use weardata_core::CodecConfig;

/// Configuration for the [`BridgeController`](crate::BridgeController).
///
/// Every field has a default, so a host can pass a partial JSON object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Maximum commands held while no transport session is attached.
    /// `None` means unbounded.
    pub max_pending_commands: Option<usize>,
    /// Also accept `putDataItem`, `getDataItems`, and `deleteDataItems`.
    pub accept_legacy_names: bool,
    /// Codec configuration.
    pub codec: CodecConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            max_pending_commands: None,
            accept_legacy_names: true,
            codec: CodecConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = BridgeConfig::from_json(r#"{"max_pending_commands": 8}"#).unwrap();
        assert_eq!(config.max_pending_commands, Some(8));
        assert!(config.accept_legacy_names);
        assert!(config.codec.warn_on_conversion_loss);
    }

    #[test]
    fn test_nested_codec_config() {
        let config =
            BridgeConfig::from_json(r#"{"codec": {"warn_on_conversion_loss": false}}"#).unwrap();
        assert!(!config.codec.warn_on_conversion_loss);
        assert_eq!(config.max_pending_commands, None);
    }
}
