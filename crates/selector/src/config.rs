//! Engine configuration

use serde::{Deserialize, Serialize};

/// What to do with pseudo-classes outside the supported set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PseudoPolicy {
    /// Treat as always-true
    #[default]
    Permissive,
    /// Fail compilation with `UnknownPseudoClass`
    Strict,
}

/// Known defects of the host environment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Quirks {
    /// Never use the host's by-class lookup even when it is advertised
    pub class_lookup_unreliable: bool,
    /// Extra substrings that keep a selector away from the native engine
    pub native_denylist: Vec<String>,
}

/// Configuration for the query engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub native_delegation: bool,
    pub unknown_pseudo: PseudoPolicy,
    pub quirks: Quirks,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            native_delegation: true,
            unknown_pseudo: PseudoPolicy::Permissive,
            quirks: Quirks::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: EngineConfig = serde_json::from_str(
            r#"{ "unknown_pseudo": "strict", "quirks": { "native_denylist": [":hover"] } }"#,
        )
        .unwrap();

        assert!(config.native_delegation);
        assert_eq!(config.unknown_pseudo, PseudoPolicy::Strict);
        assert!(!config.quirks.class_lookup_unreliable);
        assert_eq!(config.quirks.native_denylist, vec![":hover".to_string()]);
    }
}
