//! Configuration file support for the radiotap decoder
//!
//! Supports loading configuration from TOML files, with environment
//! variable overrides applied on top.

use crate::error::{RadiotapError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Upper bound accepted for `decoder.max_presence_words`.
///
/// A 65535-byte header holds at most (65535 - 4) / 4 presence words.
pub const PRESENCE_WORDS_HARD_LIMIT: usize = 16382;

/// Root configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Decoder limits and policies
    pub decoder: DecoderSettings,

    /// Logging configuration (used by the bundled tools)
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            RadiotapError::Config(format!("Failed to read config file: {}", e))
        })?;
        let mut config = Self::from_str(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| RadiotapError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Serialize configuration to a TOML string
    pub fn to_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| RadiotapError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Save configuration to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_string()?;
        std::fs::write(path.as_ref(), content).map_err(|e| {
            RadiotapError::Config(format!("Failed to write config file: {}", e))
        })
    }

    /// Generate default config file content with comments
    pub fn default_with_comments() -> &'static str {
        DEFAULT_CONFIG
    }

    /// Check limits that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let words = self.decoder.max_presence_words;
        if words == 0 || words > PRESENCE_WORDS_HARD_LIMIT {
            return Err(RadiotapError::Config(format!(
                "decoder.max_presence_words must be in 1..={}, got {}",
                PRESENCE_WORDS_HARD_LIMIT, words
            )));
        }
        Ok(())
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - RADIOTAP_MAX_PRESENCE_WORDS
    /// - RADIOTAP_TLV_POLICY ("strict" or "skip")
    /// - RADIOTAP_LOG_LEVEL
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_with(|key| std::env::var(key).ok());
    }

    /// Same as [`Config::apply_env_overrides`] with a caller-supplied lookup.
    pub fn apply_overrides_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("RADIOTAP_MAX_PRESENCE_WORDS") {
            if let Ok(words) = v.trim().parse() {
                self.decoder.max_presence_words = words;
            }
        }
        if let Some(v) = lookup("RADIOTAP_TLV_POLICY") {
            match v.trim().to_ascii_lowercase().as_str() {
                "strict" => self.decoder.tlv_policy = TlvPolicy::Strict,
                "skip" => self.decoder.tlv_policy = TlvPolicy::Skip,
                _ => {}
            }
        }
        if let Some(v) = lookup("RADIOTAP_LOG_LEVEL") {
            self.logging.level = v;
        }
    }
}

/// Decoder limits
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DecoderSettings {
    /// Maximum number of chained presence words accepted per header
    pub max_presence_words: usize,

    /// What to do with a TLV whose length contradicts its typed layout
    pub tlv_policy: TlvPolicy,
}

impl Default for DecoderSettings {
    fn default() -> Self {
        Self {
            max_presence_words: 16,
            tlv_policy: TlvPolicy::Strict,
        }
    }
}

/// Handling of TLV records whose typed sub-structure does not fit.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TlvPolicy {
    /// Abort the frame with `MalformedTlv`
    #[default]
    Strict,
    /// Keep the record as malformed and continue with the next TLV
    Skip,
}

/// Logging configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,

    /// Include the event target (module path) in log lines
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_target: false,
        }
    }
}

const DEFAULT_CONFIG: &str = r#"# Radiotap Decoder Configuration
# ==============================

[decoder]
# Maximum number of chained it_present words per header.
# Headers with a longer chain are rejected as malformed.
max_presence_words = 16

# TLV records whose length contradicts their typed layout:
#   "strict" - drop the whole frame
#   "skip"   - keep the record as malformed and continue
tlv_policy = "strict"

[logging]
# Log level: trace, debug, info, warn, error (RUST_LOG takes precedence)
level = "info"
with_target = false
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.decoder.max_presence_words, 16);
        assert_eq!(config.decoder.tlv_policy, TlvPolicy::Strict);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_default_document() {
        let config = Config::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.decoder, DecoderSettings::default());
        assert!(!config.logging.with_target);
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let config = Config::from_str("[decoder]\ntlv_policy = \"skip\"\n").unwrap();
        assert_eq!(config.decoder.tlv_policy, TlvPolicy::Skip);
        assert_eq!(config.decoder.max_presence_words, 16);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_roundtrip() {
        let mut config = Config::default();
        config.decoder.max_presence_words = 4;
        let toml = config.to_string().unwrap();
        let parsed = Config::from_str(&toml).unwrap();
        assert_eq!(parsed.decoder.max_presence_words, 4);
    }

    #[test]
    fn test_bad_policy_rejected() {
        let err = Config::from_str("[decoder]\ntlv_policy = \"ignore\"\n").unwrap_err();
        assert!(matches!(err, RadiotapError::Config(_)));
    }

    #[test]
    fn test_validate_word_limit() {
        let mut config = Config::default();
        config.decoder.max_presence_words = 0;
        assert!(matches!(config.validate(), Err(RadiotapError::Config(_))));
        config.decoder.max_presence_words = PRESENCE_WORDS_HARD_LIMIT + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config.apply_overrides_with(|key| match key {
            "RADIOTAP_MAX_PRESENCE_WORDS" => Some("8".to_string()),
            "RADIOTAP_TLV_POLICY" => Some("SKIP".to_string()),
            "RADIOTAP_LOG_LEVEL" => Some("trace".to_string()),
            _ => None,
        });
        assert_eq!(config.decoder.max_presence_words, 8);
        assert_eq!(config.decoder.tlv_policy, TlvPolicy::Skip);
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn test_unparseable_override_ignored() {
        let mut config = Config::default();
        config.apply_overrides_with(|key| match key {
            "RADIOTAP_MAX_PRESENCE_WORDS" => Some("lots".to_string()),
            "RADIOTAP_TLV_POLICY" => Some("maybe".to_string()),
            _ => None,
        });
        assert_eq!(config.decoder, DecoderSettings::default());
    }
}
