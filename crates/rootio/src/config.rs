//! Codec policies.

use serde::{Deserialize, Serialize};

/// Default upper bound on class names read from the stream.
pub const DEFAULT_MAX_CLASS_NAME_LEN: usize = 80;

/// Default bound on how deeply object pointers may nest.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// What to do when a record does not consume exactly its declared byte count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ByteCountPolicy {
    /// Record a warning, reposition to the declared end and carry on.
    #[default]
    Warn,
    /// Fail the decode.
    Strict,
}

/// What to do with a record whose on-disk version is newer than supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FutureVersionPolicy {
    /// Fail the decode with [`DecodeError::VersionTooNew`].
    ///
    /// [`DecodeError::VersionTooNew`]: crate::DecodeError::VersionTooNew
    #[default]
    Abort,
    /// Capture the record as an opaque blob when its extent is known from a
    /// byte count, and abort otherwise.
    SkipAsOpaque,
}

/// Per-session codec configuration.
///
/// Every field has a default, so a partial TOML or JSON document is enough:
///
/// ```
/// use rootio::{ByteCountPolicy, CodecConfig};
///
/// let config: CodecConfig = serde_json::from_str(r#"{"byte-count": "strict"}"#).unwrap();
/// assert_eq!(config.byte_count, ByteCountPolicy::Strict);
/// assert_eq!(config.max_class_name_len, 80);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CodecConfig {
    pub byte_count: ByteCountPolicy,
    pub future_version: FutureVersionPolicy,
    pub max_class_name_len: usize,
    /// Records nested deeper than this through object pointers fail with
    /// [`DecodeError::TooDeep`].
    ///
    /// [`DecodeError::TooDeep`]: crate::DecodeError::TooDeep
    pub max_depth: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            byte_count: ByteCountPolicy::Warn,
            future_version: FutureVersionPolicy::Abort,
            max_class_name_len: DEFAULT_MAX_CLASS_NAME_LEN,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl CodecConfig {
    pub fn strict() -> Self {
        Self {
            byte_count: ByteCountPolicy::Strict,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config: CodecConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CodecConfig::default());
    }

    #[test]
    fn test_kebab_case_names() {
        let config = CodecConfig {
            byte_count: ByteCountPolicy::Strict,
            future_version: FutureVersionPolicy::SkipAsOpaque,
            max_class_name_len: 32,
            max_depth: 16,
        };
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "byte-count": "strict",
                "future-version": "skip-as-opaque",
                "max-class-name-len": 32,
                "max-depth": 16,
            })
        );
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let res: Result<CodecConfig, _> = serde_json::from_str(r#"{"byte-count": "ignore"}"#);
        assert!(res.is_err());
    }
}
