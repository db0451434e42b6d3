use serde::{Deserialize, Serialize};

/// What to do when a map contains the same key more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateKeys {
    /// Keep the value of the last occurrence.
    #[default]
    LastWins,
    /// Fail with [`CborError::DuplicateKey`](crate::CborError::DuplicateKey).
    Reject,
}

/// Strictness knobs for decoding.
///
/// The defaults accept anything the encoder could have produced plus the
/// looser forms other CBOR encoders emit (non-shortest headers, unsorted map
/// keys, trailing bytes). Use [`DecodeOptions::strict`] for protocol messages
/// that must be canonical.
///
/// Options can be loaded from host configuration; missing fields take their
/// default:
///
/// ```
/// let options: canon_cbor::DecodeOptions =
///     serde_json::from_str(r#"{"max_depth": 8, "duplicate_keys": "reject"}"#).unwrap();
/// assert_eq!(options.max_depth, 8);
/// assert!(options.allow_trailing);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Maximum nesting of arrays and maps.
    pub max_depth: usize,
    /// Accept bytes left over after the top-level item.
    pub allow_trailing: bool,
    pub duplicate_keys: DuplicateKeys,
    /// Reject non-shortest headers and map keys out of canonical order.
    pub require_canonical: bool,
}

pub const DEFAULT_MAX_DEPTH: usize = 128;

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            max_depth: DEFAULT_MAX_DEPTH,
            allow_trailing: true,
            duplicate_keys: DuplicateKeys::LastWins,
            require_canonical: false,
        }
    }
}

impl DecodeOptions {
    /// Every check enabled.
    pub fn strict() -> Self {
        DecodeOptions {
            max_depth: DEFAULT_MAX_DEPTH,
            allow_trailing: false,
            duplicate_keys: DuplicateKeys::Reject,
            require_canonical: true,
        }
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn allow_trailing(mut self, allow: bool) -> Self {
        self.allow_trailing = allow;
        self
    }

    pub fn duplicate_keys(mut self, policy: DuplicateKeys) -> Self {
        self.duplicate_keys = policy;
        self
    }

    pub fn require_canonical(mut self, require: bool) -> Self {
        self.require_canonical = require;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_permissive() {
        let options = DecodeOptions::default();
        assert_eq!(options.max_depth, DEFAULT_MAX_DEPTH);
        assert!(options.allow_trailing);
        assert_eq!(options.duplicate_keys, DuplicateKeys::LastWins);
        assert!(!options.require_canonical);
    }

    #[test]
    fn test_builder_setters() {
        let options = DecodeOptions::default()
            .max_depth(4)
            .allow_trailing(false)
            .duplicate_keys(DuplicateKeys::Reject)
            .require_canonical(true);
        assert_eq!(options, DecodeOptions::strict().max_depth(4));
    }

    #[test]
    fn test_load_from_json_config() {
        let options: DecodeOptions = serde_json::from_str(r#"{"require_canonical": true}"#).unwrap();
        assert!(options.require_canonical);
        assert_eq!(options.max_depth, DEFAULT_MAX_DEPTH);

        let json = serde_json::to_string(&DecodeOptions::strict()).unwrap();
        assert!(json.contains(r#""duplicate_keys":"reject""#));
    }
}
