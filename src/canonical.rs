//! Canonical map key ordering.

use std::cmp::Ordering;

use crate::{CborError, DecodeOptions, Result};

/// Orders two encoded map keys for canonical output.
///
/// Keys compare by first byte, then by encoded length, then bytewise. The
/// first-byte step means every key of a lower major type (and every shorter
/// header within a major type) sorts first, whatever its length.
///
/// ```
/// use canon_cbor::cmp_encoded_keys;
/// use std::cmp::Ordering;
///
/// // 1 < b"2" < "3"
/// assert_eq!(cmp_encoded_keys(&[0x01], &[0x41, 0x32]), Ordering::Less);
/// assert_eq!(cmp_encoded_keys(&[0x61, 0x33], &[0x41, 0x32]), Ordering::Greater);
/// ```
pub fn cmp_encoded_keys(a: &[u8], b: &[u8]) -> Ordering {
    a.first()
        .cmp(&b.first())
        .then_with(|| a.len().cmp(&b.len()))
        .then_with(|| a.cmp(b))
}

/// Stable sort of encoded `(key, value)` pairs into canonical order.
pub(crate) fn sort_entries(entries: &mut [(Vec<u8>, Vec<u8>)]) {
    entries.sort_by(|(a, _), (b, _)| cmp_encoded_keys(a, b));
}

/// Checks the raw keys of one map as they are decoded.
pub(crate) struct KeyOrder<'de> {
    previous: Option<&'de [u8]>,
    enforce: bool,
}

impl<'de> KeyOrder<'de> {
    pub(crate) fn new(options: &DecodeOptions) -> Self {
        KeyOrder {
            previous: None,
            enforce: options.require_canonical,
        }
    }

    pub(crate) fn check(&mut self, key: &'de [u8]) -> Result<()> {
        if !self.enforce {
            return Ok(());
        }
        if let Some(previous) = self.previous {
            match cmp_encoded_keys(previous, key) {
                Ordering::Less => {}
                Ordering::Equal => return Err(CborError::DuplicateKey),
                Ordering::Greater => return Err(CborError::NonCanonical),
            }
        }
        self.previous = Some(key);
        Ok(())
    }
}
