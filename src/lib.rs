//! # Canonical CBOR
//!
//! A deterministic encoder/decoder for a small subset of CBOR (RFC 8949):
//! booleans, integers, byte strings, text strings, arrays and maps.
//!
//! ## Canonical form
//! - Every header uses the shortest argument encoding.
//! - Map entries are written sorted by their encoded key: first byte, then
//!   encoded length, then bytewise (see [`cmp_encoded_keys`]).
//! - Only definite lengths are produced or accepted.
//!
//! The same [`Value`] always encodes to the same bytes, however its maps were
//! built. Anything outside the subset (floats, null, undefined, tags) is an
//! error in both directions.
//!
//! ## Backends
//! [`Value`] can be handled by two codecs with identical observable
//! behaviour, selected through [`Backend`]:
//! - `Tree` walks the value directly.
//! - `Streaming` is a serde data format ([`Encoder`] / [`Decoder`]) that also
//!   works with any `Serialize`/`Deserialize` type.
//!
//! The `streaming` cargo feature (on by default) makes `Streaming` the
//! default backend.
//!
//! ## Example
//! ```rust
//! use canon_cbor::{Value, decode, encode, from_slice, to_vec};
//! use serde::{Deserialize, Serialize};
//!
//! let value = Value::map([("3", 0), ("2", 0)]);
//! let bytes = encode(&value).unwrap();
//! assert_eq!(bytes, [0xa2, 0x61, 0x32, 0x00, 0x61, 0x33, 0x00]);
//! assert_eq!(decode(&bytes).unwrap(), value);
//!
//! #[derive(Debug, Serialize, Deserialize, PartialEq)]
//! struct Credential {
//!     #[serde(with = "serde_bytes")]
//!     id: Vec<u8>,
//!     kind: String,
//! }
//!
//! let credential = Credential { id: vec![1, 2], kind: "public-key".to_string() };
//! let bytes = to_vec(&credential).unwrap();
//! assert_eq!(from_slice::<Credential>(&bytes).unwrap(), credential);
//! ```

use serde::{Deserialize, Serialize};
use std::io::Write;

mod backend;
mod canonical;
mod de;
mod error;
mod header;
mod options;
mod ser;
mod tree;
mod value;

pub use backend::Backend;
pub use canonical::cmp_encoded_keys;
pub use de::Decoder;
pub use error::{CborError, Result};
pub use options::{DEFAULT_MAX_DEPTH, DecodeOptions, DuplicateKeys};
pub use ser::Encoder;
pub use value::Value;

// CBOR major types
pub(crate) const MAJOR_UNSIGNED: u8 = 0;
pub(crate) const MAJOR_NEGATIVE: u8 = 1;
pub(crate) const MAJOR_BYTES: u8 = 2;
pub(crate) const MAJOR_TEXT: u8 = 3;
pub(crate) const MAJOR_ARRAY: u8 = 4;
pub(crate) const MAJOR_MAP: u8 = 5;
pub(crate) const MAJOR_SIMPLE: u8 = 7;

// Simple values (major type 7)
pub(crate) const FALSE: u8 = 20;
pub(crate) const TRUE: u8 = 21;

/// Encodes `value` canonically with the default [`Backend`].
pub fn encode(value: &Value) -> Result<Vec<u8>> {
    Backend::default().encode(value)
}

/// Decodes a single item with the default [`DecodeOptions`].
///
/// Trailing bytes after the item are ignored; use [`decode_prefix`] to learn
/// how much was consumed, or [`decode_with`] to reject them.
pub fn decode(data: &[u8]) -> Result<Value> {
    decode_with(data, &DecodeOptions::default())
}

pub fn decode_with(data: &[u8], options: &DecodeOptions) -> Result<Value> {
    Backend::default()
        .decode_with(data, options)
        .map(|(value, _)| value)
        .inspect_err(|err| tracing::debug!(%err, len = data.len(), "decode failed"))
}

/// Decodes the item at the start of `data`, returning it with the number of
/// bytes it occupied.
pub fn decode_prefix(data: &[u8]) -> Result<(Value, usize)> {
    Backend::default().decode_with(data, &DecodeOptions::default())
}

// Convenience functions
pub fn to_vec<T: ?Sized + Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    to_writer(&mut buf, value)?;
    Ok(buf)
}

pub fn to_writer<W: Write, T: ?Sized + Serialize>(writer: W, value: &T) -> Result<()> {
    let mut encoder = Encoder::new(writer);
    encoder.encode(value)
}

pub fn from_slice<'de, T: Deserialize<'de>>(slice: &'de [u8]) -> Result<T> {
    from_slice_with(slice, &DecodeOptions::default())
}

/// Like [`from_slice`], applying `options` including the trailing-bytes check.
pub fn from_slice_with<'de, T: Deserialize<'de>>(
    slice: &'de [u8],
    options: &DecodeOptions,
) -> Result<T> {
    let mut decoder = Decoder::with_options(slice, *options);
    let value = decoder.decode()?;
    decoder.end()?;
    Ok(value)
}
