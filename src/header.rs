//! Item headers: the initial byte (major type + additional information) and
//! the big-endian argument that may follow it.
//!
//! [`Header`] is the encoding side, [`Reader`] the decoding side. Both
//! backends read and write every header through this module.

use crate::{
    CborError, DecodeOptions, FALSE, MAJOR_ARRAY, MAJOR_BYTES, MAJOR_MAP, MAJOR_NEGATIVE,
    MAJOR_SIMPLE, MAJOR_TEXT, MAJOR_UNSIGNED, Result, TRUE,
};

/// Encoded header, at most nine bytes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Header {
    buf: [u8; 9],
    len: u8,
}

impl Header {
    pub(crate) fn new(major: u8, value: u64) -> Self {
        let mut buf = [0u8; 9];
        let len = if value < 24 {
            buf[0] = (major << 5) | value as u8;
            1
        } else if value <= u8::MAX as u64 {
            buf[0] = (major << 5) | 24;
            buf[1] = value as u8;
            2
        } else if value <= u16::MAX as u64 {
            buf[0] = (major << 5) | 25;
            buf[1..3].copy_from_slice(&(value as u16).to_be_bytes());
            3
        } else if value <= u32::MAX as u64 {
            buf[0] = (major << 5) | 26;
            buf[1..5].copy_from_slice(&(value as u32).to_be_bytes());
            5
        } else {
            buf[0] = (major << 5) | 27;
            buf[1..9].copy_from_slice(&value.to_be_bytes());
            9
        };
        Header { buf, len }
    }

    /// Header for a complete integer item. Negative values use major type 1
    /// with the argument `-1 - value`.
    pub(crate) fn integer(value: i128) -> Result<Self> {
        let (major, magnitude) = if value >= 0 {
            (MAJOR_UNSIGNED, value)
        } else {
            (MAJOR_NEGATIVE, -1 - value)
        };
        let magnitude = u64::try_from(magnitude).map_err(|_| {
            CborError::UnsupportedType(format!("integer {value} is outside the 64-bit CBOR range"))
        })?;
        Ok(Header::new(major, magnitude))
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }
}

/// One decoded item, with string payloads borrowed from the input.
///
/// Containers only carry their declared size; the caller reads the children
/// and then calls [`Reader::leave`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Item<'de> {
    Unsigned(u64),
    /// Raw argument `n` of a major type 1 item, the value is `-1 - n`.
    Negative(u64),
    Bytes(&'de [u8]),
    Text(&'de str),
    Array(usize),
    Map(usize),
    Bool(bool),
}

/// Cursor over an input slice.
pub(crate) struct Reader<'de> {
    input: &'de [u8],
    pos: usize,
    depth: usize,
    options: DecodeOptions,
}

impl<'de> Reader<'de> {
    pub(crate) fn new(input: &'de [u8], options: DecodeOptions) -> Self {
        Reader {
            input,
            pos: 0,
            depth: 0,
            options,
        }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// The raw bytes consumed since `start`.
    pub(crate) fn since(&self, start: usize) -> &'de [u8] {
        &self.input[start..self.pos]
    }

    fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }

    fn read_u8(&mut self) -> Result<u8> {
        let byte = *self.input.get(self.pos).ok_or(CborError::TruncatedInput)?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'de [u8]> {
        if len > self.remaining() {
            return Err(CborError::TruncatedInput);
        }
        let bytes = &self.input[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn read_be<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.read_bytes(N)?);
        Ok(buf)
    }

    fn read_argument(&mut self, info: u8) -> Result<u64> {
        let (value, shortest_from) = match info {
            0..=23 => return Ok(info as u64),
            24 => (self.read_u8()? as u64, 24),
            25 => (u16::from_be_bytes(self.read_be()?) as u64, 0x100),
            26 => (u32::from_be_bytes(self.read_be()?) as u64, 0x1_0000),
            27 => (u64::from_be_bytes(self.read_be()?), 0x1_0000_0000),
            _ => return Err(CborError::UnsupportedAdditionalInfo(info)),
        };
        if self.options.require_canonical && value < shortest_from {
            return Err(CborError::NonCanonical);
        }
        Ok(value)
    }

    fn read_length(&mut self, info: u8) -> Result<usize> {
        let len = self.read_argument(info)?;
        match usize::try_from(len) {
            Ok(len) if len <= self.remaining() => Ok(len),
            _ => Err(CborError::TruncatedInput),
        }
    }

    /// Container size, rejected up front when `min_item_len` bytes per
    /// element cannot fit in what is left of the input.
    fn read_count(&mut self, info: u8, min_item_len: usize) -> Result<usize> {
        let count = self.read_argument(info)?;
        match usize::try_from(count) {
            Ok(count)
                if count
                    .checked_mul(min_item_len)
                    .is_some_and(|len| len <= self.remaining()) =>
            {
                Ok(count)
            }
            _ => Err(CborError::TruncatedInput),
        }
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.options.max_depth {
            return Err(CborError::DepthLimitExceeded(self.options.max_depth));
        }
        self.depth += 1;
        Ok(())
    }

    /// Closes the container opened by the last `Item::Array` or `Item::Map`.
    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub(crate) fn next_item(&mut self) -> Result<Item<'de>> {
        let initial = self.read_u8()?;
        let major = initial >> 5;
        let info = initial & 0x1f;

        Ok(match major {
            MAJOR_UNSIGNED => Item::Unsigned(self.read_argument(info)?),
            MAJOR_NEGATIVE => Item::Negative(self.read_argument(info)?),
            MAJOR_BYTES => {
                let len = self.read_length(info)?;
                Item::Bytes(self.read_bytes(len)?)
            }
            MAJOR_TEXT => {
                let len = self.read_length(info)?;
                let bytes = self.read_bytes(len)?;
                Item::Text(std::str::from_utf8(bytes).map_err(|_| CborError::InvalidText)?)
            }
            MAJOR_ARRAY => {
                let count = self.read_count(info, 1)?;
                self.enter()?;
                Item::Array(count)
            }
            MAJOR_MAP => {
                let count = self.read_count(info, 2)?;
                self.enter()?;
                Item::Map(count)
            }
            MAJOR_SIMPLE => match info {
                FALSE => Item::Bool(false),
                TRUE => Item::Bool(true),
                _ => return Err(CborError::UnsupportedAdditionalInfo(info)),
            },
            _ => return Err(CborError::UnsupportedMajorType(major)),
        })
    }

    /// Applies the trailing-bytes policy and returns the consumed length.
    pub(crate) fn finish(&self) -> Result<usize> {
        let rest = self.remaining();
        if rest > 0 {
            if !self.options.allow_trailing {
                return Err(CborError::TrailingBytes(rest));
            }
            tracing::trace!(trailing = rest, "ignoring bytes after top-level item");
        }
        Ok(self.pos)
    }
}
