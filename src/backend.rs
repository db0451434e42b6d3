use serde::{Deserialize, Serialize};

use crate::{DecodeOptions, Decoder, Encoder, Result, Value, tree};

/// Selects which codec handles [`Value`] encoding and decoding.
///
/// Both produce the same bytes, the same errors and the same consumed
/// length. `Tree` walks the value directly; `Streaming` goes through the
/// serde [`Encoder`] and [`Decoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    Tree,
    Streaming,
}

impl Default for Backend {
    fn default() -> Self {
        if cfg!(feature = "streaming") {
            Backend::Streaming
        } else {
            Backend::Tree
        }
    }
}

impl Backend {
    pub fn encode(self, value: &Value) -> Result<Vec<u8>> {
        tracing::trace!(backend = ?self, "encode");
        match self {
            Backend::Tree => tree::encode(value),
            Backend::Streaming => {
                let mut encoder = Encoder::new(Vec::new());
                encoder.encode(value)?;
                Ok(encoder.into_inner())
            }
        }
    }

    /// Decodes one item and returns it with the number of bytes consumed.
    pub fn decode_with(self, data: &[u8], options: &DecodeOptions) -> Result<(Value, usize)> {
        tracing::trace!(backend = ?self, len = data.len(), "decode");
        match self {
            Backend::Tree => tree::decode(data, options),
            Backend::Streaming => {
                let mut decoder = Decoder::with_options(data, *options);
                let value: Value = decoder.decode()?;
                let consumed = decoder.end()?;
                Ok((value, consumed))
            }
        }
    }
}
