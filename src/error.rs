use std::io;
use thiserror::Error;

/// Errors produced while encoding or decoding.
///
/// Every error aborts the call it occurred in; there are no partial results.
#[derive(Error, Debug)]
pub enum CborError {
    /// The value cannot be represented in the supported CBOR subset.
    #[error("Unsupported value: {0}")]
    UnsupportedType(String),

    #[error("Unsupported major type {0}")]
    UnsupportedMajorType(u8),

    #[error("Unsupported additional information {0}")]
    UnsupportedAdditionalInfo(u8),

    /// The input ended where more bytes were required.
    #[error("Not enough data for encoded value")]
    TruncatedInput,

    #[error("Text string is not valid UTF-8")]
    InvalidText,

    #[error("Nesting exceeds the maximum depth of {0}")]
    DepthLimitExceeded(usize),

    #[error("{0} trailing bytes after the encoded value")]
    TrailingBytes(usize),

    #[error("Duplicate map key")]
    DuplicateKey,

    /// A header is not in its shortest form, or map keys are out of canonical order.
    #[error("Input is not canonically encoded")]
    NonCanonical,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serde error: {0}")]
    Serde(String),
}

impl serde::ser::Error for CborError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        CborError::Serde(msg.to_string())
    }
}

impl serde::de::Error for CborError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        CborError::Serde(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CborError>;
