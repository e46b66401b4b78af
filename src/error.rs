//! Error types
use crate::types::Segment;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Malformed NSO header: {0}")]
    MalformedHeader(String),

    #[error("Failed to decompress {segment} segment: {reason}")]
    Decompression { segment: Segment, reason: String },

    #[error("SHA-256 digest of {segment} segment does not match the header")]
    Integrity { segment: Segment },

    #[error("No call site loading {constant:#010x} was found in the text segment")]
    PatternNotFound { constant: u32 },

    #[error("Patch offset {0:#x} can not be encoded in an IPS record")]
    OffsetOutOfRange(u64),

    #[error("Patch payload of {0} bytes is too large for an IPS record")]
    PayloadTooLarge(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
