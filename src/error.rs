//! Error taxonomy for the `.dcz` container pipeline.
//!
//! One public enum covers every failure the library can surface. Worker
//! threads report the first error they observe; the orchestrator keeps the
//! first one (output-write errors take precedence over codec errors) and
//! returns it after all workers have joined. Corruption of chunk payloads
//! surfaces as [`Error::InvalidCode`] or [`Error::ChecksumMismatch`], never
//! as silently wrong output.

use core::fmt;
use std::io;

use crate::bitio::BitIoError;

/// Crate-wide result alias.
pub type Result<T> = core::result::Result<T, Error>;

/// Everything that can go wrong while compressing, decompressing, or
/// verifying a `.dcz` container.
#[derive(Debug)]
pub enum Error {
    /// Underlying file read/write failure.
    Io(io::Error),
    /// The container is structurally unusable: bad magic, unsupported
    /// version, impossible offsets, truncated footer.
    BadFormat(&'static str),
    /// A decoded chunk's SHA-256 does not match the stored digest.
    ChecksumMismatch { chunk_index: u32 },
    /// A chunk's bitstream contains a prefix with no matching canonical
    /// code, or its stored length table cannot describe a prefix code.
    InvalidCode { chunk_index: u32 },
    /// The bitstream ran out before `original_size` symbols were decoded.
    TruncatedBitstream { chunk_index: u32 },
    /// The length table still exceeds `max_code_len` after limiting, or the
    /// encoder tried to emit a symbol with no assigned code. Encode-side
    /// bug assertion.
    LengthLimitViolation,
    /// Rejected option values (out-of-range chunk size, code length, ...).
    InvalidOptions(&'static str),
    /// The caller's [`CancelToken`](crate::CancelToken) fired.
    Cancelled,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::BadFormat(msg) => write!(f, "bad container format: {}", msg),
            Error::ChecksumMismatch { chunk_index } => {
                write!(f, "checksum mismatch in chunk {}", chunk_index)
            }
            Error::InvalidCode { chunk_index } => {
                write!(f, "invalid Huffman code in chunk {}", chunk_index)
            }
            Error::TruncatedBitstream { chunk_index } => {
                write!(f, "truncated bitstream in chunk {}", chunk_index)
            }
            Error::LengthLimitViolation => {
                write!(f, "code length table violates the configured limit")
            }
            Error::InvalidOptions(msg) => write!(f, "invalid options: {}", msg),
            Error::Cancelled => write!(f, "operation cancelled"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<BitIoError> for Error {
    // The encoder can only misuse the bit writer by emitting a symbol whose
    // assigned length is zero or above 32, i.e. a broken length table.
    fn from(_: BitIoError) -> Self {
        Error::LengthLimitViolation
    }
}
