//! Canonical Huffman codec.
//!
//! The codec is split the way the data flows: [`lengths`] turns a histogram
//! into a code-length table, [`canonical`] turns lengths into codewords, and
//! [`decode`] turns lengths back into a symbol-lookup structure. Codebooks
//! are never stored; the length table alone determines the code, so the
//! decoder reconstructs exactly what the encoder used.

pub mod canonical;
pub mod decode;
pub mod lengths;

pub use canonical::{assign_codes, CanonicalCode};
pub use decode::DecodeTable;
pub use lengths::build_code_lengths;

use core::fmt;

use crate::freq::SYMBOL_COUNT;

/// Per-symbol code lengths; 0 marks a symbol absent from the chunk.
pub type CodeLengths = [u8; SYMBOL_COUNT];

/// Upper bound any stored code length may take. Lengths above this cannot
/// be represented by the container and are rejected outright.
pub const MODEL_MAX_CODE_LEN: u8 = 32;

/// Largest configurable encoder length limit (codewords fit in 16 bits).
pub const MAX_CODE_LEN_LIMIT: u8 = 16;

/// Smallest usable encoder length limit: 256 distinct symbols need up to
/// 8-bit codes even when perfectly balanced.
pub const MIN_CODE_LEN_LIMIT: u8 = 8;

/// Why a length table cannot be turned into a codebook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodebookError {
    /// A length exceeds [`MODEL_MAX_CODE_LEN`].
    LengthTooLong(u8),
    /// The lengths violate the Kraft inequality; no prefix code exists.
    NotPrefixFree,
}

impl fmt::Display for CodebookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodebookError::LengthTooLong(l) => {
                write!(f, "code length {} exceeds {}", l, MODEL_MAX_CODE_LEN)
            }
            CodebookError::NotPrefixFree => {
                write!(f, "length table does not describe a prefix code")
            }
        }
    }
}

impl std::error::Error for CodebookError {}
