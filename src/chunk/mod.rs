//! Per-chunk compression units.
//!
//! A chunk is encoded and decoded in isolation: it owns its histogram, its
//! length table, and its SHA-256, so the pipeline can hand whole chunks to
//! workers without any shared state.

pub mod decode;
pub mod encode;

pub use decode::decode_chunk;
pub use encode::{encode_chunk, EncodeParams};

use crate::freq::SYMBOL_COUNT;
use crate::huffman::CodeLengths;

/// Result of encoding one chunk, handed from a worker back to the writer.
#[derive(Debug, Clone)]
pub struct EncodedChunk {
    /// 0-based sequential chunk index.
    pub index: u32,
    /// Byte offset of this chunk in the uncompressed file.
    pub original_offset: u64,
    /// Uncompressed size in bytes.
    pub original_size: u32,
    /// The chunk body: Huffman bitstream, or raw bytes for a stored chunk.
    pub bytes: Vec<u8>,
    /// Code lengths the body was written with (all-8 table for raw chunks).
    pub code_lengths: CodeLengths,
    /// SHA-256 of the uncompressed bytes.
    pub sha256: [u8; 32],
    /// Body is stored uncompressed (Huffman coding would not have saved
    /// anything).
    pub stored_raw: bool,
}

/// Borrowed view of the metadata needed to decode one chunk; the container
/// layer produces these from parsed footer entries.
#[derive(Debug, Clone, Copy)]
pub struct ChunkDescriptor<'a> {
    pub index: u32,
    pub original_size: u32,
    /// Stored length fields with the raw-chunk flag already masked out.
    pub code_lengths: &'a [u16; SYMBOL_COUNT],
    pub stored_raw: bool,
    pub sha256: &'a [u8; 32],
}
