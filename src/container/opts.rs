//! Run preferences, metrics, and caller hooks.
//!
//! [`Options`] is a plain value handed to every public operation; nothing in
//! it is global. Validation happens once at the operation entry point so the
//! pipeline can trust every field.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::freq::Backend;
use crate::huffman::decode::MAX_TABLE_BITS;
use crate::huffman::{MAX_CODE_LEN_LIMIT, MIN_CODE_LEN_LIMIT};
use crate::pipeline::{self, CancelToken};

pub const KB: usize = 1 << 10;
pub const MB: usize = 1 << 20;

/// Default chunk granularity (16 MiB).
pub const DEFAULT_CHUNK_SIZE: u32 = (16 * MB) as u32;
/// Smallest accepted chunk size; below this the per-chunk metadata dwarfs
/// the data.
pub const MIN_CHUNK_SIZE: u32 = (64 * KB) as u32;
/// Largest accepted chunk size (1 GiB); chunks must stay well under 2^31.
pub const MAX_CHUNK_SIZE: u32 = 1 << 30;

/// Default direct-lookup decoder width.
pub const DEFAULT_DECODE_TABLE_BITS: u32 = 12;
/// Narrowest accepted decoder table.
pub const MIN_DECODE_TABLE_BITS: u32 = 8;

/// Default encoder length limit. Matches the default table width so every
/// code resolves in one probe.
pub const DEFAULT_MAX_CODE_LEN: u8 = 12;

/// Completion callback: `(chunks_done, chunk_count)`, invoked from the
/// drain path in ascending chunk order.
pub type ProgressFn = Arc<dyn Fn(u32, u32) + Send + Sync>;

/// Test instrumentation: called on the worker at the start of each chunk.
#[doc(hidden)]
pub type ChunkHook = Arc<dyn Fn(u32) + Send + Sync>;

/// What [`verify`](crate::verify) actually checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerifyMode {
    /// Decode every chunk and compare against the stored SHA-256.
    #[default]
    Full,
    /// Structural checks only: footer layout, geometry, checksum chain.
    Fast,
}

/// Preferences for one compress/decompress/verify run.
#[derive(Clone)]
pub struct Options {
    /// Chunk granularity in bytes.
    pub chunk_size_bytes: u32,
    /// Worker threads; `None` auto-sizes to `clamp(cores, 2, 8)`.
    pub worker_count: Option<usize>,
    /// Length limit applied after tree build, `8..=16`.
    pub max_code_len: u8,
    /// Direct-lookup decoder width, `8..=16`. Codes longer than this (only
    /// possible when `max_code_len` is raised above it) decode through the
    /// canonical fallback walk.
    pub decode_table_bits: u32,
    /// Store chunks raw when Huffman coding would not shrink them.
    pub allow_store_uncompressed: bool,
    /// Frequency-counting backend.
    pub backend: Backend,
    /// Verification depth for [`verify`](crate::verify).
    pub verify_mode: VerifyMode,
    /// Optional completion sink; not on the hot path.
    pub progress: Option<ProgressFn>,
    /// Optional cancellation handle, checked between chunks.
    pub cancel: Option<CancelToken>,
    #[doc(hidden)]
    pub chunk_start_hook: Option<ChunkHook>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            chunk_size_bytes: DEFAULT_CHUNK_SIZE,
            worker_count: None,
            max_code_len: DEFAULT_MAX_CODE_LEN,
            decode_table_bits: DEFAULT_DECODE_TABLE_BITS,
            allow_store_uncompressed: true,
            backend: Backend::default(),
            verify_mode: VerifyMode::default(),
            progress: None,
            cancel: None,
            chunk_start_hook: None,
        }
    }
}

impl Options {
    pub(crate) fn validate(&self) -> Result<()> {
        if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&self.chunk_size_bytes) {
            return Err(Error::InvalidOptions("chunk size out of range"));
        }
        if !(MIN_CODE_LEN_LIMIT..=MAX_CODE_LEN_LIMIT).contains(&self.max_code_len) {
            return Err(Error::InvalidOptions("max code length out of range"));
        }
        if !(MIN_DECODE_TABLE_BITS..=MAX_TABLE_BITS).contains(&self.decode_table_bits) {
            return Err(Error::InvalidOptions("decode table width out of range"));
        }
        Ok(())
    }

    /// Worker-pool size this run will use.
    pub fn effective_worker_count(&self) -> usize {
        pipeline::worker_count(self.worker_count)
    }
}

/// What a finished run did.
#[derive(Debug, Clone)]
pub struct Metrics {
    /// Uncompressed byte count.
    pub original_bytes: u64,
    /// Total container size on disk (bodies + footer + pointer).
    pub compressed_bytes: u64,
    pub chunk_count: u32,
    pub worker_count: usize,
    pub elapsed: Duration,
}

impl Metrics {
    /// Compressed-to-original size ratio; 0 for an empty input.
    pub fn ratio(&self) -> f64 {
        if self.original_bytes == 0 {
            0.0
        } else {
            self.compressed_bytes as f64 / self.original_bytes as f64
        }
    }
}
