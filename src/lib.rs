// dcz — chunk-parallel lossless compression with canonical Huffman coding.
//
// Each chunk of the input is compressed independently with its own
// canonical Huffman code and SHA-256, then laid out in a footer-indexed
// `.dcz` container. Codebooks are never stored: the per-chunk code length
// table reconstructs the code exactly, so the container is deterministic
// for any worker count and any frequency backend.

pub mod bitio;
pub mod chunk;
pub mod container;
pub mod error;
pub mod freq;
pub mod huffman;
pub mod pipeline;
pub mod sha256;

// ─────────────────────────────────────────────────────────────────────────────
// Primary operations
// ─────────────────────────────────────────────────────────────────────────────

/// Compress a file into a `.dcz` container.
pub use container::compress::compress;
/// Decompress a `.dcz` container back into the original file.
pub use container::decompress::decompress;
/// Check a container's integrity without producing output.
pub use container::verify::verify;
/// List a container's metadata without decoding.
pub use container::verify::{read_info, ContainerInfo};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration and results
// ─────────────────────────────────────────────────────────────────────────────

pub use container::opts::{Metrics, Options, VerifyMode};
pub use error::{Error, Result};
pub use freq::{Backend, Histogram, Histogrammer, ParallelBackend, ScalarBackend};
pub use pipeline::CancelToken;

// ─────────────────────────────────────────────────────────────────────────────
// Format constants
// ─────────────────────────────────────────────────────────────────────────────

/// `"DCZF"`, the footer magic.
pub use container::footer::DCZ_MAGIC;
/// Container format version written and accepted by this crate.
pub use container::footer::FORMAT_VERSION;
