//! Thin wrapper around the `sha2` crate providing the SHA-256 helpers used
//! by the rest of this crate.
//!
//! Chunks carry a digest of their uncompressed bytes; the container carries
//! a digest over the concatenation of those per-chunk digests, which the
//! parallel pipeline can produce without a second pass over the file.

pub use sha2::{Digest, Sha256};

/// Digest length in bytes.
pub const SHA256_LEN: usize = 32;

/// One-shot SHA-256 of `data`.
pub fn sha256(data: &[u8]) -> [u8; SHA256_LEN] {
    let mut h = Sha256::new();
    h.update(data);
    h.finalize().into()
}

/// Container-level digest: SHA-256 over the per-chunk digests in ascending
/// chunk-index order.
pub fn chain_digest<'a, I>(chunk_digests: I) -> [u8; SHA256_LEN]
where
    I: IntoIterator<Item = &'a [u8; SHA256_LEN]>,
{
    let mut h = Sha256::new();
    for d in chunk_digests {
        h.update(d);
    }
    h.finalize().into()
}
