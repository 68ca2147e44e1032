//! Chunk encoding: bytes in, self-contained bitstream + metadata out.

use crate::bitio::BitWriter;
use crate::error::{Error, Result};
use crate::freq::{Histogrammer, SYMBOL_COUNT};
use crate::huffman::canonical::assign_codes;
use crate::huffman::lengths::build_code_lengths;
use crate::sha256::sha256;

use super::EncodedChunk;

/// Knobs the encoder needs from [`Options`](crate::Options), plus the
/// frequency backend to count with.
pub struct EncodeParams<'a> {
    pub max_code_len: u8,
    pub allow_store_uncompressed: bool,
    pub backend: &'a dyn Histogrammer,
}

/// Compresses one chunk.
///
/// The predicted bitstream size is exact (`Σ count·len` bits), so the
/// store-uncompressed election happens before any bits are written: a chunk
/// whose Huffman coding would not beat its own size is stored raw with the
/// all-eights length table.
///
/// Never rejects input; failures are allocation or bug assertions only.
pub fn encode_chunk(
    index: u32,
    original_offset: u64,
    data: Vec<u8>,
    params: &EncodeParams<'_>,
) -> Result<EncodedChunk> {
    let sha256 = sha256(&data);
    let hist = params.backend.histogram(&data);
    let code_lengths = build_code_lengths(&hist, params.max_code_len)?;

    let expected_bits: u64 = (0..SYMBOL_COUNT)
        .map(|s| hist[s] * code_lengths[s] as u64)
        .sum();
    let expected_bytes = (expected_bits + 7) / 8;

    if params.allow_store_uncompressed && !data.is_empty() && expected_bytes >= data.len() as u64
    {
        let mut raw_lengths = [0u8; SYMBOL_COUNT];
        for s in 0..SYMBOL_COUNT {
            if hist[s] > 0 {
                raw_lengths[s] = 8;
            }
        }
        return Ok(EncodedChunk {
            index,
            original_offset,
            original_size: data.len() as u32,
            bytes: data,
            code_lengths: raw_lengths,
            sha256,
            stored_raw: true,
        });
    }

    let code = assign_codes(&code_lengths).map_err(|_| Error::LengthLimitViolation)?;
    let mut w = BitWriter::with_capacity_bits(expected_bits);
    for &b in &data {
        w.write_bits(code.code(b), code.len(b) as u32)?;
    }
    let (bytes, written_bits) = w.finish();
    debug_assert_eq!(written_bits, expected_bits);

    Ok(EncodedChunk {
        index,
        original_offset,
        original_size: data.len() as u32,
        bytes,
        code_lengths,
        sha256,
        stored_raw: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::freq::ScalarBackend;

    fn params(allow_raw: bool) -> EncodeParams<'static> {
        EncodeParams {
            max_code_len: 12,
            allow_store_uncompressed: allow_raw,
            backend: &ScalarBackend,
        }
    }

    #[test]
    fn all_zero_chunk_is_one_bit_per_byte() {
        let data = vec![0u8; 64 * 1024];
        let enc = encode_chunk(0, 0, data.clone(), &params(true)).unwrap();
        assert!(!enc.stored_raw);
        assert_eq!(enc.code_lengths[0], 1);
        assert!(enc.code_lengths[1..].iter().all(|&l| l == 0));
        // 65536 one-bit codes pack into exactly 8192 bytes.
        assert_eq!(enc.bytes.len(), 64 * 1024 / 8);
        assert!(enc.bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn skewed_chunk_compresses() {
        let mut data = Vec::new();
        data.extend(std::iter::repeat(b'a').take(4000));
        data.extend(std::iter::repeat(b'b').take(90));
        data.extend(std::iter::repeat(b'c').take(6));
        let enc = encode_chunk(3, 0, data.clone(), &params(true)).unwrap();
        assert!(!enc.stored_raw);
        assert!(enc.bytes.len() < data.len() / 4);
        assert_eq!(enc.index, 3);
        assert_eq!(enc.original_size, data.len() as u32);
        assert_eq!(enc.sha256, crate::sha256::sha256(&data));
    }

    #[test]
    fn incompressible_chunk_is_stored_raw() {
        // One of each byte value: 8 bits per symbol, no gain possible.
        let data: Vec<u8> = (0u8..=255).collect();
        let enc = encode_chunk(0, 0, data.clone(), &params(true)).unwrap();
        assert!(enc.stored_raw);
        assert_eq!(enc.bytes, data);
        assert!(enc.code_lengths.iter().all(|&l| l == 8));
    }

    #[test]
    fn raw_election_can_be_disabled() {
        let data: Vec<u8> = (0u8..=255).collect();
        let enc = encode_chunk(0, 0, data.clone(), &params(false)).unwrap();
        assert!(!enc.stored_raw);
        assert_eq!(enc.bytes.len(), data.len());
    }

    #[test]
    fn empty_chunk_produces_empty_bitstream() {
        let enc = encode_chunk(0, 0, Vec::new(), &params(true)).unwrap();
        assert!(enc.bytes.is_empty());
        assert!(enc.code_lengths.iter().all(|&l| l == 0));
        assert_eq!(enc.original_size, 0);
    }

    #[test]
    fn lengths_respect_the_configured_limit() {
        // Fibonacci-ish skew drives unlimited depths past 12 bits.
        let mut data = Vec::new();
        let (mut a, mut b) = (1u64, 1u64);
        for s in 0..30u8 {
            data.extend(std::iter::repeat(s).take(a as usize));
            let next = (a + b).min(1 << 20);
            a = b;
            b = next;
        }
        let enc = encode_chunk(0, 0, data, &params(true)).unwrap();
        assert!(enc.code_lengths.iter().all(|&l| l <= 12));
    }
}
