//! Chunk decoding with checksum verification.
//!
//! The stored length table is the whole codebook; the decoder rebuilds the
//! canonical code, produces exactly `original_size` symbols, and checks the
//! result against the stored SHA-256. The bitstream length is never trusted
//! as a terminator.

use crate::bitio::BitReader;
use crate::error::{Error, Result};
use crate::freq::SYMBOL_COUNT;
use crate::huffman::{CodeLengths, DecodeTable, MODEL_MAX_CODE_LEN};
use crate::sha256::sha256;

use super::ChunkDescriptor;

/// Decompresses one chunk body back into its original bytes.
///
/// `bytes` is consumed so a stored-raw chunk moves straight through without
/// a copy. Every failure names the chunk: corrupt lengths or dead prefixes
/// are [`Error::InvalidCode`], early exhaustion is
/// [`Error::TruncatedBitstream`], and a digest mismatch after a complete
/// decode is [`Error::ChecksumMismatch`].
pub fn decode_chunk(
    desc: &ChunkDescriptor<'_>,
    bytes: Vec<u8>,
    table_bits: u32,
) -> Result<Vec<u8>> {
    let chunk_index = desc.index;

    if desc.stored_raw {
        if bytes.len() != desc.original_size as usize {
            return Err(Error::BadFormat("stored-raw chunk size mismatch"));
        }
        if sha256(&bytes) != *desc.sha256 {
            return Err(Error::ChecksumMismatch { chunk_index });
        }
        return Ok(bytes);
    }

    let lengths = narrow_lengths(desc.code_lengths, chunk_index)?;
    let table =
        DecodeTable::new(&lengths, table_bits).map_err(|_| Error::InvalidCode { chunk_index })?;

    let mut out = Vec::with_capacity(desc.original_size as usize);
    let mut r = BitReader::new(&bytes);
    let bit_len = r.bit_len();
    for _ in 0..desc.original_size {
        // Zero padding can only complete the final byte; needing a symbol
        // with the cursor already past the end means the metadata lied
        // about the body size.
        if r.bit_pos() >= bit_len {
            return Err(Error::TruncatedBitstream { chunk_index });
        }
        match table.decode(&mut r) {
            Some(sym) => out.push(sym),
            None => return Err(Error::InvalidCode { chunk_index }),
        }
    }

    if sha256(&out) != *desc.sha256 {
        return Err(Error::ChecksumMismatch { chunk_index });
    }
    Ok(out)
}

/// Narrows stored `u16` length fields to the in-memory table, rejecting
/// anything above [`MODEL_MAX_CODE_LEN`] as undecodable for this chunk.
fn narrow_lengths(stored: &[u16; SYMBOL_COUNT], chunk_index: u32) -> Result<CodeLengths> {
    let mut lengths = [0u8; SYMBOL_COUNT];
    for (s, &v) in stored.iter().enumerate() {
        if v > MODEL_MAX_CODE_LEN as u16 {
            return Err(Error::InvalidCode { chunk_index });
        }
        lengths[s] = v as u8;
    }
    Ok(lengths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::encode::{encode_chunk, EncodeParams};
    use crate::freq::ScalarBackend;

    fn encode(data: &[u8], allow_raw: bool) -> crate::chunk::EncodedChunk {
        encode_chunk(
            0,
            0,
            data.to_vec(),
            &EncodeParams {
                max_code_len: 12,
                allow_store_uncompressed: allow_raw,
                backend: &ScalarBackend,
            },
        )
        .unwrap()
    }

    fn widen(lengths: &CodeLengths) -> [u16; SYMBOL_COUNT] {
        let mut out = [0u16; SYMBOL_COUNT];
        for (o, &l) in out.iter_mut().zip(lengths.iter()) {
            *o = l as u16;
        }
        out
    }

    fn roundtrip(data: &[u8]) {
        let enc = encode(data, true);
        let stored = widen(&enc.code_lengths);
        let desc = ChunkDescriptor {
            index: 0,
            original_size: enc.original_size,
            code_lengths: &stored,
            stored_raw: enc.stored_raw,
            sha256: &enc.sha256,
        };
        let out = decode_chunk(&desc, enc.bytes.clone(), 12).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn round_trips_text_and_degenerate_inputs() {
        roundtrip(b"the quick brown fox jumps over the lazy dog");
        roundtrip(&[0u8; 10_000]);
        roundtrip(&[0xAB; 1]);
        roundtrip(b"");
        let mixed: Vec<u8> = (0..50_000u32).map(|i| (i * i % 251) as u8).collect();
        roundtrip(&mixed);
    }

    #[test]
    fn stored_raw_round_trips_without_recoding() {
        let data: Vec<u8> = (0u8..=255).collect();
        let enc = encode(&data, true);
        assert!(enc.stored_raw);
        let stored = widen(&enc.code_lengths);
        let desc = ChunkDescriptor {
            index: 0,
            original_size: enc.original_size,
            code_lengths: &stored,
            stored_raw: true,
            sha256: &enc.sha256,
        };
        assert_eq!(decode_chunk(&desc, enc.bytes.clone(), 12).unwrap(), data);
    }

    #[test]
    fn tampered_digest_is_a_checksum_mismatch() {
        let data = b"checksums are not optional".to_vec();
        let enc = encode(&data, true);
        let stored = widen(&enc.code_lengths);
        let mut bad_sha = enc.sha256;
        bad_sha[0] ^= 0x01;
        let desc = ChunkDescriptor {
            index: 9,
            original_size: enc.original_size,
            code_lengths: &stored,
            stored_raw: false,
            sha256: &bad_sha,
        };
        let err = decode_chunk(&desc, enc.bytes, 12).unwrap_err();
        assert!(matches!(err, Error::ChecksumMismatch { chunk_index: 9 }));
    }

    #[test]
    fn truncated_body_never_decodes_silently() {
        let data = vec![0u8; 4096];
        let enc = encode(&data, true);
        let stored = widen(&enc.code_lengths);
        let desc = ChunkDescriptor {
            index: 2,
            original_size: enc.original_size,
            code_lengths: &stored,
            stored_raw: false,
            sha256: &enc.sha256,
        };
        let half = enc.bytes[..enc.bytes.len() / 2].to_vec();
        let err = decode_chunk(&desc, half, 12).unwrap_err();
        assert!(matches!(
            err,
            Error::TruncatedBitstream { chunk_index: 2 }
                | Error::InvalidCode { chunk_index: 2 }
                | Error::ChecksumMismatch { chunk_index: 2 }
        ));
    }

    #[test]
    fn oversized_stored_length_is_invalid_code() {
        let data = b"abc".to_vec();
        let enc = encode(&data, true);
        let mut stored = widen(&enc.code_lengths);
        stored[b'a' as usize] = 33;
        let desc = ChunkDescriptor {
            index: 5,
            original_size: enc.original_size,
            code_lengths: &stored,
            stored_raw: false,
            sha256: &enc.sha256,
        };
        let err = decode_chunk(&desc, enc.bytes, 12).unwrap_err();
        assert!(matches!(err, Error::InvalidCode { chunk_index: 5 }));
    }

    #[test]
    fn flipped_body_bit_fails_loudly() {
        let mut data = Vec::new();
        for i in 0..2048u32 {
            data.push((i % 7) as u8 * 31);
        }
        let enc = encode(&data, true);
        let stored = widen(&enc.code_lengths);
        for flip in [0usize, 3, 100, 1000] {
            let mut bytes = enc.bytes.clone();
            if flip >= bytes.len() * 8 {
                continue;
            }
            bytes[flip / 8] ^= 0x80 >> (flip % 8);
            let desc = ChunkDescriptor {
                index: 1,
                original_size: enc.original_size,
                code_lengths: &stored,
                stored_raw: false,
                sha256: &enc.sha256,
            };
            let err = decode_chunk(&desc, bytes, 12).unwrap_err();
            assert!(matches!(
                err,
                Error::InvalidCode { .. }
                    | Error::ChecksumMismatch { .. }
                    | Error::TruncatedBitstream { .. }
            ));
        }
    }
}
