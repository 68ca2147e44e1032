//! E2E: corruption detection.
//!
//! A flipped bit anywhere in a chunk's body must surface as `InvalidCode`
//! or `ChecksumMismatch` for that chunk — never as silently wrong output.
//! Footer-level damage must surface as `BadFormat`.

use std::fs;
use std::path::{Path, PathBuf};

use dcz::{compress, decompress, read_info, Error, Options};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

fn build(dir: &TempDir, data: &[u8], opts: &Options) -> PathBuf {
    let src = dir.path().join("src.bin");
    let dcz = dir.path().join("src.dcz");
    fs::write(&src, data).unwrap();
    compress(&src, &dcz, opts).unwrap();
    dcz
}

fn decompress_corrupted(dcz: &Path, bytes: &[u8]) -> Error {
    let mangled = dcz.with_extension("mangled");
    fs::write(&mangled, bytes).unwrap();
    let out = dcz.with_extension("out");
    let err = decompress(&mangled, &out, &Options::default()).unwrap_err();
    assert!(!out.exists(), "partial output left behind");
    err
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario: single corrupted bit near the end of the file
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn bit_flip_near_the_container_tail_fails_on_the_last_chunk() {
    let dir = TempDir::new().unwrap();
    let data = vec![0u8; 1_048_576];
    let dcz = build(&dir, &data, &Options::default());
    let mut bytes = fs::read(&dcz).unwrap();

    // Bit offset (file_size - 9) * 8 - 17, as counted from the file start.
    let bit = (bytes.len() as u64 - 9) * 8 - 17;
    bytes[(bit / 8) as usize] ^= 0x80 >> (bit % 8);

    let last = read_info(&dcz).unwrap().footer.chunks.len() as u32 - 1;
    let err = decompress_corrupted(&dcz, &bytes);
    assert!(
        matches!(
            err,
            Error::ChecksumMismatch { chunk_index } | Error::InvalidCode { chunk_index }
                if chunk_index == last
        ),
        "unexpected error: {}",
        err
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Sampled bit flips across every chunk body
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn sampled_body_bit_flips_always_fail_loudly() {
    let dir = TempDir::new().unwrap();
    let mut rng = StdRng::seed_from_u64(0xF11B);
    let data: Vec<u8> = (0..300_000usize)
        .map(|_| if rng.gen_ratio(3, 4) { b'a' } else { rng.gen_range(b'b'..=b'z') })
        .collect();
    let mut opts = Options::default();
    opts.chunk_size_bytes = 64 * 1024;
    let dcz = build(&dir, &data, &opts);
    let pristine = fs::read(&dcz).unwrap();
    let info = read_info(&dcz).unwrap();

    for _ in 0..24 {
        let m = &info.footer.chunks[rng.gen_range(0..info.footer.chunks.len())];
        // Skip the final body byte: its padding bits are never decoded.
        let body_bytes = (m.compressed_size as u64).saturating_sub(1);
        if body_bytes == 0 {
            continue;
        }
        let byte = m.compressed_offset + rng.gen_range(0..body_bytes);
        let mask = 0x80u8 >> rng.gen_range(0..8);

        let mut bytes = pristine.clone();
        bytes[byte as usize] ^= mask;
        let err = decompress_corrupted(&dcz, &bytes);
        assert!(
            matches!(
                err,
                Error::InvalidCode { chunk_index }
                    | Error::ChecksumMismatch { chunk_index }
                    | Error::TruncatedBitstream { chunk_index }
                    if chunk_index == m.index
            ),
            "flip at byte {} of chunk {}: unexpected error {}",
            byte,
            m.index,
            err
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Footer-level damage
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn truncated_containers_are_bad_format() {
    let dir = TempDir::new().unwrap();
    let dcz = build(&dir, &vec![1u8; 100_000], &Options::default());
    let bytes = fs::read(&dcz).unwrap();

    for keep in [0usize, 7, 40, bytes.len() - 4, bytes.len() - 1] {
        let err = decompress_corrupted(&dcz, &bytes[..keep]);
        assert!(matches!(err, Error::BadFormat(_)), "keep={}: {}", keep, err);
    }
}

#[test]
fn corrupt_magic_is_bad_format() {
    let dir = TempDir::new().unwrap();
    let dcz = build(&dir, &vec![2u8; 50_000], &Options::default());
    let info = read_info(&dcz).unwrap();
    let mut bytes = fs::read(&dcz).unwrap();
    bytes[info.footer_offset as usize] ^= 0xFF;
    assert!(matches!(decompress_corrupted(&dcz, &bytes), Error::BadFormat(_)));
}

#[test]
fn corrupt_footer_pointer_is_bad_format() {
    let dir = TempDir::new().unwrap();
    let dcz = build(&dir, &vec![3u8; 50_000], &Options::default());
    let pristine = fs::read(&dcz).unwrap();

    for bit in [0u32, 17, 63] {
        let mut bytes = pristine.clone();
        let at = bytes.len() - 8 + (bit / 8) as usize;
        bytes[at] ^= 0x80 >> (bit % 8);
        let err = decompress_corrupted(&dcz, &bytes);
        assert!(matches!(err, Error::BadFormat(_)), "bit={}: {}", bit, err);
    }
}

#[test]
fn tampered_chunk_digest_breaks_the_checksum_chain() {
    let dir = TempDir::new().unwrap();
    let dcz = build(&dir, &vec![4u8; 80_000], &Options::default());
    let info = read_info(&dcz).unwrap();
    let mut bytes = fs::read(&dcz).unwrap();
    // sha256 field sits 28 bytes into the first chunk entry; the entry
    // array starts after the fixed header + filename.
    let entry = info.footer_offset as usize + 68 + info.footer.filename.len();
    bytes[entry + 28] ^= 0x01;
    let err = decompress_corrupted(&dcz, &bytes);
    assert!(matches!(
        err,
        Error::BadFormat("container checksum chain mismatch")
    ));
}

#[test]
fn oversized_stored_length_is_rejected_per_chunk() {
    let dir = TempDir::new().unwrap();
    let dcz = build(&dir, &vec![5u8; 80_000], &Options::default());
    let info = read_info(&dcz).unwrap();
    let mut bytes = fs::read(&dcz).unwrap();
    // Length field of symbol 200 in chunk 0: entry offset 60 + 2*200.
    let entry = info.footer_offset as usize + 68 + info.footer.filename.len();
    let at = entry + 60 + 2 * 200;
    bytes[at..at + 2].copy_from_slice(&300u16.to_be_bytes());
    let err = decompress_corrupted(&dcz, &bytes);
    assert!(matches!(err, Error::InvalidCode { chunk_index: 0 }), "{}", err);
}
