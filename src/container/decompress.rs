//! Container reading and whole-file decompression.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use log::debug;

use crate::chunk::decode_chunk;
use crate::container::file_io::{file_size, read_exact_at, set_mtime_unix_ms};
use crate::container::footer::{Footer, FIXED_FOOTER_SIZE, FOOTER_POINTER_SIZE};
use crate::container::opts::{Metrics, Options};
use crate::error::{Error, Result};
use crate::pipeline;
use crate::sha256::chain_digest;

/// Locates, parses, and structurally validates a container's footer.
///
/// Returns the footer together with the footer region's offset (which is
/// also the body length, since the body starts at file offset 0) and the
/// total file size. A zero footer offset is the legal zero-chunk case.
pub fn read_container(file: &File) -> Result<(Footer, u64, u64)> {
    let size = file_size(file)?;
    let min_total = (FIXED_FOOTER_SIZE + FOOTER_POINTER_SIZE) as u64;
    if size < min_total {
        return Err(Error::BadFormat("file too small to be a container"));
    }

    let mut ptr = [0u8; FOOTER_POINTER_SIZE];
    read_exact_at(file, &mut ptr, size - FOOTER_POINTER_SIZE as u64)?;
    let footer_start = u64::from_be_bytes(ptr);
    let footer_end = size - FOOTER_POINTER_SIZE as u64;
    if footer_start > footer_end - FIXED_FOOTER_SIZE as u64 {
        return Err(Error::BadFormat("footer pointer out of range"));
    }

    let mut buf = vec![0u8; (footer_end - footer_start) as usize];
    read_exact_at(file, &mut buf, footer_start)?;
    let footer = Footer::parse(&buf)?;
    Ok((footer, footer_start, size))
}

/// Cross-checks chunk metadata against the file geometry: chunk grid,
/// body bounds, stored-raw sizing, and the container checksum chain.
pub(crate) fn validate_geometry(footer: &Footer, body_len: u64) -> Result<()> {
    let chunk_size = footer.chunk_size as u64;
    if footer.original_size > 0 && chunk_size == 0 {
        return Err(Error::BadFormat("zero chunk size with non-empty content"));
    }
    let expected_chunks = if footer.original_size == 0 {
        0
    } else {
        (footer.original_size + chunk_size - 1) / chunk_size
    };
    if footer.chunks.len() as u64 != expected_chunks {
        return Err(Error::BadFormat("chunk count does not cover the file"));
    }

    for m in &footer.chunks {
        let is_last = m.index as u64 == expected_chunks - 1;
        if m.original_offset != m.index as u64 * chunk_size {
            return Err(Error::BadFormat("chunk offset off the chunk grid"));
        }
        let expected_size = if is_last {
            footer.original_size - m.original_offset
        } else {
            chunk_size
        };
        if m.original_size as u64 != expected_size {
            return Err(Error::BadFormat("chunk size off the chunk grid"));
        }
        let end = m
            .compressed_offset
            .checked_add(m.compressed_size as u64)
            .ok_or(Error::BadFormat("chunk body offset overflow"))?;
        if end > body_len {
            return Err(Error::BadFormat("chunk body out of range"));
        }
        if m.stored_raw && m.compressed_size != m.original_size {
            return Err(Error::BadFormat("stored-raw chunk size mismatch"));
        }
    }

    if chain_digest(footer.chunks.iter().map(|m| &m.sha256)) != footer.global_sha256 {
        return Err(Error::BadFormat("container checksum chain mismatch"));
    }
    Ok(())
}

/// Decompresses a `.dcz` container back into the original bytes.
///
/// Chunks decode concurrently; decoded bytes land at their original offsets
/// by draining in ascending chunk order into a sequential writer. The stored
/// modification time is restored on success; on failure no partial output
/// remains.
pub fn decompress(input: &Path, output: &Path, opts: &Options) -> Result<Metrics> {
    opts.validate()?;
    let started = Instant::now();

    let in_file = File::open(input)?;
    let (footer, body_len, container_size) = read_container(&in_file)?;
    validate_geometry(&footer, body_len)?;
    let chunk_count = footer.chunks.len() as u32;
    let workers = opts.effective_worker_count();
    debug!(
        "decompress: {} chunk(s), {} bytes original, {} worker(s)",
        chunk_count, footer.original_size, workers
    );

    let out_file = File::create(output)?;
    let result = write_output(&in_file, out_file, &footer, chunk_count, workers, opts);
    match result {
        Ok(()) => {
            let _ = set_mtime_unix_ms(output, footer.original_mtime_ms);
            Ok(Metrics {
                original_bytes: footer.original_size,
                compressed_bytes: container_size,
                chunk_count,
                worker_count: workers,
                elapsed: started.elapsed(),
            })
        }
        Err(e) => {
            let _ = fs::remove_file(output);
            Err(e)
        }
    }
}

fn write_output(
    in_file: &File,
    out_file: File,
    footer: &Footer,
    chunk_count: u32,
    workers: usize,
    opts: &Options,
) -> Result<()> {
    let mut writer = BufWriter::new(out_file);
    let mut written: u64 = 0;

    pipeline::run_ordered(
        chunk_count,
        workers,
        opts.cancel.as_ref(),
        |idx| {
            if let Some(hook) = &opts.chunk_start_hook {
                hook(idx);
            }
            let m = &footer.chunks[idx as usize];
            let mut buf = vec![0u8; m.compressed_size as usize];
            read_exact_at(in_file, &mut buf, m.compressed_offset).map_err(Error::Io)?;
            decode_chunk(&m.descriptor(), buf, opts.decode_table_bits)
        },
        |idx, data| {
            writer.write_all(&data)?;
            written += data.len() as u64;
            if let Some(progress) = &opts.progress {
                progress(idx + 1, chunk_count);
            }
            Ok(())
        },
    )?;

    writer.flush()?;
    debug_assert_eq!(written, footer.original_size);
    Ok(())
}
