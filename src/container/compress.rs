//! Whole-file compression: chunks in, `.dcz` container out.

use std::cmp::min;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use log::debug;

use crate::chunk::{encode_chunk, EncodeParams, EncodedChunk};
use crate::container::file_io::{mtime_unix_ms, read_exact_at};
use crate::container::footer::{ChunkMeta, Footer};
use crate::container::opts::{Metrics, Options};
use crate::error::{Error, Result};
use crate::freq::SYMBOL_COUNT;
use crate::pipeline;
use crate::sha256::chain_digest;

/// Compresses `input` into a `.dcz` container at `output`.
///
/// Workers read and encode chunks concurrently; the container body is
/// written strictly in ascending chunk order, so the output bytes are
/// identical for any worker count and any frequency backend. On failure no
/// partial output remains.
pub fn compress(input: &Path, output: &Path, opts: &Options) -> Result<Metrics> {
    opts.validate()?;
    let started = Instant::now();

    let in_file = File::open(input)?;
    let in_meta = in_file.metadata()?;
    let original_size = in_meta.len();
    let chunk_size = opts.chunk_size_bytes as u64;
    let chunk_count64 = (original_size + chunk_size - 1) / chunk_size;
    if chunk_count64 > u32::MAX as u64 {
        return Err(Error::InvalidOptions("chunk size too small for this input"));
    }
    let chunk_count = chunk_count64 as u32;
    let workers = opts.effective_worker_count();
    debug!(
        "compress: {} bytes in {} chunk(s) of {} bytes, {} worker(s)",
        original_size, chunk_count, chunk_size, workers
    );

    let out_file = File::create(output)?;
    let result = write_container(
        &in_file,
        out_file,
        input,
        &in_meta,
        original_size,
        chunk_count,
        workers,
        opts,
    );
    match result {
        Ok(compressed_bytes) => {
            debug!(
                "compress: wrote {} bytes ({:.2}%)",
                compressed_bytes,
                compressed_bytes as f64 / original_size.max(1) as f64 * 100.0
            );
            Ok(Metrics {
                original_bytes: original_size,
                compressed_bytes,
                chunk_count,
                worker_count: workers,
                elapsed: started.elapsed(),
            })
        }
        Err(e) => {
            // Never leave a partial container behind.
            let _ = fs::remove_file(output);
            Err(e)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn write_container(
    in_file: &File,
    out_file: File,
    input: &Path,
    in_meta: &fs::Metadata,
    original_size: u64,
    chunk_count: u32,
    workers: usize,
    opts: &Options,
) -> Result<u64> {
    let chunk_size = opts.chunk_size_bytes as u64;
    let encode_params = EncodeParams {
        max_code_len: opts.max_code_len,
        allow_store_uncompressed: opts.allow_store_uncompressed,
        backend: opts.backend.histogrammer(),
    };

    let mut writer = BufWriter::new(out_file);
    let mut metas: Vec<ChunkMeta> = Vec::with_capacity(chunk_count as usize);
    let mut body_offset: u64 = 0;

    pipeline::run_ordered(
        chunk_count,
        workers,
        opts.cancel.as_ref(),
        |idx| {
            if let Some(hook) = &opts.chunk_start_hook {
                hook(idx);
            }
            let offset = idx as u64 * chunk_size;
            let size = min(chunk_size, original_size - offset) as usize;
            let mut buf = vec![0u8; size];
            read_exact_at(in_file, &mut buf, offset).map_err(Error::Io)?;
            encode_chunk(idx, offset, buf, &encode_params)
        },
        |idx, enc: EncodedChunk| {
            writer.write_all(&enc.bytes)?;
            let mut code_lengths = [0u16; SYMBOL_COUNT];
            for (slot, &l) in code_lengths.iter_mut().zip(enc.code_lengths.iter()) {
                *slot = l as u16;
            }
            metas.push(ChunkMeta {
                index: idx,
                original_offset: enc.original_offset,
                original_size: enc.original_size,
                compressed_offset: body_offset,
                compressed_size: enc.bytes.len() as u32,
                sha256: enc.sha256,
                code_lengths,
                stored_raw: enc.stored_raw,
            });
            body_offset += enc.bytes.len() as u64;
            if let Some(progress) = &opts.progress {
                progress(idx + 1, chunk_count);
            }
            Ok(())
        },
    )?;

    let footer = Footer {
        filename: input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        original_size,
        original_mtime_ms: mtime_unix_ms(in_meta),
        chunk_size: opts.chunk_size_bytes,
        global_sha256: chain_digest(metas.iter().map(|m| &m.sha256)),
        chunks: metas,
    };
    let footer_bytes = footer.to_bytes();
    writer.write_all(&footer_bytes)?;
    writer.write_all(&body_offset.to_be_bytes())?;
    writer.flush()?;

    Ok(body_offset + footer_bytes.len() as u64 + 8)
}
