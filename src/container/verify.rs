//! Container verification and metadata listing.

use std::fs::File;
use std::path::Path;
use std::time::Instant;

use log::{debug, warn};

use crate::chunk::decode_chunk;
use crate::container::decompress::{read_container, validate_geometry};
use crate::container::file_io::read_exact_at;
use crate::container::footer::Footer;
use crate::container::opts::{Metrics, Options, VerifyMode};
use crate::error::{Error, Result};
use crate::pipeline;

/// Parsed container metadata, exposed without decoding anything.
#[derive(Debug, Clone)]
pub struct ContainerInfo {
    /// Total container size on disk.
    pub file_size: u64,
    /// Where the footer region begins; equals the body length.
    pub footer_offset: u64,
    pub footer: Footer,
}

/// Reads a container's footer for listing purposes.
pub fn read_info(path: &Path) -> Result<ContainerInfo> {
    let file = File::open(path)?;
    let (footer, footer_offset, file_size) = read_container(&file)?;
    Ok(ContainerInfo {
        file_size,
        footer_offset,
        footer,
    })
}

/// Checks a container without producing output.
///
/// Structural validation (footer layout, chunk geometry, checksum chain)
/// always runs. [`VerifyMode::Full`] additionally re-decodes every chunk and
/// compares it against its stored SHA-256; every failing chunk is logged,
/// and the first failure (in chunk order) is returned after the whole walk.
pub fn verify(path: &Path, opts: &Options) -> Result<Metrics> {
    opts.validate()?;
    let started = Instant::now();

    let file = File::open(path)?;
    let (footer, body_len, file_size) = read_container(&file)?;
    validate_geometry(&footer, body_len)?;
    let chunk_count = footer.chunks.len() as u32;
    let workers = opts.effective_worker_count();
    debug!(
        "verify({:?}): {} chunk(s), mode {:?}",
        path, chunk_count, opts.verify_mode
    );

    if opts.verify_mode == VerifyMode::Full {
        let mut failures: Vec<Error> = Vec::new();
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
                read_exact_at(&file, &mut buf, m.compressed_offset).map_err(Error::Io)?;
                // Chunk-level corruption is a per-chunk verdict, not an
                // abort: the walk covers every chunk.
                match decode_chunk(&m.descriptor(), buf, opts.decode_table_bits) {
                    Ok(_) => Ok(None),
                    Err(e @ Error::Io(_)) => Err(e),
                    Err(e) => Ok(Some(e)),
                }
            },
            |idx, verdict| {
                if let Some(e) = verdict {
                    warn!("chunk {} failed verification: {}", idx, e);
                    failures.push(e);
                }
                if let Some(progress) = &opts.progress {
                    progress(idx + 1, chunk_count);
                }
                Ok(())
            },
        )?;
        if let Some(first) = failures.into_iter().next() {
            return Err(first);
        }
    }

    Ok(Metrics {
        original_bytes: footer.original_size,
        compressed_bytes: file_size,
        chunk_count,
        worker_count: workers,
        elapsed: started.elapsed(),
    })
}
