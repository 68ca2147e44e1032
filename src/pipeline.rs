//! Bounded worker pool with in-order draining.
//!
//! One engine drives compression, decompression, and verification: a feeder
//! admits chunk indices through a bounded channel, a fixed pool of OS
//! threads runs the per-chunk job, and the calling thread drains results in
//! ascending index order. A bounded token channel acts as the admission
//! semaphore; a token is returned only when a chunk has been drained, so at
//! most `workers` chunks are admitted-but-unwritten at any moment and memory
//! stays bounded by `workers × chunk_size`.
//!
//! The first error is sticky: a failing worker flips the shared flag, the
//! feeder stops admitting, in-flight results are discarded, and the error is
//! returned once every worker has joined. Output-side (drain) errors take
//! precedence over worker errors when both occur.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError};

use crate::error::{Error, Result};

/// Hard ceiling on explicitly requested worker counts.
pub const MAX_WORKERS: usize = 64;

/// Auto-sizing bounds: the pool never defaults below 2 or above 8 threads.
pub const MIN_AUTO_WORKERS: usize = 2;
pub const MAX_AUTO_WORKERS: usize = 8;

/// Feeder poll interval while the pool is saturated.
const ADMIT_POLL: Duration = Duration::from_millis(20);

/// Resolves the worker-pool size: explicit requests are clamped to
/// `1..=`[`MAX_WORKERS`], otherwise the hardware parallelism clamped to
/// `2..=8`.
pub fn worker_count(requested: Option<usize>) -> usize {
    match requested {
        Some(n) => n.clamp(1, MAX_WORKERS),
        None => thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .clamp(MIN_AUTO_WORKERS, MAX_AUTO_WORKERS),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cancellation
// ─────────────────────────────────────────────────────────────────────────────

/// Caller-side cancellation handle, checked at chunk granularity — never
/// mid-encode of a single chunk.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; the running operation returns
    /// [`Error::Cancelled`] after in-flight chunks settle.
    pub fn cancel(&self) {
        self.inner.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::Relaxed)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Ordered pipeline
// ─────────────────────────────────────────────────────────────────────────────

/// Runs `job` for indices `0..count` on `workers` threads and hands each
/// result to `drain` in ascending index order on the calling thread.
///
/// Completion order is unconstrained; a `BTreeMap` buffers out-of-order
/// results and the contiguous prefix is drained as it forms.
pub fn run_ordered<T, J, D>(
    count: u32,
    workers: usize,
    cancel: Option<&CancelToken>,
    job: J,
    mut drain: D,
) -> Result<()>
where
    T: Send,
    J: Fn(u32) -> Result<T> + Sync,
    D: FnMut(u32, T) -> Result<()>,
{
    let externally_cancelled = || cancel.map(CancelToken::is_cancelled).unwrap_or(false);
    if count == 0 {
        return if externally_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        };
    }
    let workers = workers.clamp(1, MAX_WORKERS).min(count as usize);

    let failed = AtomicBool::new(false);
    let (slot_tx, slot_rx) = bounded::<()>(workers);
    for _ in 0..workers {
        slot_tx.send(()).expect("fresh slot channel rejected a token");
    }
    let (job_tx, job_rx) = bounded::<u32>(workers);
    let (res_tx, res_rx) = bounded::<(u32, Result<T>)>(workers);

    let mut first_worker_err: Option<Error> = None;
    let mut first_drain_err: Option<Error> = None;
    let mut next_index: u32 = 0;

    thread::scope(|s| {
        let failed = &failed;
        let job = &job;
        let externally_cancelled = &externally_cancelled;

        // Feeder: one admission token per chunk index. Polling lets it
        // notice failure/cancellation even while the pool is saturated;
        // dropping `job_tx` is what releases the workers.
        s.spawn(move || {
            for idx in 0..count {
                loop {
                    if failed.load(Ordering::Relaxed) || externally_cancelled() {
                        return;
                    }
                    match slot_rx.recv_timeout(ADMIT_POLL) {
                        Ok(()) => break,
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => return,
                    }
                }
                if job_tx.send(idx).is_err() {
                    return;
                }
            }
        });

        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let res_tx = res_tx.clone();
            s.spawn(move || {
                while let Ok(idx) = job_rx.recv() {
                    // Already-admitted indices are skipped, not worked,
                    // once the run is doomed.
                    if failed.load(Ordering::Relaxed) || externally_cancelled() {
                        continue;
                    }
                    let result = job(idx);
                    if result.is_err() {
                        failed.store(true, Ordering::Relaxed);
                    }
                    if res_tx.send((idx, result)).is_err() {
                        return;
                    }
                }
            });
        }
        drop(job_rx);
        drop(res_tx);

        // Drain loop, on the calling thread. Tokens go back per settled
        // chunk; chunks stuck behind a gap keep theirs, which is what
        // bounds the reorder buffer.
        let mut pending: BTreeMap<u32, T> = BTreeMap::new();
        while let Ok((idx, result)) = res_rx.recv() {
            match result {
                Err(e) => {
                    if first_worker_err.is_none() {
                        first_worker_err = Some(e);
                    }
                    let _ = slot_tx.send(());
                }
                Ok(_) if first_worker_err.is_some() || first_drain_err.is_some() => {
                    let _ = slot_tx.send(());
                }
                Ok(value) => {
                    pending.insert(idx, value);
                    while let Some(entry) = pending.first_entry() {
                        if *entry.key() != next_index {
                            break;
                        }
                        let value = entry.remove();
                        let _ = slot_tx.send(());
                        if let Err(e) = drain(next_index, value) {
                            first_drain_err = Some(e);
                            failed.store(true, Ordering::Relaxed);
                            break;
                        }
                        next_index += 1;
                    }
                }
            }
        }
    });

    if let Some(e) = first_drain_err {
        return Err(e);
    }
    if let Some(e) = first_worker_err {
        return Err(e);
    }
    if externally_cancelled() {
        return Err(Error::Cancelled);
    }
    debug_assert_eq!(next_index, count);
    Ok(())
}
