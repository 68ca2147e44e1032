//! Byte-frequency histograms.
//!
//! The chunk encoder depends only on the [`Histogrammer`] trait; scalar and
//! multi-threaded implementations are shipped here, and an accelerator
//! backend would plug into the same seam. Every implementation must be pure
//! and bit-exact: for identical input slices, identical 256-bin counts.
//! Container bytes are therefore independent of the backend choice.

use rayon::prelude::*;

/// Number of distinct byte symbols.
pub const SYMBOL_COUNT: usize = 256;

/// Occurrence counts for each byte value in one chunk.
pub type Histogram = [u64; SYMBOL_COUNT];

/// A byte-histogram producer.
///
/// Contract: `histogram(data)[s]` equals the number of bytes in `data` equal
/// to `s`, the counts sum to `data.len()`, and the call is pure and safe to
/// issue concurrently.
pub trait Histogrammer: Send + Sync {
    fn histogram(&self, data: &[u8]) -> Histogram;
}

/// Convenience scalar histogram.
pub fn histogram(data: &[u8]) -> Histogram {
    let mut h = [0u64; SYMBOL_COUNT];
    for &b in data {
        h[b as usize] += 1;
    }
    h
}

fn merge(dst: &mut Histogram, src: &Histogram) {
    for (d, s) in dst.iter_mut().zip(src.iter()) {
        *d += *s;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Backends
// ─────────────────────────────────────────────────────────────────────────────

/// Single-threaded counting, one pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarBackend;

impl Histogrammer for ScalarBackend {
    fn histogram(&self, data: &[u8]) -> Histogram {
        histogram(data)
    }
}

/// Divide-and-conquer counting over the rayon pool: fixed sub-slices are
/// counted independently and the 256-bin partials merged element-wise.
/// Addition of exact counts commutes, so the result is bit-identical to
/// [`ScalarBackend`] regardless of split or scheduling.
#[derive(Debug, Clone, Copy)]
pub struct ParallelBackend {
    /// Inputs below this size take the scalar path; splitting tiny slices
    /// costs more than it saves.
    pub min_parallel_len: usize,
}

/// Sub-slice granularity for the parallel backend.
const PAR_SLICE: usize = 1 << 20;

impl Default for ParallelBackend {
    fn default() -> Self {
        ParallelBackend {
            min_parallel_len: 4 * PAR_SLICE,
        }
    }
}

impl Histogrammer for ParallelBackend {
    fn histogram(&self, data: &[u8]) -> Histogram {
        if data.len() < self.min_parallel_len {
            return histogram(data);
        }
        data.par_chunks(PAR_SLICE)
            .map(histogram)
            .reduce(
                || [0u64; SYMBOL_COUNT],
                |mut acc, part| {
                    merge(&mut acc, &part);
                    acc
                },
            )
    }
}

/// Backend selector carried in [`Options`](crate::Options).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    Scalar,
    #[default]
    Parallel,
}

static SCALAR: ScalarBackend = ScalarBackend;
static PARALLEL: ParallelBackend = ParallelBackend {
    min_parallel_len: 4 * PAR_SLICE,
};

impl Backend {
    /// The shared implementation behind this selector.
    pub fn histogrammer(&self) -> &'static dyn Histogrammer {
        match self {
            Backend::Scalar => &SCALAR,
            Backend::Parallel => &PARALLEL,
        }
    }
}
