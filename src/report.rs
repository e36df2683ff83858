//! Redundancy across several candidate block sizes.
//!
//! Each size gets its own [`BlockIndex`] and its own scan over the same new
//! stream; nothing is shared between sizes.

use crate::{BlockIndex, MatchScanner};
use log::debug;
use std::cmp::Ordering;
use std::fmt;
use std::num::NonZeroUsize;
use thiserror::Error;

/// Block sizes tried when the caller does not pick any.
pub const DEFAULT_BLOCK_SIZES: [usize; 5] = [512, 1024, 2048, 4096, 8192];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("block size must be positive (candidate #{position})")]
    ZeroBlockSize { position: usize },
    #[error("no candidate block sizes given")]
    NoBlockSizes,
    #[error("invalid chunk sizes: min {min}, avg {avg}, max {max}")]
    ChunkSizes { min: u32, avg: u32, max: u32 },
}

/// Outcome of one block size.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SizeReport {
    pub block_size: usize,
    pub matched_bytes: usize,
    pub literal_bytes: usize,
    pub total_bytes: usize,
    /// `matched_bytes / total_bytes`, in `[0, 1]`.
    pub redundancy: f64,
}

impl SizeReport {
    #[must_use]
    pub fn percent(&self) -> f64 {
        self.redundancy * 100.0
    }

    /// Orders by the exact `matched / total` ratio; an empty stream counts as 0.
    fn cmp_redundancy(&self, other: &Self) -> Ordering {
        let lhs = self.matched_bytes as u128 * other.total_bytes.max(1) as u128;
        let rhs = other.matched_bytes as u128 * self.total_bytes.max(1) as u128;
        lhs.cmp(&rhs)
    }
}

impl fmt::Display for SizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "block: {:>5} | matched: {:>8} | literal: {:>8} | total: {:>8} | redundancy: {:6.2}%",
            self.block_size,
            self.matched_bytes,
            self.literal_bytes,
            self.total_bytes,
            self.percent()
        )
    }
}

/// Reports for every candidate size, in the order the sizes were given.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Analysis {
    pub reports: Vec<SizeReport>,
}

impl Analysis {
    /// Highest redundancy; ties go to the smaller block size.
    #[must_use]
    pub fn best(&self) -> Option<&SizeReport> {
        self.reports.iter().reduce(|best, candidate| {
            let better = match candidate.cmp_redundancy(best) {
                Ordering::Greater => true,
                Ordering::Equal => candidate.block_size < best.block_size,
                Ordering::Less => false,
            };
            if better { candidate } else { best }
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

/// Indexes `basis` at `block_size` and scans `new` once.
#[must_use]
pub fn measure(basis: &[u8], new: &[u8], block_size: NonZeroUsize) -> SizeReport {
    let index = BlockIndex::build(basis, block_size);
    let result = MatchScanner::new(&index).scan(new);
    SizeReport {
        block_size: block_size.get(),
        matched_bytes: result.matched,
        literal_bytes: result.literal,
        total_bytes: result.total(),
        redundancy: result.redundancy(),
    }
}

fn validate(sizes: &[usize]) -> Result<Vec<NonZeroUsize>, ConfigError> {
    if sizes.is_empty() {
        return Err(ConfigError::NoBlockSizes);
    }
    sizes
        .iter()
        .enumerate()
        .map(|(position, &size)| {
            NonZeroUsize::new(size).ok_or(ConfigError::ZeroBlockSize { position })
        })
        .collect()
}

/// Measures every size in `sizes` against the same pair of streams.
///
/// # Errors
/// Returns [`ConfigError`] if `sizes` is empty or contains a zero, before
/// any scanning starts.
pub fn analyze(basis: &[u8], new: &[u8], sizes: &[usize]) -> Result<Analysis, ConfigError> {
    let sizes = validate(sizes)?;
    let reports = sizes
        .into_iter()
        .map(|block_size| measure(basis, new, block_size))
        .collect();
    let analysis = Analysis { reports };
    log_best(&analysis);
    Ok(analysis)
}

/// [`analyze`] over [`DEFAULT_BLOCK_SIZES`].
#[must_use]
pub fn analyze_default(basis: &[u8], new: &[u8]) -> Analysis {
    let reports = DEFAULT_BLOCK_SIZES
        .iter()
        .filter_map(|&size| NonZeroUsize::new(size))
        .map(|block_size| measure(basis, new, block_size))
        .collect();
    let analysis = Analysis { reports };
    log_best(&analysis);
    analysis
}

/// [`analyze`] with one size per rayon task. Output order matches `sizes`.
///
/// # Errors
/// Same as [`analyze`].
#[cfg(feature = "parallel")]
pub fn analyze_parallel(
    basis: &[u8],
    new: &[u8],
    sizes: &[usize],
) -> Result<Analysis, ConfigError> {
    use rayon::prelude::*;

    let sizes = validate(sizes)?;
    let reports = sizes
        .par_iter()
        .map(|&block_size| measure(basis, new, block_size))
        .collect();
    let analysis = Analysis { reports };
    log_best(&analysis);
    Ok(analysis)
}

fn log_best(analysis: &Analysis) {
    if let Some(best) = analysis.best() {
        debug!(
            "best of {} sizes: {} bytes at {:.2}%",
            analysis.len(),
            best.block_size,
            best.percent()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(block_size: usize, matched_bytes: usize, total_bytes: usize) -> SizeReport {
        SizeReport {
            block_size,
            matched_bytes,
            literal_bytes: total_bytes - matched_bytes,
            total_bytes,
            redundancy: matched_bytes as f64 / total_bytes.max(1) as f64,
        }
    }

    #[test]
    fn best_prefers_highest_redundancy() {
        let analysis = Analysis {
            reports: vec![report(512, 25, 100), report(1024, 75, 100), report(2048, 50, 100)],
        };
        assert_eq!(analysis.best().map(|r| r.block_size), Some(1024));
    }

    #[test]
    fn best_breaks_ties_on_smaller_block() {
        let analysis = Analysis {
            reports: vec![report(4096, 50, 100), report(1024, 50, 100), report(2048, 50, 100)],
        };
        assert_eq!(analysis.best().map(|r| r.block_size), Some(1024));
    }

    #[test]
    fn best_compares_exact_ratios() {
        // 1/3 and 2/6 are the same ratio even if the f64 rounding differed.
        let analysis = Analysis {
            reports: vec![report(2048, 2, 6), report(1024, 1, 3), report(4096, 0, 0)],
        };
        assert_eq!(analysis.best().map(|r| r.block_size), Some(1024));

        let empty_only = Analysis {
            reports: vec![report(8192, 0, 0), report(512, 0, 0)],
        };
        assert_eq!(empty_only.best().map(|r| r.block_size), Some(512));
    }

    #[test]
    fn best_of_empty_is_none() {
        assert!(Analysis::default().best().is_none());
    }

    #[test]
    fn validate_rejects_zero() {
        assert_eq!(
            validate(&[512, 0, 1024]),
            Err(ConfigError::ZeroBlockSize { position: 1 })
        );
        assert_eq!(validate(&[]), Err(ConfigError::NoBlockSizes));
    }

    #[test]
    fn display_renders_percent() {
        let line = report(1024, 50, 100).to_string();
        assert!(line.contains("1024"));
        assert!(line.contains("50.00%"));
    }
}
