//! Estimate how much of a new byte stream already exists in a basis stream,
//! using the rsync block-matching scheme: fixed-size basis blocks indexed by
//! a weak rolling checksum and a BLAKE3 strong digest, scanned byte by byte
//! over the new stream.
//!
//! ```
//! use std::num::NonZeroUsize;
//! use syncratio::{BlockIndex, MatchScanner};
//!
//! let basis = vec![7u8; 64];
//! let new = vec![7u8; 40];
//! let index = BlockIndex::build(&basis, NonZeroUsize::new(16).unwrap());
//! let result = MatchScanner::new(&index).scan(&new);
//! assert_eq!((result.matched, result.literal), (32, 8));
//! ```

pub mod cdc;
pub mod report;
pub mod rolling;

pub use cdc::{ChunkIndex, ChunkParams, ChunkReport, compare_chunks};
pub use report::{
    Analysis, ConfigError, DEFAULT_BLOCK_SIZES, SizeReport, analyze, analyze_default, measure,
};
pub use rolling::{RollingChecksum, weak_key};

#[cfg(feature = "parallel")]
pub use report::analyze_parallel;

use log::{debug, trace};
use std::collections::HashMap;
use std::num::NonZeroUsize;

/// 128-bit strong digest of `chunk`: the first 16 bytes of its BLAKE3 hash.
#[inline]
#[must_use]
pub fn strong_digest(chunk: &[u8]) -> u128 {
    let mut out = [0u8; 16];
    blake3::Hasher::new()
        .update(chunk)
        .finalize_xof()
        .fill(&mut out);
    u128::from_le_bytes(out)
}

/// One indexed basis block sharing a weak key with its bucket neighbours.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BlockEntry {
    /// Position of the block in the basis, counted in blocks.
    pub index: usize,
    pub strong: u128,
}

/// Fingerprint table of a basis stream for one block size.
///
/// Only whole blocks are indexed; a trailing remainder shorter than the
/// block size is dropped and can never be matched.
#[derive(Clone, Debug)]
pub struct BlockIndex {
    block_size: NonZeroUsize,
    block_count: usize,
    buckets: HashMap<u64, Vec<BlockEntry>>,
}

impl BlockIndex {
    /// Creates an empty index. Every byte scanned against it is literal.
    #[must_use]
    pub fn new(block_size: NonZeroUsize) -> Self {
        Self {
            block_size,
            block_count: 0,
            buckets: HashMap::new(),
        }
    }

    /// Partitions `basis` into non-overlapping blocks from offset 0 and
    /// indexes each one.
    #[must_use]
    pub fn build(basis: &[u8], block_size: NonZeroUsize) -> Self {
        let mut index = Self::new(block_size);
        let chunks = basis.chunks_exact(block_size.get());
        let discarded = chunks.remainder().len();

        for (block_index, chunk) in chunks.enumerate() {
            index.insert(weak_key(chunk), strong_digest(chunk), block_index);
        }

        debug!(
            "indexed {} blocks of {} bytes into {} buckets ({} tail bytes discarded)",
            index.block_count,
            block_size,
            index.buckets.len(),
            discarded
        );
        index
    }

    /// Appends a block to the bucket for `weak`, keeping insertion order.
    pub fn insert(&mut self, weak: u64, strong: u128, block_index: usize) {
        self.buckets.entry(weak).or_default().push(BlockEntry {
            index: block_index,
            strong,
        });
        self.block_count += 1;
    }

    /// Candidate blocks for a weak key, in basis order.
    #[must_use]
    pub fn candidates(&self, weak: u64) -> Option<&[BlockEntry]> {
        self.buckets.get(&weak).map(Vec::as_slice)
    }

    /// Verifies `window` against the bucket for `weak` and returns the
    /// first basis block with an equal strong digest.
    #[must_use]
    pub fn find(&self, weak: u64, window: &[u8]) -> Option<usize> {
        self.candidates(weak)
            .and_then(|entries| find_strong_hash(entries, strong_digest(window)))
    }

    #[must_use]
    pub fn block_size(&self) -> NonZeroUsize {
        self.block_size
    }

    /// Number of basis blocks indexed.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.block_count
    }

    /// Number of distinct weak keys.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

fn find_strong_hash(entries: &[BlockEntry], strong: u128) -> Option<usize> {
    entries
        .iter()
        .find(|entry| entry.strong == strong)
        .map(|entry| entry.index)
}

/// Byte accounting for one scan of a new stream.
///
/// `matched + literal` always equals the length of the scanned stream and
/// `matched` is a multiple of the block size.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanResult {
    pub matched: usize,
    pub literal: usize,
    /// Windows whose weak key had at least one candidate.
    pub weak_hits: usize,
    /// Weak hits where no candidate survived strong verification.
    pub false_positives: usize,
}

impl ScanResult {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.matched + self.literal
    }

    /// Fraction of bytes matched, `0.0` for an empty stream.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn redundancy(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.matched as f64 / total as f64,
        }
    }
}

/// Greedy single-pass matcher of a new stream against a [`BlockIndex`].
#[derive(Clone, Copy, Debug)]
pub struct MatchScanner<'a> {
    index: &'a BlockIndex,
}

impl<'a> MatchScanner<'a> {
    #[must_use]
    pub fn new(index: &'a BlockIndex) -> Self {
        Self { index }
    }

    /// Classifies every byte of `new` as matched or literal.
    ///
    /// The window slides one byte at a time on a miss, rolling the weak
    /// checksum. On a verified hit it jumps a whole block ahead and
    /// recomputes the checksum from scratch, since the jump breaks the
    /// rolling recurrence.
    #[must_use]
    pub fn scan(&self, new: &[u8]) -> ScanResult {
        let block_size = self.index.block_size().get();
        let len = new.len();
        let mut result = ScanResult::default();

        if len < block_size {
            result.literal = len;
            return result;
        }

        let mut pos = 0;
        let mut rolling = RollingChecksum::from_block(&new[..block_size]);

        while pos + block_size <= len {
            let weak = rolling.key();

            if let Some(entries) = self.index.candidates(weak) {
                result.weak_hits += 1;
                let strong = strong_digest(&new[pos..pos + block_size]);

                if find_strong_hash(entries, strong).is_some() {
                    result.matched += block_size;
                    pos += block_size;

                    if pos + block_size <= len {
                        reset_rolling(&mut rolling, new, pos, block_size);
                    }
                    continue;
                }

                result.false_positives += 1;
                trace!("weak hit at {pos} rejected by {} candidates", entries.len());
            }

            result.literal += 1;
            let old_byte = new[pos];
            pos += 1;

            if pos + block_size <= len {
                rolling.roll(old_byte, new[pos + block_size - 1]);
            } else {
                break;
            }
        }

        result.literal += len - pos;

        debug!(
            "scanned {len} bytes with block size {block_size}: {} matched, {} literal, {} weak hits, {} false positives",
            result.matched, result.literal, result.weak_hits, result.false_positives
        );
        result
    }
}

fn reset_rolling(rolling: &mut RollingChecksum, window: &[u8], start: usize, block_size: usize) {
    *rolling = RollingChecksum::from_block(&window[start..start + block_size]);
}

/// Builds an index over `basis` and scans `new` against it.
#[must_use]
pub fn scan(basis: &[u8], new: &[u8], block_size: NonZeroUsize) -> ScanResult {
    let index = BlockIndex::build(basis, block_size);
    MatchScanner::new(&index).scan(new)
}
