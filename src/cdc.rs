//! Redundancy under content-defined chunking.
//!
//! Both streams are cut with FastCDC, old chunks are indexed by their gear
//! hash, and every new chunk whose hash and BLAKE3 digest match an old chunk
//! counts as matched. Unlike the fixed-block scan there is no sliding
//! window: chunk boundaries follow content, so an insertion only disturbs
//! the chunks around it.

use crate::report::ConfigError;
use crate::strong_digest;
use fastcdc::v2020::{
    AVERAGE_MAX, AVERAGE_MIN, FastCDC, MAXIMUM_MAX, MAXIMUM_MIN, MINIMUM_MAX, MINIMUM_MIN,
};
use log::{debug, trace};
use std::collections::HashMap;
use std::fmt;

/// Chunk size bounds handed to FastCDC.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChunkParams {
    min_size: u32,
    avg_size: u32,
    max_size: u32,
}

impl Default for ChunkParams {
    /// 2 KiB / 8 KiB / 32 KiB.
    fn default() -> Self {
        Self {
            min_size: 8192 / 4,
            avg_size: 8192,
            max_size: 8192 * 4,
        }
    }
}

impl ChunkParams {
    /// # Errors
    /// Returns [`ConfigError::ChunkSizes`] unless `min <= avg <= max` and each
    /// bound lies in the range FastCDC accepts.
    pub fn new(min_size: u32, avg_size: u32, max_size: u32) -> Result<Self, ConfigError> {
        let valid = (MINIMUM_MIN..=MINIMUM_MAX).contains(&min_size)
            && (AVERAGE_MIN..=AVERAGE_MAX).contains(&avg_size)
            && (MAXIMUM_MIN..=MAXIMUM_MAX).contains(&max_size)
            && min_size <= avg_size
            && avg_size <= max_size;
        if !valid {
            return Err(ConfigError::ChunkSizes {
                min: min_size,
                avg: avg_size,
                max: max_size,
            });
        }
        Ok(Self {
            min_size,
            avg_size,
            max_size,
        })
    }

    #[must_use]
    pub const fn min_size(&self) -> u32 {
        self.min_size
    }

    #[must_use]
    pub const fn avg_size(&self) -> u32 {
        self.avg_size
    }

    #[must_use]
    pub const fn max_size(&self) -> u32 {
        self.max_size
    }

    fn chunker<'a>(&self, data: &'a [u8]) -> FastCDC<'a> {
        FastCDC::new(data, self.min_size, self.avg_size, self.max_size)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ChunkEntry {
    /// Position of the chunk in the old stream, counted in chunks.
    pub index: usize,
    pub length: usize,
    pub strong: u128,
}

/// Old-stream chunks keyed by FastCDC gear hash.
#[derive(Clone, Debug, Default)]
pub struct ChunkIndex {
    chunk_count: usize,
    buckets: HashMap<u64, Vec<ChunkEntry>>,
}

impl ChunkIndex {
    #[must_use]
    pub fn build(old: &[u8], params: &ChunkParams) -> Self {
        let mut index = Self::default();
        for (chunk_index, chunk) in params.chunker(old).enumerate() {
            let bytes = &old[chunk.offset..chunk.offset + chunk.length];
            index.buckets.entry(chunk.hash).or_default().push(ChunkEntry {
                index: chunk_index,
                length: chunk.length,
                strong: strong_digest(bytes),
            });
            index.chunk_count += 1;
        }
        debug!(
            "indexed {} chunks into {} buckets",
            index.chunk_count,
            index.buckets.len()
        );
        index
    }

    /// First old chunk with the same gear hash and the same content.
    #[must_use]
    pub fn find(&self, hash: u64, chunk: &[u8]) -> Option<usize> {
        let entries = self.buckets.get(&hash)?;
        let strong = strong_digest(chunk);
        entries
            .iter()
            .find(|entry| entry.length == chunk.len() && entry.strong == strong)
            .map(|entry| entry.index)
    }

    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Outcome of one content-defined comparison.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChunkReport {
    pub matched_bytes: usize,
    pub literal_bytes: usize,
    pub total_bytes: usize,
    pub matched_chunks: usize,
    pub new_chunks: usize,
    pub old_chunks: usize,
    /// `matched_bytes / total_bytes`, in `[0, 1]`.
    pub redundancy: f64,
}

impl ChunkReport {
    #[must_use]
    pub fn percent(&self) -> f64 {
        self.redundancy * 100.0
    }
}

impl fmt::Display for ChunkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "chunks: {:>6} new / {:>6} old | matched: {:>8} ({} chunks) | literal: {:>8} | total: {:>8} | redundancy: {:6.2}%",
            self.new_chunks,
            self.old_chunks,
            self.matched_bytes,
            self.matched_chunks,
            self.literal_bytes,
            self.total_bytes,
            self.percent()
        )
    }
}

/// Chunks `new` and counts how much of it already exists as whole chunks
/// of `old`. A new chunk repeated several times is counted every time.
#[must_use]
pub fn compare_chunks(old: &[u8], new: &[u8], params: &ChunkParams) -> ChunkReport {
    let index = ChunkIndex::build(old, params);
    let mut matched_bytes = 0;
    let mut matched_chunks = 0;
    let mut new_chunks = 0;

    for chunk in params.chunker(new) {
        new_chunks += 1;
        let bytes = &new[chunk.offset..chunk.offset + chunk.length];
        if index.find(chunk.hash, bytes).is_some() {
            matched_bytes += chunk.length;
            matched_chunks += 1;
        } else {
            trace!("chunk at {} ({} bytes) not in old", chunk.offset, chunk.length);
        }
    }

    let total_bytes = new.len();
    #[allow(clippy::cast_precision_loss)]
    let redundancy = match total_bytes {
        0 => 0.0,
        total => matched_bytes as f64 / total as f64,
    };
    let report = ChunkReport {
        matched_bytes,
        literal_bytes: total_bytes - matched_bytes,
        total_bytes,
        matched_chunks,
        new_chunks,
        old_chunks: index.chunk_count(),
        redundancy,
    };
    debug!("content-defined comparison: {report}");
    report
}
