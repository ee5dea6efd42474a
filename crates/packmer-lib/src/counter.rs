//! Parallel k-mer counting
//!
//! Sequences are scanned independently with [`MerStream`], each rayon task
//! filling its own hash map, and the maps are merged at the end. Entries are
//! canonical k-mers when the configuration asks for it, forward k-mers
//! otherwise.

use crate::config::CountConfiguration;
use crate::hasher::MerHasher;
use crate::mer_stream::MerStream;
use crate::packed_mer::PackedMer;
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::{debug, info};

/// Hash map from k-mer to abundance, seeded deterministically
pub type MerCounts<const N: usize> = HashMap<PackedMer<N>, u64, MerHasher>;

/// Summary of a counting run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CountStatistics {
    /// Number of input sequences
    pub num_sequences: u64,
    /// Number of k-mers scanned
    pub total_mers: u64,
    /// Number of distinct k-mers before the abundance filter
    pub distinct_mers: u64,
    /// Number of distinct k-mers kept
    pub kept_mers: u64,
}

impl CountStatistics {
    /// Print summary via tracing
    pub fn print_summary(&self) {
        info!("Counting statistics:");
        info!("  Sequences: {}", self.num_sequences);
        info!("  Total k-mers: {}", self.total_mers);
        info!("  Distinct k-mers: {}", self.distinct_mers);
        info!("  Kept k-mers: {}", self.kept_mers);
    }
}

/// Count k-mers of `config.k` bases over all sequences
///
/// # Parallelism
/// The number of threads is controlled by `config.num_threads`:
/// - `0`: use all available CPU cores (rayon default)
/// - `N`: use exactly N threads
///
/// # Returns
/// The kept k-mers sorted by value, with their abundances, and statistics.
pub fn count_mers<const N: usize, S>(
    sequences: &[S],
    config: &CountConfiguration,
) -> Result<(Vec<(PackedMer<N>, u64)>, CountStatistics), String>
where
    S: AsRef<[u8]> + Sync,
{
    config.validate()?;
    // reject k that does not fit before spawning anything
    PackedMer::<N>::with_mer_size(config.k).map_err(|e| e.to_string())?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.num_threads)
        .build()
        .map_err(|e| format!("Failed to create thread pool: {e}"))?;

    pool.install(|| count_mers_inner::<N, S>(sequences, config))
}

fn count_mers_inner<const N: usize, S>(
    sequences: &[S],
    config: &CountConfiguration,
) -> Result<(Vec<(PackedMer<N>, u64)>, CountStatistics), String>
where
    S: AsRef<[u8]> + Sync,
{
    if config.verbose {
        config.print();
    }
    info!("Counting {}-mers in {} sequences", config.k, sequences.len());

    let (counts, total_mers) = sequences
        .par_iter()
        .map(|seq| count_sequence::<N>(seq.as_ref(), config))
        .try_reduce(
            || (MerCounts::<N>::with_hasher(MerHasher::new(config.seed)), 0u64),
            |(left, left_total), (right, right_total)| {
                Ok((merge_counts(left, right), left_total + right_total))
            },
        )?;

    let distinct_mers = counts.len() as u64;
    let mut kept: Vec<(PackedMer<N>, u64)> = counts
        .into_iter()
        .filter(|&(_, count)| count >= config.min_count)
        .collect();
    kept.par_sort_unstable_by(|a, b| a.0.cmp(&b.0));

    let stats = CountStatistics {
        num_sequences: sequences.len() as u64,
        total_mers,
        distinct_mers,
        kept_mers: kept.len() as u64,
    };
    debug!("Merged counts: {:?}", stats);
    Ok((kept, stats))
}

/// Fold the smaller map into the larger one
fn merge_counts<const N: usize>(a: MerCounts<N>, b: MerCounts<N>) -> MerCounts<N> {
    let (mut large, small) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    for (mer, count) in small {
        *large.entry(mer).or_insert(0) += count;
    }
    large
}

/// Count the k-mers of one sequence
fn count_sequence<const N: usize>(
    sequence: &[u8],
    config: &CountConfiguration,
) -> Result<(MerCounts<N>, u64), String> {
    let mut counts = MerCounts::<N>::with_hasher(MerHasher::new(config.seed));
    let mut total = 0u64;
    let stream = MerStream::<N>::new(sequence, config.k).map_err(|e| e.to_string())?;
    for mer in stream {
        let key = if config.canonical { mer.canonical() } else { mer.forward };
        *counts.entry(key).or_insert(0) += 1;
        total += 1;
    }
    Ok((counts, total))
}
