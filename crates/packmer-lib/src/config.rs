//! Configuration for k-mer counting
//!
//! Parameters for scanning sequences into packed k-mers: window size,
//! strand handling, hashing seed and resource limits.

use crate::constants::{DEFAULT_SEED, MAX_DISPATCH_K};

/// Configuration parameters for counting k-mers
#[derive(Debug, Clone)]
pub struct CountConfiguration {
    /// K-mer length (between 1 and 256)
    pub k: usize,

    /// Count k-mer and reverse complement as the same entry
    pub canonical: bool,

    /// Seed for hash functions
    pub seed: u64,

    /// Number of threads for parallel operations (0 = all available cores)
    pub num_threads: usize,

    /// Drop k-mers seen fewer times than this
    pub min_count: u64,

    /// Verbose output during counting
    pub verbose: bool,
}

impl Default for CountConfiguration {
    fn default() -> Self {
        Self {
            k: 31,
            canonical: true,
            seed: DEFAULT_SEED,
            num_threads: 0, // 0 = use all available cores
            min_count: 1,
            verbose: false,
        }
    }
}

impl CountConfiguration {
    /// Create a new configuration with the specified k-mer length
    pub fn new(k: usize) -> Result<Self, String> {
        let config = Self {
            k,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.k == 0 || self.k > MAX_DISPATCH_K {
            return Err(format!("k must be in range [1, {}], got k={}", MAX_DISPATCH_K, self.k));
        }

        if self.min_count == 0 {
            return Err("min_count must be at least 1".to_string());
        }

        Ok(())
    }

    /// Log configuration parameters via tracing
    pub fn print(&self) {
        tracing::info!("Count Configuration:");
        tracing::info!("  k = {}", self.k);
        tracing::info!("  canonical = {}", self.canonical);
        tracing::debug!("  seed = {}", self.seed);
        if self.num_threads == 0 {
            tracing::info!("  num_threads = all available cores");
        } else {
            tracing::info!("  num_threads = {}", self.num_threads);
        }
        tracing::info!("  min_count = {}", self.min_count);
        tracing::debug!("  verbose = {}", self.verbose);
    }
}
