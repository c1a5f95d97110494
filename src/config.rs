// src/config.rs
//
// Search options. One immutable `SearchConfig` is built up front and passed
// by reference to the profile builder, the cascade and the workers; nothing
// in the engine reads process-wide state for scoring.

use crate::compute::simd_abstraction::SimdEngineType;
use crate::core::alignment::{AlignmentMode, Precision};
use crate::core::alphabet::Alphabet;
use crate::core::scoring::{GapCosts, ScoreMatrix, SubstitutionMatrix};
use crate::defaults;
use crate::error::{Result, SearchError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Options of one search run.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    // Scoring parameters
    pub mode: AlignmentMode,
    pub gaps: GapCosts,
    pub matrix: Arc<dyn SubstitutionMatrix>,

    // Cascade parameters
    pub start_precision: Precision, // First tier tried for every pair

    // Output parameters
    pub top_k: usize,              // Hits kept across the whole search
    pub compute_coordinates: bool, // Locate start/end of the reported hits

    // Processing parameters
    pub threads: usize,
    pub engine: Option<SimdEngineType>, // None = detect

    // Polled by workers before each chunk
    pub cancel: Option<Arc<AtomicBool>>,
}

impl SearchConfig {
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.gaps.validate()?;
        if self.top_k == 0 {
            return Err(SearchError::config("top-k must be at least 1"));
        }
        if self.threads == 0 {
            return Err(SearchError::config("thread count must be at least 1"));
        }
        if self.matrix.alphabet_size() == 0 || self.matrix.alphabet_size() > u8::MAX as usize {
            return Err(SearchError::config(format!(
                "matrix alphabet size {} outside 1..{}",
                self.matrix.alphabet_size(),
                u8::MAX
            )));
        }
        Ok(())
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            mode: AlignmentMode::Local,
            gaps: GapCosts {
                open: defaults::GAP_OPEN_PENALTY,
                extend: defaults::GAP_EXTEND_PENALTY,
            },
            matrix: Arc::new(ScoreMatrix::constant(
                Alphabet::Nucleotide,
                defaults::MATCH_SCORE,
                defaults::MISMATCH_SCORE,
            )),
            start_precision: Precision::Byte,
            top_k: defaults::TOP_K,
            compute_coordinates: false,
            threads: num_cpus::get(),
            engine: None,
            cancel: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct SearchConfigBuilder {
    mode: Option<AlignmentMode>,
    gaps: Option<(i32, i32)>,
    matrix: Option<Arc<dyn SubstitutionMatrix>>,
    start_precision: Option<Precision>,
    top_k: Option<usize>,
    compute_coordinates: bool,
    threads: Option<usize>,
    engine: Option<SimdEngineType>,
    cancel: Option<Arc<AtomicBool>>,
}

impl SearchConfigBuilder {
    pub fn mode(mut self, mode: AlignmentMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn gap_costs(mut self, open: i32, extend: i32) -> Self {
        self.gaps = Some((open, extend));
        self
    }

    pub fn matrix(mut self, matrix: impl SubstitutionMatrix + 'static) -> Self {
        self.matrix = Some(Arc::new(matrix));
        self
    }

    pub fn shared_matrix(mut self, matrix: Arc<dyn SubstitutionMatrix>) -> Self {
        self.matrix = Some(matrix);
        self
    }

    pub fn start_precision(mut self, precision: Precision) -> Self {
        self.start_precision = Some(precision);
        self
    }

    pub fn top_k(mut self, k: usize) -> Self {
        self.top_k = Some(k);
        self
    }

    pub fn compute_coordinates(mut self, on: bool) -> Self {
        self.compute_coordinates = on;
        self
    }

    /// Worker count; 0 means one per CPU.
    pub fn threads(mut self, n: usize) -> Self {
        self.threads = Some(n);
        self
    }

    pub fn engine(mut self, engine: SimdEngineType) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn build(self) -> Result<SearchConfig> {
        let base = SearchConfig::default();
        let gaps = match self.gaps {
            Some((open, extend)) => GapCosts::new(open, extend)?,
            None => base.gaps,
        };

        let mut threads = match self.threads {
            Some(0) | None => num_cpus::get(),
            Some(n) => n,
        };
        // Reasonable upper bound to prevent accidental resource exhaustion
        let max_threads = num_cpus::get() * 2;
        if threads > max_threads {
            log::warn!(
                "Thread count {} exceeds recommended maximum {}, capping at {}",
                threads,
                max_threads,
                max_threads
            );
            threads = max_threads;
        }

        let config = SearchConfig {
            mode: self.mode.unwrap_or(base.mode),
            gaps,
            matrix: self.matrix.unwrap_or(base.matrix),
            start_precision: self.start_precision.unwrap_or(base.start_precision),
            top_k: self.top_k.unwrap_or(base.top_k),
            compute_coordinates: self.compute_coordinates,
            threads,
            engine: self.engine,
            cancel: self.cancel,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SearchConfig::builder().build().unwrap();
        assert_eq!(config.mode, AlignmentMode::Local);
        assert_eq!(config.top_k, defaults::TOP_K);
        assert_eq!(config.start_precision, Precision::Byte);
        assert!(config.threads >= 1);
        assert!(!config.is_cancelled());
    }

    #[test]
    fn test_rejects_bad_settings() {
        assert!(matches!(
            SearchConfig::builder().top_k(0).build(),
            Err(SearchError::Config(_))
        ));
        assert!(matches!(
            SearchConfig::builder().gap_costs(-1, 1).build(),
            Err(SearchError::Config(_))
        ));
        assert!(SearchConfig::builder().gap_costs(0, 0).build().is_ok());
    }

    #[test]
    fn test_zero_threads_means_all_cpus() {
        let config = SearchConfig::builder().threads(0).build().unwrap();
        assert_eq!(config.threads, num_cpus::get().min(num_cpus::get() * 2));
    }

    #[test]
    fn test_cancel_flag_is_observed() {
        let flag = Arc::new(AtomicBool::new(false));
        let config = SearchConfig::builder().cancel_flag(flag.clone()).build().unwrap();
        assert!(!config.is_cancelled());
        flag.store(true, Ordering::Relaxed);
        assert!(config.is_cancelled());
    }
}
