pub mod compute; // SIMD engine abstraction and runtime detection
pub mod config; // SearchConfig and builder
pub mod core; // Kernels, profiles, scoring, top-K collector
pub mod defaults;
pub mod error;
pub mod io; // FASTA sources
pub mod pipelines; // Search orchestration

pub use crate::config::SearchConfig;
pub use crate::core::alignment::kernel::{Kernel, PairOutcome, align_pair};
pub use crate::core::alignment::{AlignmentMode, Precision};
pub use crate::core::topk::{SearchHit, TopK};
pub use crate::error::{Result, SearchError};
pub use crate::pipelines::search::{SearchReport, run_search};
