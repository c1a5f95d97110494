//! Database search pipeline.
//!
//! - `source`: chunked database sequence sources
//! - `cascade`: per-chunk precision cascade (8 → 16 → 64 bit)
//! - `orchestrator`: worker pool, chunk claiming and result merging

pub mod cascade;
pub mod orchestrator;
pub mod source;

pub use cascade::{CascadeController, SearchCounters};
pub use orchestrator::{SearchReport, run_search};
pub use source::{DbChunk, InMemorySource, SequenceSource};
