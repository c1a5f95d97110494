//! Search pipelines.
//!
//! Each pipeline implements a complete workflow on top of the core kernels:
//! - `search`: top-K database search with the overflow cascade

pub mod search;
