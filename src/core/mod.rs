//! Core reusable components for database search.
//!
//! Residue encoding, scoring, the alignment kernels and the result collector.
//! Nothing here knows about files or threads; the search pipeline in
//! [`crate::pipelines`] drives these pieces.

pub mod alignment;
pub mod alphabet;
pub mod scoring;
pub mod sequence;
pub mod topk;
