//! Substitution scores and gap penalties.

pub mod gap;
pub mod matrix;

pub use gap::GapCosts;
pub use matrix::{ScoreMatrix, SubstitutionMatrix};
