// src/defaults.rs

// Scoring Constants
pub const MATCH_SCORE: i32 = 1;
pub const MISMATCH_SCORE: i32 = -3;
pub const GAP_OPEN_PENALTY: i32 = 3;
pub const GAP_EXTEND_PENALTY: i32 = 1;
pub const SCORE_MATRIX: &str = "BLOSUM62";

// Search Constants
pub const TOP_K: usize = 10;
pub const CHUNK_SIZE: usize = 1000;

// Kernel Constants
/// Database residues consumed per lane per kernel step.
pub const LANE_DEPTH: usize = 4;
