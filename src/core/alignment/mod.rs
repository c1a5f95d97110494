//! Core alignment kernels - multi-precision Smith-Waterman / Needleman-Wunsch.
//!
//! The narrow kernels (`striped`) score many database sequences at once, one
//! per SIMD lane, in saturating 8- or 16-bit arithmetic. The wide kernel
//! (`scalar`) scores one pair exactly in 64-bit arithmetic. `kernel` ties them
//! together behind a single strategy type.

pub mod channel; // Lane assignment / retirement state machine
pub mod coordinates; // Start/end coordinates for reported hits
pub mod kernel; // Mode x precision strategy and engine dispatch
pub mod profile; // Per-query score profiles
pub mod scalar; // Exact 64-bit kernel
pub mod striped; // Inter-sequence SIMD kernel (8/16-bit)
pub mod workspace; // Per-worker reusable buffers

use crate::core::scoring::GapCosts;
use std::fmt;
use std::str::FromStr;

/// Exact score of a query against an empty database sequence.
pub fn empty_target_score(mode: AlignmentMode, query_len: usize, gaps: &GapCosts) -> i64 {
    match mode {
        AlignmentMode::Local => 0,
        AlignmentMode::Global => -gaps.cost(query_len),
    }
}

/// Local (Smith-Waterman) or global (Needleman-Wunsch) alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AlignmentMode {
    #[default]
    Local,
    Global,
}

impl AlignmentMode {
    #[inline]
    pub fn is_local(self) -> bool {
        self == AlignmentMode::Local
    }
}

impl fmt::Display for AlignmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlignmentMode::Local => f.write_str("SW"),
            AlignmentMode::Global => f.write_str("NW"),
        }
    }
}

impl FromStr for AlignmentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SW" | "LOCAL" => Ok(AlignmentMode::Local),
            "NW" | "GLOBAL" => Ok(AlignmentMode::Global),
            other => Err(format!("unknown alignment type '{other}' (expected SW or NW)")),
        }
    }
}

/// Numeric precision tier of the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Precision {
    /// Saturating 8-bit lanes.
    #[default]
    Byte,
    /// Saturating 16-bit lanes.
    Word,
    /// Exact 64-bit scalar.
    Wide,
}

impl Precision {
    pub const ALL: [Precision; 3] = [Precision::Byte, Precision::Word, Precision::Wide];

    pub fn bits(self) -> u32 {
        match self {
            Precision::Byte => 8,
            Precision::Word => 16,
            Precision::Wide => 64,
        }
    }

    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            8 => Some(Precision::Byte),
            16 => Some(Precision::Word),
            64 => Some(Precision::Wide),
            _ => None,
        }
    }

    /// The tier that receives pairs escalated from this one.
    pub fn next(self) -> Option<Self> {
        match self {
            Precision::Byte => Some(Precision::Word),
            Precision::Word => Some(Precision::Wide),
            Precision::Wide => None,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precision_chain() {
        assert_eq!(Precision::Byte.next(), Some(Precision::Word));
        assert_eq!(Precision::Word.next(), Some(Precision::Wide));
        assert_eq!(Precision::Wide.next(), None);
        assert_eq!(Precision::from_bits(16), Some(Precision::Word));
        assert_eq!(Precision::from_bits(32), None);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("sw".parse::<AlignmentMode>(), Ok(AlignmentMode::Local));
        assert_eq!("NW".parse::<AlignmentMode>(), Ok(AlignmentMode::Global));
        assert!("xx".parse::<AlignmentMode>().is_err());
    }
}
