//! Substitution matrices.
//!
//! The engine only needs `score(a, b)` over residue codes and the alphabet
//! size. Clamping to a lane width is done by the profile builder, never here.

use crate::core::alphabet::Alphabet;
use crate::error::{Result, SearchError};

/// Source of substitution scores, independent of numeric width.
pub trait SubstitutionMatrix: Send + Sync + std::fmt::Debug {
    /// Residue codes `0..alphabet_size()` are defined.
    fn alphabet_size(&self) -> usize;

    /// Score of aligning database residue `a` against query residue `b`.
    fn score(&self, a: u8, b: u8) -> i32;
}

#[rustfmt::skip]
const BLOSUM62: [i8; 24 * 24] = [
//   A   R   N   D   C   Q   E   G   H   I   L   K   M   F   P   S   T   W   Y   V   B   Z   X   *
     4, -1, -2, -2,  0, -1, -1,  0, -2, -1, -1, -1, -1, -2, -1,  1,  0, -3, -2,  0, -2, -1,  0, -4, // A
    -1,  5,  0, -2, -3,  1,  0, -2,  0, -3, -2,  2, -1, -3, -2, -1, -1, -3, -2, -3, -1,  0, -1, -4, // R
    -2,  0,  6,  1, -3,  0,  0,  0,  1, -3, -3,  0, -2, -3, -2,  1,  0, -4, -2, -3,  3,  0, -1, -4, // N
    -2, -2,  1,  6, -3,  0,  2, -1, -1, -3, -4, -1, -3, -3, -1,  0, -1, -4, -3, -3,  4,  1, -1, -4, // D
     0, -3, -3, -3,  9, -3, -4, -3, -3, -1, -1, -3, -1, -2, -3, -1, -1, -2, -2, -1, -3, -3, -2, -4, // C
    -1,  1,  0,  0, -3,  5,  2, -2,  0, -3, -2,  1,  0, -3, -1,  0, -1, -2, -1, -2,  0,  3, -1, -4, // Q
    -1,  0,  0,  2, -4,  2,  5, -2,  0, -3, -3,  1, -2, -3, -1,  0, -1, -3, -2, -2,  1,  4, -1, -4, // E
     0, -2,  0, -1, -3, -2, -2,  6, -2, -4, -4, -2, -3, -3, -2,  0, -2, -2, -3, -3, -1, -2, -1, -4, // G
    -2,  0,  1, -1, -3,  0,  0, -2,  8, -3, -3, -1, -2, -1, -2, -1, -2, -2,  2, -3,  0,  0, -1, -4, // H
    -1, -3, -3, -3, -1, -3, -3, -4, -3,  4,  2, -3,  1,  0, -3, -2, -1, -3, -1,  3, -3, -3, -1, -4, // I
    -1, -2, -3, -4, -1, -2, -3, -4, -3,  2,  4, -2,  2,  0, -3, -2, -1, -2, -1,  1, -4, -3, -1, -4, // L
    -1,  2,  0, -1, -3,  1,  1, -2, -1, -3, -2,  5, -1, -3, -1,  0, -1, -3, -2, -2,  0,  1, -1, -4, // K
    -1, -1, -2, -3, -1,  0, -2, -3, -2,  1,  2, -1,  5,  0, -2, -1, -1, -1, -1,  1, -3, -1, -1, -4, // M
    -2, -3, -3, -3, -2, -3, -3, -3, -1,  0,  0, -3,  0,  6, -4, -2, -2,  1,  3, -1, -3, -3, -1, -4, // F
    -1, -2, -2, -1, -3, -1, -1, -2, -2, -3, -3, -1, -2, -4,  7, -1, -1, -4, -3, -2, -2, -1, -2, -4, // P
     1, -1,  1,  0, -1,  0,  0,  0, -1, -2, -2,  0, -1, -2, -1,  4,  1, -3, -2, -2,  0,  0,  0, -4, // S
     0, -1,  0, -1, -1, -1, -1, -2, -2, -1, -1, -1, -1, -2, -1,  1,  5, -2, -2,  0, -1, -1,  0, -4, // T
    -3, -3, -4, -4, -2, -2, -3, -2, -2, -3, -2, -3, -1,  1, -4, -3, -2, 11,  2, -3, -4, -3, -2, -4, // W
    -2, -2, -2, -3, -2, -1, -2, -3,  2, -1, -1, -2, -1,  3, -3, -2, -2,  2,  7, -1, -3, -2, -1, -4, // Y
     0, -3, -3, -3, -1, -2, -2, -3, -3,  3,  1, -2,  1, -1, -2, -2,  0, -3, -1,  4, -3, -2, -1, -4, // V
    -2, -1,  3,  4, -3,  0,  1, -1,  0, -3, -4,  0, -3, -3, -2,  0, -1, -4, -3, -3,  4,  1, -1, -4, // B
    -1,  0,  0,  1, -3,  3,  4, -2,  0, -3, -3,  1, -1, -3, -1,  0, -1, -3, -2, -2,  1,  4, -1, -4, // Z
     0, -1, -1, -1, -2, -1, -1, -1, -1, -1, -1, -1, -1, -1, -2,  0,  0, -2, -1, -1, -1, -1, -1, -4, // X
    -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4,  1, // *
];

/// Dense square matrix over one alphabet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreMatrix {
    name: String,
    alphabet: Alphabet,
    size: usize,
    values: Vec<i32>,
}

impl ScoreMatrix {
    /// Match/mismatch matrix. The wildcard scores `mismatch` against everything,
    /// itself included.
    pub fn constant(alphabet: Alphabet, match_score: i32, mismatch: i32) -> Self {
        let size = alphabet.size();
        let wildcard = alphabet.wildcard() as usize;
        let mut values = vec![mismatch; size * size];
        for r in 0..size {
            if r != wildcard {
                values[r * size + r] = match_score;
            }
        }
        ScoreMatrix {
            name: format!("constant({match_score},{mismatch})"),
            alphabet,
            size,
            values,
        }
    }

    pub fn blosum62() -> Self {
        ScoreMatrix {
            name: "BLOSUM62".to_string(),
            alphabet: Alphabet::AminoAcid,
            size: 24,
            values: BLOSUM62.iter().map(|&v| v as i32).collect(),
        }
    }

    /// Look up a built-in matrix by name (case-insensitive).
    pub fn by_name(name: &str) -> Result<Self> {
        match name.to_ascii_uppercase().as_str() {
            "BLOSUM62" => Ok(Self::blosum62()),
            other => Err(SearchError::config(format!("unknown score matrix '{other}'"))),
        }
    }

    /// Row-major `size x size` values, `values[a * size + b]`.
    pub fn from_values(
        name: impl Into<String>,
        alphabet: Alphabet,
        values: Vec<i32>,
    ) -> Result<Self> {
        let size = alphabet.size();
        if values.len() != size * size {
            return Err(SearchError::config(format!(
                "matrix needs {} entries for a {}-residue alphabet, got {}",
                size * size,
                size,
                values.len()
            )));
        }
        Ok(ScoreMatrix {
            name: name.into(),
            alphabet,
            size,
            values,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    /// Largest absolute entry.
    pub fn max_abs(&self) -> i64 {
        self.values
            .iter()
            .map(|&v| (v as i64).abs())
            .max()
            .unwrap_or(0)
    }
}

impl SubstitutionMatrix for ScoreMatrix {
    #[inline]
    fn alphabet_size(&self) -> usize {
        self.size
    }

    #[inline]
    fn score(&self, a: u8, b: u8) -> i32 {
        self.values[a as usize * self.size + b as usize]
    }
}
