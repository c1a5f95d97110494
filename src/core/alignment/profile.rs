//! Per-query score profiles.
//!
//! A profile is built once per (query, matrix, precision) and shared read-only
//! by every worker. It stores the substitution scores in two layouts:
//!
//! - `rows`: residue-major, `rows[r * qlen + i] == matrix(r, query[i])`. The
//!   scalar kernel walks one row per database residue.
//! - `by_query_code`: `by_query_code[qr * alphabet + r] == matrix(r, qr)`. The
//!   striped kernel fills its per-step lane profile from this table, once per
//!   query residue code instead of once per query position.
//!
//! Values are clamped into the tier's numeric type. `values_exact()` reports
//! whether any clamping happened; a tier whose profile is not exact is skipped
//! by the cascade.

use crate::compute::simd_abstraction::ScoreWidth;
use crate::core::alignment::AlignmentMode;
use crate::core::scoring::{GapCosts, SubstitutionMatrix};
use crate::error::{Result, SearchError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreProfile<T: ScoreWidth> {
    query: Vec<u8>,
    present_codes: Vec<u8>,
    alphabet_size: usize,
    rows: Vec<T>,
    by_query_code: Vec<T>,
    max_abs_score: i64,
    values_exact: bool,
}

impl<T: ScoreWidth> ScoreProfile<T> {
    /// Build the profile of `query` against `matrix`.
    ///
    /// Fails with a configuration error for an empty query or a query residue
    /// code the matrix does not define.
    pub fn build(query: &[u8], matrix: &dyn SubstitutionMatrix) -> Result<Self> {
        if query.is_empty() {
            return Err(SearchError::config("zero-length query"));
        }
        let alphabet_size = matrix.alphabet_size();
        if let Some(pos) = query.iter().position(|&q| q as usize >= alphabet_size) {
            return Err(SearchError::config(format!(
                "matrix has no entry for residue code {} at query position {}",
                query[pos], pos
            )));
        }

        let qlen = query.len();
        let mut rows = Vec::with_capacity(alphabet_size * qlen);
        let mut max_abs_score = 0i64;
        let mut values_exact = true;

        for r in 0..alphabet_size as u8 {
            for &q in query {
                let v = matrix.score(r, q) as i64;
                max_abs_score = max_abs_score.max(v.abs());
                values_exact &= T::holds_exactly(v);
                rows.push(T::from_i64_saturating(v));
            }
        }

        // full square; the striped kernel only reads the codes in present_codes
        let mut by_query_code = Vec::with_capacity(alphabet_size * alphabet_size);
        for qr in 0..alphabet_size as u8 {
            for r in 0..alphabet_size as u8 {
                by_query_code.push(T::from_i64_saturating(matrix.score(r, qr) as i64));
            }
        }

        let mut present_codes = query.to_vec();
        present_codes.sort_unstable();
        present_codes.dedup();

        Ok(ScoreProfile {
            query: query.to_vec(),
            present_codes,
            alphabet_size,
            rows,
            by_query_code,
            max_abs_score,
            values_exact,
        })
    }

    #[inline]
    pub fn query(&self) -> &[u8] {
        &self.query
    }

    /// Distinct residue codes of the query, ascending.
    #[inline]
    pub fn present_codes(&self) -> &[u8] {
        &self.present_codes
    }

    #[inline]
    pub fn query_len(&self) -> usize {
        self.query.len()
    }

    #[inline]
    pub fn alphabet_size(&self) -> usize {
        self.alphabet_size
    }

    /// Score of database residue `r` against query position `i`.
    #[inline]
    pub fn score(&self, r: u8, i: usize) -> T {
        self.rows[r as usize * self.query.len() + i]
    }

    /// Scores of database residue `r` against every query position.
    #[inline]
    pub fn row(&self, r: u8) -> &[T] {
        let qlen = self.query.len();
        let start = r as usize * qlen;
        &self.rows[start..start + qlen]
    }

    /// Scores of every database residue against query residue code `qr`.
    #[inline]
    pub fn for_query_code(&self, qr: u8) -> &[T] {
        let start = qr as usize * self.alphabet_size;
        &self.by_query_code[start..start + self.alphabet_size]
    }

    /// Largest absolute matrix entry used by this query.
    pub fn max_abs_score(&self) -> i64 {
        self.max_abs_score
    }

    /// True when no entry used by the query was clamped.
    pub fn values_exact(&self) -> bool {
        self.values_exact
    }

    /// Whether a narrow kernel at this precision can score the query exactly
    /// up to saturation detection.
    ///
    /// Requires unclamped matrix values, a representable gap penalty and, in
    /// global mode, a representable left boundary `-(open + qlen * extend)`.
    pub fn fits(&self, mode: AlignmentMode, gaps: &GapCosts) -> bool {
        if !self.values_exact || !T::holds_exactly(gaps.open_extend()) {
            return false;
        }
        match mode {
            AlignmentMode::Local => true,
            AlignmentMode::Global => T::holds_exactly(-gaps.cost(self.query.len())),
        }
    }
}

/// The profiles of one query at every precision tier.
#[derive(Debug, Clone)]
pub struct QueryProfiles {
    pub query_id: usize,
    pub byte: ScoreProfile<i8>,
    pub word: ScoreProfile<i16>,
    pub wide: ScoreProfile<i64>,
}

impl QueryProfiles {
    pub fn build(query_id: usize, query: &[u8], matrix: &dyn SubstitutionMatrix) -> Result<Self> {
        Ok(QueryProfiles {
            query_id,
            byte: ScoreProfile::build(query, matrix)?,
            word: ScoreProfile::build(query, matrix)?,
            wide: ScoreProfile::build(query, matrix)?,
        })
    }

    pub fn query_len(&self) -> usize {
        self.wide.query_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alphabet::Alphabet;
    use crate::core::scoring::ScoreMatrix;

    fn nuc(s: &str) -> Vec<u8> {
        Alphabet::Nucleotide.encode(s.as_bytes())
    }

    #[test]
    fn test_profile_matches_matrix_across_widths() {
        let m = ScoreMatrix::constant(Alphabet::Nucleotide, 2, -3);
        let q = nuc("ACGTNA");
        let p8 = ScoreProfile::<i8>::build(&q, &m).unwrap();
        let p16 = ScoreProfile::<i16>::build(&q, &m).unwrap();
        let p64 = ScoreProfile::<i64>::build(&q, &m).unwrap();
        for r in 0..5u8 {
            for (i, &qc) in q.iter().enumerate() {
                let want = m.score(r, qc) as i64;
                assert_eq!(p8.score(r, i) as i64, want);
                assert_eq!(p16.score(r, i) as i64, want);
                assert_eq!(p64.score(r, i), want);
            }
            assert_eq!(p8.row(r).len(), q.len());
        }
        assert_eq!(p8.for_query_code(1)[1], 2);
        assert_eq!(p8.for_query_code(1)[0], -3);
    }

    #[test]
    fn test_rebuild_is_identical() {
        let m = ScoreMatrix::blosum62();
        let q = Alphabet::AminoAcid.encode(b"MKVLAAGIW");
        let a = ScoreProfile::<i8>::build(&q, &m).unwrap();
        let b = ScoreProfile::<i8>::build(&q, &m).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_empty_and_undefined_codes() {
        let m = ScoreMatrix::constant(Alphabet::Nucleotide, 1, -1);
        assert!(matches!(
            ScoreProfile::<i16>::build(&[], &m),
            Err(SearchError::Config(_))
        ));
        assert!(matches!(
            ScoreProfile::<i16>::build(&[0, 1, 9], &m),
            Err(SearchError::Config(_))
        ));
    }

    #[test]
    fn test_fits_tracks_representability() {
        let big = ScoreMatrix::constant(Alphabet::Nucleotide, 127, -1);
        let q = nuc("ACGT");
        let gaps = GapCosts::new(1, 1).unwrap();
        let p8 = ScoreProfile::<i8>::build(&q, &big).unwrap();
        assert!(!p8.values_exact());
        assert!(!p8.fits(AlignmentMode::Local, &gaps));
        let p16 = ScoreProfile::<i16>::build(&q, &big).unwrap();
        assert!(p16.fits(AlignmentMode::Local, &gaps));

        let small = ScoreMatrix::constant(Alphabet::Nucleotide, 1, -1);
        let long_query = vec![0u8; 200];
        let p8 = ScoreProfile::<i8>::build(&long_query, &small).unwrap();
        assert!(p8.fits(AlignmentMode::Local, &gaps));
        // left boundary -(1 + 200) is below i8::MIN
        assert!(!p8.fits(AlignmentMode::Global, &gaps));
    }
}
