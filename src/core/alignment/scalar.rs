//! Exact 64-bit kernel for a single (query, database sequence) pair.
//!
//! This is the terminal tier of the cascade: no saturation and no escalation.
//! Before running, the kernel checks that no cell can leave a safe range
//! around zero; when the check fails it returns `None` and the caller reports
//! a fatal overflow for the pair.
//!
//! Recurrence (gap of length k costs `open + k * extend`):
//!
//! ```text
//! E(i,j) = max(E(i,j-1) - extend, H(i,j-1) - (open + extend))
//! F(i,j) = max(F(i-1,j) - extend, H(i-1,j) - (open + extend))
//! H(i,j) = max(H(i-1,j-1) + s(d[j], q[i]), E(i,j), F(i,j) [, 0 if local])
//! ```
//!
//! Global boundaries: `H(-1,-1) = 0`, `H(i,-1) = -(open + (i+1) * extend)`,
//! `H(-1,j) = -(open + (j+1) * extend)`.

use crate::core::alignment::AlignmentMode;
use crate::core::alignment::profile::ScoreProfile;
use crate::core::alignment::workspace::ScalarWorkspace;
use crate::core::scoring::GapCosts;
use crate::error::Result;

/// Stand-in for minus infinity; far enough from `i64::MIN` that subtracting
/// any in-range gap penalty cannot wrap.
const NEG_INF: i64 = i64::MIN / 4;

/// Cells must stay within this magnitude.
const SAFE_MAGNITUDE: i64 = i64::MAX / 8;

/// Score of one pair plus the cell it ends in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WideScore {
    pub score: i64,
    /// Query position of the final cell (`None` for an empty alignment).
    pub query_end: Option<usize>,
    /// Database position of the final cell (`None` for an empty alignment).
    pub db_end: Option<usize>,
}

/// True when every cell of a `query_len x db_len` matrix is guaranteed to
/// stay within the safe range.
///
/// Any path through the matrix has at most `query_len + db_len + 2` steps and
/// each step changes a score by at most `max_abs + open + extend`.
pub fn range_is_safe(query_len: usize, db_len: usize, max_abs: i64, gaps: &GapCosts) -> bool {
    let steps = (query_len as i64)
        .checked_add(db_len as i64)
        .and_then(|n| n.checked_add(2));
    let per_step = max_abs.checked_add(gaps.open_extend());
    match (steps, per_step) {
        (Some(steps), Some(per_step)) => per_step
            .checked_mul(steps)
            .is_some_and(|bound| bound < SAFE_MAGNITUDE),
        _ => false,
    }
}

/// Score `target` against the profile's query.
///
/// Returns `Ok(None)` when the pair is outside the guaranteed-exact range.
pub fn align(
    mode: AlignmentMode,
    profile: &ScoreProfile<i64>,
    target: &[u8],
    gaps: &GapCosts,
    ws: &mut ScalarWorkspace,
) -> Result<Option<WideScore>> {
    let qlen = profile.query_len();
    if !range_is_safe(qlen, target.len(), profile.max_abs_score(), gaps) {
        return Ok(None);
    }
    ws.prepare(qlen)?;

    let goe = gaps.open_extend();
    let ext = gaps.extend as i64;
    let local = mode.is_local();

    for i in 0..qlen {
        ws.h[i] = if local { 0 } else { -gaps.cost(i + 1) };
        ws.e[i] = NEG_INF;
    }

    if target.is_empty() {
        return Ok(Some(match mode {
            AlignmentMode::Local => WideScore {
                score: 0,
                query_end: None,
                db_end: None,
            },
            AlignmentMode::Global => WideScore {
                score: -gaps.cost(qlen),
                query_end: Some(qlen - 1),
                db_end: None,
            },
        }));
    }

    let mut best = WideScore {
        score: 0,
        query_end: None,
        db_end: None,
    };

    for (j, &r) in target.iter().enumerate() {
        let row = profile.row(r);
        let (mut diag, mut f) = if local {
            (0, NEG_INF)
        } else {
            let top_left = if j == 0 { 0 } else { -gaps.cost(j) };
            (top_left, -gaps.cost(j + 1) - goe)
        };

        for i in 0..qlen {
            let e = (ws.e[i] - ext).max(ws.h[i] - goe);
            let mut h = (diag + row[i]).max(e).max(f);
            if local {
                h = h.max(0);
                if h > best.score {
                    best = WideScore {
                        score: h,
                        query_end: Some(i),
                        db_end: Some(j),
                    };
                }
            }
            diag = ws.h[i];
            ws.h[i] = h;
            ws.e[i] = e;
            f = (f - ext).max(h - goe);
        }
    }

    if local {
        Ok(Some(best))
    } else {
        Ok(Some(WideScore {
            score: ws.h[qlen - 1],
            query_end: Some(qlen - 1),
            db_end: Some(target.len() - 1),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alphabet::Alphabet;
    use crate::core::scoring::ScoreMatrix;

    fn score(mode: AlignmentMode, q: &str, d: &str, m: i32, x: i32, o: i32, e: i32) -> i64 {
        let matrix = ScoreMatrix::constant(Alphabet::Nucleotide, m, x);
        let q = Alphabet::Nucleotide.encode(q.as_bytes());
        let d = Alphabet::Nucleotide.encode(d.as_bytes());
        let profile = ScoreProfile::<i64>::build(&q, &matrix).unwrap();
        let mut ws = ScalarWorkspace::default();
        align(mode, &profile, &d, &GapCosts::new(o, e).unwrap(), &mut ws)
            .unwrap()
            .unwrap()
            .score
    }

    #[test]
    fn test_reference_pair() {
        assert_eq!(score(AlignmentMode::Local, "AT", "AATG", 1, -1, 1, 1), 2);
        assert_eq!(score(AlignmentMode::Global, "AT", "AATG", 1, -1, 1, 1), -2);
    }

    #[test]
    fn test_local_with_gap() {
        assert_eq!(score(AlignmentMode::Local, "ATGCAAA", "ATGCCCAA", 1, -1, 1, 1), 4);
    }

    #[test]
    fn test_global_identity_and_empty() {
        assert_eq!(score(AlignmentMode::Global, "ACGT", "ACGT", 2, -3, 5, 2), 8);
        assert_eq!(score(AlignmentMode::Global, "ACGT", "", 2, -3, 5, 2), -13);
        assert_eq!(score(AlignmentMode::Local, "ACGT", "", 2, -3, 5, 2), 0);
    }

    #[test]
    fn test_global_single_gap_run() {
        // one deletion of length 2: 4 matches - (3 + 2*1)
        assert_eq!(score(AlignmentMode::Global, "AACC", "AAGGCC", 1, -4, 3, 1), -1);
    }

    #[test]
    fn test_local_end_cell() {
        let matrix = ScoreMatrix::constant(Alphabet::Nucleotide, 1, -1);
        let q = Alphabet::Nucleotide.encode(b"GGG");
        let d = Alphabet::Nucleotide.encode(b"AAGGGAA");
        let profile = ScoreProfile::<i64>::build(&q, &matrix).unwrap();
        let hit = align(
            AlignmentMode::Local,
            &profile,
            &d,
            &GapCosts::new(1, 1).unwrap(),
            &mut ScalarWorkspace::default(),
        )
        .unwrap()
        .unwrap();
        assert_eq!((hit.score, hit.query_end, hit.db_end), (3, Some(2), Some(4)));
    }

    #[test]
    fn test_range_guard() {
        let gaps = GapCosts::new(1, 1).unwrap();
        assert!(range_is_safe(1000, 1_000_000, 127, &gaps));
        assert!(!range_is_safe(usize::MAX / 2, usize::MAX / 2, 127, &gaps));
        assert!(!range_is_safe(10, 10, i64::MAX, &gaps));
    }
}
