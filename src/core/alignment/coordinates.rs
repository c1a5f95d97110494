//! Start/end coordinates of reported hits.
//!
//! Only the final hits are located, with the exact 64-bit kernel. For a local
//! hit the forward pass gives the first cell (database-major scan order)
//! holding the best score; a second pass over the reversed prefixes ending at
//! that cell gives the start. The first best cell of the reversed pass is
//! always reached by an alignment anchored at the end cell, since any other
//! optimal alignment inside the prefixes would end earlier in scan order.
//!
//! Global hits span both sequences.

use crate::core::alignment::profile::ScoreProfile;
use crate::core::alignment::scalar;
use crate::core::alignment::workspace::ScalarWorkspace;
use crate::core::alignment::AlignmentMode;
use crate::core::scoring::{GapCosts, SubstitutionMatrix};
use crate::core::topk::SearchHit;
use crate::error::{Result, SearchError};

/// Inclusive, zero-based alignment bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlignmentCoordinates {
    pub query_start: usize,
    pub query_end: usize,
    pub db_start: usize,
    pub db_end: usize,
}

/// Locate the best alignment of `query` against `target`.
///
/// Returns `None` for an empty alignment (a local score of zero, or a global
/// alignment against an empty database sequence).
pub fn locate(
    mode: AlignmentMode,
    query: &[u8],
    target: &[u8],
    matrix: &dyn SubstitutionMatrix,
    gaps: &GapCosts,
    ws: &mut ScalarWorkspace,
) -> Result<Option<AlignmentCoordinates>> {
    if query.is_empty() || target.is_empty() {
        return Ok(None);
    }
    if mode == AlignmentMode::Global {
        return Ok(Some(AlignmentCoordinates {
            query_start: 0,
            query_end: query.len() - 1,
            db_start: 0,
            db_end: target.len() - 1,
        }));
    }

    let forward = ScoreProfile::<i64>::build(query, matrix)?;
    let Some(end) = scalar::align(mode, &forward, target, gaps, ws)? else {
        return Err(SearchError::config(
            "alignment coordinates requested for a pair outside the 64-bit range",
        ));
    };
    let (Some(query_end), Some(db_end)) = (end.query_end, end.db_end) else {
        return Ok(None);
    };

    let rev_query: Vec<u8> = query[..=query_end].iter().rev().copied().collect();
    let rev_target: Vec<u8> = target[..=db_end].iter().rev().copied().collect();
    let reverse = ScoreProfile::<i64>::build(&rev_query, matrix)?;
    let start = scalar::align(mode, &reverse, &rev_target, gaps, ws)?
        .filter(|s| s.score == end.score)
        .and_then(|s| s.query_end.zip(s.db_end));

    match start {
        Some((qi, dj)) => Ok(Some(AlignmentCoordinates {
            query_start: query_end - qi,
            query_end,
            db_start: db_end - dj,
            db_end,
        })),
        None => {
            log::warn!("reverse pass disagrees with forward score {}; reporting end cell only", end.score);
            Ok(Some(AlignmentCoordinates {
                query_start: query_end,
                query_end,
                db_start: db_end,
                db_end,
            }))
        }
    }
}

/// Fill in `hit.coordinates` for a hit whose residues are at hand.
pub fn annotate_coordinates(
    hit: &mut SearchHit,
    mode: AlignmentMode,
    query: &[u8],
    target: &[u8],
    matrix: &dyn SubstitutionMatrix,
    gaps: &GapCosts,
    ws: &mut ScalarWorkspace,
) -> Result<()> {
    if hit.coordinates.is_none() {
        hit.coordinates = locate(mode, query, target, matrix, gaps, ws)?;
    }
    Ok(())
}
