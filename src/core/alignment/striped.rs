//! Inter-sequence ("striped") SIMD kernel for 8-bit and 16-bit lanes.
//!
//! Every lane of a vector scores a different database sequence against the
//! same query. A step consumes `LANE_DEPTH` database residues per lane and
//! sweeps all query rows; the channel multiplexer swaps sequences in and out
//! of lanes between steps.
//!
//! ## Layout
//!
//! All buffers are lane-interleaved: element `[row * lanes + lane]`. The H and
//! E columns persist across steps; the per-step lane profile holds, for every
//! query residue code and depth, the score of each lane's database residue.
//!
//! ## Saturation
//!
//! Arithmetic saturates at the lane width. A lane is flagged for escalation
//! when any of its H values reaches `MAX` in a step (and, in global mode,
//! `MIN`). Matrix values, gap penalties and the left boundary are checked
//! before the pass (`ScoreProfile::fits`); the top boundary is checked per
//! sequence before it is fed. With those guarantees every H strictly inside
//! `(MIN, MAX)` is exact: E and F values clamped at `MIN` can only win the
//! max when H itself ends at `MIN`, which flags the lane.

use crate::compute::simd_abstraction::{LaneScore, SimdEngine};
use crate::core::alignment::channel::{ChannelMux, MuxState, PAD};
use crate::core::alignment::profile::ScoreProfile;
use crate::core::alignment::workspace::StripedWorkspace;
use crate::core::alignment::{AlignmentMode, empty_target_score};
use crate::core::scoring::GapCosts;
use crate::defaults::LANE_DEPTH;
use crate::error::Result;

/// Scores and escalations of one tier over a list of targets.
///
/// Indices refer to positions in the target slice given to the kernel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierOutcome {
    pub scores: Vec<(usize, i64)>,
    pub escalated: Vec<usize>,
    /// Pairs the 64-bit tier could not score exactly.
    pub fatal: Vec<usize>,
}

impl TierOutcome {
    pub fn clear(&mut self) {
        self.scores.clear();
        self.escalated.clear();
        self.fatal.clear();
    }

    /// Number of targets accounted for.
    pub fn len(&self) -> usize {
        self.scores.len() + self.escalated.len() + self.fatal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Score every target against the profile's query, one target per lane.
///
/// Results are appended to `out`. The caller must have checked
/// `profile.fits(mode, gaps)`.
///
/// # Safety
///
/// The CPU must support engine `E`. Call through a wrapper compiled with the
/// engine's target features so the lane operations inline.
#[inline(always)]
pub unsafe fn align_batch<E: SimdEngine, T: LaneScore>(
    mode: AlignmentMode,
    profile: &ScoreProfile<T>,
    targets: &[&[u8]],
    gaps: &GapCosts,
    ws: &mut StripedWorkspace<T>,
    out: &mut TierOutcome,
) -> Result<()> {
    debug_assert!(profile.fits(mode, gaps));
    let lanes = T::lanes::<E>();
    let qlen = profile.query_len();
    let local = mode.is_local();
    ws.prepare(qlen, lanes, profile.alphabet_size())?;

    // Empty targets are exact without DP; targets whose top boundary leaves
    // the lane range go straight to the next tier.
    let mut feed = Vec::with_capacity(targets.len());
    for (slot, target) in targets.iter().enumerate() {
        if target.is_empty() {
            out.scores.push((slot, empty_target_score(mode, qlen, gaps)));
        } else if !local && !T::holds_exactly(-gaps.cost(target.len())) {
            out.escalated.push(slot);
        } else {
            feed.push(slot);
        }
    }
    if feed.is_empty() {
        return Ok(());
    }
    log::trace!(
        "{} engine: {} of {} targets on {} lanes of {} bits",
        E::NAME,
        feed.len(),
        targets.len(),
        lanes,
        std::mem::size_of::<T>() * 8
    );

    let goe = gaps.open_extend();
    let v_goe = unsafe { T::splat::<E>(T::from_i64_saturating(goe)) };
    let v_ext = unsafe { T::splat::<E>(T::from_i64_saturating(gaps.extend as i64)) };

    let mut mux = ChannelMux::new(targets, feed, lanes);
    let mut fresh = Vec::with_capacity(lanes);

    loop {
        fresh.clear();
        if mux.refill(&mut fresh) == MuxState::Done {
            break;
        }
        for &lane in &fresh {
            reset_lane(ws, lane, local, gaps);
        }

        mux.fill_window(LANE_DEPTH, &mut ws.window);
        fill_step_profile(profile, &ws.window, &mut ws.step_profile, lanes);
        if !local {
            seed_global_boundary(ws, &mux, gaps);
        }

        unsafe { step::<E, T>(ws, profile.query(), local, v_goe, v_ext) };

        for lane in 0..lanes {
            if !mux.is_active(lane) {
                continue;
            }
            let saturated =
                ws.hmax[lane] == T::MAX || (!local && ws.hmin[lane] == T::MIN);
            if saturated {
                mux.mark_escalate(lane);
            }
            if local {
                mux.raise_score(lane, ws.hmax[lane].to_i64());
            }

            match mux.channel(lane).end_within(LANE_DEPTH) {
                Some(end) => {
                    if !local {
                        mux.set_score(lane, ws.last_row[end * lanes + lane].to_i64());
                    }
                    if let Some(done) = mux.retire(lane) {
                        if done.escalate {
                            out.escalated.push(done.slot);
                        } else {
                            out.scores.push((done.slot, done.score));
                        }
                    }
                }
                None => {
                    mux.advance(lane, LANE_DEPTH);
                }
            }
        }
    }

    Ok(())
}

/// Load the left boundary into a lane that just received a new sequence.
fn reset_lane<T: LaneScore>(ws: &mut StripedWorkspace<T>, lane: usize, local: bool, gaps: &GapCosts) {
    let lanes = ws.lanes();
    let goe = gaps.open_extend();
    for i in 0..ws.query_len() {
        let idx = i * lanes + lane;
        if local {
            ws.h[idx] = T::ZERO;
            ws.e[idx] = T::ZERO;
        } else {
            // H(i,-1) and the E value entering column 0
            let h = -gaps.cost(i + 1);
            ws.h[idx] = T::from_i64_saturating(h);
            ws.e[idx] = T::from_i64_saturating(h - goe);
        }
    }
}

/// Top boundary of each lane's next `LANE_DEPTH` columns: H above the first
/// query row, the F value entering row 0, and the corner left of the window.
fn seed_global_boundary<T: LaneScore>(ws: &mut StripedWorkspace<T>, mux: &ChannelMux<'_>, gaps: &GapCosts) {
    let lanes = ws.lanes();
    let goe = gaps.open_extend();
    for lane in 0..lanes {
        let cursor = mux.channel(lane).cursor();
        ws.corner[lane] = if cursor == 0 {
            T::ZERO
        } else {
            T::from_i64_saturating(-gaps.cost(cursor))
        };
        for d in 0..LANE_DEPTH {
            let top = -gaps.cost(cursor + d + 1);
            ws.up[d * lanes + lane] = T::from_i64_saturating(top);
            ws.f[d * lanes + lane] = T::from_i64_saturating(top - goe);
        }
    }
}

/// Scores of each lane's window residues, for every query code in use.
fn fill_step_profile<T: LaneScore>(
    profile: &ScoreProfile<T>,
    window: &[u8],
    step_profile: &mut [T],
    lanes: usize,
) {
    for &qc in profile.present_codes() {
        let scores = profile.for_query_code(qc);
        let base = qc as usize * LANE_DEPTH * lanes;
        let dst = &mut step_profile[base..base + LANE_DEPTH * lanes];
        for (slot, &r) in dst.iter_mut().zip(window) {
            *slot = if r == PAD { T::ZERO } else { scores[r as usize] };
        }
    }
}

/// One kernel step: every query row against `LANE_DEPTH` columns per lane.
#[inline(always)]
unsafe fn step<E: SimdEngine, T: LaneScore>(
    ws: &mut StripedWorkspace<T>,
    query: &[u8],
    local: bool,
    v_goe: T::Vector<E>,
    v_ext: T::Vector<E>,
) {
    let lanes = ws.lanes();
    unsafe {
        let zero = T::splat::<E>(T::ZERO);
        let mut up: [T::Vector<E>; LANE_DEPTH] =
            std::array::from_fn(|d| T::load::<E>(&ws.up[d * lanes..]));
        let mut f: [T::Vector<E>; LANE_DEPTH] =
            std::array::from_fn(|d| T::load::<E>(&ws.f[d * lanes..]));
        let mut hmax = T::splat::<E>(if local { T::ZERO } else { T::MIN });
        let mut hmin = T::splat::<E>(T::MAX);
        let mut left_above = T::load::<E>(&ws.corner);

        for (i, &qc) in query.iter().enumerate() {
            let row = i * lanes;
            let prof = &ws.step_profile[qc as usize * LANE_DEPTH * lanes..];
            let left = T::load::<E>(&ws.h[row..]);
            let mut e = T::load::<E>(&ws.e[row..]);
            let mut diag = left_above;
            let mut h = zero;

            for d in 0..LANE_DEPTH {
                h = T::adds::<E>(diag, T::load::<E>(&prof[d * lanes..]));
                h = T::vmax::<E>(h, e);
                h = T::vmax::<E>(h, f[d]);
                if local {
                    h = T::vmax::<E>(h, zero);
                }
                hmax = T::vmax::<E>(hmax, h);
                hmin = T::vmin::<E>(hmin, h);

                diag = up[d];
                up[d] = h;

                let open = T::subs::<E>(h, v_goe);
                f[d] = T::vmax::<E>(T::subs::<E>(f[d], v_ext), open);
                e = T::vmax::<E>(T::subs::<E>(e, v_ext), open);
            }

            T::store::<E>(&mut ws.h[row..], h);
            T::store::<E>(&mut ws.e[row..], e);
            left_above = left;
        }

        for (d, v) in up.iter().enumerate() {
            T::store::<E>(&mut ws.last_row[d * lanes..], *v);
        }
        T::store::<E>(&mut ws.hmax, hmax);
        T::store::<E>(&mut ws.hmin, hmin);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::simd_abstraction::SimdEnginePortable;
    use crate::core::alignment::scalar;
    use crate::core::alignment::workspace::ScalarWorkspace;
    use crate::core::alphabet::Alphabet;
    use crate::core::scoring::ScoreMatrix;

    fn run_portable<T: LaneScore>(
        mode: AlignmentMode,
        query: &[u8],
        targets: &[&[u8]],
        matrix: &ScoreMatrix,
        gaps: &GapCosts,
    ) -> TierOutcome {
        let profile = ScoreProfile::<T>::build(query, matrix).unwrap();
        let mut ws = StripedWorkspace::<T>::default();
        let mut out = TierOutcome::default();
        unsafe {
            align_batch::<SimdEnginePortable, T>(mode, &profile, targets, gaps, &mut ws, &mut out)
                .unwrap();
        }
        out.scores.sort_unstable();
        out.escalated.sort_unstable();
        out
    }

    fn wide(mode: AlignmentMode, query: &[u8], target: &[u8], matrix: &ScoreMatrix, gaps: &GapCosts) -> i64 {
        let profile = ScoreProfile::<i64>::build(query, matrix).unwrap();
        scalar::align(mode, &profile, target, gaps, &mut ScalarWorkspace::default())
            .unwrap()
            .unwrap()
            .score
    }

    #[test]
    fn test_reference_pair_both_modes() {
        let m = ScoreMatrix::constant(Alphabet::Nucleotide, 1, -1);
        let gaps = GapCosts::new(1, 1).unwrap();
        let q = Alphabet::Nucleotide.encode(b"AT");
        let d = Alphabet::Nucleotide.encode(b"AATG");
        let targets = [d.as_slice()];

        let sw = run_portable::<i8>(AlignmentMode::Local, &q, &targets, &m, &gaps);
        assert_eq!(sw.scores, vec![(0, 2)]);
        let nw = run_portable::<i16>(AlignmentMode::Global, &q, &targets, &m, &gaps);
        assert_eq!(nw.scores, vec![(0, -2)]);
    }

    #[test]
    fn test_many_lengths_match_wide_kernel() {
        let m = ScoreMatrix::constant(Alphabet::Nucleotide, 2, -3);
        let gaps = GapCosts::new(3, 1).unwrap();
        let q = Alphabet::Nucleotide.encode(b"ACGTTGCAACGTAGCTAGGA");
        // lengths 0..=40 exercise every end depth and more targets than lanes
        let seqs: Vec<Vec<u8>> = (0..41)
            .map(|n| (0..n).map(|k| ((k * 7 + n * 3) % 4) as u8).collect())
            .collect();
        let targets: Vec<&[u8]> = seqs.iter().map(|s| s.as_slice()).collect();

        for mode in [AlignmentMode::Local, AlignmentMode::Global] {
            let out = run_portable::<i16>(mode, &q, &targets, &m, &gaps);
            assert!(out.escalated.is_empty(), "{mode}: {:?}", out.escalated);
            assert_eq!(out.scores.len(), targets.len());
            for &(slot, score) in &out.scores {
                assert_eq!(score, wide(mode, &q, targets[slot], &m, &gaps), "{mode} slot {slot}");
            }
        }
    }

    #[test]
    fn test_saturation_escalates_only_long_match() {
        let m = ScoreMatrix::constant(Alphabet::Nucleotide, 5, -4);
        let gaps = GapCosts::new(3, 1).unwrap();
        let q: Vec<u8> = (0..40).map(|k| (k % 4) as u8).collect();
        let same = q.clone();
        let other = vec![0u8; 40];
        let targets = [same.as_slice(), other.as_slice()];

        let out = run_portable::<i8>(AlignmentMode::Local, &q, &targets, &m, &gaps);
        // 40 matches * 5 = 200 exceeds i8
        assert_eq!(out.escalated, vec![0]);
        assert_eq!(out.scores, vec![(1, wide(AlignmentMode::Local, &q, &other, &m, &gaps))]);
    }

    #[test]
    fn test_global_top_boundary_escalates() {
        let m = ScoreMatrix::constant(Alphabet::Nucleotide, 1, -1);
        let gaps = GapCosts::new(1, 1).unwrap();
        let q = Alphabet::Nucleotide.encode(b"ACGT");
        let long = vec![0u8; 300];
        let short = vec![0u8; 10];
        let targets = [long.as_slice(), short.as_slice()];
        let out = run_portable::<i8>(AlignmentMode::Global, &q, &targets, &m, &gaps);
        assert_eq!(out.escalated, vec![0]);
        assert_eq!(out.scores, vec![(1, wide(AlignmentMode::Global, &q, &short, &m, &gaps))]);
    }
}
