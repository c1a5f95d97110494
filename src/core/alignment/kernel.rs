//! Kernel strategy: {local, global} x {8-bit, 16-bit, 64-bit}.
//!
//! `Kernel` is the single entry point the cascade uses to score a batch of
//! database sequences at one precision. The 8/16-bit variants go through the
//! striped kernel on the engine picked at runtime; the 64-bit variant loops
//! the scalar kernel over the batch.

use crate::compute::simd_abstraction::{LaneScore, SimdEngineType, SimdEnginePortable};
use crate::core::alignment::profile::{QueryProfiles, ScoreProfile};
use crate::core::alignment::scalar;
use crate::core::alignment::striped::{self, TierOutcome};
use crate::core::alignment::workspace::{ScalarWorkspace, SearchWorkspace, StripedWorkspace};
use crate::core::alignment::{AlignmentMode, Precision, empty_target_score};
use crate::core::scoring::{GapCosts, SubstitutionMatrix};
use crate::core::sequence::{QuerySequence, Sequence};
use crate::error::{Result, SearchError};

#[cfg(target_arch = "x86_64")]
use crate::compute::simd_abstraction::SimdEngine256;
#[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
use crate::compute::simd_abstraction::SimdEngine128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kernel {
    LocalByte,
    LocalWord,
    LocalWide,
    GlobalByte,
    GlobalWord,
    GlobalWide,
}

impl Kernel {
    pub fn new(mode: AlignmentMode, precision: Precision) -> Self {
        match (mode, precision) {
            (AlignmentMode::Local, Precision::Byte) => Kernel::LocalByte,
            (AlignmentMode::Local, Precision::Word) => Kernel::LocalWord,
            (AlignmentMode::Local, Precision::Wide) => Kernel::LocalWide,
            (AlignmentMode::Global, Precision::Byte) => Kernel::GlobalByte,
            (AlignmentMode::Global, Precision::Word) => Kernel::GlobalWord,
            (AlignmentMode::Global, Precision::Wide) => Kernel::GlobalWide,
        }
    }

    pub fn mode(self) -> AlignmentMode {
        match self {
            Kernel::LocalByte | Kernel::LocalWord | Kernel::LocalWide => AlignmentMode::Local,
            Kernel::GlobalByte | Kernel::GlobalWord | Kernel::GlobalWide => AlignmentMode::Global,
        }
    }

    pub fn precision(self) -> Precision {
        match self {
            Kernel::LocalByte | Kernel::GlobalByte => Precision::Byte,
            Kernel::LocalWord | Kernel::GlobalWord => Precision::Word,
            Kernel::LocalWide | Kernel::GlobalWide => Precision::Wide,
        }
    }

    /// Whether this kernel can score the query at all. A narrow kernel whose
    /// profile does not fit forwards every non-empty target to the next tier.
    pub fn accepts(self, profiles: &QueryProfiles, gaps: &GapCosts) -> bool {
        match self.precision() {
            Precision::Byte => profiles.byte.fits(self.mode(), gaps),
            Precision::Word => profiles.word.fits(self.mode(), gaps),
            Precision::Wide => true,
        }
    }

    /// Score `targets` against one query. Results are appended to `out`,
    /// indexed by position in `targets`.
    pub fn run(
        self,
        engine: SimdEngineType,
        profiles: &QueryProfiles,
        targets: &[&[u8]],
        gaps: &GapCosts,
        ws: &mut SearchWorkspace,
        out: &mut TierOutcome,
    ) -> Result<()> {
        let mode = self.mode();
        if !self.accepts(profiles, gaps) {
            // empty targets need no DP, so they never leave the tier
            for (slot, target) in targets.iter().enumerate() {
                if target.is_empty() {
                    out.scores.push((slot, empty_target_score(mode, profiles.query_len(), gaps)));
                } else {
                    out.escalated.push(slot);
                }
            }
            return Ok(());
        }
        match self.precision() {
            Precision::Byte => align_batch(engine, mode, &profiles.byte, targets, gaps, &mut ws.byte, out),
            Precision::Word => align_batch(engine, mode, &profiles.word, targets, gaps, &mut ws.word, out),
            Precision::Wide => align_wide(mode, &profiles.wide, targets, gaps, &mut ws.wide, out),
        }
    }
}

/// Run the striped kernel on the requested engine, falling back to the
/// portable engine when the CPU lacks the features.
pub fn align_batch<T: LaneScore>(
    engine: SimdEngineType,
    mode: AlignmentMode,
    profile: &ScoreProfile<T>,
    targets: &[&[u8]],
    gaps: &GapCosts,
    ws: &mut StripedWorkspace<T>,
    out: &mut TierOutcome,
) -> Result<()> {
    match engine {
        #[cfg(target_arch = "x86_64")]
        SimdEngineType::Engine256 if is_x86_feature_detected!("avx2") => unsafe {
            align_batch_avx2(mode, profile, targets, gaps, ws, out)
        },
        #[cfg(target_arch = "x86_64")]
        SimdEngineType::Engine128 if is_x86_feature_detected!("sse4.1") => unsafe {
            align_batch_sse41(mode, profile, targets, gaps, ws, out)
        },
        #[cfg(target_arch = "aarch64")]
        SimdEngineType::Engine128 => unsafe {
            striped::align_batch::<SimdEngine128, T>(mode, profile, targets, gaps, ws, out)
        },
        _ => unsafe {
            striped::align_batch::<SimdEnginePortable, T>(mode, profile, targets, gaps, ws, out)
        },
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn align_batch_avx2<T: LaneScore>(
    mode: AlignmentMode,
    profile: &ScoreProfile<T>,
    targets: &[&[u8]],
    gaps: &GapCosts,
    ws: &mut StripedWorkspace<T>,
    out: &mut TierOutcome,
) -> Result<()> {
    unsafe { striped::align_batch::<SimdEngine256, T>(mode, profile, targets, gaps, ws, out) }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse4.1")]
unsafe fn align_batch_sse41<T: LaneScore>(
    mode: AlignmentMode,
    profile: &ScoreProfile<T>,
    targets: &[&[u8]],
    gaps: &GapCosts,
    ws: &mut StripedWorkspace<T>,
    out: &mut TierOutcome,
) -> Result<()> {
    unsafe { striped::align_batch::<SimdEngine128, T>(mode, profile, targets, gaps, ws, out) }
}

/// 64-bit tier: one scalar pass per target. Pairs outside the exact range
/// land in `out.fatal`.
fn align_wide(
    mode: AlignmentMode,
    profile: &ScoreProfile<i64>,
    targets: &[&[u8]],
    gaps: &GapCosts,
    ws: &mut ScalarWorkspace,
    out: &mut TierOutcome,
) -> Result<()> {
    for (slot, target) in targets.iter().enumerate() {
        match scalar::align(mode, profile, target, gaps, ws)? {
            Some(hit) => out.scores.push((slot, hit.score)),
            None => out.fatal.push(slot),
        }
    }
    Ok(())
}

/// Reject database residues the matrix does not define.
pub fn validate_targets(targets: &[Sequence], alphabet_size: usize) -> Result<()> {
    for seq in targets {
        if let Some(pos) = seq.residues.iter().position(|&r| r as usize >= alphabet_size) {
            return Err(SearchError::config(format!(
                "database sequence {} has residue code {} at position {} outside the matrix",
                seq.id, seq.residues[pos], pos
            )));
        }
    }
    Ok(())
}

/// Outcome of scoring one pair at a single precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairOutcome {
    Score(i64),
    /// The pair saturated (or cannot be represented) at this precision.
    Escalate,
}

/// Score a single pair at one precision, without cascading.
///
/// Exposed for testing the tiers in isolation; searches go through the
/// cascade. The 64-bit tier reports an out-of-range pair as
/// `SearchError::FatalOverflow`.
pub fn align_pair(
    query: &QuerySequence,
    target: &Sequence,
    matrix: &dyn SubstitutionMatrix,
    gaps: &GapCosts,
    mode: AlignmentMode,
    precision: Precision,
    engine: SimdEngineType,
) -> Result<PairOutcome> {
    gaps.validate()?;
    validate_targets(std::slice::from_ref(target), matrix.alphabet_size())?;
    let profiles = QueryProfiles::build(query.id, &query.residues, matrix)?;
    let mut ws = SearchWorkspace::new();
    let mut out = TierOutcome::default();
    Kernel::new(mode, precision).run(
        engine,
        &profiles,
        &[target.residues.as_slice()],
        gaps,
        &mut ws,
        &mut out,
    )?;

    pair_outcome(&out, query.id, target.id)
}

/// Outcome of a one-target tier run.
fn pair_outcome(out: &TierOutcome, query_id: usize, db_id: usize) -> Result<PairOutcome> {
    if let Some(&(_, score)) = out.scores.first() {
        Ok(PairOutcome::Score(score))
    } else if !out.fatal.is_empty() {
        Err(SearchError::FatalOverflow { query_id, db_id })
    } else {
        Ok(PairOutcome::Escalate)
    }
}
