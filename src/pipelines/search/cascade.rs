//! Overflow cascade: 8-bit, then 16-bit, then exact 64-bit.
//!
//! For every query the whole chunk is scored at the starting precision. The
//! pairs a tier flags are re-run at the next tier; the 64-bit tier has no
//! successor, and a pair it cannot score is a fatal overflow. A narrow tier
//! whose profile does not fit the query is skipped; its non-empty pairs count
//! as escalated.
//!
//! ```text
//!   chunk ──▶ [8-bit] ──S1──▶ [16-bit] ──S2──▶ [64-bit]
//!               │               │                │
//!               ▼               ▼                ▼
//!             scores          scores        scores / fatal
//! ```

use crate::compute::simd_abstraction::SimdEngineType;
use crate::config::SearchConfig;
use crate::core::alignment::coordinates::annotate_coordinates;
use crate::core::alignment::kernel::{Kernel, validate_targets};
use crate::core::alignment::profile::QueryProfiles;
use crate::core::alignment::striped::TierOutcome;
use crate::core::alignment::workspace::SearchWorkspace;
use crate::core::alignment::Precision;
use crate::core::sequence::{QuerySet, Sequence};
use crate::core::topk::TopK;
use crate::error::{Result, SearchError};
use crate::pipelines::search::source::DbChunk;
use std::collections::HashMap;

/// Diagnostics accumulated over a search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCounters {
    pub chunks_processed: u64,
    /// Database sequences read from the source.
    pub sequences_processed: u64,
    /// (query, database sequence) pairs given a final score.
    pub pairs_scored: u64,
    /// Pairs that left each tier, indexed by `Precision::index`.
    pub escalations: [u64; 3],
    /// Pairs the 64-bit tier could not score, as (query_id, db_id).
    pub fatal_overflows: Vec<(usize, usize)>,
}

impl SearchCounters {
    pub fn escalations_at(&self, precision: Precision) -> u64 {
        self.escalations[precision.index()]
    }

    pub fn merge(&mut self, other: SearchCounters) {
        self.chunks_processed += other.chunks_processed;
        self.sequences_processed += other.sequences_processed;
        self.pairs_scored += other.pairs_scored;
        for (mine, theirs) in self.escalations.iter_mut().zip(other.escalations) {
            *mine += theirs;
        }
        self.fatal_overflows.extend(other.fatal_overflows);
    }
}

/// Drives one chunk through the precision tiers for every query.
pub struct CascadeController<'a> {
    config: &'a SearchConfig,
    queries: &'a QuerySet,
    profiles: &'a [QueryProfiles],
    engine: SimdEngineType,
}

impl<'a> CascadeController<'a> {
    pub fn new(
        config: &'a SearchConfig,
        queries: &'a QuerySet,
        profiles: &'a [QueryProfiles],
        engine: SimdEngineType,
    ) -> Self {
        CascadeController {
            config,
            queries,
            profiles,
            engine,
        }
    }

    /// Score every (query, sequence) pair of `chunk` and offer the results
    /// to `top`.
    pub fn process_chunk(
        &self,
        chunk: &DbChunk,
        ws: &mut SearchWorkspace,
        top: &mut TopK,
        counters: &mut SearchCounters,
    ) -> Result<()> {
        validate_targets(&chunk.sequences, self.config.matrix.alphabet_size())?;
        counters.chunks_processed += 1;
        counters.sequences_processed += chunk.len() as u64;
        if chunk.is_empty() {
            return Ok(());
        }

        let mut out = TierOutcome::default();
        for profiles in self.profiles {
            self.cascade_query(profiles, &chunk.sequences, ws, &mut out, top, counters)?;
        }

        if self.config.compute_coordinates {
            self.annotate_chunk_hits(chunk, ws, top)?;
        }
        log::debug!(
            "chunk {}: {} sequences, {} residues",
            chunk.index,
            chunk.len(),
            chunk.residues()
        );
        Ok(())
    }

    fn cascade_query(
        &self,
        profiles: &QueryProfiles,
        sequences: &[Sequence],
        ws: &mut SearchWorkspace,
        out: &mut TierOutcome,
        top: &mut TopK,
        counters: &mut SearchCounters,
    ) -> Result<()> {
        let query_id = profiles.query_id;
        // indices into `sequences` still waiting for a score
        let mut pending: Vec<usize> = (0..sequences.len()).collect();
        let mut tier = Some(self.config.start_precision);

        while let Some(precision) = tier {
            if pending.is_empty() {
                break;
            }
            let targets: Vec<&[u8]> = pending.iter().map(|&i| sequences[i].residues.as_slice()).collect();
            out.clear();
            Kernel::new(self.config.mode, precision).run(
                self.engine,
                profiles,
                &targets,
                &self.config.gaps,
                ws,
                out,
            )?;
            debug_assert_eq!(out.len(), targets.len());
            pending = settle_tier(query_id, precision, sequences, &pending, out, top, counters);
            tier = precision.next();
        }
        Ok(())
    }

    /// Locate hits from this chunk that entered the collector without
    /// coordinates, while their residues are still in memory.
    fn annotate_chunk_hits(&self, chunk: &DbChunk, ws: &mut SearchWorkspace, top: &mut TopK) -> Result<()> {
        let by_id: HashMap<usize, &Sequence> = chunk.sequences.iter().map(|s| (s.id, s)).collect();
        let config = self.config;
        top.try_for_each_mut(|hit| {
            let (Some(target), Some(query)) = (by_id.get(&hit.db_id), self.queries.get(hit.query_id)) else {
                return Ok(());
            };
            annotate_coordinates(
                hit,
                config.mode,
                &query.residues,
                &target.residues,
                config.matrix.as_ref(),
                &config.gaps,
                &mut ws.wide,
            )
        })
    }
}

/// Apply one tier's outcome: offer scored pairs, record fatal overflows and
/// count escalations. Returns the indices into `sequences` that move on to
/// the next tier.
fn settle_tier(
    query_id: usize,
    precision: Precision,
    sequences: &[Sequence],
    pending: &[usize],
    out: &TierOutcome,
    top: &mut TopK,
    counters: &mut SearchCounters,
) -> Vec<usize> {
    for &(slot, score) in &out.scores {
        top.offer(score, query_id, sequences[pending[slot]].id);
    }
    counters.pairs_scored += out.scores.len() as u64;

    for &slot in &out.fatal {
        let db_id = sequences[pending[slot]].id;
        let err = SearchError::FatalOverflow { query_id, db_id };
        log::warn!("{err}; pair skipped");
        counters.fatal_overflows.push((query_id, db_id));
    }

    if !out.escalated.is_empty() {
        counters.escalations[precision.index()] += out.escalated.len() as u64;
        log::debug!(
            "query {}: {} of {} pairs escalated from {}",
            query_id,
            out.escalated.len(),
            pending.len(),
            precision
        );
    }
    out.escalated.iter().map(|&slot| pending[slot]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alignment::AlignmentMode;
    use crate::core::alphabet::Alphabet;
    use crate::core::scoring::ScoreMatrix;
    use crate::core::sequence::StrandMode;

    fn setup(mode: AlignmentMode, match_score: i32, start: Precision) -> (SearchConfig, QuerySet, Vec<QueryProfiles>) {
        let config = SearchConfig::builder()
            .mode(mode)
            .matrix(ScoreMatrix::constant(Alphabet::Nucleotide, match_score, -1))
            .gap_costs(1, 1)
            .start_precision(start)
            .top_k(8)
            .threads(1)
            .build()
            .unwrap();
        let mut queries = QuerySet::new();
        let q: Vec<u8> = (0..100).map(|k| (k % 4) as u8).collect();
        queries.push("q", q, Alphabet::Nucleotide, StrandMode::Forward);
        let profiles = queries
            .iter()
            .map(|q| QueryProfiles::build(q.id, &q.residues, config.matrix.as_ref()).unwrap())
            .collect();
        (config, queries, profiles)
    }

    fn chunk(queries: &QuerySet) -> DbChunk {
        let same = queries.get(0).unwrap().residues.clone();
        DbChunk {
            index: 0,
            sequences: vec![
                Sequence::new(10, "same", same),
                Sequence::new(11, "poly-a", vec![0u8; 30]),
                Sequence::new(12, "empty", Vec::new()),
            ],
        }
    }

    #[test]
    fn test_escalated_pair_scored_exactly() {
        let (config, queries, profiles) = setup(AlignmentMode::Local, 2, Precision::Byte);
        let cascade = CascadeController::new(&config, &queries, &profiles, SimdEngineType::Portable);
        let mut top = TopK::new(8);
        let mut counters = SearchCounters::default();
        cascade
            .process_chunk(&chunk(&queries), &mut SearchWorkspace::new(), &mut top, &mut counters)
            .unwrap();

        // 100 matches * 2 = 200 saturates i8 but not i16
        assert_eq!(counters.escalations_at(Precision::Byte), 1);
        assert_eq!(counters.escalations_at(Precision::Word), 0);
        assert_eq!(counters.pairs_scored, 3);
        let hits = top.drain_sorted();
        assert_eq!((hits[0].db_id, hits[0].score), (10, 200));
        assert_eq!(hits.last().map(|h| (h.db_id, h.score)), Some((12, 0)));
    }

    #[test]
    fn test_start_at_wide_never_escalates() {
        let (config, queries, profiles) = setup(AlignmentMode::Global, 2, Precision::Wide);
        let cascade = CascadeController::new(&config, &queries, &profiles, SimdEngineType::Portable);
        let mut top = TopK::new(8);
        let mut counters = SearchCounters::default();
        cascade
            .process_chunk(&chunk(&queries), &mut SearchWorkspace::new(), &mut top, &mut counters)
            .unwrap();
        assert_eq!(counters.escalations, [0, 0, 0]);
        assert_eq!(top.len(), 3);
    }

    #[test]
    fn test_unfit_tier_escalates_nonempty_pairs() {
        // a match score of 127 cannot be held exactly in an 8-bit lane
        let (config, queries, profiles) = setup(AlignmentMode::Local, 127, Precision::Byte);
        let cascade = CascadeController::new(&config, &queries, &profiles, SimdEngineType::Portable);
        let mut top = TopK::new(8);
        let mut counters = SearchCounters::default();
        cascade
            .process_chunk(&chunk(&queries), &mut SearchWorkspace::new(), &mut top, &mut counters)
            .unwrap();
        // the empty sequence is settled without leaving the 8-bit tier
        assert_eq!(counters.escalations_at(Precision::Byte), 2);
        assert_eq!(counters.pairs_scored, 3);
        assert_eq!(top.drain_sorted()[0].score, 100 * 127);
    }

    #[test]
    fn test_coordinates_attached_to_hits() {
        let (mut config, queries, profiles) = setup(AlignmentMode::Local, 2, Precision::Byte);
        config.compute_coordinates = true;
        let cascade = CascadeController::new(&config, &queries, &profiles, SimdEngineType::Portable);
        let mut top = TopK::new(8);
        cascade
            .process_chunk(&chunk(&queries), &mut SearchWorkspace::new(), &mut top, &mut SearchCounters::default())
            .unwrap();
        let hits = top.drain_sorted();
        let best = hits[0].coordinates.unwrap();
        assert_eq!((best.query_start, best.query_end, best.db_start, best.db_end), (0, 99, 0, 99));
        // the empty sequence has no alignment to locate
        assert_eq!(hits.last().unwrap().coordinates, None);
    }

    #[test]
    fn test_fatal_pair_is_recorded_and_skipped() {
        let sequences = vec![
            Sequence::new(20, "huge", vec![0; 8]),
            Sequence::new(21, "fine", vec![1; 8]),
            Sequence::new(22, "narrow", vec![2; 8]),
        ];
        // slots index the pending list, not the chunk
        let pending = vec![2, 0, 1];
        let out = TierOutcome {
            scores: vec![(2, 9)],
            escalated: vec![0],
            fatal: vec![1],
        };
        let mut top = TopK::new(8);
        let mut counters = SearchCounters::default();

        let next = settle_tier(3, Precision::Wide, &sequences, &pending, &out, &mut top, &mut counters);

        assert_eq!(next, vec![2]);
        assert_eq!(counters.fatal_overflows, vec![(3, 20)]);
        assert_eq!(counters.pairs_scored, 1);
        assert_eq!(counters.escalations_at(Precision::Wide), 1);
        let hits = top.drain_sorted();
        assert_eq!(hits.len(), 1);
        assert_eq!((hits[0].query_id, hits[0].db_id, hits[0].score), (3, 21, 9));
    }

    #[test]
    fn test_rejects_out_of_alphabet_residues() {
        let (config, queries, profiles) = setup(AlignmentMode::Local, 2, Precision::Byte);
        let cascade = CascadeController::new(&config, &queries, &profiles, SimdEngineType::Portable);
        let bad = DbChunk {
            index: 0,
            sequences: vec![Sequence::new(0, "bad", vec![0, 42])],
        };
        let err = cascade
            .process_chunk(&bad, &mut SearchWorkspace::new(), &mut TopK::new(1), &mut SearchCounters::default())
            .unwrap_err();
        assert!(matches!(err, SearchError::Config(_)));
    }
}
