//! Search orchestrator
//!
//! Coordinates a database search across worker threads:
//! - Builds every query profile up front (configuration errors surface
//!   before any kernel runs)
//! - Runs one worker per pool thread; each claims the next chunk from the
//!   shared source under a mutex and runs it through the cascade
//! - Keeps a private top-K collector and counters per worker, merged after
//!   all workers finish
//!
//! # Pipeline Flow
//!
//! ```text
//! [SequenceSource] ─next_chunk()─▶ worker ─▶ Cascade (8 → 16 → 64) ─▶ TopK
//!        (mutex)                   worker ─▶ Cascade               ─▶ TopK ─┐
//!                                  ...                                      ├─▶ merge ─▶ hits
//!                                  worker ─▶ Cascade               ─▶ TopK ─┘
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::compute::simd_abstraction::{SimdEngineType, resolve_simd_engine, simd_engine_description};
use crate::config::SearchConfig;
use crate::core::alignment::profile::QueryProfiles;
use crate::core::alignment::workspace::with_workspace;
use crate::core::sequence::QuerySet;
use crate::core::topk::{SearchHit, TopK};
use crate::error::{Result, SearchError};
use crate::pipelines::search::cascade::{CascadeController, SearchCounters};
use crate::pipelines::search::source::SequenceSource;

/// Outcome of a search.
#[derive(Debug, Clone)]
pub struct SearchReport {
    /// Best hits, highest-ranked first.
    pub hits: Vec<SearchHit>,
    pub counters: SearchCounters,
    pub engine: SimdEngineType,
    /// True when the cancel flag stopped the search early.
    pub cancelled: bool,
    pub elapsed: Duration,
}

/// What one worker brings back.
struct WorkerOutput {
    top: TopK,
    counters: SearchCounters,
}

/// Search `queries` against every sequence of `source`.
///
/// Returns the best `config.top_k` hits over all (query, sequence) pairs plus
/// diagnostics. Pairs that overflow even the 64-bit kernel are skipped and
/// listed in `counters.fatal_overflows`.
pub fn run_search<S: SequenceSource>(
    queries: &QuerySet,
    source: &mut S,
    config: &SearchConfig,
) -> Result<SearchReport> {
    let start_time = Instant::now();
    config.validate()?;
    if queries.is_empty() {
        return Err(SearchError::config("no query sequences"));
    }

    let profiles = queries
        .iter()
        .map(|q| QueryProfiles::build(q.id, &q.residues, config.matrix.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    let engine = resolve_simd_engine(config.engine);
    log::info!(
        "Searching {} query sequence(s): {} mode, start at {}, engine {}",
        queries.len(),
        config.mode,
        config.start_precision,
        simd_engine_description(engine)
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .thread_name(|i| format!("search-worker-{i}"))
        .build()?;
    log::debug!("Worker pool started with {} threads", pool.current_num_threads());

    let cascade = CascadeController::new(config, queries, &profiles, engine);
    let shared_source = Mutex::new(source);
    let abort = AtomicBool::new(false);

    let outputs: Vec<Result<WorkerOutput>> = pool.broadcast(|_| {
        let result = run_worker(&cascade, &shared_source, config, &abort);
        if result.is_err() {
            abort.store(true, Ordering::Relaxed);
        }
        result
    });

    let mut top = TopK::new(config.top_k);
    let mut counters = SearchCounters::default();
    for output in outputs {
        let output = output?;
        top.merge(output.top);
        counters.merge(output.counters);
    }
    counters.fatal_overflows.sort_unstable();

    let cancelled = config.is_cancelled();
    let elapsed = start_time.elapsed();
    if cancelled {
        log::warn!("Search cancelled after {} chunks", counters.chunks_processed);
    }
    if !counters.fatal_overflows.is_empty() {
        log::warn!(
            "{} pair(s) exceeded the 64-bit score range and were skipped",
            counters.fatal_overflows.len()
        );
    }
    log::info!(
        "Processed {} sequences in {} chunks ({:.2}s); escalations 8-bit: {}, 16-bit: {}",
        counters.sequences_processed,
        counters.chunks_processed,
        elapsed.as_secs_f64(),
        counters.escalations[0],
        counters.escalations[1]
    );

    Ok(SearchReport {
        hits: top.drain_sorted(),
        counters,
        engine,
        cancelled,
        elapsed,
    })
}

/// Claim chunks until the source is exhausted, the search is cancelled or
/// another worker failed.
fn run_worker<S: SequenceSource>(
    cascade: &CascadeController<'_>,
    source: &Mutex<&mut S>,
    config: &SearchConfig,
    abort: &AtomicBool,
) -> Result<WorkerOutput> {
    let mut top = TopK::new(config.top_k);
    let mut counters = SearchCounters::default();

    loop {
        if abort.load(Ordering::Relaxed) || config.is_cancelled() {
            break;
        }
        let chunk = {
            let mut guard = source.lock().unwrap_or_else(PoisonError::into_inner);
            guard.next_chunk()?
        };
        if chunk.is_empty() {
            break;
        }
        with_workspace(|ws| cascade.process_chunk(&chunk, ws, &mut top, &mut counters))?;
    }

    Ok(WorkerOutput { top, counters })
}
