//! Thread-local workspace for reusable allocations
//!
//! The DP buffers of every kernel are sized by the query length and the lane
//! count of the active engine. Workers keep one workspace per thread and reuse
//! it across chunks and queries, so the hot path only allocates when a longer
//! query or a wider engine shows up.
//!
//! Growth goes through `try_reserve`; a failed allocation surfaces as
//! `SearchError::Resource` instead of aborting the process.

use crate::compute::simd_abstraction::ScoreWidth;
use crate::defaults::LANE_DEPTH;
use crate::error::{Result, try_resize};
use std::cell::RefCell;

/// Initial query length the buffers are sized for.
const INITIAL_QUERY_LEN: usize = 512;

/// Initial lane count (AVX2, 8-bit).
const INITIAL_LANES: usize = 32;

// Thread-local workspace for alignment buffers
thread_local! {
    static WORKSPACE: RefCell<SearchWorkspace> = RefCell::new(SearchWorkspace::new());
}

/// Run `f` with this thread's workspace.
pub fn with_workspace<R>(f: impl FnOnce(&mut SearchWorkspace) -> R) -> R {
    WORKSPACE.with(|ws| f(&mut ws.borrow_mut()))
}

/// Buffers of one striped-kernel pass, lane-interleaved (`[row * lanes + lane]`).
#[derive(Debug, Default)]
pub struct StripedWorkspace<T> {
    /// H column at the last processed database position, one entry per query row.
    pub h: Vec<T>,
    /// E (horizontal gap) value entering the next database position.
    pub e: Vec<T>,
    /// Per-step lane profile, `[(query_code * LANE_DEPTH + d) * lanes + lane]`.
    pub step_profile: Vec<T>,
    /// Database residues of the step, `[d * lanes + lane]`.
    pub window: Vec<u8>,
    /// H of the previous row at each depth; seeded with the top boundary.
    pub up: Vec<T>,
    /// F (vertical gap) value at each depth.
    pub f: Vec<T>,
    /// H of the top boundary left of the step's first column, per lane.
    pub corner: Vec<T>,
    /// H of the last query row at each depth, `[d * lanes + lane]`.
    pub last_row: Vec<T>,
    /// Step-wide maximum and minimum H, per lane.
    pub hmax: Vec<T>,
    pub hmin: Vec<T>,
    lanes: usize,
    query_len: usize,
}

impl<T: ScoreWidth> StripedWorkspace<T> {
    pub fn with_capacity(query_len: usize, lanes: usize) -> Self {
        StripedWorkspace {
            h: Vec::with_capacity(query_len * lanes),
            e: Vec::with_capacity(query_len * lanes),
            window: Vec::with_capacity(LANE_DEPTH * lanes),
            up: Vec::with_capacity(LANE_DEPTH * lanes),
            f: Vec::with_capacity(LANE_DEPTH * lanes),
            last_row: Vec::with_capacity(LANE_DEPTH * lanes),
            ..Default::default()
        }
    }

    /// Size every buffer for a pass over a `query_len` query with `lanes`
    /// lanes and an alphabet of `alphabet_size` codes. Contents are reset.
    pub fn prepare(&mut self, query_len: usize, lanes: usize, alphabet_size: usize) -> Result<()> {
        let column = query_len * lanes;
        try_resize(&mut self.h, column, T::ZERO, "striped H column")?;
        try_resize(&mut self.e, column, T::ZERO, "striped E column")?;
        try_resize(
            &mut self.step_profile,
            alphabet_size * LANE_DEPTH * lanes,
            T::ZERO,
            "lane profile",
        )?;
        try_resize(&mut self.window, LANE_DEPTH * lanes, 0u8, "residue window")?;
        try_resize(&mut self.up, LANE_DEPTH * lanes, T::ZERO, "boundary row")?;
        try_resize(&mut self.f, LANE_DEPTH * lanes, T::ZERO, "F row")?;
        try_resize(&mut self.corner, lanes, T::ZERO, "corner")?;
        try_resize(&mut self.last_row, LANE_DEPTH * lanes, T::ZERO, "last row")?;
        try_resize(&mut self.hmax, lanes, T::ZERO, "lane maximum")?;
        try_resize(&mut self.hmin, lanes, T::ZERO, "lane minimum")?;
        self.lanes = lanes;
        self.query_len = query_len;
        Ok(())
    }

    #[inline]
    pub fn lanes(&self) -> usize {
        self.lanes
    }

    #[inline]
    pub fn query_len(&self) -> usize {
        self.query_len
    }
}

/// Buffers of the 64-bit kernel: one H and one E entry per query row.
#[derive(Debug, Default)]
pub struct ScalarWorkspace {
    pub h: Vec<i64>,
    pub e: Vec<i64>,
}

impl ScalarWorkspace {
    pub fn prepare(&mut self, query_len: usize) -> Result<()> {
        try_resize(&mut self.h, query_len, 0, "scalar H column")?;
        try_resize(&mut self.e, query_len, 0, "scalar E column")?;
        Ok(())
    }
}

/// Reusable buffers for every precision tier.
#[derive(Debug)]
pub struct SearchWorkspace {
    pub byte: StripedWorkspace<i8>,
    pub word: StripedWorkspace<i16>,
    pub wide: ScalarWorkspace,
}

impl SearchWorkspace {
    /// Create a new workspace with pre-allocated buffers
    pub fn new() -> Self {
        Self {
            byte: StripedWorkspace::with_capacity(INITIAL_QUERY_LEN, INITIAL_LANES),
            word: StripedWorkspace::with_capacity(INITIAL_QUERY_LEN, INITIAL_LANES / 2),
            wide: ScalarWorkspace {
                h: Vec::with_capacity(INITIAL_QUERY_LEN),
                e: Vec::with_capacity(INITIAL_QUERY_LEN),
            },
        }
    }
}

impl Default for SearchWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_sizes_buffers() {
        let mut ws = StripedWorkspace::<i16>::default();
        ws.prepare(10, 8, 5).unwrap();
        assert_eq!(ws.h.len(), 80);
        assert_eq!(ws.e.len(), 80);
        assert_eq!(ws.step_profile.len(), 5 * LANE_DEPTH * 8);
        assert_eq!(ws.window.len(), LANE_DEPTH * 8);
        assert_eq!((ws.lanes(), ws.query_len()), (8, 10));

        ws.h[3] = 7;
        ws.prepare(4, 8, 5).unwrap();
        assert_eq!(ws.h.len(), 32);
        assert!(ws.h.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_thread_local_workspace_is_reused() {
        with_workspace(|ws| ws.wide.prepare(100).unwrap());
        let cap = with_workspace(|ws| ws.wide.h.capacity());
        assert!(cap >= 100);
    }
}
