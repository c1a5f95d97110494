//! Bounded top-K collector.
//!
//! A min-heap of capacity K keyed by rank, so the worst held hit sits at the
//! root and is the first to be evicted. Rank is score descending, then
//! `(query_id, db_id)` ascending. Because the tie rule depends only on the
//! hit itself, the final contents do not depend on the order of `offer`
//! calls, and per-worker collectors can be merged in any order.
//!
//! Not synchronized: each worker owns one collector and they are merged once
//! the workers are done.

use crate::core::alignment::coordinates::AlignmentCoordinates;
use crate::error::Result;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// One reported (query, database sequence) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub score: i64,
    pub query_id: usize,
    pub db_id: usize,
    pub coordinates: Option<AlignmentCoordinates>,
}

impl SearchHit {
    pub fn new(score: i64, query_id: usize, db_id: usize) -> Self {
        SearchHit {
            score,
            query_id,
            db_id,
            coordinates: None,
        }
    }

    /// `Greater` when `self` ranks above `other`.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        self.score
            .cmp(&other.score)
            .then_with(|| (other.query_id, other.db_id).cmp(&(self.query_id, self.db_id)))
    }
}

/// Heap entry ordered by rank; coordinates do not take part.
#[derive(Debug, Clone)]
struct Ranked(SearchHit);

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.rank_cmp(&other.0)
    }
}

#[derive(Debug, Clone)]
pub struct TopK {
    capacity: usize,
    heap: BinaryHeap<Reverse<Ranked>>,
}

impl TopK {
    pub fn new(capacity: usize) -> Self {
        TopK {
            capacity,
            heap: BinaryHeap::with_capacity(capacity.min(1 << 16)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Score of the lowest-ranked hit held, if any.
    pub fn min_score(&self) -> Option<i64> {
        self.heap.peek().map(|Reverse(r)| r.0.score)
    }

    /// Offer one scored pair.
    pub fn offer(&mut self, score: i64, query_id: usize, db_id: usize) -> bool {
        self.offer_hit(SearchHit::new(score, query_id, db_id))
    }

    /// Insert `hit` if it ranks among the best `capacity` seen so far.
    /// Returns whether it was kept.
    pub fn offer_hit(&mut self, hit: SearchHit) -> bool {
        if self.capacity == 0 {
            return false;
        }
        let candidate = Ranked(hit);
        if self.heap.len() < self.capacity {
            self.heap.push(Reverse(candidate));
            return true;
        }
        match self.heap.peek_mut() {
            Some(mut worst) if candidate > worst.0 => {
                *worst = Reverse(candidate);
                true
            }
            _ => false,
        }
    }

    /// Fold another collector into this one.
    pub fn merge(&mut self, other: TopK) {
        for Reverse(Ranked(hit)) in other.heap {
            self.offer_hit(hit);
        }
    }

    /// Apply `f` to every held hit. `f` must not change score or ids.
    pub fn try_for_each_mut<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(&mut SearchHit) -> Result<()>,
    {
        let mut entries = std::mem::take(&mut self.heap).into_vec();
        let mut outcome = Ok(());
        for Reverse(Ranked(hit)) in entries.iter_mut() {
            outcome = f(hit);
            if outcome.is_err() {
                break;
            }
        }
        self.heap = BinaryHeap::from(entries);
        outcome
    }

    /// Held hits, best first.
    pub fn drain_sorted(self) -> Vec<SearchHit> {
        // ascending by Reverse == descending by rank
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(Ranked(hit))| hit)
            .collect()
    }
}
