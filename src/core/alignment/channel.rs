//! Channel multiplexer for the striped kernels.
//!
//! Each SIMD lane ("channel") holds at most one database sequence at a time.
//! The multiplexer hands out sequences in feed order as lanes become free and
//! keeps the per-lane bookkeeping: cursor, length, score accumulator and the
//! escalation flag. All state lives in a `Vec<Channel>` indexed by lane.
//!
//! ```text
//!            refill(): every lane busy
//!   ┌────────────────────────────────────────┐
//!   ▼                                        │
//! Feeding ──step ends a sequence──▶ Draining ┤
//!                                            │ refill(): nothing left in
//!                                            │ flight and feed exhausted
//!                                            ▼
//!                                          Done
//! ```
//!
//! Lanes that cannot be refilled stay idle: the kernel feeds them `PAD`
//! residues and ignores them when checking for saturation.

/// Window marker for a lane with no residue at this depth.
pub const PAD: u8 = u8::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuxState {
    /// Every lane has a sequence in flight.
    Feeding,
    /// At least one lane finished its sequence in the last step.
    Draining,
    /// No sequence in flight and none left to assign.
    Done,
}

/// Book-keeping of one lane.
#[derive(Debug, Clone, Default)]
pub struct Channel {
    slot: Option<usize>,
    cursor: usize,
    len: usize,
    score: i64,
    escalate: bool,
}

impl Channel {
    /// Index (into the kernel's target list) of the sequence in flight.
    #[inline]
    pub fn slot(&self) -> Option<usize> {
        self.slot
    }

    /// Next database position to be processed.
    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn score(&self) -> i64 {
        self.score
    }

    #[inline]
    pub fn escalate(&self) -> bool {
        self.escalate
    }

    /// Depth within the next step of the final residue, if the sequence ends
    /// inside a window of `depth` residues.
    #[inline]
    pub fn end_within(&self, depth: usize) -> Option<usize> {
        if self.slot.is_some() && self.cursor + depth >= self.len {
            Some(self.len - 1 - self.cursor)
        } else {
            None
        }
    }
}

/// Result of retiring a lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retired {
    pub slot: usize,
    pub score: i64,
    pub escalate: bool,
}

pub struct ChannelMux<'a> {
    targets: &'a [&'a [u8]],
    feed: Vec<usize>,
    next: usize,
    channels: Vec<Channel>,
    state: MuxState,
}

impl<'a> ChannelMux<'a> {
    /// `feed` lists the target indices to process, in order. Every listed
    /// target must be non-empty.
    pub fn new(targets: &'a [&'a [u8]], feed: Vec<usize>, lanes: usize) -> Self {
        debug_assert!(lanes > 0);
        debug_assert!(feed.iter().all(|&t| !targets[t].is_empty()));
        ChannelMux {
            targets,
            feed,
            next: 0,
            channels: vec![Channel::default(); lanes],
            state: MuxState::Draining,
        }
    }

    #[inline]
    pub fn lanes(&self) -> usize {
        self.channels.len()
    }

    #[inline]
    pub fn state(&self) -> MuxState {
        self.state
    }

    #[inline]
    pub fn channel(&self, lane: usize) -> &Channel {
        &self.channels[lane]
    }

    #[inline]
    pub fn is_active(&self, lane: usize) -> bool {
        self.channels[lane].slot.is_some()
    }

    /// Sequences not yet assigned to any lane.
    pub fn remaining(&self) -> usize {
        self.feed.len() - self.next
    }

    /// Put the next unconsumed sequence on an idle `lane`.
    pub fn assign(&mut self, lane: usize) -> Option<usize> {
        debug_assert!(self.channels[lane].slot.is_none(), "lane {lane} is busy");
        let slot = *self.feed.get(self.next)?;
        self.next += 1;
        self.channels[lane] = Channel {
            slot: Some(slot),
            cursor: 0,
            len: self.targets[slot].len(),
            score: 0,
            escalate: false,
        };
        Some(slot)
    }

    /// Take the sequence off `lane`, leaving the lane idle.
    pub fn retire(&mut self, lane: usize) -> Option<Retired> {
        let ch = std::mem::take(&mut self.channels[lane]);
        let slot = ch.slot?;
        self.state = MuxState::Draining;
        Some(Retired {
            slot,
            score: ch.score,
            escalate: ch.escalate,
        })
    }

    /// Assign sequences to every idle lane. Lanes that received a fresh
    /// sequence are appended to `fresh`.
    pub fn refill(&mut self, fresh: &mut Vec<usize>) -> MuxState {
        for lane in 0..self.channels.len() {
            if self.channels[lane].slot.is_none() && self.assign(lane).is_some() {
                fresh.push(lane);
            }
        }

        let busy = self.channels.iter().filter(|c| c.slot.is_some()).count();
        let next_state = if busy == 0 {
            MuxState::Done
        } else if busy == self.channels.len() || self.remaining() == 0 {
            // idle lanes are permanently retired once the feed is empty
            MuxState::Feeding
        } else {
            MuxState::Draining
        };
        if next_state != self.state {
            log::trace!(
                "channel mux {:?} -> {:?} ({} busy, {} queued)",
                self.state,
                next_state,
                busy,
                self.remaining()
            );
        }
        self.state = next_state;
        next_state
    }

    /// Residues for the next step, `window[d * lanes + lane]`, `PAD` past the
    /// end of a sequence and on idle lanes.
    pub fn fill_window(&self, depth: usize, window: &mut [u8]) {
        let lanes = self.channels.len();
        debug_assert!(window.len() >= depth * lanes);
        for (lane, ch) in self.channels.iter().enumerate() {
            let residues = ch.slot.map(|s| self.targets[s]).unwrap_or(&[]);
            for d in 0..depth {
                window[d * lanes + lane] = residues.get(ch.cursor + d).copied().unwrap_or(PAD);
            }
        }
    }

    #[inline]
    pub fn mark_escalate(&mut self, lane: usize) {
        self.channels[lane].escalate = true;
    }

    /// Keep the larger of the accumulated and the offered score.
    #[inline]
    pub fn raise_score(&mut self, lane: usize, score: i64) {
        let ch = &mut self.channels[lane];
        ch.score = ch.score.max(score);
    }

    #[inline]
    pub fn set_score(&mut self, lane: usize, score: i64) {
        self.channels[lane].score = score;
    }

    /// Move the lane's cursor forward by `depth`. Returns true when the
    /// sequence has been fully consumed.
    #[inline]
    pub fn advance(&mut self, lane: usize, depth: usize) -> bool {
        let ch = &mut self.channels[lane];
        ch.cursor += depth;
        ch.cursor >= ch.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Run the mux to completion without any scoring, returning the order in
    /// which slots were retired.
    fn drain(targets: &[&[u8]], lanes: usize, depth: usize) -> Vec<usize> {
        let feed: Vec<usize> = (0..targets.len()).collect();
        let mut mux = ChannelMux::new(targets, feed, lanes);
        let mut retired = Vec::new();
        let mut fresh = Vec::new();
        while mux.refill(&mut fresh) != MuxState::Done {
            fresh.clear();
            for lane in 0..lanes {
                if mux.is_active(lane) && mux.advance(lane, depth) {
                    retired.push(mux.retire(lane).unwrap().slot);
                }
            }
        }
        retired
    }

    #[test]
    fn test_every_sequence_retired_once() {
        let seqs: Vec<Vec<u8>> = (0..37).map(|i| vec![0u8; 1 + (i * 7) % 23]).collect();
        let targets: Vec<&[u8]> = seqs.iter().map(|s| s.as_slice()).collect();
        for lanes in [1, 3, 16, 64] {
            let mut retired = drain(&targets, lanes, 4);
            retired.sort_unstable();
            assert_eq!(retired, (0..37).collect::<Vec<_>>(), "lanes={lanes}");
        }
    }

    #[test]
    fn test_empty_feed_is_done() {
        let mut mux = ChannelMux::new(&[], Vec::new(), 8);
        assert_eq!(mux.refill(&mut Vec::new()), MuxState::Done);
    }

    #[test]
    fn test_window_pads_short_and_idle_lanes() {
        let a: &[u8] = &[1, 2, 3, 0, 1, 2];
        let b: &[u8] = &[3];
        let targets = [a, b];
        let mut mux = ChannelMux::new(&targets, vec![0, 1], 3);
        let mut fresh = Vec::new();
        assert_eq!(mux.refill(&mut fresh), MuxState::Feeding);
        assert_eq!(fresh, vec![0, 1]);

        let mut window = vec![0u8; 4 * 3];
        mux.fill_window(4, &mut window);
        assert_eq!(&window[0..3], &[1, 3, PAD]);
        assert_eq!(&window[3..6], &[2, PAD, PAD]);
        assert_eq!(mux.channel(1).end_within(4), Some(0));
        assert_eq!(mux.channel(0).end_within(4), None);

        assert!(!mux.advance(0, 4));
        assert!(mux.advance(1, 4));
        mux.fill_window(4, &mut window);
        assert_eq!(&window[0..3], &[1, PAD, PAD]);
        assert_eq!(mux.channel(0).end_within(4), Some(1));
    }

    #[test]
    fn test_retire_reports_score_and_flag() {
        let a: &[u8] = &[0, 0];
        let targets = [a];
        let mut mux = ChannelMux::new(&targets, vec![0], 2);
        mux.refill(&mut Vec::new());
        mux.raise_score(0, 5);
        mux.raise_score(0, 3);
        mux.mark_escalate(0);
        assert_eq!(
            mux.retire(0),
            Some(Retired {
                slot: 0,
                score: 5,
                escalate: true
            })
        );
        assert_eq!(mux.state(), MuxState::Draining);
        assert_eq!(mux.retire(0), None);
        assert_eq!(mux.refill(&mut Vec::new()), MuxState::Done);
    }
}
