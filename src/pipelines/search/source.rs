//! Chunked database sources.
//!
//! A source hands out the database as ordered, fixed-capacity chunks of
//! sequences with stable ids. An empty chunk signals exhaustion. Workers
//! share one source behind a mutex; `next_chunk` is the only contended call.

use crate::core::sequence::Sequence;
use crate::defaults;
use crate::error::Result;

/// One unit of work: consecutive database sequences, fully materialized.
#[derive(Debug, Clone, Default)]
pub struct DbChunk {
    /// Position of the chunk in the source's stream.
    pub index: usize,
    pub sequences: Vec<Sequence>,
}

impl DbChunk {
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Total residues in the chunk.
    pub fn residues(&self) -> usize {
        self.sequences.iter().map(|s| s.len()).sum()
    }
}

pub trait SequenceSource: Send {
    /// The next chunk, or an empty chunk once the database is exhausted.
    fn next_chunk(&mut self) -> Result<DbChunk>;
}

/// Source over sequences already in memory.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    sequences: Vec<Sequence>,
    chunk_size: usize,
    next: usize,
    chunks_emitted: usize,
}

impl InMemorySource {
    pub fn new(sequences: Vec<Sequence>, chunk_size: usize) -> Self {
        InMemorySource {
            sequences,
            chunk_size: chunk_size.max(1),
            next: 0,
            chunks_emitted: 0,
        }
    }

    /// Wrap encoded residue strings, assigning ids `0..n` in order.
    pub fn from_residues(residues: Vec<Vec<u8>>, chunk_size: usize) -> Self {
        let sequences = residues
            .into_iter()
            .enumerate()
            .map(|(id, r)| Sequence::new(id, format!("seq{id}"), r))
            .collect();
        Self::new(sequences, chunk_size)
    }
}

impl Default for InMemorySource {
    fn default() -> Self {
        Self::new(Vec::new(), defaults::CHUNK_SIZE)
    }
}

impl SequenceSource for InMemorySource {
    fn next_chunk(&mut self) -> Result<DbChunk> {
        let end = (self.next + self.chunk_size).min(self.sequences.len());
        let sequences = self.sequences[self.next..end].to_vec();
        self.next = end;
        let index = self.chunks_emitted;
        if !sequences.is_empty() {
            self.chunks_emitted += 1;
        }
        Ok(DbChunk { index, sequences })
    }
}

impl<S: SequenceSource + ?Sized> SequenceSource for Box<S> {
    fn next_chunk(&mut self) -> Result<DbChunk> {
        (**self).next_chunk()
    }
}
