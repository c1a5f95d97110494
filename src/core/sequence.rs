//! Database and query sequence types.
//!
//! Residues are stored as alphabet codes (see [`crate::core::alphabet`]).
//! The engine borrows them read-only for the duration of a search.

use crate::core::alphabet::{reverse_complement, Alphabet};

/// One database sequence with a stable identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    pub id: usize,
    pub header: String,
    pub residues: Vec<u8>,
}

impl Sequence {
    pub fn new(id: usize, header: impl Into<String>, residues: Vec<u8>) -> Self {
        Sequence {
            id,
            header: header.into(),
            residues,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.residues.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Forward,
    Reverse,
}

/// Which strands of a nucleotide query are searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrandMode {
    #[default]
    Forward,
    Reverse,
    Both,
}

/// One searchable query sequence (a strand of an input query).
///
/// `strand` is carried through to results; the engine itself only uses `id`
/// and `residues`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySequence {
    pub id: usize,
    pub name: String,
    pub residues: Vec<u8>,
    pub strand: Strand,
}

impl QuerySequence {
    #[inline]
    pub fn len(&self) -> usize {
        self.residues.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }
}

/// All query sequences of one search, with dense ids `0..len()`.
#[derive(Debug, Clone, Default)]
pub struct QuerySet {
    sequences: Vec<QuerySequence>,
}

impl QuerySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an encoded query. Nucleotide queries expand into one entry per
    /// requested strand; protein queries always add a single forward entry.
    pub fn push(&mut self, name: &str, residues: Vec<u8>, alphabet: Alphabet, strands: StrandMode) {
        let want_forward = alphabet == Alphabet::AminoAcid || strands != StrandMode::Reverse;
        let want_reverse = alphabet == Alphabet::Nucleotide && strands != StrandMode::Forward;

        if want_reverse {
            let rc = reverse_complement(&residues);
            if want_forward {
                self.push_one(name, residues, Strand::Forward);
            }
            self.push_one(name, rc, Strand::Reverse);
        } else if want_forward {
            self.push_one(name, residues, Strand::Forward);
        }
    }

    fn push_one(&mut self, name: &str, residues: Vec<u8>, strand: Strand) {
        let id = self.sequences.len();
        self.sequences.push(QuerySequence {
            id,
            name: name.to_string(),
            residues,
            strand,
        });
    }

    pub fn get(&self, id: usize) -> Option<&QuerySequence> {
        self.sequences.get(id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QuerySequence> {
        self.sequences.iter()
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

impl<'a> IntoIterator for &'a QuerySet {
    type Item = &'a QuerySequence;
    type IntoIter = std::slice::Iter<'a, QuerySequence>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
