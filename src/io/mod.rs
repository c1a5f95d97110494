//! Input collaborators of the search engine.

pub mod fasta_reader; // FASTA database/query reader using bio::io::fasta

pub use fasta_reader::{FastaChunkSource, FastaReader, read_queries};
