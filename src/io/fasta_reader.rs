// FASTA input using bio::io::fasta
//
// Database and query files are read through one reader with:
// - Automatic gzip/bgzip detection by file extension and magic bytes
// - Parallel BGZIP decompression (noodles-bgzf) when the BGZIP header is present
//
// `FastaChunkSource` turns a database file into the chunked stream the search
// workers consume; `read_queries` loads a query file into a `QuerySet`.

use bio::io::fasta;
use flate2::read::GzDecoder;
use noodles_bgzf as bgzf;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::core::alphabet::Alphabet;
use crate::core::sequence::{QuerySet, Sequence, StrandMode};
use crate::error::{Result, SearchError};
use crate::pipelines::search::source::{DbChunk, SequenceSource};

const BUFFER_SIZE: usize = 4 * 1024 * 1024; // 4MB buffer

/// FASTA reader with automatic gzip/bgzip detection
pub struct FastaReader {
    records: fasta::Records<BufReader<Box<dyn Read + Send>>>,
}

/// Detect a BGZIP file by its gzip header carrying the 'BC' extra subfield
fn is_bgzip_format(path: &Path) -> io::Result<bool> {
    let mut file = File::open(path)?;
    let mut header = [0u8; 18];
    let mut filled = 0;
    while filled < header.len() {
        let n = file.read(&mut header[filled..])?;
        if n == 0 {
            return Ok(false); // Not enough bytes for BGZIP header
        }
        filled += n;
    }

    // gzip magic, FEXTRA flag, then 'BC' subfield id at byte 12
    Ok(header[0] == 0x1f && header[1] == 0x8b && header[3] & 0x04 != 0 && header[12] == b'B' && header[13] == b'C')
}

impl FastaReader {
    /// Open a FASTA file (.fa, .fasta, .fa.gz, .fasta.gz).
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let gzipped = path.extension().is_some_and(|ext| ext == "gz");
        let reader: Box<dyn Read + Send> = if gzipped {
            if is_bgzip_format(path)? {
                log::debug!("Detected BGZIP format, using parallel decompression for {}", path.display());
                Box::new(bgzf::MultithreadedReader::new(file))
            } else {
                log::debug!("Detected standard gzip format for {}", path.display());
                Box::new(GzDecoder::new(file))
            }
        } else {
            Box::new(file)
        };

        Ok(Self {
            records: fasta::Reader::with_capacity(BUFFER_SIZE, reader).records(),
        })
    }

    /// Next record; `Ok(None)` at end of file.
    pub fn read_record(&mut self) -> io::Result<Option<fasta::Record>> {
        self.records.next().transpose().map_err(io::Error::other)
    }
}

/// Header line of a record without the leading '>'.
fn header_of(record: &fasta::Record) -> String {
    match record.desc() {
        Some(desc) => format!("{} {}", record.id(), desc),
        None => record.id().to_string(),
    }
}

/// Database source streaming a FASTA file in chunks of `chunk_size` records.
///
/// Sequences get ids `0..n` in file order.
pub struct FastaChunkSource {
    reader: FastaReader,
    alphabet: Alphabet,
    chunk_size: usize,
    next_id: usize,
    chunks_emitted: usize,
    residues_read: u64,
}

impl FastaChunkSource {
    pub fn open(path: &Path, alphabet: Alphabet, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(SearchError::config("chunk size must be at least 1"));
        }
        Ok(FastaChunkSource {
            reader: FastaReader::open(path)?,
            alphabet,
            chunk_size,
            next_id: 0,
            chunks_emitted: 0,
            residues_read: 0,
        })
    }

    pub fn residues_read(&self) -> u64 {
        self.residues_read
    }
}

impl SequenceSource for FastaChunkSource {
    fn next_chunk(&mut self) -> Result<DbChunk> {
        let mut sequences = Vec::with_capacity(self.chunk_size);
        while sequences.len() < self.chunk_size {
            let Some(record) = self.reader.read_record()? else {
                break;
            };
            let residues = self.alphabet.encode(record.seq());
            self.residues_read += residues.len() as u64;
            sequences.push(Sequence::new(self.next_id, header_of(&record), residues));
            self.next_id += 1;
        }

        let index = self.chunks_emitted;
        if !sequences.is_empty() {
            self.chunks_emitted += 1;
            log::trace!("read chunk {} ({} sequences)", index, sequences.len());
        }
        Ok(DbChunk { index, sequences })
    }
}

/// Load every record of a query file. Nucleotide queries expand into one
/// query sequence per requested strand.
pub fn read_queries(path: &Path, alphabet: Alphabet, strands: StrandMode) -> Result<QuerySet> {
    let mut reader = FastaReader::open(path)?;
    let mut queries = QuerySet::new();
    while let Some(record) = reader.read_record()? {
        let residues = alphabet.encode(record.seq());
        if residues.is_empty() {
            return Err(SearchError::config(format!("query '{}' is empty", record.id())));
        }
        queries.push(record.id(), residues, alphabet, strands);
    }
    if queries.is_empty() {
        return Err(SearchError::config(format!("no query sequences in {}", path.display())));
    }
    Ok(queries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    const DB: &str = ">s0 first\nACGT\nACGT\n>s1\nGGCC\n>s2 third one\nTTTT\n";

    fn drain(mut source: impl SequenceSource) -> Vec<DbChunk> {
        let mut chunks = Vec::new();
        loop {
            let chunk = source.next_chunk().unwrap();
            if chunk.is_empty() {
                return chunks;
            }
            chunks.push(chunk);
        }
    }

    #[test]
    fn test_chunks_from_plain_fasta() {
        let mut file = tempfile::Builder::new().suffix(".fa").tempfile().unwrap();
        file.write_all(DB.as_bytes()).unwrap();
        let source = FastaChunkSource::open(file.path(), Alphabet::Nucleotide, 2).unwrap();
        let chunks = drain(source);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 2);
        assert_eq!(chunks[1].index, 1);
        let first = &chunks[0].sequences[0];
        assert_eq!(first.id, 0);
        assert_eq!(first.header, "s0 first");
        assert_eq!(first.residues, vec![0, 1, 2, 3, 0, 1, 2, 3]);
        assert_eq!(chunks[1].sequences[0].header, "s2 third one");
    }

    #[test]
    fn test_gzip_database() {
        let mut file = tempfile::Builder::new().suffix(".fa.gz").tempfile().unwrap();
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(DB.as_bytes()).unwrap();
        file.write_all(&enc.finish().unwrap()).unwrap();
        let source = FastaChunkSource::open(file.path(), Alphabet::Nucleotide, 10).unwrap();
        let chunks = drain(source);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 3);
    }

    #[test]
    fn test_read_queries_with_both_strands() {
        let mut file = tempfile::Builder::new().suffix(".fa").tempfile().unwrap();
        file.write_all(b">q1\nAAC\n>q2\nGT\n").unwrap();
        let queries = read_queries(file.path(), Alphabet::Nucleotide, StrandMode::Both).unwrap();
        assert_eq!(queries.len(), 4);
        assert_eq!(queries.get(1).unwrap().residues, vec![2, 3, 3]);
        assert_eq!(queries.get(2).unwrap().name, "q2");
    }

    #[test]
    fn test_read_queries_rejects_empty_file() {
        let file = tempfile::Builder::new().suffix(".fa").tempfile().unwrap();
        assert!(matches!(
            read_queries(file.path(), Alphabet::Nucleotide, StrandMode::Forward),
            Err(SearchError::Config(_))
        ));
    }
}
