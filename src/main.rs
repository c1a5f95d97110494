use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ferrous_search::compute::simd_abstraction::SimdEngineType;
use ferrous_search::config::SearchConfig;
use ferrous_search::core::alphabet::Alphabet;
use ferrous_search::core::scoring::{ScoreMatrix, SubstitutionMatrix};
use ferrous_search::core::sequence::{QuerySet, Strand, StrandMode};
use ferrous_search::io::{FastaChunkSource, read_queries};
use ferrous_search::{AlignmentMode, Precision, defaults, run_search};

#[derive(Parser)]
#[command(name = "ferrous-search")]
#[command(about = "FerrousSearch - multi-precision SIMD Smith-Waterman / Needleman-Wunsch database search", long_about = None)]
#[command(version)]
struct Cli {
    // ===== Input =====
    /// Query FASTA file
    #[arg(short = 'i', long = "query", value_name = "QUERY.FA")]
    query: PathBuf,

    /// Database FASTA file (.fa, .fa.gz)
    #[arg(short = 'd', long = "db", value_name = "DB.FA")]
    db: PathBuf,

    /// Sequences are nucleotides (default: amino acids)
    #[arg(short = 'n', long)]
    nucleotide: bool,

    /// Query strand(s) to search (nucleotide only)
    #[arg(long, value_enum, default_value = "forward")]
    strand: StrandArg,

    // ===== Scoring Options =====
    /// Alignment type: SW (local) or NW (global)
    #[arg(short = 't', long = "type", value_name = "SW|NW", default_value = "SW")]
    alignment_type: AlignmentMode,

    /// Gap open penalty
    #[arg(short = 'O', long, value_name = "INT", default_value_t = defaults::GAP_OPEN_PENALTY)]
    gap_open: i32,

    /// Gap extension penalty
    #[arg(short = 'E', long, value_name = "INT", default_value_t = defaults::GAP_EXTEND_PENALTY)]
    gap_extend: i32,

    /// Score matrix for amino acids
    #[arg(short = 'M', long, value_name = "NAME", default_value = defaults::SCORE_MATRIX)]
    matrix: String,

    /// Match score (nucleotide)
    #[arg(long = "match", value_name = "INT", default_value_t = defaults::MATCH_SCORE)]
    match_score: i32,

    /// Mismatch score (nucleotide, usually negative)
    #[arg(long, value_name = "INT", default_value_t = defaults::MISMATCH_SCORE, allow_negative_numbers = true)]
    mismatch: i32,

    // ===== Search Options =====
    /// Starting precision in bits: 8, 16 or 64
    #[arg(short = 'b', long, value_name = "BITS", default_value = "8")]
    bits: u32,

    /// Number of hits to report
    #[arg(short = 'c', long, value_name = "INT", default_value_t = defaults::TOP_K)]
    hits: usize,

    /// Report alignment start and end coordinates
    #[arg(long)]
    coordinates: bool,

    // ===== Processing =====
    /// Number of threads (default: all cores)
    #[arg(short = 'N', long, value_name = "INT")]
    threads: Option<usize>,

    /// SIMD engine: portable, 128 or 256 (default: detect)
    #[arg(short = 's', long, value_name = "MODE")]
    simd: Option<SimdEngineType>,

    /// Database sequences per chunk
    #[arg(long, value_name = "INT", default_value_t = defaults::CHUNK_SIZE)]
    chunk_size: usize,

    /// Verbosity: repeat for more output (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrandArg {
    Forward,
    Reverse,
    Both,
}

impl From<StrandArg> for StrandMode {
    fn from(s: StrandArg) -> Self {
        match s {
            StrandArg::Forward => StrandMode::Forward,
            StrandArg::Reverse => StrandMode::Reverse,
            StrandArg::Both => StrandMode::Both,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None) // Don't show timestamps
        .format_target(false) // Don't show module names
        .init();

    if let Err(e) = run(cli) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let alphabet = if cli.nucleotide {
        Alphabet::Nucleotide
    } else {
        Alphabet::AminoAcid
    };
    let matrix: Arc<dyn SubstitutionMatrix> = match alphabet {
        Alphabet::Nucleotide => Arc::new(ScoreMatrix::constant(alphabet, cli.match_score, cli.mismatch)),
        Alphabet::AminoAcid => Arc::new(ScoreMatrix::by_name(&cli.matrix)?),
    };
    let Some(start_precision) = Precision::from_bits(cli.bits) else {
        bail!("invalid bit width {} (expected 8, 16 or 64)", cli.bits);
    };

    let mut builder = SearchConfig::builder()
        .mode(cli.alignment_type)
        .gap_costs(cli.gap_open, cli.gap_extend)
        .shared_matrix(matrix)
        .start_precision(start_precision)
        .top_k(cli.hits)
        .compute_coordinates(cli.coordinates)
        .threads(cli.threads.unwrap_or(0));
    if let Some(engine) = cli.simd {
        builder = builder.engine(engine);
    }
    let config = builder.build().context("invalid search options")?;

    let queries = read_queries(&cli.query, alphabet, cli.strand.into())
        .with_context(|| format!("failed to read queries from {}", cli.query.display()))?;
    let mut source = FastaChunkSource::open(&cli.db, alphabet, cli.chunk_size)
        .with_context(|| format!("failed to open database {}", cli.db.display()))?;

    log::info!("Query file: {} ({} sequences)", cli.query.display(), queries.len());
    log::info!("Database: {}", cli.db.display());
    log::info!(
        "Scoring: {} gap open {} extend {}, {} thread(s)",
        config.mode,
        config.gaps.open,
        config.gaps.extend,
        config.threads
    );

    let report = run_search(&queries, &mut source, &config).context("search failed")?;

    let headers = collect_headers(&cli.db, &report.hits, alphabet, cli.chunk_size)?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    write_hits(&mut out, &queries, &report.hits, &headers)?;
    out.flush()?;

    log::info!(
        "{} residues in {} sequences searched; {} fatal overflow(s)",
        source.residues_read(),
        report.counters.sequences_processed,
        report.counters.fatal_overflows.len()
    );
    Ok(())
}

/// Headers of the database sequences that made it into the report.
fn collect_headers(
    db: &Path,
    hits: &[ferrous_search::SearchHit],
    alphabet: Alphabet,
    chunk_size: usize,
) -> Result<Vec<(usize, String)>> {
    use ferrous_search::pipelines::search::SequenceSource;

    let mut wanted: Vec<usize> = hits.iter().map(|h| h.db_id).collect();
    wanted.sort_unstable();
    wanted.dedup();
    let mut headers = Vec::with_capacity(wanted.len());
    if wanted.is_empty() {
        return Ok(headers);
    }

    let mut source = FastaChunkSource::open(db, alphabet, chunk_size)?;
    loop {
        let chunk = source.next_chunk()?;
        if chunk.is_empty() {
            break;
        }
        for seq in chunk.sequences {
            if wanted.binary_search(&seq.id).is_ok() {
                headers.push((seq.id, seq.header));
            }
        }
        if headers.len() == wanted.len() {
            break;
        }
    }
    Ok(headers)
}

fn write_hits(
    out: &mut impl Write,
    queries: &QuerySet,
    hits: &[ferrous_search::SearchHit],
    headers: &[(usize, String)],
) -> Result<()> {
    for hit in hits {
        let query = match queries.get(hit.query_id) {
            Some(q) if q.strand == Strand::Reverse => format!("{}(-)", q.name),
            Some(q) => q.name.clone(),
            None => "?".to_string(),
        };
        let header = headers
            .binary_search_by_key(&hit.db_id, |(id, _)| *id)
            .map(|i| headers[i].1.as_str())
            .unwrap_or("");
        write!(out, "{}\t{}\t{}\t{}", hit.score, query, hit.db_id, header)?;
        if let Some(c) = hit.coordinates {
            write!(
                out,
                "\t{}-{}\t{}-{}",
                c.query_start + 1,
                c.query_end + 1,
                c.db_start + 1,
                c.db_end + 1
            )?;
        }
        writeln!(out)?;
    }
    Ok(())
}
