use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use packmer_lib::{
    count_mers, dispatch_on_words, read_mer_file, write_mer_file, CountConfiguration, MerFileHeader,
    PackedMer,
};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "packmer")]
#[command(version = "0.1.0")]
#[command(about = "packmer: multi-word packed k-mers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the packed form of a DNA sequence
    Encode {
        /// Sequence of A/C/G/T (case-insensitive)
        sequence: String,
    },

    /// Count the k-mers of a FASTA/FASTQ file
    Count {
        /// Input FASTA/FASTQ file
        #[arg(short, long)]
        input: String,

        /// K-mer length
        #[arg(short, long)]
        k: usize,

        /// Output mer file (prints k-mers and counts when omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Use canonical k-mers (k-mer or reverse complement, whichever is smaller)
        #[arg(long, default_value = "false")]
        canonical: bool,

        /// Number of threads (0 = all available cores)
        #[arg(short = 't', long, default_value = "0")]
        threads: usize,

        /// Drop k-mers seen fewer times than this
        #[arg(long, default_value = "1")]
        min_count: u64,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the contents of a mer file
    Dump {
        /// Mer file written by `count`
        #[arg(short, long)]
        input: String,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing: use RUST_LOG if set, otherwise default to info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Encode { sequence } => {
            encode_command(&sequence)?;
        }
        Commands::Count { input, k, output, canonical, threads, min_count, verbose } => {
            let config = CountConfiguration {
                k,
                canonical,
                num_threads: threads,
                min_count,
                verbose,
                ..CountConfiguration::default()
            };
            count_command(&input, output.as_deref(), &config)?;
        }
        Commands::Dump { input } => {
            dump_command(&input)?;
        }
    }

    Ok(())
}

/// Print words, reverse complement and canonical form of one sequence
fn encode_command(sequence: &str) -> anyhow::Result<()> {
    let k = sequence.len();
    dispatch_on_words!(k, N => encode_with_words::<N>(sequence), else => {
        Err(anyhow!("sequence of {} bases is longer than the supported maximum", k))
    })
}

fn encode_with_words<const N: usize>(sequence: &str) -> anyhow::Result<()> {
    let mer = PackedMer::<N>::from_ascii(sequence.as_bytes())?;
    debug!("Encoding {}-mer in {} words", mer.mer_size(), N);

    let mut out = std::io::stdout().lock();
    writeln!(out, "k:         {}", mer.mer_size())?;
    writeln!(out, "words:     {}", N)?;
    for (i, word) in mer.words().iter().enumerate() {
        writeln!(out, "word[{}]:   {:#018x}", i, word)?;
    }
    writeln!(out, "forward:   {}", mer)?;
    writeln!(out, "reverse:   {}", mer.reverse_complemented())?;
    writeln!(out, "canonical: {}", mer.canonical())?;
    Ok(())
}

/// Count k-mers from FASTA/FASTQ input
fn count_command(input: &str, output: Option<&str>, config: &CountConfiguration) -> anyhow::Result<()> {
    config.validate().map_err(|e| anyhow!("{}", e))?;

    info!("Counting k-mers...");
    info!("  Input: {}", input);
    info!("  k: {}", config.k);
    info!("  Canonical: {}", config.canonical);

    let sequences = parse_fasta_file(input)?;
    info!("  Loaded {} sequences", sequences.len());

    let k = config.k;
    dispatch_on_words!(k, N => count_with_words::<N>(&sequences, output, config), else => {
        Err(anyhow!("k = {} is larger than the supported maximum", k))
    })
}

fn count_with_words<const N: usize>(
    sequences: &[Vec<u8>],
    output: Option<&str>,
    config: &CountConfiguration,
) -> anyhow::Result<()> {
    let (records, stats) = count_mers::<N, _>(sequences, config).map_err(|e| anyhow!("{}", e))?;
    stats.print_summary();

    match output {
        Some(path) => {
            info!("Saving k-mers to {}...", path);
            let file = File::create(Path::new(path))
                .with_context(|| format!("cannot create {}", path))?;
            write_mer_file(BufWriter::new(file), config.k, &records, true)?;
        }
        None => {
            let mut out = BufWriter::new(std::io::stdout().lock());
            for (mer, count) in &records {
                writeln!(out, "{}\t{}", mer, count)?;
            }
            out.flush()?;
        }
    }
    Ok(())
}

/// Print every record of a mer file
fn dump_command(input: &str) -> anyhow::Result<()> {
    let header = {
        let file = File::open(input).with_context(|| format!("cannot open {}", input))?;
        MerFileHeader::read(&mut BufReader::new(file))?
    };
    info!(
        "{}: {} records of {}-mers (format {}.{})",
        input, header.count, header.mer_size, header.version_major, header.version_minor
    );

    let k = header.mer_size as usize;
    dispatch_on_words!(k, N => dump_with_words::<N>(input), else => {
        Err(anyhow!("mer size {} in {} is larger than the supported maximum", k, input))
    })
}

fn dump_with_words<const N: usize>(input: &str) -> anyhow::Result<()> {
    let file = File::open(input).with_context(|| format!("cannot open {}", input))?;
    let (header, records) = read_mer_file::<_, N>(BufReader::new(file))?;

    let mut out = BufWriter::new(std::io::stdout().lock());
    for (mer, count) in &records {
        if header.with_counts {
            writeln!(out, "{}\t{}", mer, count)?;
        } else {
            writeln!(out, "{}", mer)?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Parse FASTA/FASTQ file using needletail
fn parse_fasta_file(path: &str) -> anyhow::Result<Vec<Vec<u8>>> {
    use needletail::parse_fastx_file;

    let mut sequences = Vec::new();
    let mut reader = parse_fastx_file(path).with_context(|| format!("cannot read {}", path))?;
    let mut skipped = 0usize;

    while let Some(record) = reader.next() {
        let record = record?;
        let seq = record.seq();
        if seq.is_empty() {
            skipped += 1;
            continue;
        }
        sequences.push(seq.into_owned());
    }

    if skipped > 0 {
        warn!("  Skipped {} empty records", skipped);
    }
    Ok(sequences)
}
