use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use ferrous_edit::align_opt::{parse_aligner_order, parse_penalties, SplitParams};
use ferrous_edit::core::alignment::split_read::SplitLayout;
use ferrous_edit::core::compute::encoding::{reverse_complement, Alphabet};
use ferrous_edit::pipelines::batch::{self, BatchOptions};
use ferrous_edit::{defaults, AlignRequest, AlignerConfig, AlignerFactory, Arm, ChainStats, IndelPenaltyTable, NO_ALIGNMENT};

#[derive(Parser)]
#[command(name = "ferrous-edit")]
#[command(about = "FerrousEdit - banded edit-distance aligner for reads against template windows", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Align a single read against a template
    Align {
        /// Read sequence (ACGTN)
        #[arg(long, value_name = "SEQ")]
        read: String,

        /// Template sequence (ACGTN)
        #[arg(long, value_name = "SEQ")]
        template: String,

        /// Expected zero-based template position of the first read base
        #[arg(long, value_name = "INT", allow_hyphen_values = true)]
        start: i32,

        /// Align the reverse complement of the read
        #[arg(long)]
        rc: bool,

        /// Sequences are amino acids rather than nucleotides
        #[arg(long)]
        protein: bool,

        /// Anchor a split read at its left or right end
        #[arg(long, value_enum)]
        arm: Option<ArmArg>,

        #[command(flatten)]
        call: CallOptions,

        #[command(flatten)]
        chain: ChainOptions,
    },

    /// Align every line of a tab-separated file in parallel
    Batch {
        /// Input file: read, template, start and optional strand per line
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Anchor split reads at their left or right end
        #[arg(long, value_enum)]
        arm: Option<ArmArg>,

        /// Number of threads (default: all cores)
        #[arg(short = 't', long, value_name = "INT")]
        threads: Option<usize>,

        #[command(flatten)]
        call: CallOptions,

        #[command(flatten)]
        chain: ChainOptions,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ArmArg {
    Left,
    Right,
}

impl From<ArmArg> for Arm {
    fn from(arm: ArmArg) -> Self {
        match arm {
            ArmArg::Left => Arm::Left,
            ArmArg::Right => Arm::Right,
        }
    }
}

#[derive(Debug, Clone, Args)]
struct CallOptions {
    /// Reject alignments scoring INT or more (default: unbounded)
    #[arg(long, value_name = "INT")]
    max_score: Option<i32>,

    /// Maximum start shift / band half-width
    #[arg(long, value_name = "INT", default_value_t = defaults::MAX_SHIFT)]
    max_shift: u32,
}

#[derive(Debug, Clone, Args)]
struct ChainOptions {
    /// Penalties: MISMATCH,UNKNOWN,OPEN,EXTEND
    #[arg(short = 'p', long, value_name = "LIST", default_value = defaults::PENALTIES)]
    penalties: String,

    /// Indel penalty table, e.g. "ins=20,21,22;del=20,21;slope=1,1"
    #[arg(long, value_name = "TABLE")]
    indel_table: Option<String>,

    /// Aligners to try, in order; the exact aligner always runs last
    #[arg(long, value_name = "LIST", default_value = defaults::ALIGNER_ORDER)]
    aligners: String,

    /// Split-read layout, e.g. "5,10,10,10/o0-4,g0-3,g4-8"
    #[arg(long, value_name = "LAYOUT")]
    split_layout: Option<String>,

    /// Use the Complete Genomics split-read layout
    #[arg(long, conflicts_with = "split_layout")]
    complete_genomics: bool,

    /// Seed length for the seed-and-extend aligner
    #[arg(short = 'k', long, value_name = "INT", default_value_t = defaults::SEED_LEN)]
    seed_len: usize,

    /// Soft clip edits within INT matches of either end
    #[arg(long, value_name = "INT")]
    soft_clip: Option<i32>,

    /// Do not validate heuristic results before trusting them
    #[arg(long)]
    no_validate: bool,

    /// Compare every result with an unbounded exact alignment
    #[arg(long)]
    cross_check: bool,

    /// Verbose level: 1=error, 2=warning, 3=message, 4+=debugging
    #[arg(short = 'v', long, value_name = "INT", default_value_t = defaults::VERBOSITY)]
    verbosity: u8,
}

impl ChainOptions {
    fn to_config(&self) -> Result<AlignerConfig> {
        let mut config = AlignerConfig {
            penalties: parse_penalties(&self.penalties)?,
            ..Default::default()
        };
        if let Some(table) = &self.indel_table {
            config.indel_table = Some(IndelPenaltyTable::parse(table)?);
        }
        config.chain.order = parse_aligner_order(&self.aligners)?;
        config.chain.validate_heuristics = !self.no_validate;
        config.chain.cross_check = self.cross_check;
        config.seed.seed_len = self.seed_len;
        config.soft_clip_limit = self.soft_clip;
        if self.complete_genomics {
            config.split = SplitParams::complete_genomics();
        } else if let Some(layout) = &self.split_layout {
            config.split.layout = Some(SplitLayout::parse(layout)?);
        }
        Ok(config)
    }
}

fn init_logging(verbosity: u8) {
    // Map verbosity (1=error, 2=warning, 3=message, 4=debug, 5+=trace)
    // to Rust log levels
    let log_level = match verbosity {
        v if v <= 1 => log::LevelFilter::Error,
        2 => log::LevelFilter::Warn,
        3 => log::LevelFilter::Info,
        4 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace, // 5+ = trace
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None) // Don't show timestamps
        .format_target(false) // Don't show module names
        .init();
}

#[allow(clippy::too_many_arguments)]
fn run_align(
    read: &str,
    template: &str,
    start: i32,
    rc: bool,
    alphabet: Alphabet,
    arm: Option<ArmArg>,
    call: &CallOptions,
    chain: &ChainOptions,
) -> Result<()> {
    if rc && !alphabet.has_complement() {
        bail!("--rc needs a nucleotide alphabet, {} has no complement", alphabet.name());
    }
    let factory = AlignerFactory::new(chain.to_config()?)?;
    let read = alphabet.encode_sequence(read.as_bytes());
    let template = alphabet.encode_sequence(template.as_bytes());
    let req = AlignRequest::new(&read, &template, start)
        .with_max_score(call.max_score.unwrap_or(NO_ALIGNMENT))
        .with_max_shift(call.max_shift)
        .with_arm(arm.map(Arm::from));

    let mut stats = ChainStats::new();
    let actions = factory.chain().align(&req, rc, &mut stats);
    let aligned_read = if rc { reverse_complement(&read) } else { read.clone() };
    let line = batch::format_result(&actions, &aligned_read, &template);
    match alphabet {
        Alphabet::Dna => println!("{line}"),
        // MD letters are nucleotides
        Alphabet::Protein => match line.rsplit_once('\t') {
            Some((head, _)) => println!("{head}\t*"),
            None => println!("{line}"),
        },
    }
    stats.log_summary("align");
    Ok(())
}

fn run_batch(
    input: &Path,
    arm: Option<ArmArg>,
    threads: Option<usize>,
    call: &CallOptions,
    chain: &ChainOptions,
) -> Result<()> {
    if let Some(n) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .context("Error configuring thread pool")?;
    }
    let factory = AlignerFactory::new(chain.to_config()?)?;
    let options = BatchOptions {
        max_score: call.max_score.unwrap_or(NO_ALIGNMENT),
        max_shift: call.max_shift,
        arm: arm.map(Arm::from),
    };
    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    let stats = batch::run_batch(input, &factory, options, &mut out)?;
    stats.log_summary("batch");
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let outcome = match &cli.command {
        Commands::Align {
            read,
            template,
            start,
            rc,
            protein,
            arm,
            call,
            chain,
        } => {
            init_logging(chain.verbosity);
            let alphabet = if *protein { Alphabet::Protein } else { Alphabet::Dna };
            run_align(read, template, *start, *rc, alphabet, *arm, call, chain)
        }
        Commands::Batch {
            input,
            arm,
            threads,
            call,
            chain,
        } => {
            init_logging(chain.verbosity);
            run_batch(input, *arm, *threads, call, chain)
        }
    };

    if let Err(e) = outcome {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}
