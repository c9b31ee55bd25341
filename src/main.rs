use clap::Parser;
use log::error;
use rayon::ThreadPoolBuilder;
use std::num::NonZeroUsize;
use t2g::commands::stats::run_stats;
use t2g::commands::translate::run_translate;
use t2g::commands::RegistryOptions;
use t2g::error::TranslateError;
use t2g::registry::DuplicatePolicy;

/// Common options shared between all commands
#[derive(Parser, Debug)]
struct CommonOpts {
    /// Tab-separated alignment file: transcript, chromosome, 0-based genomic start, CIGAR (no header). May be BGZF-compressed.
    #[clap(short = 'a', long, value_parser)]
    alignments: String,

    /// Path to a registry index. Loaded if it exists, otherwise built from the alignment file and written here.
    #[clap(short = 'i', long, value_parser)]
    index: Option<String>,

    /// Force the regeneration of the index, even if it already exists.
    #[clap(short = 'I', long, action)]
    force_reindex: bool,

    /// Keep the last complete record of a transcript listed more than once instead of aborting.
    #[clap(long, action)]
    allow_duplicates: bool,

    /// Number of threads for parallel processing.
    #[clap(short = 't', long, value_parser, default_value_t = NonZeroUsize::new(4).unwrap())]
    num_threads: NonZeroUsize,

    /// Verbosity level (0 = warnings, 1 = info, 2 = debug)
    #[clap(short, long, default_value = "0")]
    verbose: u8,
}

impl CommonOpts {
    fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            alignment_file: self.alignments.clone(),
            index_file: self.index.clone(),
            force_reindex: self.force_reindex,
            threads: self.num_threads,
            duplicates: if self.allow_duplicates {
                DuplicatePolicy::Overwrite
            } else {
                DuplicatePolicy::Reject
            },
        }
    }
}

/// Translate transcript coordinates to genomic coordinates using per-transcript CIGAR alignments.
#[derive(Parser, Debug)]
#[command(author, version, about, disable_help_subcommand = true)]
enum Args {
    /// Translate (transcript, position) queries into (chromosome, genomic position)
    Translate {
        #[clap(flatten)]
        common: CommonOpts,

        /// Tab-separated query file: transcript, 0-based transcript position (no header)
        #[clap(short = 'q', long, value_parser)]
        queries: String,

        /// Output base name; results are written to <OUTPUT>.tsv
        #[clap(short = 'o', long, value_parser)]
        output: String,
    },
    /// Print registry statistics
    Stats {
        #[clap(flatten)]
        common: CommonOpts,
    },
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), TranslateError> {
    match args {
        Args::Translate {
            common,
            queries,
            output,
        } => {
            initialize(&common)?;
            run_translate(&common.registry_options(), &queries, &output)?;
        }
        Args::Stats { common } => {
            initialize(&common)?;
            run_stats(&common.registry_options())?;
        }
    }

    Ok(())
}

/// Initialize logger and thread pool based on common options
fn initialize(common: &CommonOpts) -> Result<(), TranslateError> {
    env_logger::Builder::new()
        .filter_level(match common.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    ThreadPoolBuilder::new()
        .num_threads(common.num_threads.into())
        .build_global()
        .map_err(|e| {
            TranslateError::Io(std::io::Error::other(format!(
                "Failed to configure thread pool: {}",
                e
            )))
        })
}
