use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use qrx_core::EcLevel;
use qrx_core::pack::encoder::DEFAULT_CHUNK_SIZE;
use qrx_core::policy::{DuplicatePolicy, TotalPolicy};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "qrxdev: move files through QR code images", long_about = None)]
pub struct Cli {
    /// More log output (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum DuplicatesArg {
    LastWins,
    FirstWins,
    Strict,
}

impl From<DuplicatesArg> for DuplicatePolicy {
    fn from(a: DuplicatesArg) -> Self {
        match a {
            DuplicatesArg::LastWins => DuplicatePolicy::LastWins,
            DuplicatesArg::FirstWins => DuplicatePolicy::FirstWins,
            DuplicatesArg::Strict => DuplicatePolicy::Strict,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TotalsArg {
    Max,
    Strict,
}

impl From<TotalsArg> for TotalPolicy {
    fn from(a: TotalsArg) -> Self {
        match a {
            TotalsArg::Max => TotalPolicy::MaxObserved,
            TotalsArg::Strict => TotalPolicy::Strict,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render every file under a directory as QR code images
    Encode {
        source: PathBuf,
        output: PathBuf,

        /// glob of files/directories to skip (repeatable)
        #[arg(long, short = 'x')]
        exclude: Vec<String>,

        /// base64 characters per symbol
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,

        /// error-correction level: L, M, Q or H
        #[arg(long = "error-correction", short = 'e', default_value = "M")]
        error_correction: EcLevel,

        /// zero the manifest timestamp
        #[arg(long)]
        deterministic: bool,
    },

    /// Scan QR code images and rebuild the original files
    Decode {
        input: PathBuf,
        output: PathBuf,

        /// how to resolve the same chunk scanned more than once
        #[arg(long, value_enum, default_value_t = DuplicatesArg::LastWins)]
        duplicates: DuplicatesArg,

        /// how to resolve chunks that disagree on the chunk count
        #[arg(long, value_enum, default_value_t = TotalsArg::Max)]
        totals: TotalsArg,

        /// shorthand for --duplicates strict --totals strict
        #[arg(long)]
        strict: bool,

        /// write a JSON report (files, digests, diagnostics) to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Show which chunks are present per file, without writing anything
    Inspect {
        input: PathBuf,

        /// print the coverage report as JSON on stdout
        #[arg(long)]
        json: bool,
    },
}
