//! Command line interface, built using the [`clap`] derive API
use clap::{Parser, Subcommand};

use crate::kmer_graph::compatible_paths::DEFAULT_ERROR_RATE;
use crate::kmer_hash::bit_encoding::MAX_K;
use crate::local_prg::PathMode;

extern crate num_cpus;

/// Default k-mer size
pub const DEFAULT_KMER: u32 = 15;
/// Default window size, in k-mers
pub const DEFAULT_WINDOW: u32 = 1;
/// Default number of paths to infer or sample
pub const DEFAULT_NUM_PATHS: usize = 1;
/// Default PRG to walk, by its position in the input file
pub const DEFAULT_PRG_ID: u32 = 0;

fn valid_kmer(s: &str) -> Result<u32, String> {
    let k: u32 = s
        .parse()
        .map_err(|_| format!("`{s}` isn't a valid k-mer"))?;
    if k < 1 || k as usize > MAX_K {
        Err(format!("K-mer must be between 1 and {MAX_K} (inclusive)"))
    } else {
        Ok(k)
    }
}

fn valid_window(s: &str) -> Result<u32, String> {
    let w: u32 = s
        .parse()
        .map_err(|_| format!("`{s}` isn't a valid window size"))?;
    if w < 1 {
        Err("Window must contain at least one k-mer".to_string())
    } else {
        Ok(w)
    }
}

fn zero_to_one(s: &str) -> Result<f64, String> {
    let f: f64 = s
        .parse()
        .map_err(|_| format!("`{s}` isn't a valid error rate"))?;
    if f <= 0.0 || f >= 1.0 {
        Err("Error rate must be between 0 and 1 (exclusive)".to_string())
    } else {
        Ok(f)
    }
}

fn valid_cpus(s: &str) -> Result<usize, String> {
    let threads: usize = s
        .parse()
        .map_err(|_| format!("`{s}` isn't a valid number of cores"))?;
    let max_threads = num_cpus::get();
    if threads < 1 || threads > max_threads {
        Err(format!("Threads must be between 1 and {max_threads}"))
    } else {
        Ok(threads)
    }
}

/// Options that apply to all subcommands
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Show progress messages
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Subcommands and their specific options
#[derive(Subcommand)]
pub enum Commands {
    /// Sketch PRGs into a minimizer index and k-mer graphs
    Index {
        /// FASTA file of PRG strings
        prg_file: String,

        /// Output prefix
        #[arg(short)]
        output: String,

        /// Window size, in k-mers
        #[arg(short, value_parser = valid_window, default_value_t = DEFAULT_WINDOW)]
        w: u32,

        /// K-mer size
        #[arg(short, value_parser = valid_kmer, default_value_t = DEFAULT_KMER)]
        k: u32,

        /// Number of CPU threads
        #[arg(long, value_parser = valid_cpus, default_value_t = 1)]
        threads: usize,
    },
    /// Infer sequence from a coverage-annotated k-mer graph
    Walk {
        /// FASTA file of PRG strings
        prg_file: String,

        /// K-mer graph (.gfa) with coverage
        kmer_graph: String,

        /// Number of reads the coverage came from
        #[arg(short)]
        num_reads: u32,

        /// Position of the PRG in the input file
        #[arg(long, default_value_t = DEFAULT_PRG_ID)]
        prg_id: u32,

        /// Window size the graph was sketched with
        #[arg(short, value_parser = valid_window, default_value_t = DEFAULT_WINDOW)]
        w: u32,

        /// Per-base error rate of the reads
        #[arg(short, value_parser = zero_to_one, default_value_t = DEFAULT_ERROR_RATE)]
        error_rate: f64,

        /// Path search to run
        #[arg(long, value_enum, default_value_t = PathMode::Max)]
        mode: PathMode,

        /// Number of paths to find by coverage depletion
        #[arg(long, default_value_t = DEFAULT_NUM_PATHS)]
        num_paths: usize,

        /// Output filename (omit to output to stdout)
        #[arg(short)]
        output: Option<String>,
    },
    /// Sample random paths through a k-mer graph
    Random {
        /// K-mer graph (.gfa)
        kmer_graph: String,

        /// Number of paths to sample
        #[arg(short, default_value_t = DEFAULT_NUM_PATHS)]
        num_paths: usize,

        /// Seed for the random number generator
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Get the number of minimizers and records in an index
    Nk {
        /// Index (.idx) file
        index_file: String,
    },
}

/// Function to parse command line args into [`Args`] struct
pub fn cli_args() -> Args {
    Args::parse()
}
