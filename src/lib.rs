//! Minimizer sketches of variation graphs, and inference of the sequence a set
//! of reads came from.
//!
//! A population reference graph (PRG) describes the variation in a locus as a
//! string of sequence interspersed with site markers. Each PRG is built into a
//! variation graph, which is then sketched with `(w, k)` minimizers: every walk
//! through the graph is split into windows of `w` consecutive k-mers, and the
//! k-mer with the smallest canonical hash in each window is kept. The kept
//! k-mers, linked in the order they occur along walks, form a k-mer graph.
//!
//! Reads sketched in the same way hit k-mer graph nodes, adding coverage. The
//! most likely sequence is then the path through the k-mer graph whose nodes
//! best fit a simple error model of that coverage.
//!
//! ## Details
//!
//! PRG strings are space separated sequence and integer markers. An odd
//! marker opens and closes a site, and the next even marker separates its
//! alleles. For example `AAA 5 CCC 6 GGG 5 TTT` is the graph:
//!
//! ```text
//!        ┌─ CCC ─┐
//! AAA ───┤       ├─── TTT
//!        └─ GGG ─┘
//! ```
//!
//! Sites may be nested within alleles, and an allele may be empty (as in
//! `AAA 5 CCC 6 5 TTT`), giving a zero-length node.
//!
//! Every position is tracked in the coordinates of the PRG string, so a k-mer
//! is identified by its [`Path`](crate::path::Path), the intervals of the PRG
//! string it covers. The k-mer graph has a zero-length source at the start of
//! the string and a zero-length sink at the end.
//!
//! Coverage is scored per node with the probability `p = exp(-e * k)` of a
//! k-mer being read without error, given a per-base error rate `e`. Path
//! searches then find:
//! - the path with the highest mean log-probability,
//! - the path with the highest minimum log-probability,
//! - several paths, by depleting coverage along each path found,
//! - all paths compatible with the coverage and per-read support.
//!
//! # Usage
//!
//! `prgsketch index` reads a FASTA file where each record is one PRG, and
//! writes `<prefix>.idx`, the minimizer index across all PRGs, and
//! `<prefix>.kg/<name>.gfa`, one k-mer graph per PRG:
//! ```bash
//! prgsketch index prgs.fa -o sketch -w 14 -k 15 --threads 4
//! ```
//!
//! The number of minimizers and records in an index can be checked with:
//! ```bash
//! prgsketch nk sketch.idx
//! ```
//!
//! K-mer graphs are written in a GFA-like format, with forward and reverse
//! coverage of each node:
//! ```text
//! H	VN:Z:1.0	bn:Z:--linear --singlearr
//! S	0	1{[0, 0)}	FC:i:0	RC:i:0	0
//! L	0	+	1	+	0M
//! ```
//!
//! Once coverage has been added to a graph, `prgsketch walk` finds the most
//! likely sequence and writes it as FASTA:
//! ```bash
//! prgsketch walk prgs.fa sketch.kg/gene1.gfa -n 30 --prg-id 0 -w 14 -e 0.11
//! ```
//! Use `--mode min` to maximise the worst supported k-mer instead of the
//! mean, and `--num-paths` to find more than one sequence.
//!
//! `prgsketch random` samples uniformly random paths through a k-mer graph,
//! printing their node ids, optionally with `--seed` for reproducibility.
//!
//! Add `-v` to any command to show progress messages.
//!
//! # API usage
//!
//! Build and sketch a PRG, add coverage, and find the best path:
//! ```rust
//! use prgsketch::index::Index;
//! use prgsketch::local_prg::{LocalPrg, PathMode};
//!
//! let mut local_prg = LocalPrg::new(0, "gene1", "ACGTA 5 CCC 6 GGG 5 TTGCA").unwrap();
//! let mut index = Index::new();
//! local_prg.minimizer_sketch(&mut index, 1, 3).unwrap();
//!
//! let kmer_prg = local_prg.kmer_prg_mut();
//! for node_id in 0..kmer_prg.len() {
//!     kmer_prg.set_covg(node_id, [5, 5]).unwrap();
//! }
//! kmer_prg.set_num_reads(10);
//! kmer_prg.set_p(0.01).unwrap();
//!
//! let prg_path = local_prg.find_path(PathMode::Max, 1).unwrap();
//! println!("{}", local_prg.string_along_local_path(&prg_path.local_path));
//! ```

#![warn(missing_docs)]
use std::io::Write;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;

pub mod errors;
pub mod interval;
pub mod path;

pub mod kmer_hash;
pub mod local_graph;
pub mod local_prg;

pub mod index;
pub mod kmer_graph;
pub mod minihit;
use crate::index::Index;
use crate::kmer_graph::KmerGraph;
use crate::local_prg::PathMode;

pub mod cli;
use crate::cli::*;

pub mod io_utils;
use crate::io_utils::*;

use crate::errors::Result;

/// Possible user input
#[doc(hidden)]
pub fn main() -> Result<()> {
    let args = cli_args();
    let log_level = if args.verbose {
        log::Level::Info
    } else {
        log::Level::Warn
    };
    if let Err(e) = simple_logger::init_with_level(log_level) {
        eprintln!("Could not start logging: {e}");
    }

    eprintln!("prgsketch: minimizer sketches of variation graphs");
    let start = Instant::now();
    match &args.command {
        Commands::Index {
            prg_file,
            output,
            w,
            k,
            threads,
        } => {
            let prgs = read_prg_fasta(prg_file)?;
            let (local_prgs, index) = sketch_prgs(&prgs, *w, *k, *threads)?;

            log::info!("Saving index and k-mer graphs");
            index.save(format!("{output}.idx").as_str())?;
            save_kmer_graphs(&local_prgs, output)?;
        }
        Commands::Walk {
            prg_file,
            kmer_graph,
            num_reads,
            prg_id,
            w,
            error_rate,
            mode,
            num_paths,
            output,
        } => {
            let mut local_prg = load_prg(prg_file, *prg_id)?;
            local_prg.set_kmer_prg(KmerGraph::load(kmer_graph)?);
            let kmer_prg = local_prg.kmer_prg_mut();
            kmer_prg.set_num_reads(*num_reads);
            kmer_prg.set_p(*error_rate)?;

            let mut out_stream = set_ostream(output)?;
            if *num_paths > 1 {
                log::info!("Finding {num_paths} paths");
                let kmer_paths = local_prg.kmer_prg_mut().find_max_paths(*num_paths)?;
                for kmer_path in kmer_paths {
                    let score = local_prg.kmer_prg().prob_path(&kmer_path)?;
                    let local_path = local_prg.localnode_path_from_kmernode_path(&kmer_path, *w);
                    local_prg.write_path_to_fasta(&mut out_stream, &local_path, score)?;
                }
            } else {
                log::info!("Finding {} path", if *mode == PathMode::Max { "max" } else { "min" });
                let prg_path = local_prg.find_path(*mode, *w)?;
                local_prg.write_path_to_fasta(
                    &mut out_stream,
                    &prg_path.local_path,
                    prg_path.score,
                )?;
            }
            out_stream.flush()?;
        }
        Commands::Random {
            kmer_graph,
            num_paths,
            seed,
        } => {
            let kmer_prg = KmerGraph::load(kmer_graph)?;
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(*seed),
                None => StdRng::from_entropy(),
            };
            for random_path in kmer_prg.get_random_paths(*num_paths, &mut rng) {
                let ids: Vec<String> = random_path.iter().map(|id| id.to_string()).collect();
                println!("{}", ids.join(" "));
            }
        }
        Commands::Nk { index_file } => {
            log::info!("Printing basic info");
            let index = Index::load(index_file)?;
            print!("{index}");
        }
    }
    let end = Instant::now();

    log::info!("Complete");
    eprintln!("prgsketch done in {}s", end.duration_since(start).as_secs());
    Ok(())
}
