//! Common helper functions for reading PRG input, sketching, and setting output
//!
//! The functions are used by the subcommands to go from the command line
//! input to built graphs and output streams.

use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::path::Path;

use indicatif::{ParallelProgressIterator, ProgressIterator};
use needletail::parse_fastx_file;
use rayon::prelude::*;
use regex::Regex;

use crate::errors::{PrgError, Result};
use crate::index::Index;
use crate::local_prg::LocalPrg;

/// Read a FASTA file of PRGs into `(name, PRG string)` pairs, in file order.
pub fn read_prg_fasta(filename: &str) -> Result<Vec<(String, String)>> {
    let mut reader = parse_fastx_file(filename)?;
    let mut prgs = Vec::new();
    while let Some(record) = reader.next() {
        let record = record?;
        let name = String::from_utf8_lossy(record.id()).to_string();
        let seq = String::from_utf8(record.seq().to_vec())
            .map_err(|_| PrgError::MalformedPrg(format!("PRG {name} is not valid text")))?;
        prgs.push((name, seq));
    }
    log::info!("Read {} PRGs from {filename}", prgs.len());
    Ok(prgs)
}

/// Build one PRG from a FASTA file, by its position in the file
pub fn load_prg(filename: &str, prg_id: u32) -> Result<LocalPrg> {
    let prgs = read_prg_fasta(filename)?;
    let (name, seq) = prgs.get(prg_id as usize).ok_or_else(|| {
        PrgError::InvalidParameter(format!(
            "{filename} has {} PRGs, no PRG with id {prg_id}",
            prgs.len()
        ))
    })?;
    LocalPrg::new(prg_id, name, seq)
}

/// Build and sketch every PRG, merging their minimizers into one [`Index`].
///
/// PRGs are independent, so with more than one thread they are built in
/// parallel and the per-PRG indexes merged afterwards. PRG ids are their
/// positions in `prgs`.
pub fn sketch_prgs(
    prgs: &[(String, String)],
    w: u32,
    k: u32,
    threads: usize,
) -> Result<(Vec<LocalPrg>, Index)> {
    let sketch_one = |idx: usize, name: &str, seq: &str| -> Result<(LocalPrg, Index)> {
        let mut local_prg = LocalPrg::new(idx as u32, name, seq)?;
        let mut index = Index::new();
        local_prg.minimizer_sketch(&mut index, w, k)?;
        Ok((local_prg, index))
    };

    log::info!("Sketching {} PRGs with w={w} k={k}", prgs.len());
    let sketches: Vec<(LocalPrg, Index)> = if threads > 1 {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            log::warn!("Could not set up thread pool: {e}");
        }
        prgs.par_iter()
            .progress_count(prgs.len() as u64)
            .enumerate()
            .map(|(idx, (name, seq))| sketch_one(idx, name, seq))
            .collect::<Result<Vec<_>>>()?
    } else {
        prgs.iter()
            .progress_count(prgs.len() as u64)
            .enumerate()
            .map(|(idx, (name, seq))| sketch_one(idx, name, seq))
            .collect::<Result<Vec<_>>>()?
    };

    log::info!("Merging indexes");
    let mut merged_index = Index::new();
    let mut local_prgs = Vec::with_capacity(sketches.len());
    for (local_prg, index) in sketches {
        merged_index.merge(index);
        local_prgs.push(local_prg);
    }
    Ok((local_prgs, merged_index))
}

/// Replace characters which are awkward in file names with `_`
pub fn file_safe_name(name: &str) -> Result<String> {
    let re = Regex::new(r"[^A-Za-z0-9._-]+").map_err(|e| PrgError::Parse(e.to_string()))?;
    Ok(re.replace_all(name, "_").to_string())
}

/// Directory holding the k-mer graphs written for an index prefix
pub fn kmer_graph_dir(prefix: &str) -> String {
    format!("{prefix}.kg")
}

/// Save each PRG's k-mer graph as `<prefix>.kg/<name>.gfa`
pub fn save_kmer_graphs(local_prgs: &[LocalPrg], prefix: &str) -> Result<()> {
    let dir = kmer_graph_dir(prefix);
    std::fs::create_dir_all(&dir)?;
    for local_prg in local_prgs {
        let filename = format!("{dir}/{}.gfa", file_safe_name(local_prg.name())?);
        local_prg.kmer_prg().save(&filename)?;
    }
    Ok(())
}

/// Set a buffered stream to write to.
///
/// Either a file (if [`Some`]) or stdout otherwise (if [`None`]).
pub fn set_ostream(oprefix: &Option<String>) -> Result<BufWriter<Box<dyn Write>>> {
    let out_writer = match oprefix {
        Some(prefix) => {
            let path = Path::new(prefix);
            Box::new(File::create(path)?) as Box<dyn Write>
        }
        None => Box::new(stdout()) as Box<dyn Write>,
    };
    Ok(BufWriter::new(out_writer))
}
