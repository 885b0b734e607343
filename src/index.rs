//! Minimizer index over a collection of PRGs.
//!
//! Maps each canonical minimizer hash to the places it occurs: which PRG, at
//! which path, on which k-mer graph node and strand. Saved with [`ciborium`]
//! in the same way a k-mer dictionary would be.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter};

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::errors::{PrgError, Result};
use crate::path::Path;

/// One occurrence of a minimizer in a PRG.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MiniRecord {
    /// Id of the PRG
    pub prg_id: u32,
    /// Path of the k-mer in the PRG
    pub path: Path,
    /// Id of the k-mer graph node for this k-mer
    pub knode_id: usize,
    /// `true` if the forward k-mer is the canonical one
    pub strand: bool,
}

/// Minimizer hash to occurrences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Index {
    minhash: HashMap<u64, Vec<MiniRecord>>,
}

impl Index {
    /// An empty index
    pub fn new() -> Self {
        Self {
            minhash: HashMap::new(),
        }
    }

    /// Add an occurrence, ignoring exact duplicates
    pub fn add_record(&mut self, kh: u64, prg_id: u32, path: Path, knode_id: usize, strand: bool) {
        let record = MiniRecord {
            prg_id,
            path,
            knode_id,
            strand,
        };
        let records = self.minhash.entry(kh).or_default();
        if !records.contains(&record) {
            records.push(record);
        }
    }

    /// Occurrences of a minimizer hash
    pub fn get(&self, kh: u64) -> Option<&[MiniRecord]> {
        self.minhash.get(&kh).map(Vec::as_slice)
    }

    /// Iterate over hashes and their occurrences, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&u64, &Vec<MiniRecord>)> {
        self.minhash.iter()
    }

    /// Number of distinct minimizer hashes
    pub fn num_minimizers(&self) -> usize {
        self.minhash.len()
    }

    /// Total number of occurrences
    pub fn num_records(&self) -> usize {
        self.minhash.values().map(Vec::len).sum()
    }

    /// Whether there are no minimizers
    pub fn is_empty(&self) -> bool {
        self.minhash.is_empty()
    }

    /// Remove all records
    pub fn clear(&mut self) {
        self.minhash.clear();
    }

    /// Add all records from another index
    pub fn merge(&mut self, other: Index) {
        for (kh, records) in other.minhash {
            for record in records {
                self.add_record(kh, record.prg_id, record.path, record.knode_id, record.strand);
            }
        }
    }

    /// Save the index to a file
    pub fn save(&self, filename: &str) -> Result<()> {
        log::info!("Saving index with {} minimizers to {filename}", self.num_minimizers());
        let serial_file = BufWriter::new(File::create(filename)?);
        ciborium::ser::into_writer(self, serial_file)
            .map_err(|e| PrgError::Serialisation(e.to_string()))
    }

    /// Load an index saved by [`Index::save()`]
    pub fn load(filename: &str) -> Result<Self> {
        log::info!("Loading index from {filename}");
        let serial_file = BufReader::new(File::open(filename)?);
        ciborium::de::from_reader(serial_file).map_err(|e| PrgError::Serialisation(e.to_string()))
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "minimizers\t{}", self.num_minimizers())?;
        writeln!(f, "records\t{}", self.num_records())
    }
}
