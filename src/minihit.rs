//! A read minimizer matched to an index record.

use std::cmp::Ordering;

use crate::index::MiniRecord;
use crate::interval::Interval;
use crate::path::Path;

/// Hit of a read k-mer against a PRG k-mer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinimizerHit {
    /// Id of the read
    pub read_id: u32,
    /// Position of the k-mer in the read
    pub read_interval: Interval,
    /// Id of the PRG hit
    pub prg_id: u32,
    /// Path of the k-mer in the PRG
    pub prg_path: Path,
    /// Node of the PRG's k-mer graph which was hit
    pub knode_id: usize,
    /// `true` if the read and PRG k-mers are on the same strand
    pub strand: bool,
}

impl MinimizerHit {
    /// # Panics
    /// If the read interval and record path have different lengths.
    pub fn new(read_id: u32, read_interval: Interval, record: &MiniRecord, read_strand: bool) -> Self {
        assert_eq!(
            read_interval.length(),
            record.path.length(),
            "Read k-mer and PRG k-mer lengths differ"
        );
        Self {
            read_id,
            read_interval,
            prg_id: record.prg_id,
            prg_path: record.path.clone(),
            knode_id: record.knode_id,
            strand: read_strand == record.strand,
        }
    }
}

impl Ord for MinimizerHit {
    /// By read, then PRG, then strand (forward first), then read position,
    /// then PRG path.
    fn cmp(&self, other: &Self) -> Ordering {
        self.read_id
            .cmp(&other.read_id)
            .then(self.prg_id.cmp(&other.prg_id))
            .then(other.strand.cmp(&self.strand))
            .then(self.read_interval.start.cmp(&other.read_interval.start))
            .then_with(|| self.prg_path.cmp(&other.prg_path))
            .then(self.read_interval.end.cmp(&other.read_interval.end))
            .then(self.knode_id.cmp(&other.knode_id))
    }
}

impl PartialOrd for MinimizerHit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
