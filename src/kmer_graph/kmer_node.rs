//! A node of the k-mer graph: one minimizing k-mer and its coverage.

use std::fmt;

use crate::path::Path;

/// A minimizing k-mer, identified by its [`Path`] through the PRG.
///
/// The source and sink of a k-mer graph are nodes with zero-length paths.
#[derive(Debug, Clone)]
pub struct KmerNode {
    pub(crate) id: usize,
    pub(crate) path: Path,
    pub(crate) out_nodes: Vec<usize>,
    pub(crate) in_nodes: Vec<usize>,
    pub(crate) covg: [u32; 2],
    pub(crate) khash: u64,
    pub(crate) num_at: u8,
}

impl KmerNode {
    pub(crate) fn new(id: usize, path: Path) -> Self {
        Self {
            id,
            path,
            out_nodes: Vec::new(),
            in_nodes: Vec::new(),
            covg: [0, 0],
            khash: u64::MAX,
            num_at: 0,
        }
    }

    /// Id, which is also the index in the graph
    pub fn id(&self) -> usize {
        self.id
    }

    /// Position of the k-mer in the PRG
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ids of successors, in insertion order
    pub fn out_nodes(&self) -> &[usize] {
        &self.out_nodes
    }

    /// Ids of predecessors, in insertion order
    pub fn in_nodes(&self) -> &[usize] {
        &self.in_nodes
    }

    /// Forward and reverse strand coverage
    pub fn covg(&self) -> [u32; 2] {
        self.covg
    }

    /// Sum of coverage on both strands
    pub fn total_covg(&self) -> u32 {
        self.covg[0].saturating_add(self.covg[1])
    }

    /// Canonical hash of the k-mer, `u64::MAX` when not known
    pub fn khash(&self) -> u64 {
        self.khash
    }

    /// Number of A/T bases in the k-mer
    pub fn num_at(&self) -> u8 {
        self.num_at
    }

    /// Whether this is a source or sink (zero-length) node
    pub fn is_terminal(&self) -> bool {
        self.path.length() == 0
    }
}

impl PartialEq for KmerNode {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl fmt::Display for KmerNode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {},{}",
            self.id, self.path, self.covg[0], self.covg[1]
        )
    }
}
