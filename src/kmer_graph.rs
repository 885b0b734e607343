//! The k-mer graph: minimizing k-mers of a PRG and the edges between them.
//!
//! Nodes live in an arena and are referred to by id. The graph is a DAG
//! ordered by node [`Path`], with a zero-length source at the start of the
//! PRG and a zero-length sink at its end. Every path from source to sink
//! spells out a sequence of the PRG, sampled at its minimizers.
//!
//! Coverage from read hits is stored per node and strand, and is scored with
//! a binomial-like model ([`KmerGraph::prob`]) where each k-mer of a read is
//! correct with probability `p = exp(-e * k)`.
//!
//! Path searches over the graph:
//! - [`KmerGraph::find_max_path()`] maximum mean log-probability.
//! - [`KmerGraph::find_min_path()`] maximum bottleneck (highest minimum).
//! - [`KmerGraph::find_max_paths()`] several paths by coverage depletion.
//! - [`KmerGraph::get_random_paths()`] uniform random walks.
//! - [`KmerGraph::find_compatible_paths()`] all paths supported by reads,
//!   see [`compatible_paths`].

use std::cmp::{max, min};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};

use hashbrown::HashMap;
use rand::Rng;

use crate::errors::{PrgError, Result};
use crate::path::Path;

pub mod compatible_paths;
pub mod kmer_node;
use crate::kmer_graph::kmer_node::KmerNode;

/// Means closer than this are treated as equal when comparing paths
const EPSILON: f64 = 0.000001;
/// Default mean log-probability given to stopping at the sink
pub const DEFAULT_THRESH: f64 = -25.0;

/// ln(n! / ((n - k1 - k2)! k1! k2!))
fn lognchoosek2(n: u64, k1: u64, k2: u64) -> f64 {
    debug_assert!(n >= k1 + k2);
    let mut total = 0.0;
    for m in (n - k1 - k2 + 1)..=n {
        total += (m as f64).ln();
    }
    for m in 1..=k1 {
        total -= (m as f64).ln();
    }
    for m in 1..=k2 {
        total -= (m as f64).ln();
    }
    total
}

/// DAG of minimizing k-mers with coverage.
#[derive(Debug, Clone)]
pub struct KmerGraph {
    nodes: Vec<KmerNode>,
    path_index: HashMap<Path, usize>,
    sorted_nodes: Vec<usize>,
    read_covgs: Vec<[Vec<u32>; 2]>,
    num_reads: u32,
    longest_path: Option<u32>,
    k: u32,
    p: f64,
    thresh: f64,
}

impl Default for KmerGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl KmerGraph {
    /// An empty graph with unset error model
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            path_index: HashMap::new(),
            sorted_nodes: Vec::new(),
            read_covgs: Vec::new(),
            num_reads: 0,
            longest_path: None,
            k: 0,
            p: 1.0,
            thresh: DEFAULT_THRESH,
        }
    }

    /// Remove all nodes, coverage and cached results, keeping the error model
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.path_index.clear();
        self.sorted_nodes.clear();
        self.read_covgs.clear();
        self.longest_path = None;
        self.k = 0;
    }

    /// Number of nodes, including source and sink
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes, in id order
    pub fn nodes(&self) -> &[KmerNode] {
        &self.nodes
    }

    /// # Panics
    /// If there is no node with this id.
    pub fn node(&self, id: usize) -> &KmerNode {
        &self.nodes[id]
    }

    /// Node ids in topological order, empty until
    /// [`KmerGraph::sort_topologically()`] has been called
    pub fn sorted_nodes(&self) -> &[usize] {
        &self.sorted_nodes
    }

    /// Id of the node with this path, if there is one
    pub fn find_node(&self, path: &Path) -> Option<usize> {
        self.path_index.get(path).copied()
    }

    /// k-mer size, or 0 before any k-mer has been added
    pub fn k(&self) -> u32 {
        self.k
    }

    /// Probability a k-mer is read correctly
    pub fn p(&self) -> f64 {
        self.p
    }

    /// Number of reads coverage was collected from
    pub fn num_reads(&self) -> u32 {
        self.num_reads
    }

    /// Set the number of reads used by [`KmerGraph::prob()`]
    pub fn set_num_reads(&mut self, num_reads: u32) {
        self.num_reads = num_reads;
    }

    /// Change the score for ending a path at the sink
    pub fn set_thresh(&mut self, thresh: f64) {
        self.thresh = thresh;
    }

    /// Per-read coverage, indexed by read id then strand then node id
    pub fn read_covgs(&self) -> &[[Vec<u32>; 2]] {
        &self.read_covgs
    }

    /// Add a node for `path`, or return the id of the existing one.
    ///
    /// The first k-mer added fixes k; all other non-terminal nodes must have
    /// the same sequence length.
    pub fn add_node(&mut self, path: Path) -> Result<usize> {
        if let Some(&id) = self.path_index.get(&path) {
            return Ok(id);
        }
        let length = path.length();
        if length > 0 {
            if self.k == 0 {
                self.k = length;
            } else if self.k != length {
                return Err(PrgError::Invariant(format!(
                    "k-mer {path} has length {length} but the graph has k={}",
                    self.k
                )));
            }
        }

        let id = self.nodes.len();
        self.path_index.insert(path.clone(), id);
        self.nodes.push(KmerNode::new(id, path));
        self.sorted_nodes.clear();
        self.longest_path = None;
        Ok(id)
    }

    /// Add a node carrying its canonical hash and A/T count
    pub fn add_node_with_kh(&mut self, path: Path, khash: u64, num_at: u8) -> Result<usize> {
        let id = self.add_node(path)?;
        self.nodes[id].khash = khash;
        self.nodes[id].num_at = num_at;
        Ok(id)
    }

    /// Add an edge between existing nodes. Duplicates and self-edges are
    /// ignored; the source path must sort strictly before the target path.
    pub fn add_edge(&mut self, from: usize, to: usize) -> Result<()> {
        if from >= self.nodes.len() || to >= self.nodes.len() {
            return Err(PrgError::Invariant(format!(
                "Edge {from}->{to} refers to a missing node"
            )));
        }
        if from == to {
            return Ok(());
        }
        if self.nodes[from].path >= self.nodes[to].path {
            return Err(PrgError::Invariant(format!(
                "Edge from {} to {} does not go forwards",
                self.nodes[from].path, self.nodes[to].path
            )));
        }
        if !self.nodes[from].out_nodes.contains(&to) {
            self.nodes[from].out_nodes.push(to);
            self.nodes[to].in_nodes.push(from);
            self.sorted_nodes.clear();
            self.longest_path = None;
        }
        Ok(())
    }

    /// Add an edge between the nodes with these paths
    pub fn add_edge_by_path(&mut self, from: &Path, to: &Path) -> Result<()> {
        let from_id = self
            .find_node(from)
            .ok_or_else(|| PrgError::Invariant(format!("No k-mer node with path {from}")))?;
        let to_id = self
            .find_node(to)
            .ok_or_else(|| PrgError::Invariant(format!("No k-mer node with path {to}")))?;
        self.add_edge(from_id, to_id)
    }

    /// Order node ids by path
    pub fn sort_topologically(&mut self) {
        let mut sorted: Vec<usize> = (0..self.nodes.len()).collect();
        sorted.sort_by(|a, b| self.nodes[*a].path.cmp(&self.nodes[*b].path));
        self.sorted_nodes = sorted;
    }

    /// Sort (if not already sorted) and check the graph is a proper DAG from
    /// source to sink.
    pub fn check(&mut self) -> Result<()> {
        if self.sorted_nodes.len() != self.nodes.len() {
            self.sort_topologically();
        }
        let Some((&first, &last)) = self.sorted_nodes.first().zip(self.sorted_nodes.last()) else {
            return Ok(());
        };
        let mut position = vec![0; self.nodes.len()];
        for (pos, &id) in self.sorted_nodes.iter().enumerate() {
            position[id] = pos;
        }

        for &id in &self.sorted_nodes {
            let node = &self.nodes[id];
            if id != first && node.in_nodes.is_empty() {
                return Err(PrgError::Invariant(format!(
                    "Node {node} has no incoming edges"
                )));
            }
            if id != last && node.out_nodes.is_empty() {
                return Err(PrgError::Invariant(format!(
                    "Node {node} has no outgoing edges"
                )));
            }
            for &out in &node.out_nodes {
                if node.path >= self.nodes[out].path || position[out] <= position[id] {
                    return Err(PrgError::Invariant(format!(
                        "Edge {}->{} is out of order",
                        node, self.nodes[out]
                    )));
                }
            }
        }
        Ok(())
    }

    /// Source and sink ids, from the sort order if available
    fn terminals(&self) -> Option<(usize, usize)> {
        if self.sorted_nodes.len() == self.nodes.len() && !self.nodes.is_empty() {
            return self.sorted_nodes.first().copied().zip(self.sorted_nodes.last().copied());
        }
        let source = self.nodes.iter().min_by(|a, b| a.path.cmp(&b.path))?;
        let sink = self.nodes.iter().max_by(|a, b| a.path.cmp(&b.path))?;
        Some((source.id, sink.id))
    }

    /// Add one hit to a node's coverage on the given strand (`true` is forward)
    pub fn increment_covg(&mut self, node_id: usize, strand: bool) -> Result<()> {
        let node = self.nodes.get_mut(node_id).ok_or_else(|| {
            PrgError::Invariant(format!("Coverage added to missing node {node_id}"))
        })?;
        let strand_idx = usize::from(!strand);
        node.covg[strand_idx] = node.covg[strand_idx].saturating_add(1);
        Ok(())
    }

    /// Record a hit from read `read_id` in the per-read coverage table
    pub fn add_read_hit(&mut self, read_id: u32, node_id: usize, strand: bool) -> Result<()> {
        if node_id >= self.nodes.len() {
            return Err(PrgError::Invariant(format!(
                "Read coverage added to missing node {node_id}"
            )));
        }
        let read_idx = read_id as usize;
        if self.read_covgs.len() <= read_idx {
            self.read_covgs
                .resize_with(read_idx + 1, || [Vec::new(), Vec::new()]);
        }
        let strand_covg = &mut self.read_covgs[read_idx][usize::from(!strand)];
        if strand_covg.len() < self.nodes.len() {
            strand_covg.resize(self.nodes.len(), 0);
        }
        strand_covg[node_id] = strand_covg[node_id].saturating_add(1);
        Ok(())
    }

    /// Set a node's coverage directly
    pub fn set_covg(&mut self, node_id: usize, covg: [u32; 2]) -> Result<()> {
        let node = self
            .nodes
            .get_mut(node_id)
            .ok_or_else(|| PrgError::Invariant(format!("No k-mer node {node_id}")))?;
        node.covg = covg;
        Ok(())
    }

    /// Set `p = exp(-e * k)` from a per-base error rate `e`
    pub fn set_p(&mut self, error_rate: f64) -> Result<()> {
        if self.k == 0 {
            return Err(PrgError::ProbabilityUnset(
                "k is not known until k-mers are added".to_string(),
            ));
        }
        if !(error_rate > 0.0 && error_rate < 1.0) {
            return Err(PrgError::InvalidParameter(format!(
                "Error rate {error_rate} must be in (0, 1)"
            )));
        }
        self.p = (-error_rate * f64::from(self.k)).exp();
        Ok(())
    }

    fn check_p(&self) -> Result<()> {
        if self.p >= 1.0 {
            return Err(PrgError::ProbabilityUnset(
                "p has not been set from an error rate".to_string(),
            ));
        }
        Ok(())
    }

    /// Log-probability of a node's coverage given `num_reads` reads.
    ///
    /// Terminal nodes score 0.
    pub fn prob_with(&self, node_id: usize, num_reads: u32) -> Result<f64> {
        self.check_p()?;
        let node = self
            .nodes
            .get(node_id)
            .ok_or_else(|| PrgError::Invariant(format!("No k-mer node {node_id}")))?;
        if node.is_terminal() {
            return Ok(0.0);
        }
        let [c0, c1] = node.covg.map(u64::from);
        let c = c0 + c1;
        let num_reads = u64::from(num_reads);
        let half_p = (self.p / 2.0).ln();
        if c > num_reads {
            Ok(lognchoosek2(c, c0, c1) + c as f64 * half_p)
        } else {
            Ok(lognchoosek2(num_reads, c0, c1)
                + c as f64 * half_p
                + (num_reads - c) as f64 * (1.0 - self.p).ln())
        }
    }

    /// Log-probability of a node's coverage given the graph's read count
    pub fn prob(&self, node_id: usize) -> Result<f64> {
        if self.num_reads == 0 {
            return Err(PrgError::ProbabilityUnset(
                "number of reads is zero".to_string(),
            ));
        }
        self.prob_with(node_id, self.num_reads)
    }

    fn check_search_params(&mut self) -> Result<(usize, usize)> {
        self.check_p()?;
        if self.num_reads == 0 {
            return Err(PrgError::ProbabilityUnset(
                "number of reads is zero".to_string(),
            ));
        }
        self.check()?;
        self.terminals().ok_or(PrgError::NoPath)
    }

    /// Path maximising mean node log-probability.
    ///
    /// Returns the mean score and the node ids on the path, excluding source
    /// and sink. Among successors within [`EPSILON`] of the best mean the
    /// longer path wins; ending at the sink scores the threshold.
    pub fn find_max_path(&mut self) -> Result<(f64, Vec<usize>)> {
        let (source, sink) = self.check_search_params()?;
        let num_nodes = self.nodes.len();
        let mut max_sum = vec![0.0; num_nodes];
        let mut length = vec![0u32; num_nodes];
        let mut prev = vec![sink; num_nodes];

        for &id in self.sorted_nodes.iter().rev().skip(1) {
            let mut best_mean = f64::MIN;
            let mut best_len = 0;
            for &succ in &self.nodes[id].out_nodes {
                let take = if succ == sink {
                    self.thresh > best_mean + EPSILON
                } else if length[succ] == 0 {
                    false
                } else {
                    let mean = max_sum[succ] / f64::from(length[succ]);
                    mean > best_mean + EPSILON
                        || (best_mean - mean <= EPSILON && length[succ] > best_len)
                };
                if take {
                    max_sum[id] = self.prob(id)? + max_sum[succ];
                    length[id] = 1 + length[succ];
                    prev[id] = succ;
                    if succ == sink {
                        best_mean = self.thresh;
                    } else {
                        best_mean = max_sum[succ] / f64::from(length[succ]);
                        best_len = length[succ];
                    }
                }
            }
        }

        let path_len = length[source].saturating_sub(1);
        if path_len == 0 {
            return Err(PrgError::NoPath);
        }
        let max_path = Self::trace_path(&prev, source, sink);
        Ok((max_sum[source] / f64::from(path_len), max_path))
    }

    /// Path maximising the minimum node log-probability.
    ///
    /// Ties within [`EPSILON`] prefer the longer path. Returns the bottleneck
    /// score and node ids on the path, excluding source and sink.
    pub fn find_min_path(&mut self) -> Result<(f64, Vec<usize>)> {
        let (source, sink) = self.check_search_params()?;
        let num_nodes = self.nodes.len();
        let mut min_score = vec![0.0; num_nodes];
        let mut length = vec![0u32; num_nodes];
        let mut prev = vec![sink; num_nodes];

        for &id in self.sorted_nodes.iter().rev().skip(1) {
            let mut best_min = f64::MIN;
            let mut best_len = 0;
            for &succ in &self.nodes[id].out_nodes {
                let take = if succ == sink {
                    self.thresh > best_min + EPSILON
                } else if length[succ] == 0 {
                    false
                } else {
                    min_score[succ] > best_min + EPSILON
                        || (best_min - min_score[succ] <= EPSILON && length[succ] > best_len)
                };
                if take {
                    let node_prob = self.prob(id)?;
                    if succ == sink {
                        min_score[id] = node_prob;
                        best_min = self.thresh;
                    } else {
                        min_score[id] = node_prob.min(min_score[succ]);
                        best_min = min_score[succ];
                        best_len = length[succ];
                    }
                    length[id] = 1 + length[succ];
                    prev[id] = succ;
                }
            }
        }

        if length[source] <= 1 {
            return Err(PrgError::NoPath);
        }
        let min_path = Self::trace_path(&prev, source, sink);
        Ok((min_score[source], min_path))
    }

    fn trace_path(prev: &[usize], source: usize, sink: usize) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = prev[source];
        while current != sink {
            path.push(current);
            current = prev[current];
        }
        path
    }

    /// Find `num_paths` paths, depleting coverage along each found path
    /// before searching for the next. Coverage is restored afterwards.
    pub fn find_max_paths(&mut self, num_paths: usize) -> Result<Vec<Vec<usize>>> {
        if num_paths == 0 {
            return Err(PrgError::InvalidParameter(
                "number of paths must be at least 1".to_string(),
            ));
        }
        let saved_covgs: Vec<[u32; 2]> = self.nodes.iter().map(|n| n.covg).collect();
        let result = self.depleting_max_paths(num_paths);
        for (node, covg) in self.nodes.iter_mut().zip(saved_covgs) {
            node.covg = covg;
        }
        result
    }

    fn depleting_max_paths(&mut self, num_paths: usize) -> Result<Vec<Vec<usize>>> {
        let depletion = (self.p * f64::from(self.num_reads) / num_paths as f64) as u32;
        let mut paths = Vec::with_capacity(num_paths);
        let (_, mut max_path) = self.find_max_path()?;
        paths.push(max_path.clone());
        while paths.len() < num_paths {
            for &id in &max_path {
                let covg = &mut self.nodes[id].covg;
                covg[0] -= min(covg[0], depletion);
                covg[1] -= min(covg[1], depletion);
            }
            max_path = self.find_max_path()?.1;
            paths.push(max_path.clone());
        }
        Ok(paths)
    }

    /// Sample paths by choosing an out-edge uniformly at each node.
    ///
    /// Paths exclude source and sink.
    pub fn get_random_paths<R: Rng>(&self, num_paths: usize, rng: &mut R) -> Vec<Vec<usize>> {
        let Some((source, sink)) = self.terminals() else {
            return Vec::new();
        };
        let mut random_paths = Vec::with_capacity(num_paths);
        for _ in 0..num_paths {
            let mut random_path = Vec::new();
            let mut current = source;
            loop {
                let outs = &self.nodes[current].out_nodes;
                if outs.is_empty() {
                    break;
                }
                let next = outs[rng.gen_range(0..outs.len())];
                if next == sink {
                    break;
                }
                random_path.push(next);
                current = next;
            }
            random_paths.push(random_path);
        }
        random_paths
    }

    /// Mean log-probability of the non-terminal nodes on a path
    pub fn prob_path(&self, kpath: &[usize]) -> Result<f64> {
        let mut total = 0.0;
        let mut len = 0;
        for &id in kpath {
            total += self.prob(id)?;
            if !self.nodes[id].is_terminal() {
                len += 1;
            }
        }
        Ok(total / f64::from(max(len, 1)))
    }

    /// Joint score of a set of paths.
    ///
    /// Each node is scored with read count scaled by the fraction of paths
    /// using it, and the scores are averaged over distinct non-terminal nodes.
    pub fn prob_paths(&self, kpaths: &[Vec<usize>]) -> Result<f64> {
        if kpaths.is_empty() {
            return Ok(0.0);
        }
        let mut path_node_count = vec![0u32; self.nodes.len()];
        for kpath in kpaths {
            for &id in kpath {
                let count = path_node_count.get_mut(id).ok_or_else(|| {
                    PrgError::Invariant(format!("Path refers to missing node {id}"))
                })?;
                *count += 1;
            }
        }

        let mut total = 0.0;
        let mut len = 0;
        for (id, &count) in path_node_count.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let expected_reads =
                u64::from(self.num_reads) * u64::from(count) / kpaths.len() as u64;
            total += self.prob_with(id, u32::try_from(expected_reads).unwrap_or(u32::MAX))?;
            if !self.nodes[id].is_terminal() {
                len += 1;
            }
        }
        Ok(total / f64::from(max(len, 1)))
    }

    /// Number of k-mers on the longest source to sink path
    pub fn longest_path_length(&mut self) -> Result<u32> {
        if let Some(len) = self.longest_path {
            return Ok(len);
        }
        self.check()?;
        let Some((source, _)) = self.terminals() else {
            return Ok(0);
        };
        let mut length = vec![0u32; self.nodes.len()];
        for &id in self.sorted_nodes.iter().rev() {
            for &succ in &self.nodes[id].out_nodes {
                length[id] = max(length[id], length[succ] + 1);
            }
        }
        let num_kmers = length[source].saturating_sub(1);
        self.longest_path = Some(num_kmers);
        Ok(num_kmers)
    }

    /// Write `c0,c1,num_at ` for every node in id order
    pub fn save_covg_dist(&self, filepath: &str) -> Result<()> {
        let mut handle = BufWriter::new(File::create(filepath)?);
        for node in &self.nodes {
            write!(handle, "{},{},{} ", node.covg[0], node.covg[1], node.num_at)?;
        }
        handle.flush()?;
        Ok(())
    }

    /// Write the graph in GFA-style text
    pub fn write_gfa<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "H\tVN:Z:1.0\tbn:Z:--linear --singlearr")?;
        for node in &self.nodes {
            writeln!(
                writer,
                "S\t{}\t{}\tFC:i:{}\tRC:i:{}\t{}",
                node.id, node.path, node.covg[0], node.covg[1], node.num_at
            )?;
            for out in &node.out_nodes {
                writeln!(writer, "L\t{}\t+\t{}\t+\t0M", node.id, out)?;
            }
        }
        Ok(())
    }

    /// Save the graph to a GFA file
    pub fn save(&self, filepath: &str) -> Result<()> {
        log::info!("Saving k-mer graph to {filepath}");
        let mut handle = BufWriter::new(File::create(filepath)?);
        self.write_gfa(&mut handle)?;
        handle.flush()?;
        Ok(())
    }

    /// Load a graph from a GFA file written by [`KmerGraph::save()`]
    pub fn load(filepath: &str) -> Result<Self> {
        log::info!("Loading k-mer graph from {filepath}");
        let handle = BufReader::new(File::open(filepath)?);
        Self::read_gfa(handle)
    }

    /// Parse GFA-style text. Segment lines are read before link lines, so
    /// their relative order does not matter.
    pub fn read_gfa<R: BufRead>(reader: R) -> Result<Self> {
        let lines: Vec<String> = reader.lines().collect::<std::io::Result<_>>()?;

        let mut slots: Vec<Option<KmerNode>> = Vec::new();
        let mut k = 0;
        for line in &lines {
            let fields: Vec<&str> = line.split('\t').collect();
            if fields[0] != "S" {
                continue;
            }
            if fields.len() < 5 {
                return Err(PrgError::Parse(format!("Segment line `{line}` is too short")));
            }
            let id: usize = fields[1]
                .parse()
                .map_err(|_| PrgError::Parse(format!("Invalid node id in `{line}`")))?;
            let path: Path = fields[2].parse()?;
            let mut node = KmerNode::new(id, path);
            node.covg = [
                parse_tagged_int(fields[3], "FC", line)?,
                parse_tagged_int(fields[4], "RC", line)?,
            ];
            if let Some(at_field) = fields.get(5) {
                node.num_at = at_field
                    .trim()
                    .parse()
                    .map_err(|_| PrgError::Parse(format!("Invalid A/T count in `{line}`")))?;
            }
            if k == 0 && node.path.length() > 0 {
                k = node.path.length();
            }
            if slots.len() <= id {
                slots.resize_with(id + 1, || None);
            }
            if slots[id].is_some() {
                return Err(PrgError::Parse(format!("Node id {id} appears twice")));
            }
            slots[id] = Some(node);
        }

        let mut graph = KmerGraph::new();
        graph.k = k;
        for (id, slot) in slots.into_iter().enumerate() {
            let node = slot.ok_or_else(|| PrgError::Parse(format!("Node id {id} is missing")))?;
            let length = node.path.length();
            if length > 0 && length != k {
                return Err(PrgError::Parse(format!(
                    "Node {id} has length {length} but k={k}"
                )));
            }
            if graph.path_index.insert(node.path.clone(), id).is_some() {
                return Err(PrgError::Parse(format!(
                    "Path {} appears on more than one node",
                    node.path
                )));
            }
            graph.nodes.push(node);
        }

        for line in &lines {
            let fields: Vec<&str> = line.split('\t').collect();
            if fields[0] != "L" {
                continue;
            }
            if fields.len() < 5 {
                return Err(PrgError::Parse(format!("Link line `{line}` is too short")));
            }
            let parse_id = |field: &str| -> Result<usize> {
                field
                    .parse()
                    .map_err(|_| PrgError::Parse(format!("Invalid node id in `{line}`")))
            };
            let (from, to) = if fields[2] == fields[4] {
                (parse_id(fields[1])?, parse_id(fields[3])?)
            } else {
                (parse_id(fields[3])?, parse_id(fields[1])?)
            };
            graph
                .add_edge(from, to)
                .map_err(|e| PrgError::Parse(format!("Bad link `{line}`: {e}")))?;
        }

        graph.sort_topologically();
        Ok(graph)
    }
}

fn parse_tagged_int(field: &str, tag: &str, line: &str) -> Result<u32> {
    field
        .strip_prefix(tag)
        .and_then(|rest| rest.strip_prefix(":i:"))
        .and_then(|value| value.parse().ok())
        .ok_or_else(|| PrgError::Parse(format!("Expected {tag}:i:<count> in `{line}`")))
}

impl PartialEq for KmerGraph {
    /// Graphs are equal if they have the same node paths and the same edges
    /// between them; node ids may differ.
    fn eq(&self, other: &Self) -> bool {
        if self.nodes.len() != other.nodes.len() {
            return false;
        }
        self.nodes.iter().all(|node| {
            let Some(other_id) = other.find_node(&node.path) else {
                return false;
            };
            let other_node = &other.nodes[other_id];
            node.out_nodes.len() == other_node.out_nodes.len()
                && node.in_nodes.len() == other_node.in_nodes.len()
                && node.out_nodes.iter().all(|&out| {
                    other_node
                        .out_nodes
                        .iter()
                        .any(|&other_out| other.nodes[other_out].path == self.nodes[out].path)
                })
        })
    }
}

impl fmt::Display for KmerGraph {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for node in &self.nodes {
            write!(f, "{node}")?;
            for out in &node.out_nodes {
                write!(f, " ->{out}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choose_two_ways() {
        // 4! / (2! 1! 1!) = 12
        assert!((lognchoosek2(4, 2, 1) - 12f64.ln()).abs() < 1e-9);
        assert!(lognchoosek2(3, 0, 0).abs() < 1e-9);
    }
}
