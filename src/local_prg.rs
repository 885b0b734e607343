//! A single PRG: its marker string, variation graph and k-mer graph.
//!
//! A PRG is written as a space-separated string of sequence and integer
//! markers. Odd marker `s` opens and closes a site and `s + 1` separates its
//! alleles, so `AAA 5 CCC 6 GGG 5 TTT` is `AAA` followed by one of `CCC` or
//! `GGG`, then `TTT`. Sites may nest inside alleles, and sites are numbered
//! from 5 upwards in steps of 2 in order of first appearance.
//!
//! [`LocalPrg::new()`] parses the string into a [`LocalGraph`], and
//! [`LocalPrg::minimizer_sketch()`] walks the graph in windows of `w` k-mers
//! to build the [`KmerGraph`] of minimizers, adding each to an [`Index`].
//! After coverage has been added from read hits,
//! [`LocalPrg::find_path()`] infers the most likely sequence.

use std::cmp::min;
use std::collections::VecDeque;
use std::io::Write;

use hashbrown::HashSet;

use crate::errors::{PrgError, Result};
use crate::index::Index;
use crate::interval::Interval;
use crate::kmer_graph::KmerGraph;
use crate::kmer_hash::bit_encoding::MAX_K;
use crate::kmer_hash::{count_at, KmerHash};
use crate::local_graph::LocalGraph;
use crate::minihit::MinimizerHit;
use crate::path::Path;

/// Separator between tokens of a PRG string
const SEPARATOR: u8 = b' ';
/// Marker of the first site
const FIRST_SITE: u32 = 5;

/// Which k-mer graph search to use when inferring a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PathMode {
    /// Maximum mean log-probability
    Max,
    /// Maximum bottleneck log-probability
    Min,
}

/// A path inferred through a PRG
#[derive(Debug, Clone, PartialEq)]
pub struct PrgPath {
    /// K-mer graph node ids, excluding source and sink
    pub kmer_path: Vec<usize>,
    /// Variation graph node ids, from source to sink
    pub local_path: Vec<usize>,
    /// Score of the k-mer path under the chosen search
    pub score: f64,
}

fn is_alpha(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_alphabetic())
}

/// Split at whole-token occurrences of `marker`. Separators next to the
/// marker are excluded from the pieces, and adjacent markers give
/// zero-length pieces.
fn split_on_marker(seq: &str, interval: Interval, marker: &str) -> Vec<Interval> {
    let bytes = seq.as_bytes();
    let start = interval.start as usize;
    let end = interval.end as usize;

    let mut pieces = Vec::new();
    let mut piece_start = start;
    let mut search = start;
    while let Some(found) = seq[search..end].find(marker) {
        let token_start = search + found;
        let token_end = token_start + marker.len();
        let whole_token = (token_start == start || bytes[token_start - 1] == SEPARATOR)
            && (token_end == end || bytes[token_end] == SEPARATOR);
        if whole_token {
            let piece_end = usize::max(piece_start, token_start.saturating_sub(1));
            pieces.push(Interval::new(piece_start as u32, piece_end as u32));
            piece_start = min(token_end + 1, end);
        }
        search = token_end;
    }
    pieces.push(Interval::new(
        piece_start as u32,
        usize::max(piece_start, end) as u32,
    ));
    pieces
}

/// A PRG and the graphs built from it.
#[derive(Debug, Clone)]
pub struct LocalPrg {
    id: u32,
    name: String,
    seq: String,
    prg: LocalGraph,
    kmer_prg: KmerGraph,
    num_hits: [u32; 2],
    next_id: usize,
    next_site: u32,
}

impl LocalPrg {
    /// Parse a PRG string and build its variation graph.
    ///
    /// An empty (or whitespace only) string gives a graph of one empty node.
    ///
    /// # Errors
    /// [`PrgError::MalformedPrg`] if the site markers do not nest properly.
    pub fn new(id: u32, name: &str, seq: &str) -> Result<Self> {
        let mut local_prg = Self {
            id,
            name: name.to_string(),
            seq: seq.to_string(),
            prg: LocalGraph::new(),
            kmer_prg: KmerGraph::new(),
            num_hits: [0, 0],
            next_id: 0,
            next_site: FIRST_SITE,
        };

        if seq.trim().is_empty() {
            log::debug!("PRG {name} is empty");
            local_prg.prg.add_node(0, "", Interval::new(0, 0));
            return Ok(local_prg);
        }
        local_prg.build_graph(Interval::new(0, seq.len() as u32), &[], 0)?;
        log::debug!("PRG {name} has {} nodes", local_prg.prg.len());
        Ok(local_prg)
    }

    /// Position of the PRG in its input file
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Name from the input file
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The PRG marker string
    pub fn seq(&self) -> &str {
        &self.seq
    }

    /// Variation graph
    pub fn prg(&self) -> &LocalGraph {
        &self.prg
    }

    /// K-mer graph, empty until sketched or loaded
    pub fn kmer_prg(&self) -> &KmerGraph {
        &self.kmer_prg
    }

    /// K-mer graph, for adding coverage and setting the error model
    pub fn kmer_prg_mut(&mut self) -> &mut KmerGraph {
        &mut self.kmer_prg
    }

    /// Replace the k-mer graph, e.g. with one loaded from file
    pub fn set_kmer_prg(&mut self, kmer_prg: KmerGraph) {
        self.kmer_prg = kmer_prg;
    }

    /// Hits added with [`LocalPrg::update_covg_with_hit()`], by strand
    pub fn num_hits(&self) -> [u32; 2] {
        self.num_hits
    }

    /// Sequence spelled by a path.
    ///
    /// # Panics
    /// If the path goes past the end of the PRG string.
    pub fn string_along_path(&self, path: &Path) -> String {
        assert!(
            path.end() as usize <= self.seq.len(),
            "Path {path} runs past the end of PRG {}",
            self.name
        );
        path.intervals()
            .iter()
            .map(|i| &self.seq[i.start as usize..i.end as usize])
            .collect()
    }

    /// Sequence spelled by a list of variation graph nodes
    pub fn string_along_local_path(&self, local_path: &[usize]) -> String {
        local_path
            .iter()
            .map(|&id| self.prg.node(id).seq.as_str())
            .collect()
    }

    /// Ids of variation graph nodes on a path
    pub fn nodes_along_path(&self, path: &Path) -> Vec<usize> {
        self.prg.nodes_along_path(path)
    }

    /// Split an interval into `[prefix, alleles..., suffix]` at the next site
    fn split_by_site(&self, interval: Interval) -> Vec<Interval> {
        let site_pieces = split_on_marker(&self.seq, interval, &self.next_site.to_string());
        let allele_marker = (self.next_site + 1).to_string();
        let mut pieces: Vec<Interval> = site_pieces
            .iter()
            .flat_map(|piece| split_on_marker(&self.seq, *piece, &allele_marker))
            .collect();

        if site_pieces.len() == 3 && pieces.len() == 3 {
            log::warn!(
                "Site {} in PRG {} has one allele, adding an empty one",
                self.next_site,
                self.name
            );
            let suffix = pieces[2];
            let allele_end = pieces[1].end;
            pieces[2] = Interval::new(allele_end, allele_end);
            pieces.push(suffix);
        }
        pieces
    }

    /// Add nodes for `interval`, with edges from `from_ids`. Returns the ids
    /// of the nodes at the end of the interval.
    fn build_graph(&mut self, interval: Interval, from_ids: &[usize], level: u32) -> Result<Vec<usize>> {
        let start_id = self.next_id;
        let s = self.seq[interval.start as usize..interval.end as usize].to_string();

        let end_ids = if is_alpha(&s) {
            let id = self.add_local_node(&s, interval, from_ids)?;
            vec![id]
        } else {
            let pieces = self.split_by_site(interval);
            if pieces.len() < 4 {
                return Err(PrgError::MalformedPrg(format!(
                    "splitting {} on site {} gave {} pieces in PRG {}",
                    interval,
                    self.next_site,
                    pieces.len(),
                    self.name
                )));
            }
            log::debug!(
                "Site {} at level {level} has {} alleles",
                self.next_site,
                pieces.len() - 2
            );
            self.next_site += 2;

            let prefix = pieces[0];
            let prefix_seq = self.seq[prefix.start as usize..prefix.end as usize].to_string();
            if !is_alpha(&prefix_seq) {
                return Err(PrgError::MalformedPrg(format!(
                    "unexpected marker in `{prefix_seq}` of PRG {}",
                    self.name
                )));
            }
            let prefix_id = self.add_local_node(&prefix_seq, prefix, from_ids)?;

            let mut allele_ends = Vec::new();
            for allele in &pieces[1..pieces.len() - 1] {
                allele_ends.extend(self.build_graph(*allele, &[prefix_id], level + 1)?);
            }
            let suffix = pieces[pieces.len() - 1];
            self.build_graph(suffix, &allele_ends, level)?
        };

        if start_id == 0 && end_ids.len() != 1 {
            return Err(PrgError::Invariant(format!(
                "PRG {} ends in {} nodes",
                self.name,
                end_ids.len()
            )));
        }
        Ok(end_ids)
    }

    fn add_local_node(&mut self, seq: &str, pos: Interval, from_ids: &[usize]) -> Result<usize> {
        let id = self.next_id;
        self.prg.add_node(id, seq, pos);
        for &from in from_ids {
            self.prg.add_edge(from, id)?;
        }
        self.next_id += 1;
        Ok(id)
    }

    fn last_node_along(&self, path: &Path) -> Option<usize> {
        self.prg.nodes_along_path(path).last().copied()
    }

    /// All paths of the same sequence length as `path`, moved one position
    /// along the graph.
    ///
    /// Zero-length nodes are passed through without counting as a step. When
    /// a shifted path can reach the sink through zero-length nodes only, that
    /// extension is returned, along with the shifted path itself if it also
    /// continues into sequence.
    pub fn shift(&self, path: &Path) -> Vec<Path> {
        let sink_end = self.prg.sink_end();
        let mut shortened = path.subpath(1, path.length().saturating_sub(1));
        if shortened.is_empty() {
            shortened = Path::from_interval(Interval::new(path.end(), path.end()));
        }

        let mut short_paths = VecDeque::from([shortened]);
        let mut k_paths = Vec::new();
        while let Some(mut short) = short_paths.pop_front() {
            let Some(last) = self
                .last_node_along(&short)
                .or_else(|| self.last_node_along(path))
            else {
                continue;
            };
            let last_node = self.prg.node(last);
            if short.end() < last_node.pos.end {
                short.extend_end();
                short.trim_start();
                k_paths.push(short);
            } else if short.end() != sink_end {
                for &out in &last_node.out_nodes {
                    let out_start = self.prg.node(out).pos.start;
                    let mut extended = short.clone();
                    extended.add_end_interval(Interval::new(out_start, out_start));
                    short_paths.push_back(extended);
                }
            }
        }

        let mut return_paths = Vec::new();
        for k_path in k_paths {
            let mut non_terminus = false;
            let mut to_sink = VecDeque::from([k_path.clone()]);
            while let Some(candidate) = to_sink.pop_front() {
                let Some(last) = self.last_node_along(&candidate) else {
                    continue;
                };
                let last_node = self.prg.node(last);
                if last_node.pos.end == sink_end {
                    return_paths.push(candidate);
                } else if last_node.pos.end == candidate.end() {
                    for &out in &last_node.out_nodes {
                        let out_pos = self.prg.node(out).pos;
                        if out_pos.is_empty() {
                            let mut extended = candidate.clone();
                            extended.add_end_interval(out_pos);
                            to_sink.push_back(extended);
                        } else {
                            non_terminus = true;
                        }
                    }
                } else {
                    non_terminus = true;
                }
            }
            if non_terminus {
                return_paths.push(k_path);
            }
        }
        return_paths
    }

    /// Find the node for a selected k-mer, adding it (and its index record)
    /// if it is new.
    fn select_minimizer(
        &mut self,
        index: &mut Index,
        kmer_path: &Path,
        kh: (u64, u64),
    ) -> Result<(usize, bool)> {
        if let Some(id) = self.kmer_prg.find_node(kmer_path) {
            return Ok((id, false));
        }
        let kmer = self.string_along_path(kmer_path);
        let smallest = u64::min(kh.0, kh.1);
        let knode = self.kmer_prg.add_node_with_kh(
            kmer_path.clone(),
            smallest,
            count_at(kmer.as_bytes()),
        )?;
        index.add_record(smallest, self.id, kmer_path.clone(), knode, kh.0 <= kh.1);
        Ok((knode, true))
    }

    /// Select the minimizers of a window, adding an edge from `from` to the
    /// first of them and chaining any tied minimizers after it. Returns the
    /// selected node ids.
    fn select_window(
        &mut self,
        index: &mut Index,
        hasher: &KmerHash,
        window: &[Path],
        from: usize,
        only_new: bool,
    ) -> Result<Vec<usize>> {
        let hashes: Vec<(u64, u64)> = window
            .iter()
            .map(|kmer_path| hasher.kmerhash(self.string_along_path(kmer_path).as_bytes()))
            .collect();
        let smallest = hashes
            .iter()
            .map(|(fwd, rev)| u64::min(*fwd, *rev))
            .min()
            .unwrap_or(u64::MAX);

        let mut selected = Vec::new();
        for (kmer_path, kh) in window.iter().zip(hashes) {
            if kh.0 != smallest && kh.1 != smallest {
                continue;
            }
            let (knode, is_new) = self.select_minimizer(index, kmer_path, kh)?;
            if only_new && !is_new {
                continue;
            }
            match selected.last() {
                Some(&prev) => self.kmer_prg.add_edge(prev, knode)?,
                None => self.kmer_prg.add_edge(from, knode)?,
            }
            selected.push(knode);
        }
        Ok(selected)
    }

    /// Extend a k-mer at the end of the graph through single zero-length
    /// successors, so it meets the sink coordinate.
    fn extend_through_null_nodes(&self, kmer_path: &mut Path, w: u32, k: u32) {
        let Some(mut last) = self.last_node_along(kmer_path) else {
            return;
        };
        if !self
            .prg
            .walk(last, self.prg.node(last).pos.end, w + k - 1)
            .is_empty()
        {
            return;
        }
        loop {
            let node = self.prg.node(last);
            let next = match node.out_nodes[..] {
                [next] if kmer_path.end() >= node.pos.end && self.prg.node(next).pos.is_empty() => next,
                _ => break,
            };
            kmer_path.add_end_interval(self.prg.node(next).pos);
            last = next;
        }
    }

    /// Build the k-mer graph of `(w, k)` minimizers, adding a record for each
    /// to `index`.
    ///
    /// # Errors
    /// [`PrgError::InvalidParameter`] unless `w > 0` and `0 < k <= 32`.
    pub fn minimizer_sketch(&mut self, index: &mut Index, w: u32, k: u32) -> Result<()> {
        if w == 0 {
            return Err(PrgError::InvalidParameter("w must be positive".to_string()));
        }
        if k == 0 || k as usize > MAX_K {
            return Err(PrgError::InvalidParameter(format!(
                "k must be between 1 and {MAX_K}"
            )));
        }
        log::info!("Sketching PRG {} with {} nodes", self.name, self.prg.len());

        self.kmer_prg.clear();
        let hasher = KmerHash::new(k as usize);
        let sink_end = self.prg.sink_end();
        let source_start = self.prg.node(0).pos.start;
        let source = self
            .kmer_prg
            .add_node(Path::from_interval(Interval::new(source_start, source_start)))?;

        let walk_paths = self.prg.walk(0, source_start, w + k - 1);
        if walk_paths.is_empty() {
            log::warn!("PRG {} is too short for a full window", self.name);
            let sink = self
                .kmer_prg
                .add_node(Path::from_interval(Interval::new(sink_end, sink_end)))?;
            self.kmer_prg.add_edge(source, sink)?;
            self.kmer_prg.sort_topologically();
            return Ok(());
        }

        let mut current_leaves: VecDeque<usize> = VecDeque::new();
        for walk_path in &walk_paths {
            let window: Vec<Path> = (0..w)
                .map(|j| {
                    let mut kmer_path = walk_path.subpath(j, k);
                    self.extend_through_null_nodes(&mut kmer_path, w, k);
                    kmer_path
                })
                .collect();
            let new_minimizers = self.select_window(index, &hasher, &window, source, true)?;
            current_leaves.extend(new_minimizers);
        }

        let mut end_leaves: Vec<usize> = Vec::new();
        let mut explored: HashSet<usize> = HashSet::new();
        while let Some(leaf) = current_leaves.pop_front() {
            if !explored.insert(leaf) {
                continue;
            }
            let leaf_hash = self.kmer_prg.node(leaf).khash();
            let leaf_path = self.kmer_prg.node(leaf).path().clone();
            let shifts = self.shift(&leaf_path);
            if shifts.is_empty() {
                end_leaves.push(leaf);
            }

            let mut windows: VecDeque<Vec<Path>> = shifts.into_iter().map(|p| vec![p]).collect();
            while let Some(window) = windows.pop_front() {
                let last = &window[window.len() - 1];
                if last.length() != k {
                    return Err(PrgError::Invariant(format!(
                        "shifted k-mer {last} does not have length {k}"
                    )));
                }
                let kh = hasher.kmerhash(self.string_along_path(last).as_bytes());
                let selected = if u64::min(kh.0, kh.1) <= leaf_hash {
                    let (knode, _) = self.select_minimizer(index, last, kh)?;
                    self.kmer_prg.add_edge(leaf, knode)?;
                    vec![knode]
                } else if window.len() == w as usize {
                    self.select_window(index, &hasher, &window, leaf, false)?
                } else if last.end() == sink_end {
                    end_leaves.push(leaf);
                    continue;
                } else {
                    for next in self.shift(last) {
                        let mut extended = window.clone();
                        extended.push(next);
                        windows.push_back(extended);
                    }
                    continue;
                };

                for knode in selected {
                    if last.end() == sink_end {
                        end_leaves.push(knode);
                    } else if !current_leaves.contains(&knode) {
                        current_leaves.push_back(knode);
                    }
                }
            }
        }

        if end_leaves.is_empty() {
            return Err(PrgError::Invariant(format!(
                "sketch of PRG {} found no k-mers at the end of the graph",
                self.name
            )));
        }
        let sink = self
            .kmer_prg
            .add_node(Path::from_interval(Interval::new(sink_end, sink_end)))?;
        for leaf in end_leaves {
            self.kmer_prg.add_edge(leaf, sink)?;
        }
        self.kmer_prg.sort_topologically();
        self.kmer_prg.check()?;
        log::info!(
            "PRG {} has {} minimizing k-mers",
            self.name,
            self.kmer_prg.len() - 2
        );
        Ok(())
    }

    /// Add coverage from a read hit to the k-mer node with the same path.
    pub fn update_covg_with_hit(&mut self, hit: &MinimizerHit) -> Result<()> {
        let node_id = self.kmer_prg.find_node(&hit.prg_path).ok_or_else(|| {
            PrgError::Invariant(format!(
                "hit path {} is not a k-mer of PRG {}",
                hit.prg_path, self.name
            ))
        })?;
        self.kmer_prg.increment_covg(node_id, hit.strand)?;
        self.kmer_prg.add_read_hit(hit.read_id, node_id, hit.strand)?;
        self.num_hits[usize::from(!hit.strand)] += 1;
        Ok(())
    }

    /// Variation graph nodes covered by a path of k-mer graph nodes.
    ///
    /// Gaps between consecutive k-mers are filled along first out-edges, and
    /// the result is extended back to the source and forward to the sink
    /// using walks which overlap its ends. An empty k-mer path gives the top
    /// path of the graph.
    pub fn localnode_path_from_kmernode_path(&self, kmer_path: &[usize], w: u32) -> Vec<usize> {
        let mut local_path: Vec<usize> = Vec::new();
        for &knode in kmer_path {
            let kmer_node = self.kmer_prg.node(knode);
            if kmer_node.is_terminal() {
                continue;
            }
            let kmer_local_nodes = self.prg.nodes_along_path(kmer_node.path());
            let Some(&first) = kmer_local_nodes.first() else {
                continue;
            };
            // join up to the k-mer
            while let Some(&back) = local_path.last() {
                match self.prg.node(back).out_nodes.first() {
                    Some(&next) if first > next => local_path.push(next),
                    _ => break,
                }
            }
            // drop any overlap with the k-mer
            while let Some(&back) = local_path.last() {
                if first <= back {
                    local_path.pop();
                } else {
                    break;
                }
            }
            local_path.extend(kmer_local_nodes);
        }

        if local_path.is_empty() {
            return self.prg.top_path();
        }

        let window_len = w + self.kmer_prg.k().saturating_sub(1);
        if local_path[0] != 0 {
            let start = self.prg.node(0).pos.start;
            for walk_path in self.prg.walk(0, start, window_len) {
                let walk_nodes = self.prg.nodes_along_path(&walk_path);
                if let Some(m) = overlap_start(&walk_nodes, &local_path) {
                    local_path.splice(0..0, walk_nodes[..m].iter().copied());
                    break;
                }
            }
            if local_path[0] != 0 {
                log::warn!("Could not extend path in PRG {} back to the start", self.name);
            }
        }

        let last_id = self.prg.len() - 1;
        if local_path[local_path.len() - 1] != last_id {
            for walk_path in self.prg.walk_back(last_id, self.prg.sink_end(), window_len) {
                let walk_nodes = self.prg.nodes_along_path(&walk_path);
                if let Some(m) = overlap_end(&walk_nodes, &local_path) {
                    local_path.extend_from_slice(&walk_nodes[m..]);
                    break;
                }
            }
            if local_path[local_path.len() - 1] != last_id {
                log::warn!("Could not extend path in PRG {} to the end", self.name);
            }
        }
        local_path
    }

    /// Search the k-mer graph and convert the result to variation graph
    /// nodes. Coverage, read count and error rate must already be set on the
    /// k-mer graph.
    pub fn find_path(&mut self, mode: PathMode, w: u32) -> Result<PrgPath> {
        let (score, kmer_path) = match mode {
            PathMode::Max => self.kmer_prg.find_max_path()?,
            PathMode::Min => self.kmer_prg.find_min_path()?,
        };
        let local_path = self.localnode_path_from_kmernode_path(&kmer_path, w);
        Ok(PrgPath {
            kmer_path,
            local_path,
            score,
        })
    }

    /// Write the sequence along `local_path` as a FASTA record named after
    /// this PRG, with the score in the header.
    pub fn write_path_to_fasta<W: Write>(
        &self,
        f: &mut W,
        local_path: &[usize],
        score: f64,
    ) -> Result<()> {
        let header = format!("{}\tlog P(data|sequence)={}", self.name, score);
        needletail::parser::write_fasta(
            header.as_bytes(),
            self.string_along_local_path(local_path).as_bytes(),
            f,
            needletail::parser::LineEnding::Unix,
        )?;
        Ok(())
    }
}

/// Where a walk from the start first runs into the start of `local_path`.
/// Returns the number of walk nodes to prepend, if the walk and path agree
/// from that point.
fn overlap_start(walk_nodes: &[usize], local_path: &[usize]) -> Option<usize> {
    let mut n = 0;
    let mut m = 0;
    let mut overlap = false;
    for (j, &walk_node) in walk_nodes.iter().enumerate() {
        if walk_node == local_path[n] {
            if !overlap {
                m = j;
            }
            overlap = true;
            if n + 1 >= local_path.len() {
                break;
            }
            n += 1;
        } else if overlap {
            return None;
        }
    }
    overlap.then_some(m)
}

/// Where a walk back from the end first runs into the end of `local_path`.
/// Returns the index of the first walk node to append.
fn overlap_end(walk_nodes: &[usize], local_path: &[usize]) -> Option<usize> {
    let mut n = local_path.len();
    let mut m = 0;
    let mut overlap = false;
    for j in (1..=walk_nodes.len()).rev() {
        if walk_nodes[j - 1] == local_path[n - 1] {
            if !overlap {
                m = j;
            }
            overlap = true;
            if n == 1 {
                break;
            }
            n -= 1;
        } else if overlap {
            return None;
        }
    }
    overlap.then_some(m)
}
