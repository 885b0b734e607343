//! Enumeration of all source to sink paths supported by read coverage.
//!
//! Runs of single-successor nodes (contigs) are followed in one step, and
//! dropped when long but poorly supported by reads spanning them. At branch
//! points every successor is tried, allowing a limited number of nodes below
//! the coverage threshold on each path.

use crate::errors::Result;
use crate::kmer_graph::KmerGraph;

/// Default cap on both the search frontier and the number of paths returned
pub const DEFAULT_MAX_PATHS: usize = 50000;
/// Default per-base error rate used for the max-path search
pub const DEFAULT_ERROR_RATE: f64 = 0.11;

/// Options for [`KmerGraph::find_compatible_paths()`].
#[derive(Debug, Clone)]
pub struct CompatiblePathOpts {
    /// Coverage (both strands) a node needs to count as supported
    pub min_covg: u32,
    /// Reads which must share a contig, per node of the contig
    pub min_read_share: u32,
    /// Unsupported nodes allowed on a path
    pub max_misses: u32,
    /// Stop when this many partial paths are waiting
    pub max_frontier: usize,
    /// Stop when this many complete paths are found
    pub max_paths: usize,
    /// Error rate for the initial max-path search
    pub error_rate: f64,
}

impl Default for CompatiblePathOpts {
    fn default() -> Self {
        Self {
            min_covg: 2,
            min_read_share: 1,
            max_misses: 1,
            max_frontier: DEFAULT_MAX_PATHS,
            max_paths: DEFAULT_MAX_PATHS,
            error_rate: DEFAULT_ERROR_RATE,
        }
    }
}

/// Paths found by [`KmerGraph::find_all_compatible_paths()`], and which
/// reads support them.
#[derive(Debug, Clone, Default)]
pub struct CompatiblePaths {
    /// Node ids of each path, from source to sink inclusive
    pub paths: Vec<Vec<usize>>,
    /// For each read, the paths it supports and its hits on each
    pub read_path_hits: Vec<Vec<(usize, u32)>>,
    /// Coverage threshold used during the search, which may be lower than
    /// requested
    pub min_covg_used: u32,
}

impl KmerGraph {
    fn read_node_covg(&self, read_id: usize, node_id: usize) -> u32 {
        let strands = &self.read_covgs[read_id];
        strands[0]
            .get(node_id)
            .copied()
            .unwrap_or(0)
            .saturating_add(strands[1].get(node_id).copied().unwrap_or(0))
    }

    /// Follow single out-edges from `node_id`. Unless `keep` is set, the
    /// contig is rejected (`None`) if it has more than three nodes and fewer
    /// than `min_read_share` reads per node hit at least two of them.
    fn get_contig_fwd(
        &self,
        node_id: usize,
        min_read_share: u32,
        keep: bool,
    ) -> Option<Vec<usize>> {
        let mut contig = vec![node_id];
        let mut current = node_id;
        while let [next] = self.nodes[current].out_nodes[..] {
            contig.push(next);
            current = next;
        }

        let shared_reads = (0..self.read_covgs.len())
            .filter(|&read_id| {
                contig
                    .iter()
                    .filter(|&&id| self.read_node_covg(read_id, id) > 0)
                    .count()
                    > 1
            })
            .count();
        if !keep && contig.len() > 3 && shared_reads < min_read_share as usize * contig.len() {
            None
        } else {
            Some(contig)
        }
    }

    /// Coverage threshold for the search, and the max-likelihood path. The
    /// threshold is the requested one, lowered to the smallest coverage on
    /// the max-likelihood path.
    fn compatible_min_covg(&mut self, opts: &CompatiblePathOpts) -> Result<(u32, Vec<usize>)> {
        self.num_reads = self.read_covgs.len() as u32;
        self.set_p(opts.error_rate)?;
        let (_, max_path) = self.find_max_path()?;
        let lowest = max_path
            .iter()
            .map(|&id| self.nodes[id].total_covg())
            .fold(opts.min_covg, u32::min);
        if lowest < opts.min_covg {
            log::info!(
                "Lowered minimum coverage from {} to {} to keep the max-likelihood path",
                opts.min_covg,
                lowest
            );
        }
        Ok((lowest, max_path))
    }

    /// All source to sink paths compatible with the coverage, and the
    /// coverage threshold actually used.
    ///
    /// Paths include the source and sink. The per-read coverage table sets
    /// the read count.
    pub fn find_compatible_paths(
        &mut self,
        opts: &CompatiblePathOpts,
    ) -> Result<(Vec<Vec<usize>>, u32)> {
        let (min_covg, max_path) = self.compatible_min_covg(opts)?;
        let (source, sink) = (
            self.sorted_nodes[0],
            self.sorted_nodes[self.sorted_nodes.len() - 1],
        );

        // contigs on the max-likelihood path are never rejected
        let mut on_max_path = vec![false; self.nodes.len()];
        on_max_path[source] = true;
        for &id in &max_path {
            on_max_path[id] = true;
        }
        let mut contigs: Vec<Option<Vec<usize>>> = vec![None; self.nodes.len()];
        for &id in &self.sorted_nodes {
            if self.nodes[id].out_nodes.len() == 1 {
                contigs[id] = self.get_contig_fwd(id, opts.min_read_share, on_max_path[id]);
            }
        }

        let misses = |path: &[usize]| {
            path.iter()
                .filter(|&&id| id != source && id != sink && self.nodes[id].total_covg() < min_covg)
                .count() as u32
        };

        let mut frontier: Vec<Vec<usize>> = vec![vec![source]];
        let mut paths = Vec::new();
        while frontier.len() < opts.max_frontier && paths.len() < opts.max_paths {
            let Some(mut current) = frontier.pop() else {
                break;
            };
            let tip = current[current.len() - 1];
            let outs = &self.nodes[tip].out_nodes;
            if tip == sink {
                paths.push(current);
            } else if outs.len() == 1 {
                if let Some(contig) = &contigs[tip] {
                    current.extend_from_slice(&contig[1..]);
                    frontier.push(current);
                }
            } else {
                for &next in outs {
                    let mut candidate = current.clone();
                    candidate.push(next);
                    if misses(&candidate) <= opts.max_misses {
                        frontier.push(candidate);
                    }
                }
            }
        }

        if frontier.len() >= opts.max_frontier {
            log::warn!(
                "Stopped compatible path search with {} partial paths waiting",
                frontier.len()
            );
        }
        if paths.len() >= opts.max_paths {
            log::warn!("Stopped compatible path search at {} paths", paths.len());
        }
        Ok((paths, min_covg))
    }

    /// Compatible paths, with the reads which hit each path at least
    /// `opts.min_covg` times.
    pub fn find_all_compatible_paths(&mut self, opts: &CompatiblePathOpts) -> Result<CompatiblePaths> {
        let (paths, min_covg_used) = self.find_compatible_paths(opts)?;
        log::info!("Found {} compatible paths", paths.len());

        let read_path_hits = (0..self.read_covgs.len())
            .map(|read_id| {
                paths
                    .iter()
                    .enumerate()
                    .filter_map(|(path_idx, path)| {
                        let hits = path
                            .iter()
                            .map(|&id| self.read_node_covg(read_id, id))
                            .fold(0u32, u32::saturating_add);
                        (hits >= opts.min_covg).then_some((path_idx, hits))
                    })
                    .collect()
            })
            .collect();

        Ok(CompatiblePaths {
            paths,
            read_path_hits,
            min_covg_used,
        })
    }
}
