//! The variation graph of a single PRG.
//!
//! Nodes are stored in an arena indexed by their id. Ids are given in order of
//! occurrence in the PRG string, so positions increase with id, node 0 is the
//! source and the highest id is the sink. Edges are stored as ids and only go
//! from lower to higher ids.

use std::cmp::min;
use std::fmt;

use crate::errors::{PrgError, Result};
use crate::interval::Interval;
use crate::path::Path;

/// A segment of sequence in the variation graph.
#[derive(Debug, Clone)]
pub struct LocalNode {
    /// Sequence of the segment (may be empty)
    pub seq: String,
    /// Position of the segment in the PRG string
    pub pos: Interval,
    /// Node id, also its index in the graph
    pub id: usize,
    /// Ids of successor nodes
    pub out_nodes: Vec<usize>,
}

impl LocalNode {
    /// A node with no edges
    pub fn new(seq: String, pos: Interval, id: usize) -> Self {
        assert_eq!(
            seq.len() as u32,
            pos.length(),
            "Node sequence length does not match its interval"
        );
        Self {
            seq,
            pos,
            id,
            out_nodes: Vec::new(),
        }
    }
}

impl PartialEq for LocalNode {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq && self.pos == other.pos
    }
}

impl fmt::Display for LocalNode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {}", self.id, self.pos, self.seq)
    }
}

/// Directed acyclic graph of [`LocalNode`]s.
#[derive(Debug, Clone, Default)]
pub struct LocalGraph {
    nodes: Vec<LocalNode>,
}

impl LocalGraph {
    /// An empty graph
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes, in id order
    pub fn nodes(&self) -> &[LocalNode] {
        &self.nodes
    }

    /// Node with the given id
    ///
    /// # Panics
    /// If there is no such node.
    pub fn node(&self, id: usize) -> &LocalNode {
        &self.nodes[id]
    }

    /// Add a node. Ids must be added consecutively; re-adding an existing id
    /// is ignored.
    ///
    /// # Panics
    /// If the id skips ahead of the next free id, or the sequence does not
    /// fit the interval.
    pub fn add_node(&mut self, id: usize, seq: &str, pos: Interval) {
        if id < self.nodes.len() {
            return;
        }
        assert_eq!(id, self.nodes.len(), "Local graph node ids must be consecutive");
        self.nodes.push(LocalNode::new(seq.to_string(), pos, id));
    }

    /// Add an edge between existing nodes, ignoring duplicates.
    pub fn add_edge(&mut self, from: usize, to: usize) -> Result<()> {
        if from >= self.nodes.len() || to >= self.nodes.len() {
            return Err(PrgError::Invariant(format!(
                "Edge {from}->{to} refers to a missing node"
            )));
        }
        if from >= to {
            return Err(PrgError::Invariant(format!(
                "Edge {from}->{to} does not go forwards"
            )));
        }
        if !self.nodes[from].out_nodes.contains(&to) {
            self.nodes[from].out_nodes.push(to);
        }
        Ok(())
    }

    /// Ids of nodes with an edge into `id`
    pub fn in_nodes(&self, id: usize) -> Vec<usize> {
        self.nodes[..id]
            .iter()
            .filter(|n| n.out_nodes.contains(&id))
            .map(|n| n.id)
            .collect()
    }

    /// End coordinate of the sink node
    pub fn sink_end(&self) -> u32 {
        self.nodes.last().map_or(0, |n| n.pos.end)
    }

    /// All paths of sequence length `len` starting at `pos` in node `node_id`.
    ///
    /// Zero-length nodes passed through appear as zero-length intervals. Walks
    /// which run off the end of the graph before reaching `len` are dropped.
    pub fn walk(&self, node_id: usize, pos: u32, len: u32) -> Vec<Path> {
        let node = &self.nodes[node_id];
        if pos + len <= node.pos.end {
            return vec![Path::from_interval(Interval::new(pos, pos + len))];
        }

        let len_added = min(node.pos.end.saturating_sub(pos), len);
        let mut return_paths = Vec::new();
        for &next_id in &node.out_nodes {
            let next = &self.nodes[next_id];
            for tail in self.walk(next_id, next.pos.start, len - len_added) {
                let mut walk_path = Path::from_interval(Interval::new(pos, pos + len_added));
                for interval in tail.intervals() {
                    walk_path.add_end_interval(*interval);
                }
                return_paths.push(walk_path);
            }
        }
        return_paths
    }

    /// All paths of sequence length `len` ending at `pos` in node `node_id`.
    pub fn walk_back(&self, node_id: usize, pos: u32, len: u32) -> Vec<Path> {
        let node = &self.nodes[node_id];
        if node.pos.start + len <= pos {
            return vec![Path::from_interval(Interval::new(pos - len, pos))];
        }

        let len_added = min(pos.saturating_sub(node.pos.start), len);
        let mut return_paths = Vec::new();
        for prev_id in self.in_nodes(node_id).into_iter().rev() {
            let prev = &self.nodes[prev_id];
            for mut head in self.walk_back(prev_id, prev.pos.end, len - len_added) {
                head.add_end_interval(Interval::new(pos - len_added, pos));
                return_paths.push(head);
            }
        }
        return_paths
    }

    /// Follow the first out-edge from the source to the sink
    pub fn top_path(&self) -> Vec<usize> {
        self.follow_path(|outs| outs.first().copied())
    }

    /// Follow the last out-edge from the source to the sink
    pub fn bottom_path(&self) -> Vec<usize> {
        self.follow_path(|outs| outs.last().copied())
    }

    fn follow_path<F>(&self, choose: F) -> Vec<usize>
    where
        F: Fn(&[usize]) -> Option<usize>,
    {
        let mut node_path = Vec::new();
        let mut current = if self.nodes.is_empty() { None } else { Some(0) };
        while let Some(id) = current {
            node_path.push(id);
            current = choose(&self.nodes[id].out_nodes);
        }
        node_path
    }

    /// Ids of the nodes a path passes through, in order.
    ///
    /// A zero-length interval at the end of the path selects the node which
    /// starts at that coordinate, so a path ending on an edge is attributed to
    /// the node it is about to enter.
    pub fn nodes_along_path(&self, path: &Path) -> Vec<usize> {
        let mut node_ids = Vec::new();
        let last_idx = path.num_intervals().saturating_sub(1);
        for (idx, interval) in path.intervals().iter().enumerate() {
            for node in &self.nodes {
                if (interval.end > node.pos.start && interval.start < node.pos.end)
                    || (interval.start == node.pos.start && interval.end == node.pos.end)
                    || (interval.start == node.pos.start
                        && interval.is_empty()
                        && idx == last_idx
                        && node.id != 0)
                {
                    node_ids.push(node.id);
                } else if interval.end < node.pos.start {
                    // node positions increase with id
                    break;
                }
            }
        }
        node_ids
    }
}

impl PartialEq for LocalGraph {
    fn eq(&self, other: &Self) -> bool {
        self.nodes.len() == other.nodes.len()
            && self.nodes.iter().zip(other.nodes.iter()).all(|(a, b)| {
                a == b
                    && a.out_nodes.len() == b.out_nodes.len()
                    && a.out_nodes.iter().all(|out| b.out_nodes.contains(out))
            })
    }
}

impl fmt::Display for LocalGraph {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for node in &self.nodes {
            writeln!(f, "{node}")?;
        }
        for node in &self.nodes {
            for out in &node.out_nodes {
                writeln!(f, "{}->{}", node.id, out)?;
            }
        }
        Ok(())
    }
}
