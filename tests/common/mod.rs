use std::path::{Path, PathBuf};

use assert_fs::{prelude::*, TempDir};
use predicates::prelude::*;

use prgsketch::interval::Interval;
use prgsketch::kmer_graph::KmerGraph;
use prgsketch::path::Path as PrgPath;

// Creates correct path for input/output files
static FILE_IN: &str = "tests/test_files_in";
static SYM_IN: &str = "input";

pub struct TestSetup {
    wd: TempDir,
}

impl TestSetup {
    pub fn setup() -> Self {
        let wd = assert_fs::TempDir::new().unwrap();
        wd.child(SYM_IN)
            .symlink_to_dir(
                Path::new(FILE_IN)
                    .canonicalize()
                    .expect("Could not link input files"),
            )
            .unwrap();
        Self { wd }
    }

    pub fn get_wd(&self) -> String {
        self.wd.path().display().to_string()
    }

    pub fn input_path(&self, name: &str) -> PathBuf {
        PathBuf::from(&format!("{}/{}/{}", self.wd.path().display(), SYM_IN, name))
    }

    pub fn input_string(&self, name: &str) -> String {
        self.input_path(name)
            .to_str()
            .expect("Could not unpack file path")
            .to_owned()
    }

    pub fn output_string(&self, name: &str) -> String {
        format!("{}/{}", self.get_wd(), name)
    }

    pub fn file_exists(&self, name_out: &str) -> bool {
        let predicate_fn = predicate::path::is_file();
        predicate_fn.eval(self.wd.child(name_out).path())
    }
}

pub fn single_path(start: u32, end: u32) -> PrgPath {
    PrgPath::from_interval(Interval::new(start, end))
}

/// source -> n1 -> n2 -> n4 -> sink, with n1 -> n3 -> n4 as a poorly
/// covered alternative
///
/// Ids are 0 (source), 1-4 (n1-n4) and 5 (sink). Error model is set with
/// 10 reads and e = 0.01.
pub fn diamond_graph() -> KmerGraph {
    let mut kmer_prg = KmerGraph::new();
    let source = kmer_prg.add_node(single_path(0, 0)).unwrap();
    let n1 = kmer_prg.add_node(single_path(0, 3)).unwrap();
    let n2 = kmer_prg.add_node(single_path(1, 4)).unwrap();
    let n3 = kmer_prg.add_node(single_path(2, 5)).unwrap();
    let n4 = kmer_prg.add_node(single_path(5, 8)).unwrap();
    let sink = kmer_prg.add_node(single_path(10, 10)).unwrap();

    kmer_prg.add_edge(source, n1).unwrap();
    kmer_prg.add_edge(n1, n2).unwrap();
    kmer_prg.add_edge(n1, n3).unwrap();
    kmer_prg.add_edge(n2, n4).unwrap();
    kmer_prg.add_edge(n3, n4).unwrap();
    kmer_prg.add_edge(n4, sink).unwrap();
    kmer_prg.sort_topologically();

    for node in [n1, n2, n4] {
        kmer_prg.set_covg(node, [5, 5]).unwrap();
    }
    kmer_prg.set_covg(n3, [0, 1]).unwrap();
    kmer_prg.set_num_reads(10);
    kmer_prg.set_p(0.01).unwrap();
    kmer_prg
}

/// Whether `to` can be reached from `from` following out-edges
pub fn reachable(kmer_prg: &KmerGraph, from: usize, to: usize) -> bool {
    let mut stack = vec![from];
    let mut seen = vec![false; kmer_prg.len()];
    while let Some(id) = stack.pop() {
        if id == to {
            return true;
        }
        if !seen[id] {
            seen[id] = true;
            stack.extend_from_slice(kmer_prg.node(id).out_nodes());
        }
    }
    false
}
