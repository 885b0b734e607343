use snapbox::cmd::{cargo_bin, Command};

use prgsketch::kmer_graph::KmerGraph;
use prgsketch::local_prg::LocalPrg;

pub mod common;
use crate::common::TestSetup;

#[cfg(test)]
use pretty_assertions::assert_eq;

fn index_test_prgs(sandbox: &TestSetup) {
    Command::new(cargo_bin("prgsketch"))
        .current_dir(sandbox.get_wd())
        .arg("index")
        .arg(sandbox.input_string("test.prg.fa"))
        .arg("-o")
        .arg("out")
        .arg("-w")
        .arg("1")
        .arg("-k")
        .arg("3")
        .assert()
        .success();
}

/// Give the `CCC` route of the two allele PRG coverage, and save the graph
fn cover_two_allele(sandbox: &TestSetup) -> String {
    let local_prg = LocalPrg::new(0, "two_allele", "AAA 5 CCC 6 GGG 5 6 TTT").unwrap();
    let mut kmer_prg = KmerGraph::load(&sandbox.output_string("out.kg/two_allele.gfa")).unwrap();
    for node_id in 0..kmer_prg.len() {
        let local_nodes = local_prg.nodes_along_path(kmer_prg.node(node_id).path());
        if local_nodes.contains(&1) || local_nodes == [0] || local_nodes == [4] {
            kmer_prg.set_covg(node_id, [5, 5]).unwrap();
        }
    }
    let covered = sandbox.output_string("covered.gfa");
    kmer_prg.save(&covered).unwrap();
    covered
}

#[test]
fn index_and_count() {
    let sandbox = TestSetup::setup();
    index_test_prgs(&sandbox);

    assert_eq!(true, sandbox.file_exists("out.idx"));
    for name in ["two_allele", "nested", "tiny"] {
        assert_eq!(true, sandbox.file_exists(&format!("out.kg/{name}.gfa")));
    }

    let nk = Command::new(cargo_bin("prgsketch"))
        .current_dir(sandbox.get_wd())
        .arg("nk")
        .arg("out.idx")
        .output()
        .unwrap();
    assert!(nk.status.success());
    let nk_out = String::from_utf8(nk.stdout).unwrap();
    assert!(nk_out.starts_with("minimizers\t"));
    assert!(nk_out.contains("\nrecords\t"));
}

#[test]
fn index_single_prg() {
    let sandbox = TestSetup::setup();
    std::fs::write(
        sandbox.output_string("single.fa"),
        ">two_allele\nAAA 5 CCC 6 GGG 5 6 TTT\n",
    )
    .unwrap();

    Command::new(cargo_bin("prgsketch"))
        .current_dir(sandbox.get_wd())
        .arg("index")
        .arg("single.fa")
        .arg("-o")
        .arg("single")
        .arg("-w")
        .arg("1")
        .arg("-k")
        .arg("3")
        .arg("--threads")
        .arg("1")
        .assert()
        .success();

    // each k-mer shares its minimizer with its reverse complement
    Command::new(cargo_bin("prgsketch"))
        .current_dir(sandbox.get_wd())
        .arg("nk")
        .arg("single.idx")
        .assert()
        .success()
        .stdout_eq("minimizers\t7\nrecords\t14\n");
}

#[test]
fn walk_covered_graph() {
    let sandbox = TestSetup::setup();
    index_test_prgs(&sandbox);
    let covered = cover_two_allele(&sandbox);

    Command::new(cargo_bin("prgsketch"))
        .current_dir(sandbox.get_wd())
        .arg("walk")
        .arg(sandbox.input_string("test.prg.fa"))
        .arg(&covered)
        .arg("-n")
        .arg("10")
        .arg("--prg-id")
        .arg("0")
        .arg("-e")
        .arg("0.01")
        .arg("-o")
        .arg("best.fa")
        .assert()
        .success();

    let best = std::fs::read_to_string(sandbox.output_string("best.fa")).unwrap();
    assert!(best.starts_with(">two_allele\t"));
    assert!(best.ends_with("\nAAACCCTTT\n"));

    let min_walk = Command::new(cargo_bin("prgsketch"))
        .current_dir(sandbox.get_wd())
        .arg("walk")
        .arg(sandbox.input_string("test.prg.fa"))
        .arg(&covered)
        .arg("-n")
        .arg("10")
        .arg("-e")
        .arg("0.01")
        .arg("--mode")
        .arg("min")
        .output()
        .unwrap();
    assert!(min_walk.status.success());
    assert!(String::from_utf8(min_walk.stdout)
        .unwrap()
        .ends_with("\nAAACCCTTT\n"));

    let two_walks = Command::new(cargo_bin("prgsketch"))
        .current_dir(sandbox.get_wd())
        .arg("walk")
        .arg(sandbox.input_string("test.prg.fa"))
        .arg(&covered)
        .arg("-n")
        .arg("10")
        .arg("-e")
        .arg("0.01")
        .arg("--num-paths")
        .arg("2")
        .output()
        .unwrap();
    assert!(two_walks.status.success());
    let records = String::from_utf8(two_walks.stdout).unwrap();
    assert_eq!(records.matches('>').count(), 2);
}

#[test]
fn random_walks() {
    let sandbox = TestSetup::setup();
    index_test_prgs(&sandbox);

    let sample = || {
        Command::new(cargo_bin("prgsketch"))
            .current_dir(sandbox.get_wd())
            .arg("random")
            .arg("out.kg/two_allele.gfa")
            .arg("-n")
            .arg("5")
            .arg("--seed")
            .arg("7")
            .output()
            .unwrap()
    };
    let first = sample();
    assert!(first.status.success());
    let paths = String::from_utf8(first.stdout.clone()).unwrap();
    assert_eq!(paths.lines().count(), 5);
    for line in paths.lines() {
        // every route has at least three k-mers
        assert!(line.split(' ').count() >= 3);
    }
    assert_eq!(sample().stdout, first.stdout);
}

#[test]
fn bad_input() {
    let sandbox = TestSetup::setup();

    Command::new(cargo_bin("prgsketch"))
        .current_dir(sandbox.get_wd())
        .arg("index")
        .arg(sandbox.input_string("malformed.prg.fa"))
        .arg("-o")
        .arg("broken")
        .arg("-k")
        .arg("3")
        .assert()
        .failure();
    assert_eq!(false, sandbox.file_exists("broken.idx"));

    Command::new(cargo_bin("prgsketch"))
        .current_dir(sandbox.get_wd())
        .arg("index")
        .arg(sandbox.input_string("test.prg.fa"))
        .arg("-o")
        .arg("out")
        .arg("-k")
        .arg("33")
        .assert()
        .failure();

    index_test_prgs(&sandbox);
    Command::new(cargo_bin("prgsketch"))
        .current_dir(sandbox.get_wd())
        .arg("walk")
        .arg(sandbox.input_string("test.prg.fa"))
        .arg("out.kg/two_allele.gfa")
        .arg("-n")
        .arg("10")
        .arg("--prg-id")
        .arg("9")
        .assert()
        .failure();

    // a k-mer graph is not an index
    Command::new(cargo_bin("prgsketch"))
        .current_dir(sandbox.get_wd())
        .arg("nk")
        .arg("out.kg/two_allele.gfa")
        .assert()
        .failure();
}
