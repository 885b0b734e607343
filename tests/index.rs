use prgsketch::errors::PrgError;
use prgsketch::index::{Index, MiniRecord};
use prgsketch::interval::Interval;
use prgsketch::minihit::MinimizerHit;

pub mod common;
use crate::common::*;

#[cfg(test)]
use pretty_assertions::assert_eq;

fn small_index() -> Index {
    let mut index = Index::new();
    index.add_record(7, 0, single_path(0, 3), 1, true);
    index.add_record(7, 1, single_path(4, 7), 3, false);
    index.add_record(2, 0, single_path(1, 4), 2, true);
    index
}

#[test]
fn add_records() {
    let mut index = small_index();
    assert_eq!(index.num_minimizers(), 2);
    assert_eq!(index.num_records(), 3);

    // exact duplicates are ignored
    index.add_record(7, 0, single_path(0, 3), 1, true);
    assert_eq!(index.num_records(), 3);
    // but the same path on the other strand is not a duplicate
    index.add_record(7, 0, single_path(0, 3), 1, false);
    assert_eq!(index.num_records(), 4);

    let records = index.get(2).unwrap();
    assert_eq!(
        records,
        &[MiniRecord {
            prg_id: 0,
            path: single_path(1, 4),
            knode_id: 2,
            strand: true,
        }]
    );
    assert!(index.get(3).is_none());

    index.clear();
    assert!(index.is_empty());
}

#[test]
fn merge_indexes() {
    let mut index = small_index();
    let mut other = Index::new();
    other.add_record(7, 0, single_path(0, 3), 1, true);
    other.add_record(9, 2, single_path(2, 5), 1, true);

    index.merge(other);
    assert_eq!(index.num_minimizers(), 3);
    assert_eq!(index.num_records(), 4);
    assert_eq!(index.get(9).unwrap()[0].prg_id, 2);
}

#[test]
fn save_and_load() {
    let sandbox = TestSetup::setup();
    let index = small_index();
    let filename = sandbox.output_string("small.idx");
    index.save(&filename).unwrap();
    assert!(sandbox.file_exists("small.idx"));

    let loaded = Index::load(&filename).unwrap();
    assert_eq!(loaded, index);
    assert_eq!(loaded.to_string(), "minimizers\t2\nrecords\t3\n");

    // a GFA is not an index
    assert!(matches!(
        Index::load(&sandbox.input_string("simple.gfa")),
        Err(PrgError::Serialisation(_))
    ));
    assert!(matches!(
        Index::load(&sandbox.output_string("missing.idx")),
        Err(PrgError::Io(_))
    ));
}

#[test]
fn hits_from_records() {
    let record = MiniRecord {
        prg_id: 3,
        path: single_path(4, 7),
        knode_id: 5,
        strand: false,
    };
    let same = MinimizerHit::new(0, Interval::new(10, 13), &record, false);
    assert!(same.strand);
    assert_eq!(same.prg_id, 3);
    assert_eq!(same.knode_id, 5);
    assert_eq!(same.prg_path, single_path(4, 7));

    let opposite = MinimizerHit::new(0, Interval::new(10, 13), &record, true);
    assert!(!opposite.strand);
}

#[test]
#[should_panic]
fn hit_length_mismatch() {
    let record = MiniRecord {
        prg_id: 0,
        path: single_path(0, 3),
        knode_id: 1,
        strand: true,
    };
    MinimizerHit::new(0, Interval::new(0, 5), &record, true);
}

#[test]
fn hit_order() {
    let record = |prg_id: u32, start: u32| MiniRecord {
        prg_id,
        path: single_path(start, start + 3),
        knode_id: 1,
        strand: true,
    };
    let fwd_late = MinimizerHit::new(0, Interval::new(8, 11), &record(0, 2), true);
    let fwd_early = MinimizerHit::new(0, Interval::new(2, 5), &record(0, 6), true);
    let rev = MinimizerHit::new(0, Interval::new(0, 3), &record(0, 0), false);
    let other_prg = MinimizerHit::new(0, Interval::new(0, 3), &record(1, 0), true);
    let other_read = MinimizerHit::new(1, Interval::new(0, 3), &record(0, 0), true);

    let mut hits = vec![
        other_read.clone(),
        rev.clone(),
        other_prg.clone(),
        fwd_late.clone(),
        fwd_early.clone(),
    ];
    hits.sort();
    // by read, then PRG, then forward before reverse, then read position
    assert_eq!(hits, vec![fwd_early, fwd_late, rev, other_prg, other_read]);
}
