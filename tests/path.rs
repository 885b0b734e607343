use prgsketch::errors::PrgError;
use prgsketch::interval::Interval;
use prgsketch::path::Path;

#[cfg(test)]
use pretty_assertions::assert_eq;

fn gapped_path() -> Path {
    Path::from_intervals(vec![
        Interval::new(0, 3),
        Interval::new(5, 5),
        Interval::new(7, 10),
    ])
}

#[test]
fn interval_basics() {
    let interval = Interval::new(3, 7);
    assert_eq!(interval.length(), 4);
    assert!(!interval.is_empty());
    assert!(Interval::new(4, 4).is_empty());
    assert_eq!(interval.to_string(), "[3, 7)");
    assert_eq!("[3, 7)".parse::<Interval>().unwrap(), interval);

    assert!(Interval::new(0, 5) < Interval::new(1, 2));
    assert!(Interval::new(1, 1) < Interval::new(1, 2));

    assert!(matches!("[7, 3)".parse::<Interval>(), Err(PrgError::Parse(_))));
    assert!(matches!("3, 7".parse::<Interval>(), Err(PrgError::Parse(_))));
}

#[test]
#[should_panic]
fn interval_backwards() {
    Interval::new(5, 2);
}

#[test]
fn path_lengths() {
    let path = gapped_path();
    assert_eq!(path.length(), 6);
    assert_eq!(path.num_intervals(), 3);
    assert_eq!(path.start(), 0);
    assert_eq!(path.end(), 10);
    assert!(Path::new().is_empty());
    assert_eq!(Path::new().length(), 0);
}

#[test]
fn path_order() {
    let source = Path::from_interval(Interval::new(0, 0));
    let kmer = Path::from_interval(Interval::new(0, 3));
    let longer = Path::from_intervals(vec![Interval::new(0, 3), Interval::new(5, 6)]);
    let later = Path::from_interval(Interval::new(1, 2));

    // a strict prefix sorts first
    assert!(source < kmer);
    assert!(kmer < longer);
    assert!(longer < later);
    assert!(source < later);

    let mut paths = vec![later.clone(), longer.clone(), source.clone(), kmer.clone()];
    paths.sort();
    assert_eq!(paths, vec![source, kmer, longer, later]);
}

#[test]
fn subpaths() {
    let path = gapped_path();
    assert_eq!(
        path.subpath(2, 3),
        Path::from_intervals(vec![
            Interval::new(2, 3),
            Interval::new(5, 5),
            Interval::new(7, 9)
        ])
    );
    // zero-length intervals before the start are dropped
    assert_eq!(
        path.subpath(3, 2),
        Path::from_interval(Interval::new(7, 9))
    );
    assert_eq!(path.subpath(0, 6), path);

    assert!(path.subpath(2, 3).is_subpath(&path));
    assert!(Path::from_interval(Interval::new(0, 2)).is_subpath(&path));
    assert!(!Path::from_interval(Interval::new(1, 4)).is_subpath(&path));
    assert!(!path.is_subpath(&path.subpath(0, 4)));
}

#[test]
#[should_panic]
fn subpath_too_long() {
    gapped_path().subpath(4, 3);
}

#[test]
fn path_text() {
    let path = gapped_path();
    assert_eq!(path.to_string(), "3{[0, 3)[5, 5)[7, 10)}");
    assert_eq!(path.to_string().parse::<Path>().unwrap(), path);
    assert_eq!("0{}".parse::<Path>().unwrap(), Path::new());

    assert!(matches!("2{[0, 3)}".parse::<Path>(), Err(PrgError::Parse(_))));
    assert!(matches!(
        "2{[4, 5)[0, 3)}".parse::<Path>(),
        Err(PrgError::Parse(_))
    ));
    assert!(matches!("[0, 3)".parse::<Path>(), Err(PrgError::Parse(_))));
}

#[test]
fn add_intervals() {
    let mut path = Path::from_interval(Interval::new(4, 6));
    path.add_end_interval(Interval::new(8, 8));
    path.add_end_interval(Interval::new(9, 11));
    path.add_start_interval(Interval::new(1, 2));
    assert_eq!(path.to_string(), "4{[1, 2)[4, 6)[8, 8)[9, 11)}");
    assert_eq!(path.length(), 5);
}
