use genome_browser::interval::sort_for_packing;
use genome_browser::{Interval, IntervalError, Strand, Value};

#[test]
fn test_interval_rejects_empty_and_inverted_ranges() {
    assert_eq!(
        Interval::new("chr1", 10, 10, Strand::Forward).unwrap_err(),
        IntervalError::InvalidLength { start: 10, end: 10 }
    );
    assert!(Interval::new("chr1", 20, 10, Strand::Forward).is_err());
    assert_eq!(Interval::new("chr1", 10, 11, Strand::Forward).unwrap().len(), 1);
}

#[test]
fn test_interval_parse_strand_symbols() {
    let forward = Interval::parse("chr1", 0, 5, "+").unwrap();
    let reverse = Interval::parse("chr1", 0, 5, "-").unwrap();
    let unknown = Interval::parse("chr1", 0, 5, ".").unwrap();
    assert_eq!(forward.strand(), Strand::Forward);
    assert_eq!(reverse.strand(), Strand::Reverse);
    assert_eq!(unknown.strand(), Strand::Unknown);

    assert_eq!(
        Interval::parse("chr1", 0, 5, "x").unwrap_err(),
        IntervalError::InvalidStrand("x".to_string())
    );
}

#[test]
fn test_interval_display_and_sam_interval() {
    let interval = Interval::new("chr7", 100, 250, Strand::Reverse).unwrap();
    assert_eq!(interval.to_string(), r#"Interval("chr7", 100, 250, "-")"#);
    assert_eq!(interval.sam_interval(), "chr7:100-250");
}

#[test]
fn test_interval_attribute_lookup() {
    let interval = Interval::new("chr1", 5, 9, Strand::Forward)
        .unwrap()
        .with_name("TP53")
        .with_metadata("color", "#E74C3C")
        .with_metadata("score", 12i64);

    assert_eq!(interval.get("name"), Some(Value::from("TP53")));
    assert_eq!(interval.get("start"), Some(Value::from(5u64)));
    assert_eq!(interval.get("strand"), Some(Value::from("+")));
    assert_eq!(interval.get("color"), Some(Value::from("#E74C3C")));
    assert_eq!(interval.get("score"), Some(Value::Integer(12)));
    assert_eq!(interval.get("missing"), None);
}

#[test]
fn test_interval_equality_ignores_annotations() {
    let plain = Interval::new("chr1", 5, 9, Strand::Forward).unwrap();
    let named = plain.clone().with_name("A").with_metadata("color", "red");
    assert_eq!(plain, named);
    assert_ne!(plain, Interval::new("chr1", 5, 9, Strand::Reverse).unwrap());
}

#[test]
fn test_interval_relations() {
    let a = Interval::new("chr1", 10, 20, Strand::Forward).unwrap();
    let b = Interval::new("chr1", 15, 25, Strand::Reverse).unwrap();
    let c = Interval::new("chr1", 20, 30, Strand::Unknown).unwrap();
    let other = Interval::new("chr2", 10, 20, Strand::Forward).unwrap();

    assert!(a.overlaps(&b));
    assert!(!a.overlaps(&c));
    assert!(!a.overlaps(&other));
    assert!(a.starts_before(&b));
    assert!(a.starts_at_or_before(&a));
    assert!(b.ends_after(&a));
    assert!(c.ends_at_or_after(&c));
    assert!(!a.starts_before(&other));
}

#[test]
fn test_sort_for_packing_order() {
    let mut intervals = vec![
        Interval::new("chr1", 30, 40, Strand::Unknown).unwrap(),
        Interval::new("chr1", 10, 15, Strand::Reverse).unwrap(),
        Interval::new("chr1", 10, 20, Strand::Unknown).unwrap(),
        Interval::new("chr1", 10, 20, Strand::Forward).unwrap(),
    ];
    sort_for_packing(&mut intervals);

    let order: Vec<_> = intervals
        .iter()
        .map(|i| (i.start(), i.end(), i.strand()))
        .collect();
    assert_eq!(
        order,
        vec![
            (10, 20, Strand::Forward),
            (10, 20, Strand::Unknown),
            (10, 15, Strand::Reverse),
            (30, 40, Strand::Unknown),
        ]
    );
}
