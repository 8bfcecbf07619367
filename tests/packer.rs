use genome_browser::{disjoint_bins, disjoint_bins_with, Boundary, Interval, IntervalTrack, Strand};

fn no_collisions(levels: &[usize], spans: &[(u64, u64)]) -> bool {
    // No two spans on the same level may overlap, touching included.
    for (i, (a, la)) in spans.iter().zip(levels).enumerate() {
        for (b, lb) in spans.iter().zip(levels).skip(i + 1) {
            if la == lb && a.0 <= b.1 && b.0 <= a.1 {
                return false;
            }
        }
    }
    true
}

#[test]
fn test_disjoint_intervals_share_level_zero() {
    let input: Vec<(u64, u64)> = (0..10).map(|i| (i * 100, i * 100 + 50)).collect();
    let levels: Vec<_> = disjoint_bins(&input).collect();
    assert_eq!(levels, vec![0; 10]);
}

#[test]
fn test_nested_clique_needs_one_level_each() {
    let input: Vec<(u64, u64)> = (0..6).map(|i| (i, 100 - i)).collect();
    let levels: Vec<_> = disjoint_bins(&input).collect();
    assert_eq!(levels, vec![0, 1, 2, 3, 4, 5]);
}

#[test]
fn test_levels_never_collide() {
    let input: Vec<(u64, u64)> = vec![
        (0, 30),
        (5, 12),
        (10, 50),
        (12, 20),
        (31, 40),
        (35, 90),
        (45, 46),
        (60, 70),
        (70, 80),
    ];
    let levels: Vec<_> = disjoint_bins(&input).collect();
    assert_eq!(levels.len(), input.len());
    assert!(no_collisions(&levels, &input));
    // first-fit never skips a free level
    assert_eq!(levels[0], 0);
    assert_eq!(levels[4], 0);
}

#[test]
fn test_exclusive_boundary_lets_neighbours_touch() {
    let input: [(u64, u64); 3] = [(0, 10), (10, 20), (20, 30)];
    let inclusive: Vec<_> = disjoint_bins(input).collect();
    let exclusive: Vec<_> = disjoint_bins_with(input, Boundary::Exclusive).collect();
    assert_eq!(inclusive, vec![0, 1, 0]);
    assert_eq!(exclusive, vec![0, 0, 0]);
}

#[test]
fn test_packing_is_lazy() {
    let mut bins = disjoint_bins([(0u64, 10u64), (5, 15), (20, 30)]);
    assert_eq!(bins.next(), Some(0));
    assert_eq!(bins.level_count(), 1);
    assert_eq!(bins.next(), Some(1));
    assert_eq!(bins.level_count(), 2);
    assert_eq!(bins.next(), Some(0));
    assert_eq!(bins.next(), None);
}

#[test]
fn test_track_packs_sorted_intervals() {
    let mut track = IntervalTrack::new("genes");
    track.add_interval(Interval::new("chr1", 30, 40, Strand::Unknown).unwrap());
    track.add_interval(Interval::new("chr1", 15, 25, Strand::Reverse).unwrap());
    track.add_interval(Interval::new("chr1", 10, 20, Strand::Forward).unwrap());

    let sorted: Vec<_> = track.sorted().iter().map(|i| i.start()).collect();
    assert_eq!(sorted, vec![10, 15, 30]);
    assert_eq!(track.levels(), vec![0, 1, 0]);
}

#[test]
fn test_track_packs_genes_and_exons() {
    let gene = Interval::new("chr1", 100, 1000, Strand::Forward).unwrap();
    let exons: Vec<_> = [(100u64, 200u64), (400, 500), (900, 1000)]
        .iter()
        .map(|&(s, e)| Interval::new("chr1", s, e, Strand::Forward).unwrap())
        .collect();

    let levels: Vec<_> = disjoint_bins(std::iter::once(&gene).chain(&exons)).collect();
    assert_eq!(levels, vec![0, 1, 1, 1]);
}
