//! End-to-end k-nearest-neighbor map scenarios.
//!
//! Exercises the public API the way a caller would: point features in,
//! lines or hulls out, through both `knn_map` and `KnnMapProcess`.

use geo::{Area, Coord, Geometry, Intersects, Point};
use knnmap_algorithms::neighbor::{build_index, query, KdTree, LinearScan, NeighborSearch};
use knnmap_algorithms::pattern::{
    knn_map, KnnMapParams, KnnMapProcess, ProcessState, COUNT_FIELD, RANK_FIELD, TARGET_FIELD,
};
use knnmap_core::{AttributeValue, CancelFlag, Error, Feature, FeatureCollection};

/// The four-point layout: a tight triangle near the origin and one outlier.
fn four_points() -> FeatureCollection {
    vec![
        Feature::point(0.0, 0.0).with_id("a").with_property("name", "origin"),
        Feature::point(1.0, 0.0).with_id("b"),
        Feature::point(0.0, 1.0).with_id("c"),
        Feature::point(5.0, 5.0).with_id("d"),
    ]
    .into()
}

/// Deterministic pseudo-random scatter (LCG), large enough for the k-d tree path.
fn scatter(n: usize) -> FeatureCollection {
    let mut state: u64 = 0x2545_F491_4F6C_DD1D;
    let mut next = || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((state >> 33) % 10_000) as f64 / 100.0
    };
    (0..n)
        .map(|i| {
            let (x, y) = (next(), next());
            Feature::point(x, y).with_id(format!("s{}", i))
        })
        .collect()
}

fn coords(fc: &FeatureCollection) -> Vec<Coord<f64>> {
    fc.iter().map(|f| f.coord().unwrap()).collect()
}

fn target(f: &Feature) -> &str {
    f.get_property(TARGET_FIELD).and_then(|v| v.as_str()).unwrap()
}

// ---------------------------------------------------------------------------
// Neighbor lines
// ---------------------------------------------------------------------------

#[test]
fn origin_gets_tied_neighbors_in_input_order() {
    let out = knn_map(&four_points(), KnnMapParams::new(2)).unwrap();

    let from_a: Vec<&Feature> = out
        .iter()
        .filter(|f| f.get_property("name") == Some(&AttributeValue::from("origin")))
        .collect();
    assert_eq!(from_a.len(), 2);
    assert_eq!(target(from_a[0]), "b");
    assert_eq!(target(from_a[1]), "c");

    let Some(Geometry::LineString(line)) = &from_a[0].geometry else {
        panic!("expected a line geometry");
    };
    assert_eq!(line.0, vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 0.0 }]);
}

#[test]
fn k_larger_than_collection_is_clamped() {
    let fc = four_points();
    let out = knn_map(&fc, KnnMapParams::new(10)).unwrap();
    assert_eq!(out.len(), 4 * 3);

    for (src, group) in out.features.chunks(3).enumerate() {
        let mut targets: Vec<&str> = group.iter().map(target).collect();
        targets.sort_unstable();
        let mut expected: Vec<String> = fc
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != src)
            .map(|(i, f)| f.key(i))
            .collect();
        expected.sort_unstable();
        assert_eq!(targets, expected);
    }
}

#[test]
fn lines_per_source_are_min_k_n_minus_1() {
    let fc = scatter(200);
    for k in [1, 5, 12] {
        let out = knn_map(&fc, KnnMapParams::new(k)).unwrap();
        assert_eq!(out.len(), fc.len() * k);
        for group in out.features.chunks(k) {
            let ranks: Vec<i64> = group
                .iter()
                .map(|f| f.get_property(RANK_FIELD).and_then(|v| v.as_i64()).unwrap())
                .collect();
            assert_eq!(ranks, (1..=k as i64).collect::<Vec<_>>());
        }
    }
}

#[test]
fn source_attributes_are_carried_through() {
    let fc: FeatureCollection = vec![
        Feature::point(0.0, 0.0).with_property("species", "oak").with_property("dbh", 41.5),
        Feature::point(3.0, 4.0).with_property("species", "elm"),
    ]
    .into();

    let out = knn_map(&fc, KnnMapParams::new(1)).unwrap();
    assert_eq!(out.features[0].get_property("species"), Some(&AttributeValue::from("oak")));
    assert_eq!(out.features[0].get_property("dbh"), Some(&AttributeValue::Float(41.5)));
    assert_eq!(out.features[1].get_property("species"), Some(&AttributeValue::from("elm")));
    assert_eq!(out.features[0].id.as_deref(), Some("0.1"));
}

// ---------------------------------------------------------------------------
// Cluster hulls
// ---------------------------------------------------------------------------

#[test]
fn hulls_contain_source_and_neighbors() {
    let fc = scatter(150);
    let pts = coords(&fc);
    let index = build_index(&pts).unwrap();
    let k = 6;

    let out = knn_map(&fc, KnnMapParams::new(k).with_convex_hull(true)).unwrap();
    assert_eq!(out.len(), fc.len());

    for (src, hull) in out.iter().enumerate() {
        assert_eq!(hull.get_property(COUNT_FIELD), Some(&AttributeValue::Int(k as i64)));
        let Some(Geometry::Polygon(poly)) = &hull.geometry else {
            panic!("expected a polygon for source {}", src);
        };
        assert!(poly.unsigned_area() > 0.0);
        assert!(poly.intersects(&Point(pts[src])));
        for nb in query(&index, src, k).unwrap() {
            assert!(poly.intersects(&Point(pts[nb.index])));
        }
    }
}

#[test]
fn collinear_clusters_degrade_to_lines() {
    let fc: FeatureCollection = (0..5).map(|i| Feature::point(i as f64, 2.0 * i as f64)).collect();
    let out = knn_map(&fc, KnnMapParams::new(2).with_convex_hull(true)).unwrap();
    assert_eq!(out.len(), 5);
    assert!(out
        .iter()
        .all(|f| matches!(f.geometry, Some(Geometry::LineString(_)))));
}

#[test]
fn single_point_yields_point_hull_and_no_lines() {
    let fc: FeatureCollection = vec![Feature::point(7.0, 7.0).with_id("only")].into();

    let lines = knn_map(&fc, KnnMapParams::new(3)).unwrap();
    assert!(lines.is_empty());

    let hulls = knn_map(&fc, KnnMapParams::new(3).with_convex_hull(true)).unwrap();
    assert_eq!(hulls.len(), 1);
    assert_eq!(hulls.features[0].geometry, Some(Geometry::Point(Point::new(7.0, 7.0))));
    assert_eq!(hulls.features[0].get_property(COUNT_FIELD), Some(&AttributeValue::Int(0)));
}

// ---------------------------------------------------------------------------
// Index equivalence
// ---------------------------------------------------------------------------

#[test]
fn kdtree_matches_linear_scan_on_scatter() {
    let fc = scatter(500);
    let pts = coords(&fc);
    let tree = KdTree::build(&pts);
    let linear = LinearScan::build(&pts).unwrap();
    assert_eq!(NeighborSearch::len(&tree), linear.len());

    for source in 0..pts.len() {
        assert_eq!(tree.neighbors_of(source, 8), linear.neighbors_of(source, 8));
    }
}

// ---------------------------------------------------------------------------
// Validation and lifecycle
// ---------------------------------------------------------------------------

#[test]
fn empty_input_or_zero_k_is_invalid() {
    assert!(matches!(
        knn_map(&FeatureCollection::new(), KnnMapParams::new(2)),
        Err(Error::InvalidArgument { .. })
    ));
    assert!(matches!(
        knn_map(&four_points(), KnnMapParams::new(0)),
        Err(Error::InvalidArgument { name: "k", .. })
    ));

    let mut runner = KnnMapProcess::new();
    let err = runner.execute(&four_points(), KnnMapParams::new(0), None).unwrap_err();
    assert!(matches!(err.root(), Error::InvalidArgument { .. }));
}

#[test]
fn duplicate_ids_are_invalid() {
    let mut fc = four_points();
    fc.push(Feature::point(9.0, 9.0).with_id("a"));
    assert!(matches!(
        knn_map(&fc, KnnMapParams::new(1)),
        Err(Error::InvalidArgument { .. })
    ));
}

#[test]
fn explicit_id_matching_unnamed_position_is_invalid() {
    let fc: FeatureCollection = vec![
        Feature::point(0.0, 0.0),
        Feature::point(1.0, 0.0).with_id("0"),
    ]
    .into();
    assert!(matches!(
        knn_map(&fc, KnnMapParams::new(1)),
        Err(Error::InvalidArgument { .. })
    ));
}

#[test]
fn output_ids_are_unique_with_mixed_ids() {
    let fc: FeatureCollection = vec![
        Feature::point(0.0, 0.0),
        Feature::point(1.0, 0.0).with_id("a"),
        Feature::point(3.0, 0.0),
        Feature::point(0.0, 2.0).with_id("2.1"),
    ]
    .into();
    let out = knn_map(&fc, KnnMapParams::new(3)).unwrap();
    let mut ids: Vec<&str> = out.iter().map(|f| f.id.as_deref().unwrap()).collect();
    let total = ids.len();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), total);
}

#[test]
fn huge_coordinates_are_rejected() {
    let fc: FeatureCollection = vec![
        Feature::point(0.0, 0.0),
        Feature::point(2e200, 0.0),
        Feature::point(1e200, 0.0),
    ]
    .into();
    assert!(matches!(
        knn_map(&fc, KnnMapParams::new(1)),
        Err(Error::InvalidArgument { .. })
    ));
}

#[test]
fn rerun_without_reset_is_invalid_state() {
    let mut runner = KnnMapProcess::new();
    assert!(runner.execute(&four_points(), KnnMapParams::new(2), None).unwrap().is_some());
    assert_eq!(runner.state(), ProcessState::Completed);

    let err = runner.execute(&four_points(), KnnMapParams::new(2), None).unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));
    assert_eq!(runner.state(), ProcessState::Completed);
}

#[test]
fn failed_process_also_needs_reset() {
    let mut runner = KnnMapProcess::new();
    assert!(runner.execute(&FeatureCollection::new(), KnnMapParams::new(2), None).is_err());
    assert_eq!(runner.state(), ProcessState::Failed);
    assert!(matches!(
        runner.execute(&four_points(), KnnMapParams::new(2), None),
        Err(Error::InvalidState(_))
    ));

    runner.reset();
    assert!(runner.execute(&four_points(), KnnMapParams::new(2), None).is_ok());
}

#[test]
fn canceled_process_returns_nothing() {
    let flag = CancelFlag::new();
    let mut listener = flag.clone();
    flag.cancel();

    let mut runner = KnnMapProcess::new();
    let out = runner
        .execute(&scatter(50), KnnMapParams::new(3), Some(&mut listener))
        .unwrap();
    assert!(out.is_none());
}
