//! Spatial index and k-nearest-neighbor queries
//!
//! [`build_index`] validates the input coordinates and builds a static
//! index; [`query`] returns the k nearest *other* points of an indexed
//! point, sorted by ascending distance with ties broken by input order.
//!
//! Two implementations share the [`NeighborSearch`] trait and produce
//! identical results:
//! - [`KdTree`]: O(log n) average query
//! - [`LinearScan`]: exhaustive O(n) scan, used for small inputs

pub mod kdtree;
mod linear;

pub use kdtree::{KdTree, NearestResult};
pub use linear::LinearScan;

use geo::Coord;
use knnmap_core::{Error, Result};

/// Inputs up to this size are searched with [`LinearScan`].
pub const LINEAR_SCAN_THRESHOLD: usize = 32;

/// Largest accepted coordinate magnitude. Squared distances between any two
/// accepted points stay finite in `f64`.
pub const MAX_COORDINATE: f64 = 1e150;

/// A neighbor of a source point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Input index of the neighbor
    pub index: usize,
    /// Euclidean distance to the source point
    pub distance: f64,
}

/// Read-only neighbor lookup over a fixed point set.
pub trait NeighborSearch: Sync {
    /// Number of indexed points
    fn len(&self) -> usize;

    /// Whether no points are indexed
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Coordinate of the point at input index `index`
    fn point(&self, index: usize) -> Coord<f64>;

    /// Up to `k` nearest points to `source`, excluding `source` itself,
    /// ordered by ascending distance then input index.
    fn neighbors_of(&self, source: usize, k: usize) -> Vec<Neighbor>;
}

/// Index chosen by [`build_index`] according to input size.
#[derive(Debug, Clone)]
pub enum SpatialIndex {
    KdTree(KdTree),
    Linear(LinearScan),
}

impl NeighborSearch for SpatialIndex {
    fn len(&self) -> usize {
        match self {
            SpatialIndex::KdTree(t) => NeighborSearch::len(t),
            SpatialIndex::Linear(l) => l.len(),
        }
    }

    fn point(&self, index: usize) -> Coord<f64> {
        match self {
            SpatialIndex::KdTree(t) => t.point(index),
            SpatialIndex::Linear(l) => l.point(index),
        }
    }

    fn neighbors_of(&self, source: usize, k: usize) -> Vec<Neighbor> {
        match self {
            SpatialIndex::KdTree(t) => t.neighbors_of(source, k),
            SpatialIndex::Linear(l) => l.neighbors_of(source, k),
        }
    }
}

/// Fail unless `points` is non-empty and every coordinate is finite and
/// within [`MAX_COORDINATE`].
pub(crate) fn validate_points(points: &[Coord<f64>]) -> Result<()> {
    if points.is_empty() {
        return Err(Error::invalid_argument(
            "inputFeatures",
            0,
            "at least one point is required",
        ));
    }
    if let Some((i, p)) = points
        .iter()
        .enumerate()
        .find(|(_, p)| !in_range(p.x) || !in_range(p.y))
    {
        return Err(Error::invalid_argument(
            "inputFeatures",
            format!("#{} ({}, {})", i, p.x, p.y),
            format!("coordinates must be finite with magnitude <= {:e}", MAX_COORDINATE),
        ));
    }
    Ok(())
}

#[inline]
fn in_range(v: f64) -> bool {
    v.is_finite() && v.abs() <= MAX_COORDINATE
}

/// Build a static spatial index over `points`.
///
/// # Errors
/// `InvalidArgument` if `points` is empty or holds a non-finite or
/// out-of-range coordinate.
pub fn build_index(points: &[Coord<f64>]) -> Result<SpatialIndex> {
    validate_points(points)?;

    if points.len() <= LINEAR_SCAN_THRESHOLD {
        Ok(SpatialIndex::Linear(LinearScan::build(points)?))
    } else {
        Ok(SpatialIndex::KdTree(KdTree::build(points)))
    }
}

/// The `k` nearest other points of indexed point `source`.
///
/// When the index holds `n <= k` points, all `n - 1` others are returned.
///
/// # Errors
/// `InvalidArgument` if `k == 0` or `source` is out of range.
pub fn query<S: NeighborSearch + ?Sized>(index: &S, source: usize, k: usize) -> Result<Vec<Neighbor>> {
    if k == 0 {
        return Err(Error::invalid_argument("k", k, "must be >= 1"));
    }
    if source >= index.len() {
        return Err(Error::invalid_argument(
            "source",
            source,
            format!("index holds {} points", index.len()),
        ));
    }
    Ok(index.neighbors_of(source, k))
}
