//! 2D k-d tree for spatial indexing
//!
//! Provides O(log n) nearest-neighbor and k-nearest-neighbor queries
//! over the input points. Results with equal distance are ordered by
//! input index, so the tree returns exactly what an exhaustive scan would.
//!
//! Reference:
//! Bentley, J.L. (1975). Multidimensional binary search trees used
//! for associative searching. CACM, 18(9).

use geo::Coord;
use std::cmp::Ordering;

use super::{Neighbor, NeighborSearch};

/// A 2D k-d tree over a static set of points.
#[derive(Debug, Clone)]
pub struct KdTree {
    nodes: Vec<KdNode>,
    /// Points in input order; node `point_idx` values index into this
    points: Vec<Coord<f64>>,
}

#[derive(Debug, Clone)]
struct KdNode {
    /// Index into `points`
    point_idx: usize,
    /// Split dimension: 0 = x, 1 = y
    split_dim: u8,
    /// Left child index (None = leaf)
    left: Option<usize>,
    /// Right child index (None = leaf)
    right: Option<usize>,
}

/// Result of a nearest-neighbor query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestResult {
    pub point: Coord<f64>,
    pub distance_sq: f64,
    pub index: usize,
}

/// Candidate ordering: distance first, then input index.
#[inline]
pub(crate) fn candidate_cmp(a: (f64, usize), b: (f64, usize)) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
}

#[inline]
fn dist_sq(a: Coord<f64>, qx: f64, qy: f64) -> f64 {
    let dx = qx - a.x;
    let dy = qy - a.y;
    dx * dx + dy * dy
}

impl KdTree {
    /// Build a k-d tree from points.
    ///
    /// Construction is O(n log n) using median-of-coordinate splitting.
    /// Coordinates are assumed finite; see [`super::build_index`] for the
    /// validating entry point.
    pub fn build(points: &[Coord<f64>]) -> Self {
        if points.is_empty() {
            return Self {
                nodes: Vec::new(),
                points: Vec::new(),
            };
        }

        let mut indices: Vec<usize> = (0..points.len()).collect();
        let mut nodes = Vec::with_capacity(points.len());

        build_recursive(points, &mut indices, 0, &mut nodes);

        Self {
            nodes,
            points: points.to_vec(),
        }
    }

    /// Number of points in the tree.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Find the k nearest points to (qx, qy), skipping the point at input
    /// index `exclude`.
    ///
    /// Returns up to k results sorted by ascending distance, then index.
    /// Complexity: O(k log n) average case.
    pub fn k_nearest_excluding(
        &self,
        qx: f64,
        qy: f64,
        k: usize,
        exclude: Option<usize>,
    ) -> Vec<NearestResult> {
        if self.nodes.is_empty() || k == 0 {
            return Vec::new();
        }

        // Bounded candidate list kept sorted ascending; the worst is last
        let mut best: Vec<(f64, usize)> = Vec::with_capacity(k + 1);

        self.knn_recursive(0, qx, qy, k, exclude, &mut best);

        best.iter()
            .map(|&(distance_sq, idx)| NearestResult {
                point: self.points[idx],
                distance_sq,
                index: idx,
            })
            .collect()
    }

    fn knn_recursive(
        &self,
        node_idx: usize,
        qx: f64,
        qy: f64,
        k: usize,
        exclude: Option<usize>,
        best: &mut Vec<(f64, usize)>,
    ) {
        let node = &self.nodes[node_idx];
        let p = self.points[node.point_idx];

        let dx = qx - p.x;
        let dy = qy - p.y;

        if exclude != Some(node.point_idx) {
            let candidate = (dist_sq(p, qx, qy), node.point_idx);
            let accept = best.len() < k
                || best
                    .last()
                    .is_some_and(|&worst| candidate_cmp(candidate, worst) == Ordering::Less);

            if accept {
                let pos = best
                    .binary_search_by(|entry| candidate_cmp(*entry, candidate))
                    .unwrap_or_else(|e| e);
                best.insert(pos, candidate);
                best.truncate(k);
            }
        }

        let diff = if node.split_dim == 0 { dx } else { dy };
        let (first, second) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(child) = first {
            self.knn_recursive(child, qx, qy, k, exclude, best);
        }

        let threshold = if best.len() >= k {
            best[best.len() - 1].0
        } else {
            f64::MAX
        };

        // `<=` so equidistant points with a lower index are still reached
        if diff * diff <= threshold {
            if let Some(child) = second {
                self.knn_recursive(child, qx, qy, k, exclude, best);
            }
        }
    }
}

impl NeighborSearch for KdTree {
    fn len(&self) -> usize {
        self.points.len()
    }

    fn point(&self, index: usize) -> Coord<f64> {
        self.points[index]
    }

    fn neighbors_of(&self, source: usize, k: usize) -> Vec<Neighbor> {
        let q = self.points[source];
        self.k_nearest_excluding(q.x, q.y, k, Some(source))
            .into_iter()
            .map(|r| Neighbor {
                index: r.index,
                distance: r.distance_sq.sqrt(),
            })
            .collect()
    }
}

/// Recursively build the k-d tree.
fn build_recursive(
    points: &[Coord<f64>],
    indices: &mut [usize],
    depth: usize,
    nodes: &mut Vec<KdNode>,
) -> usize {
    let n = indices.len();
    let split_dim = (depth % 2) as u8;

    let axis = |i: usize| if split_dim == 0 { points[i].x } else { points[i].y };
    indices.sort_by(|&a, &b| axis(a).total_cmp(&axis(b)));

    let median = n / 2;
    let point_idx = indices[median];

    let node_idx = nodes.len();
    nodes.push(KdNode {
        point_idx,
        split_dim,
        left: None,
        right: None,
    });

    let (lower, upper) = indices.split_at_mut(median);

    if !lower.is_empty() {
        let left_idx = build_recursive(points, lower, depth + 1, nodes);
        nodes[node_idx].left = Some(left_idx);
    }

    if upper.len() > 1 {
        let right_idx = build_recursive(points, &mut upper[1..], depth + 1, nodes);
        nodes[node_idx].right = Some(right_idx);
    }

    node_idx
}
