//! Exhaustive neighbor search

use geo::Coord;
use knnmap_core::Result;

use super::kdtree::candidate_cmp;
use super::{validate_points, Neighbor, NeighborSearch};

/// Brute-force index: every query scans all points.
#[derive(Debug, Clone)]
pub struct LinearScan {
    points: Vec<Coord<f64>>,
}

impl LinearScan {
    pub fn build(points: &[Coord<f64>]) -> Result<Self> {
        validate_points(points)?;
        Ok(Self {
            points: points.to_vec(),
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl NeighborSearch for LinearScan {
    fn len(&self) -> usize {
        self.points.len()
    }

    fn point(&self, index: usize) -> Coord<f64> {
        self.points[index]
    }

    fn neighbors_of(&self, source: usize, k: usize) -> Vec<Neighbor> {
        let q = self.points[source];

        let mut candidates: Vec<(f64, usize)> = self
            .points
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != source)
            .map(|(i, p)| {
                let dx = q.x - p.x;
                let dy = q.y - p.y;
                (dx * dx + dy * dy, i)
            })
            .collect();

        candidates.sort_by(|a, b| candidate_cmp(*a, *b));
        candidates.truncate(k);

        candidates
            .into_iter()
            .map(|(d, index)| Neighbor {
                index,
                distance: d.sqrt(),
            })
            .collect()
    }
}
