//! # knnmap Algorithms
//!
//! Point pattern algorithms for knnmap.
//!
//! ## Available Algorithm Categories
//!
//! - **neighbor**: k-d tree and linear-scan k-nearest-neighbor search
//! - **pattern**: k-nearest-neighbor maps (neighbor lines, cluster hulls)

mod maybe_rayon;
pub mod neighbor;
pub mod pattern;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::neighbor::{build_index, query, KdTree, LinearScan, Neighbor, NeighborSearch, SpatialIndex};
    pub use crate::pattern::{knn_map, process, KnnMap, KnnMapParams, KnnMapProcess, ProcessState};
    pub use knnmap_core::prelude::*;
}
