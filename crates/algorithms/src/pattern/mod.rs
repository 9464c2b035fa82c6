//! Point pattern maps
//!
//! - k-nearest-neighbor map: one line per (point, neighbor) pair, or one
//!   convex hull per neighbor cluster

pub mod geometry;
mod process;

pub use geometry::{
    build_result, cluster_hull, output_schema, COUNT_FIELD, DISTANCE_FIELD, RANK_FIELD,
    TARGET_FIELD,
};
pub use process::{knn_map, process, KnnMap, KnnMapParams, KnnMapProcess, ProcessState};
