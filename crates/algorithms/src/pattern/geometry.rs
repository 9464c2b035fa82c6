//! Result geometry construction for k-nearest-neighbor maps
//!
//! Each source point yields either one line per neighbor (source to
//! neighbor, in rank order) or a single hull around the neighbor cluster.

use geo::kernels::{Kernel, Orientation, RobustKernel};
use geo::{ConvexHull, Coord, Geometry, LineString, MultiPoint, Point};
use knnmap_core::vector::{FieldType, Schema};
use knnmap_core::{AttributeValue, Error, Feature, Result};

use crate::neighbor::Neighbor;

/// 1-based neighbor rank on line features
pub const RANK_FIELD: &str = "knn_rank";
/// Euclidean source-to-neighbor distance on line features
pub const DISTANCE_FIELD: &str = "knn_dist";
/// Key of the neighbor feature on line features
pub const TARGET_FIELD: &str = "knn_to";
/// Number of neighbors enclosed by a hull feature
pub const COUNT_FIELD: &str = "knn_count";

/// Schema of the result collection for a given input schema.
pub fn output_schema(input: &Schema, convex_hull: bool) -> Schema {
    if convex_hull {
        input.clone().with_field(COUNT_FIELD, FieldType::Int)
    } else {
        input
            .clone()
            .with_field(RANK_FIELD, FieldType::Int)
            .with_field(DISTANCE_FIELD, FieldType::Float)
            .with_field(TARGET_FIELD, FieldType::String)
    }
}

fn coord_of(features: &[Feature], index: usize) -> Result<Coord<f64>> {
    features
        .get(index)
        .and_then(Feature::coord)
        .ok_or_else(|| Error::Computation(format!("feature #{} is not a point", index)))
}

/// Build the output features for the point at `source`.
///
/// `neighbors` must be in rank order, as returned by
/// [`crate::neighbor::query`]. Every output feature carries a copy of the
/// source attributes plus the fields named in [`output_schema`].
pub fn build_result(
    features: &[Feature],
    source: usize,
    neighbors: &[Neighbor],
    convex_hull: bool,
) -> Result<Vec<Feature>> {
    let origin = coord_of(features, source)?;
    let source_feature = &features[source];
    let source_key = source_feature.key(source);

    if convex_hull {
        let mut cluster = Vec::with_capacity(neighbors.len() + 1);
        cluster.push(origin);
        for nb in neighbors {
            cluster.push(coord_of(features, nb.index)?);
        }

        let mut out = Feature::new(cluster_hull(&cluster)?);
        out.id = source_feature.id.clone();
        out.properties = source_feature.properties.clone();
        out.set_property(COUNT_FIELD, AttributeValue::Int(neighbors.len() as i64));
        return Ok(vec![out]);
    }

    neighbors
        .iter()
        .enumerate()
        .map(|(i, nb)| {
            let rank = i + 1;
            let target = coord_of(features, nb.index)?;

            let mut out = Feature::new(Geometry::LineString(LineString::new(vec![origin, target])));
            out.id = Some(format!("{}.{}", source_key, rank));
            out.properties = source_feature.properties.clone();
            out.set_property(RANK_FIELD, AttributeValue::Int(rank as i64));
            out.set_property(DISTANCE_FIELD, AttributeValue::Float(nb.distance));
            out.set_property(TARGET_FIELD, AttributeValue::String(features[nb.index].key(nb.index)));
            Ok(out)
        })
        .collect()
}

/// Convex hull of a point cluster, degrading gracefully.
///
/// - one distinct point: `Point`
/// - all points collinear: `LineString` between the two extreme points
/// - otherwise: closed counter-clockwise `Polygon`
pub fn cluster_hull(points: &[Coord<f64>]) -> Result<Geometry<f64>> {
    let first = *points
        .first()
        .ok_or_else(|| Error::Computation("cannot build a hull from zero points".into()))?;

    let Some(second) = points.iter().copied().find(|p| *p != first) else {
        return Ok(Geometry::Point(Point(first)));
    };

    let collinear = points
        .iter()
        .all(|&p| <RobustKernel as Kernel<f64>>::orient2d(first, second, p) == Orientation::Collinear);

    if collinear {
        let lexical = |a: &&Coord<f64>, b: &&Coord<f64>| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y));
        let (Some(lo), Some(hi)) = (points.iter().min_by(lexical), points.iter().max_by(lexical)) else {
            return Err(Error::Computation("empty collinear cluster".into()));
        };
        return Ok(Geometry::LineString(LineString::new(vec![*lo, *hi])));
    }

    let mp: MultiPoint<f64> = points.iter().map(|c| Point(*c)).collect();
    let hull = mp.convex_hull();
    if hull.exterior().0.len() < 4 {
        return Err(Error::Computation(format!(
            "convex hull of {} points has {} vertices",
            points.len(),
            hull.exterior().0.len()
        )));
    }
    Ok(Geometry::Polygon(hull))
}
