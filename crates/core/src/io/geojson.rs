//! GeoJSON reading/writing
//!
//! Decodes `FeatureCollection` documents into [`FeatureCollection`] and
//! back. Supports Point, LineString and Polygon geometries; a third point
//! coordinate is kept as the feature's `z`.

use crate::error::{Error, Result};
use crate::vector::{AttributeValue, Feature, FeatureCollection};
use geo_types::{Coord, Geometry, LineString, Point, Polygon};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Read a GeoJSON FeatureCollection from a file
pub fn read_geojson<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    let file = File::open(path.as_ref())?;
    let value: Value = serde_json::from_reader(BufReader::new(file))?;
    let fc = decode_collection(&value)?;
    debug!("Read {} features from {}", fc.len(), path.as_ref().display());
    Ok(fc)
}

/// Read a GeoJSON FeatureCollection from an in-memory string
pub fn read_geojson_from_str(text: &str) -> Result<FeatureCollection> {
    let value: Value = serde_json::from_str(text)?;
    decode_collection(&value)
}

/// Write a FeatureCollection to a GeoJSON file
pub fn write_geojson<P: AsRef<Path>>(collection: &FeatureCollection, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &encode_collection(collection))?;
    writer.flush()?;
    debug!("Wrote {} features to {}", collection.len(), path.as_ref().display());
    Ok(())
}

/// Encode a FeatureCollection as a GeoJSON string
pub fn write_geojson_to_string(collection: &FeatureCollection) -> Result<String> {
    Ok(serde_json::to_string(&encode_collection(collection))?)
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

fn malformed(msg: impl Into<String>) -> Error {
    Error::GeoJson(msg.into())
}

fn decode_collection(value: &Value) -> Result<FeatureCollection> {
    match value.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => {}
        Some(other) => return Err(malformed(format!("expected FeatureCollection, got {}", other))),
        None => return Err(malformed("missing \"type\"")),
    }

    let features = value
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("missing \"features\" array"))?;

    features.iter().map(decode_feature).collect()
}

fn decode_feature(value: &Value) -> Result<Feature> {
    if value.get("type").and_then(Value::as_str) != Some("Feature") {
        return Err(malformed("expected a Feature"));
    }

    let mut feature = Feature::empty();

    feature.id = match value.get("id") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(other) => return Err(malformed(format!("unsupported feature id: {}", other))),
    };

    if let Some(geom) = value.get("geometry").filter(|g| !g.is_null()) {
        let (geometry, z) = decode_geometry(geom)?;
        feature.geometry = Some(geometry);
        feature.z = z;
    }

    if let Some(props) = value.get("properties").and_then(Value::as_object) {
        feature.properties = props
            .iter()
            .map(|(k, v)| (k.clone(), decode_attribute(v)))
            .collect::<BTreeMap<_, _>>();
    }

    Ok(feature)
}

fn decode_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null,
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => AttributeValue::Int(i),
            None => AttributeValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => AttributeValue::String(s.clone()),
        // Nested values are kept as their JSON text
        other => AttributeValue::String(other.to_string()),
    }
}

fn decode_position(value: &Value) -> Result<(Coord<f64>, Option<f64>)> {
    let arr = value
        .as_array()
        .filter(|a| a.len() >= 2)
        .ok_or_else(|| malformed("position must have at least 2 numbers"))?;
    let num = |v: &Value| v.as_f64().ok_or_else(|| malformed("non-numeric coordinate"));
    let x = num(&arr[0])?;
    let y = num(&arr[1])?;
    let z = arr.get(2).map(num).transpose()?;
    Ok((Coord { x, y }, z))
}

fn decode_ring(value: &Value) -> Result<LineString<f64>> {
    let positions = value
        .as_array()
        .ok_or_else(|| malformed("expected an array of positions"))?;
    positions
        .iter()
        .map(|p| decode_position(p).map(|(c, _)| c))
        .collect::<Result<Vec<_>>>()
        .map(LineString::new)
}

fn decode_geometry(value: &Value) -> Result<(Geometry<f64>, Option<f64>)> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("geometry without \"type\""))?;
    let coords = value
        .get("coordinates")
        .ok_or_else(|| malformed("geometry without \"coordinates\""))?;

    match kind {
        "Point" => {
            let (c, z) = decode_position(coords)?;
            Ok((Geometry::Point(Point(c)), z))
        }
        "LineString" => Ok((Geometry::LineString(decode_ring(coords)?), None)),
        "Polygon" => {
            let rings = coords
                .as_array()
                .ok_or_else(|| malformed("polygon coordinates must be an array of rings"))?;
            let mut rings = rings.iter().map(decode_ring);
            let exterior = rings
                .next()
                .transpose()?
                .unwrap_or_else(|| LineString::new(vec![]));
            let interiors = rings.collect::<Result<Vec<_>>>()?;
            Ok((Geometry::Polygon(Polygon::new(exterior, interiors)), None))
        }
        other => Err(malformed(format!("unsupported geometry type: {}", other))),
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

fn encode_collection(collection: &FeatureCollection) -> Value {
    json!({
        "type": "FeatureCollection",
        "features": collection.iter().map(encode_feature).collect::<Vec<_>>(),
    })
}

fn encode_feature(feature: &Feature) -> Value {
    let mut obj = Map::new();
    obj.insert("type".into(), Value::from("Feature"));
    if let Some(id) = &feature.id {
        obj.insert("id".into(), Value::from(id.as_str()));
    }
    let geometry = feature
        .geometry
        .as_ref()
        .map(|g| encode_geometry(g, feature.z))
        .unwrap_or(Value::Null);
    obj.insert("geometry".into(), geometry);
    let props: Map<String, Value> = feature
        .properties
        .iter()
        .map(|(k, v)| (k.clone(), encode_attribute(v)))
        .collect();
    obj.insert("properties".into(), Value::Object(props));
    Value::Object(obj)
}

fn encode_attribute(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::Null => Value::Null,
        AttributeValue::Bool(b) => Value::from(*b),
        AttributeValue::Int(i) => Value::from(*i),
        // Non-finite floats have no JSON representation
        AttributeValue::Float(f) if f.is_finite() => Value::from(*f),
        AttributeValue::Float(_) => Value::Null,
        AttributeValue::String(s) => Value::from(s.as_str()),
    }
}

fn encode_ring(ring: &LineString<f64>) -> Value {
    Value::Array(ring.coords().map(|c| json!([c.x, c.y])).collect())
}

fn encode_geometry(geometry: &Geometry<f64>, z: Option<f64>) -> Value {
    match geometry {
        Geometry::Point(p) => {
            let coords = match z {
                Some(z) => json!([p.x(), p.y(), z]),
                None => json!([p.x(), p.y()]),
            };
            json!({ "type": "Point", "coordinates": coords })
        }
        Geometry::LineString(ls) => json!({ "type": "LineString", "coordinates": encode_ring(ls) }),
        Geometry::Polygon(poly) => {
            let mut rings = vec![encode_ring(poly.exterior())];
            rings.extend(poly.interiors().iter().map(encode_ring));
            json!({ "type": "Polygon", "coordinates": rings })
        }
        Geometry::Line(line) => json!({
            "type": "LineString",
            "coordinates": [[line.start.x, line.start.y], [line.end.x, line.end.y]],
        }),
        _ => Value::Null,
    }
}
