//! Attribute schema of a feature collection

use super::{AttributeValue, FeatureCollection};
use serde::{Deserialize, Serialize};

/// Type of an attribute field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    Bool,
    Int,
    Float,
    String,
    /// Only null values seen so far
    Unknown,
}

impl FieldType {
    fn of(value: &AttributeValue) -> Self {
        match value {
            AttributeValue::Null => FieldType::Unknown,
            AttributeValue::Bool(_) => FieldType::Bool,
            AttributeValue::Int(_) => FieldType::Int,
            AttributeValue::Float(_) => FieldType::Float,
            AttributeValue::String(_) => FieldType::String,
        }
    }

    /// Widen two observed types into one that holds both.
    fn merge(self, other: FieldType) -> FieldType {
        use FieldType::*;
        match (self, other) {
            (a, b) if a == b => a,
            (Unknown, b) => b,
            (a, Unknown) => a,
            (Int, Float) | (Float, Int) => Float,
            _ => String,
        }
    }
}

/// A named, typed attribute field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
}

/// Ordered list of attribute fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<FieldDef>,
}

impl Schema {
    /// Derive a schema from every feature's attributes.
    ///
    /// Fields appear in first-seen order; conflicting types widen
    /// (Int + Float = Float, anything else = String).
    pub fn infer(collection: &FeatureCollection) -> Self {
        let mut schema = Schema::default();
        for feature in collection.iter() {
            for (name, value) in &feature.properties {
                schema.observe(name, FieldType::of(value));
            }
        }
        schema
    }

    fn observe(&mut self, name: &str, field_type: FieldType) {
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(field) => field.field_type = field.field_type.merge(field_type),
            None => self.fields.push(FieldDef {
                name: name.to_string(),
                field_type,
            }),
        }
    }

    /// Add a field, replacing the type of an existing field with the same name.
    pub fn with_field(mut self, name: &str, field_type: FieldType) -> Self {
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(field) => field.field_type = field_type,
            None => self.fields.push(FieldDef {
                name: name.to_string(),
                field_type,
            }),
        }
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::Feature;

    #[test]
    fn test_infer_widens_types() {
        let fc: FeatureCollection = vec![
            Feature::point(0.0, 0.0)
                .with_property("count", 3i64)
                .with_property("label", AttributeValue::Null),
            Feature::point(1.0, 0.0)
                .with_property("count", 2.5)
                .with_property("label", "north"),
        ]
        .into();

        let schema = Schema::infer(&fc);
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.field("count").unwrap().field_type, FieldType::Float);
        assert_eq!(schema.field("label").unwrap().field_type, FieldType::String);
    }

    #[test]
    fn test_with_field_replaces() {
        let schema = Schema::default()
            .with_field("rank", FieldType::String)
            .with_field("rank", FieldType::Int);
        assert_eq!(schema.len(), 1);
        assert_eq!(schema.field("rank").unwrap().field_type, FieldType::Int);
    }
}
