//! `worldmodel-types` – shared data types for the world model persistence
//! layer.
//!
//! The world model tracks perceived objects as three kinds of records:
//!
//! - [`Descriptor`] – a single piece of perception data (point cloud,
//!   image, mesh, …) attached to a description. Its binary payload lives
//!   in large-object storage, not inline in the row.
//! - [`Description`] – a named, tagged description of an object class,
//!   shared by many descriptors and instances.
//! - [`Instance`] – a live, mutable object instance observed in the
//!   world, carrying pose and bookkeeping timestamps.
//!
//! Writes go through the generic [`Entity`] field map: an ordered mapping
//! from column name to [`FieldValue`] that the store layer turns into a
//! parameterized SQL statement. Reads come back as the typed records
//! above.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// FieldValue
// ─────────────────────────────────────────────────────────────────────────────

/// A single value inside an [`Entity`].
///
/// Timestamp columns are carried as [`FieldValue::Real`] Unix epoch
/// seconds (fractional seconds preserved); the store layer converts them
/// to database-native timestamps on write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// 64-bit integer (ids, sequence numbers).
    Int(i64),
    /// Double-precision float (TTLs, epoch-second timestamps).
    Real(f64),
    /// UTF-8 text.
    Text(String),
    /// Raw binary payload. The descriptor store offloads these to
    /// large-object storage and stores only the object reference.
    Bytes(Vec<u8>),
    /// Tag array.
    TextArray(Vec<String>),
    /// Structured value (pose vectors, free-form properties).
    Json(serde_json::Value),
    /// Reference to a large object already living in the database.
    /// Produced by the descriptor store when it offloads a
    /// [`Bytes`][FieldValue::Bytes] payload.
    Oid(u32),
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Real(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(v: Vec<u8>) -> Self {
        FieldValue::Bytes(v)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(v: Vec<String>) -> Self {
        FieldValue::TextArray(v)
    }
}

impl From<&[&str]> for FieldValue {
    fn from(v: &[&str]) -> Self {
        FieldValue::TextArray(v.iter().map(|s| s.to_string()).collect())
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(v: serde_json::Value) -> Self {
        FieldValue::Json(v)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Entity
// ─────────────────────────────────────────────────────────────────────────────

/// An ordered field-name → value map describing a row to insert or the
/// columns of a row to update.
///
/// Iteration order is insertion order; [`set`][Entity::set] on an
/// existing name replaces the value in place. The store layer strips the
/// table's identity column before building any statement, so callers may
/// include or omit it freely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    fields: Vec<(String, FieldValue)>,
}

impl Entity {
    /// Create an empty entity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value`, replacing any existing value for `name`.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.fields.push((name, value)),
        }
        self
    }

    /// Look up the value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Remove and return the value stored under `name`.
    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        let idx = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(idx).1)
    }

    /// `true` if a value is stored under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n == name)
    }

    /// Iterate fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// `true` if no fields are set.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Records
// ─────────────────────────────────────────────────────────────────────────────

/// A perception descriptor row. Owned by exactly one [`Description`];
/// many descriptors may reference the same description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    /// Server-assigned identity, immutable after insert.
    pub descriptor_id: i64,
    /// The description this descriptor belongs to.
    pub description_id: Option<i64>,
    /// Kind of payload (e.g. `"pointcloud"`, `"rgb_image"`).
    #[serde(rename = "type")]
    pub descriptor_type: Option<String>,
    /// Full binary payload, read back from large-object storage.
    pub data: Option<Vec<u8>>,
    /// External reference (file name, frame id, …).
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    pub tags: Vec<String>,
}

/// A shared world object description row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Description {
    /// Server-assigned identity, immutable after insert.
    pub description_id: i64,
    pub name: Option<String>,
    pub tags: Vec<String>,
}

/// A live world object instance row.
///
/// Timestamp columns surface as Unix epoch seconds (`f64`, fractional
/// seconds preserved to the database's timestamp precision); `NULL`
/// decodes to `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Server-assigned identity, immutable after insert.
    pub instance_id: i64,
    pub name: Option<String>,
    /// When the instance was first perceived.
    pub creation: Option<f64>,
    /// When the instance was last updated.
    pub update: Option<f64>,
    /// Expected time-to-live in seconds.
    pub expected_ttl: Option<f64>,
    /// When the instance stopped being perceived.
    pub perceived_end: Option<f64>,
    pub source_origin: Option<String>,
    pub source_creator: Option<String>,
    pub pose_seq: Option<i64>,
    pub pose_stamp: Option<f64>,
    pub pose_frame_id: Option<String>,
    /// Position vector, stored as a structured value.
    pub pose_position: Option<serde_json::Value>,
    /// Orientation quaternion, stored as a structured value.
    pub pose_orientation: Option<serde_json::Value>,
    /// 6×6 pose covariance, stored as a structured value.
    pub pose_covariance: Option<serde_json::Value>,
    /// The description this instance realizes.
    pub description_id: Option<i64>,
    /// Free-form properties.
    pub properties: Option<serde_json::Value>,
    pub tags: Vec<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ── Entity ───────────────────────────────────────────────────────────────

    #[test]
    fn entity_preserves_insertion_order() {
        let mut e = Entity::new();
        e.set("name", "chair");
        e.set("tags", vec!["furniture".to_string()]);
        e.set("description_id", 4i64);

        let names: Vec<&str> = e.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["name", "tags", "description_id"]);
    }

    #[test]
    fn entity_set_replaces_in_place() {
        let mut e = Entity::new();
        e.set("name", "chair");
        e.set("expected_ttl", 30.0);
        e.set("name", "table");

        assert_eq!(e.len(), 2);
        assert_eq!(e.get("name"), Some(&FieldValue::Text("table".into())));
        // Replacement keeps the original position.
        assert_eq!(e.iter().next().unwrap().0, "name");
    }

    #[test]
    fn entity_remove_returns_value() {
        let mut e = Entity::new();
        e.set("data", vec![1u8, 2, 3]);
        let removed = e.remove("data");
        assert_eq!(removed, Some(FieldValue::Bytes(vec![1, 2, 3])));
        assert!(e.is_empty());
        assert_eq!(e.remove("data"), None);
    }

    #[test]
    fn entity_contains_and_get() {
        let mut e = Entity::new();
        e.set("pose_seq", 7i64);
        assert!(e.contains("pose_seq"));
        assert!(!e.contains("pose_stamp"));
        assert_eq!(e.get("pose_seq"), Some(&FieldValue::Int(7)));
        assert_eq!(e.get("missing"), None);
    }

    // ── FieldValue conversions ───────────────────────────────────────────────

    #[test]
    fn field_value_from_conversions() {
        assert_eq!(FieldValue::from(3i64), FieldValue::Int(3));
        assert_eq!(FieldValue::from(1.5f64), FieldValue::Real(1.5));
        assert_eq!(FieldValue::from("x"), FieldValue::Text("x".into()));
        assert_eq!(
            FieldValue::from(json!({"x": 1.0})),
            FieldValue::Json(json!({"x": 1.0}))
        );
        let tags: &[&str] = &["a", "b"];
        assert_eq!(
            FieldValue::from(tags),
            FieldValue::TextArray(vec!["a".into(), "b".into()])
        );
    }

    // ── Record serde ─────────────────────────────────────────────────────────

    #[test]
    fn descriptor_serde_uses_column_names() {
        let d = Descriptor {
            descriptor_id: 1,
            description_id: Some(2),
            descriptor_type: Some("pointcloud".into()),
            data: None,
            reference: Some("cloud.pcd".into()),
            tags: vec!["furniture".into()],
        };
        let v = serde_json::to_value(&d).unwrap();
        // Rust-reserved field names map back to their column names.
        assert_eq!(v["type"], "pointcloud");
        assert_eq!(v["ref"], "cloud.pcd");

        let back: Descriptor = serde_json::from_value(v).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn instance_roundtrips_through_serde() {
        let i = Instance {
            instance_id: 9,
            name: Some("chair_0".into()),
            creation: Some(1_700_000_000.25),
            update: None,
            expected_ttl: Some(30.0),
            perceived_end: None,
            source_origin: Some("camera_head".into()),
            source_creator: Some("segmenter".into()),
            pose_seq: Some(12),
            pose_stamp: Some(1_700_000_000.5),
            pose_frame_id: Some("map".into()),
            pose_position: Some(json!({"x": 0.1, "y": 2.0, "z": 0.0})),
            pose_orientation: Some(json!({"x": 0.0, "y": 0.0, "z": 0.0, "w": 1.0})),
            pose_covariance: Some(json!(vec![0.0; 36])),
            description_id: Some(4),
            properties: Some(json!({"color": "red"})),
            tags: vec!["furniture".into(), "red".into()],
        };
        let text = serde_json::to_string(&i).unwrap();
        let back: Instance = serde_json::from_str(&text).unwrap();
        assert_eq!(back, i);
    }
}
