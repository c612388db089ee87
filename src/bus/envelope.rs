//! # Change Envelopes
//!
//! The message shape shared by every transport:
//! `{"operation": "add", "data": {...}, "timestamp": "..."}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::store::{Point, PointId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Add,
    Update,
    Delete,
    /// Receivers must discard their state and reload everything
    Reset,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Reset => "reset",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A "something changed, re-read it" signal. Never the only copy of data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEnvelope {
    pub operation: Operation,
    #[serde(default)]
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl ChangeEnvelope {
    pub fn new(operation: Operation, data: Value) -> Self {
        Self {
            operation,
            data,
            timestamp: Utc::now(),
        }
    }

    pub fn add(point: &Point) -> Self {
        Self::new(Operation::Add, serde_json::to_value(point).unwrap_or(Value::Null))
    }

    pub fn update(point: &Point) -> Self {
        Self::new(Operation::Update, serde_json::to_value(point).unwrap_or(Value::Null))
    }

    pub fn delete(id: PointId) -> Self {
        Self::new(Operation::Delete, json!({ "id": id }))
    }

    pub fn reset() -> Self {
        Self::new(Operation::Reset, Value::Null)
    }

    /// Id of the affected point: `data.id`, or `data` itself when it is a
    /// bare number.
    pub fn point_id(&self) -> Option<PointId> {
        let id = match &self.data {
            Value::Object(map) => map.get("id")?,
            other => other,
        };
        match id {
            Value::Number(n) => n.as_u64().map(PointId),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

/// What actually travels: the envelope plus who sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Frame {
    /// Unique per message
    pub id: Uuid,
    /// Unique per publishing context
    pub origin: Uuid,
    #[serde(flatten)]
    pub envelope: ChangeEnvelope,
}

impl Frame {
    pub fn new(origin: Uuid, envelope: ChangeEnvelope) -> Self {
        Self {
            id: Uuid::new_v4(),
            origin,
            envelope,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_wire_shape() {
        let envelope = ChangeEnvelope::delete(PointId(12));
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["operation"], "delete");
        assert_eq!(value["data"]["id"], 12);
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_point_id_extraction() {
        assert_eq!(ChangeEnvelope::delete(PointId(3)).point_id(), Some(PointId(3)));
        assert_eq!(ChangeEnvelope::new(Operation::Delete, json!(5)).point_id(), Some(PointId(5)));
        assert_eq!(ChangeEnvelope::new(Operation::Update, json!({"id": "8"})).point_id(), Some(PointId(8)));
        assert_eq!(ChangeEnvelope::reset().point_id(), None);
    }

    #[test]
    fn test_frame_flattens_envelope() {
        let frame = Frame::new(Uuid::new_v4(), ChangeEnvelope::reset());
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["operation"], "reset");
        assert!(value["origin"].is_string());

        let back: Frame = serde_json::from_value(value).unwrap();
        assert_eq!(back, frame);
    }
}
