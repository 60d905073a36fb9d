//! Serializable payload shapes consumed by the visualization backend.
//!
//! These types only describe the JSON layout. Projecting a [`Frame`] into
//! them is the encoder's job (`nautilus-core::encode`).
//!
//! [`Frame`]: crate::Frame

use serde::{Deserialize, Serialize};

use crate::ids::BoidId;
use crate::structs::Agent;

// ---------------------------------------------------------------------------
// Envelope (batch push)
// ---------------------------------------------------------------------------

/// Per-agent entry of the batch push payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoidSummary {
    /// Agent identity.
    pub id: BoidId,
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
    /// Heading in degrees.
    pub rotation: f64,
}

impl From<&Agent> for BoidSummary {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id.clone(),
            x: agent.position.x,
            y: agent.position.y,
            rotation: agent.heading,
        }
    }
}

/// The whole population at one tick, as pushed over HTTP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// Tick instant, Unix milliseconds.
    pub timestamp: i64,
    /// One summary per agent, in population order.
    pub boids: Vec<BoidSummary>,
}

/// Annotation/event record attached to a batch push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Event instant, Unix milliseconds.
    pub time: i64,
    /// Free-form tags for dashboard filtering.
    pub tags: Vec<String>,
    /// Human-readable description.
    pub text: String,
}

/// Top-level batch push body: `{"data": {...}, "annotation": {...}}`.
///
/// The annotation is omitted entirely when absent, which yields the plain
/// `{"data": {...}}` body some deployments expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// The population payload.
    pub data: Payload,
    /// Optional event record describing the tick.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<Annotation>,
}

// ---------------------------------------------------------------------------
// Columnar data frame (live streaming)
// ---------------------------------------------------------------------------

/// Type tag of a data-frame column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Unix-millisecond timestamps.
    Time,
    /// Text values.
    String,
    /// Floating-point values.
    Number,
}

/// Schema entry of a data-frame column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Column name.
    pub name: String,
    /// Column type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl Field {
    /// Construct a schema entry.
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_owned(),
            field_type,
        }
    }
}

/// A single heterogeneous data-frame value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Integer value (timestamps).
    Integer(i64),
    /// Floating-point value.
    Number(f64),
    /// Text value.
    Text(String),
}

/// Memory layout of [`DataFrame::values`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// One array per agent: `[time, id, x, y, rotation]`.
    #[default]
    Rows,
    /// One array per field holding every agent's value.
    Columns,
}

/// Columnar data frame: `{"fields": [...], "values": [[...]]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFrame {
    /// Column schema, in value order.
    pub fields: Vec<Field>,
    /// Either row-major or column-major values, see [`Orientation`].
    pub values: Vec<Vec<Cell>>,
}

// ---------------------------------------------------------------------------
// Per-agent record (pub/sub JSON)
// ---------------------------------------------------------------------------

/// One agent at one tick, published as its own broker message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    /// Tick instant, Unix milliseconds.
    pub time: i64,
    /// Agent identity.
    pub id: BoidId,
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
    /// Heading in degrees.
    pub rotation: f64,
}
