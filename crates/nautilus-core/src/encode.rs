//! Frame encoder: projects a [`Frame`] into the wire shape a sink needs.
//!
//! Building a [`WireFrame`] cannot fail. Turning it into bytes can (JSON
//! serialization), and that failure is reported as [`EncodeError`] so the
//! caller can log it and skip the tick.
//!
//! | encoding | shape | carried by |
//! |---|---|---|
//! | `envelope` | `{"data": {"timestamp", "boids"}, "annotation"?}` | batch push |
//! | `data_frame_rows` | `{"fields", "values": [[time, id, x, y, rotation], ...]}` | batch push, live socket |
//! | `data_frame_columns` | `{"fields", "values": [[time...], [id...], ...]}` | batch push, live socket |
//! | `line_protocol` | `boids,id=boid-000 x=..,y=.. <ns>` per agent | pub/sub |
//! | `agent_json` | `{"time", "id", "x", "y", "rotation"}` per agent | pub/sub |

use core::fmt::Write as _;

use nautilus_types::{
    Agent, AgentRecord, Annotation, BoidSummary, Cell, DataFrame, Envelope, Field, FieldType,
    Frame, Orientation, Payload,
};
use serde::Deserialize;

use crate::config::TransportConfig;

/// Failure to serialize a wire frame into bytes.
#[derive(Debug, thiserror::Error)]
#[error("failed to serialize {what} frame: {source}")]
pub struct EncodeError {
    /// Which encoding was being serialized.
    pub what: &'static str,
    /// The underlying JSON error.
    #[source]
    pub source: serde_json::Error,
}

/// Wire encodings the simulator can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// Population payload wrapped in a `data` envelope, optional annotation.
    Envelope,
    /// Columnar data frame, one value array per agent.
    DataFrameRows,
    /// Columnar data frame, one value array per field.
    DataFrameColumns,
    /// One line-protocol record per agent.
    LineProtocol,
    /// One JSON object per agent.
    AgentJson,
}

/// An encoded frame, ready for a sink to serialize and send.
#[derive(Debug, Clone, PartialEq)]
pub enum WireFrame {
    /// Batch push envelope.
    Envelope(Envelope),
    /// Columnar data frame (either orientation).
    DataFrame(DataFrame),
    /// Line-protocol records, one per agent.
    Lines(Vec<String>),
    /// JSON records, one per agent.
    Records(Vec<AgentRecord>),
}

impl WireFrame {
    /// Short name for logs and errors.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Envelope(_) => "envelope",
            Self::DataFrame(_) => "data frame",
            Self::Lines(_) => "line protocol",
            Self::Records(_) => "agent record",
        }
    }

    /// Serialize the whole frame as a single body.
    ///
    /// Line-protocol frames are newline-joined; record frames become a JSON
    /// array.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] if JSON serialization fails.
    pub fn body(&self) -> Result<Vec<u8>, EncodeError> {
        match self {
            Self::Envelope(envelope) => self.json(envelope),
            Self::DataFrame(frame) => self.json(frame),
            Self::Lines(lines) => Ok(lines.join("\n").into_bytes()),
            Self::Records(records) => self.json(records),
        }
    }

    /// Serialize the frame as one message per agent.
    ///
    /// Envelope and data-frame encodings are a single message.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] if JSON serialization fails.
    pub fn messages(&self) -> Result<Vec<Vec<u8>>, EncodeError> {
        match self {
            Self::Lines(lines) => Ok(lines.iter().map(|l| l.clone().into_bytes()).collect()),
            Self::Records(records) => records.iter().map(|r| self.json(r)).collect(),
            Self::Envelope(_) | Self::DataFrame(_) => Ok(vec![self.body()?]),
        }
    }

    fn json<T: serde::Serialize>(&self, value: &T) -> Result<Vec<u8>, EncodeError> {
        serde_json::to_vec(value).map_err(|source| EncodeError {
            what: self.kind(),
            source,
        })
    }
}

/// Projects frames into one configured [`Encoding`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoder {
    encoding: Encoding,
    measurement: String,
    annotate: bool,
}

impl Encoder {
    /// Encoder for `encoding` with the default measurement name and no
    /// annotations.
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            measurement: String::from("boids"),
            annotate: false,
        }
    }

    /// Encoder matching a transport configuration.
    pub fn from_config(config: &TransportConfig) -> Self {
        Self::new(config.effective_encoding())
            .with_measurement(&config.measurement)
            .with_annotation(config.annotate)
    }

    /// Set the line-protocol measurement name.
    #[must_use]
    pub fn with_measurement(mut self, measurement: &str) -> Self {
        measurement.clone_into(&mut self.measurement);
        self
    }

    /// Attach an annotation record to envelopes.
    #[must_use]
    pub const fn with_annotation(mut self, annotate: bool) -> Self {
        self.annotate = annotate;
        self
    }

    /// The encoding this encoder produces.
    pub const fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Project `frame` into the configured wire shape.
    pub fn encode(&self, frame: &Frame) -> WireFrame {
        match self.encoding {
            Encoding::Envelope => WireFrame::Envelope(self.envelope(frame)),
            Encoding::DataFrameRows => WireFrame::DataFrame(data_frame(frame, Orientation::Rows)),
            Encoding::DataFrameColumns => {
                WireFrame::DataFrame(data_frame(frame, Orientation::Columns))
            }
            Encoding::LineProtocol => WireFrame::Lines(
                frame
                    .agents
                    .iter()
                    .map(|agent| line_record(&self.measurement, agent, frame.timestamp_ns()))
                    .collect(),
            ),
            Encoding::AgentJson => WireFrame::Records(
                frame
                    .agents
                    .iter()
                    .map(|agent| AgentRecord {
                        time: frame.timestamp_ms,
                        id: agent.id.clone(),
                        x: agent.position.x,
                        y: agent.position.y,
                        rotation: agent.heading,
                    })
                    .collect(),
            ),
        }
    }

    fn envelope(&self, frame: &Frame) -> Envelope {
        let annotation = self.annotate.then(|| Annotation {
            time: frame.timestamp_ms,
            tags: vec![String::from("boids"), String::from("simulation")],
            text: format!("tick {}: {} boids", frame.tick, frame.len()),
        });
        Envelope {
            data: Payload {
                timestamp: frame.timestamp_ms,
                boids: frame.agents.iter().map(BoidSummary::from).collect(),
            },
            annotation,
        }
    }
}

/// Schema shared by both data-frame orientations.
fn schema() -> Vec<Field> {
    vec![
        Field::new("time", FieldType::Time),
        Field::new("id", FieldType::String),
        Field::new("x", FieldType::Number),
        Field::new("y", FieldType::Number),
        Field::new("rotation", FieldType::Number),
    ]
}

fn row(time: i64, agent: &Agent) -> [Cell; 5] {
    [
        Cell::Integer(time),
        Cell::Text(agent.id.to_string()),
        Cell::Number(agent.position.x),
        Cell::Number(agent.position.y),
        Cell::Number(agent.heading),
    ]
}

/// Build a data frame in either orientation.
pub fn data_frame(frame: &Frame, orientation: Orientation) -> DataFrame {
    let fields = schema();
    let values = match orientation {
        Orientation::Rows => frame
            .agents
            .iter()
            .map(|agent| row(frame.timestamp_ms, agent).to_vec())
            .collect(),
        Orientation::Columns => {
            let mut columns: Vec<Vec<Cell>> = fields
                .iter()
                .map(|_| Vec::with_capacity(frame.len()))
                .collect();
            for agent in &frame.agents {
                for (column, cell) in columns.iter_mut().zip(row(frame.timestamp_ms, agent)) {
                    column.push(cell);
                }
            }
            columns
        }
    };
    DataFrame { fields, values }
}

/// Format one agent as a line-protocol record.
///
/// `<measurement>,id=<id> x=..,y=..,rotation=..,vx=..,vy=..,speed=.. <ns>`
pub fn line_record(measurement: &str, agent: &Agent, timestamp_ns: i64) -> String {
    let mut line = String::with_capacity(128);
    escape_into(&mut line, measurement, &[',', ' ']);
    line.push_str(",id=");
    escape_into(&mut line, agent.id.as_str(), &[',', '=', ' ']);
    // Writing into a String cannot fail.
    let _ = write!(
        line,
        " x={},y={},rotation={},vx={},vy={},speed={} {}",
        agent.position.x,
        agent.position.y,
        agent.heading,
        agent.velocity.x,
        agent.velocity.y,
        agent.speed,
        timestamp_ns,
    );
    line
}

fn escape_into(out: &mut String, value: &str, special: &[char]) {
    for c in value.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
}
