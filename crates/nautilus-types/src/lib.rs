//! Shared type definitions for the Nautilus simulator.
//!
//! This crate is the single source of truth for the data that flows between
//! the simulation core and the transports: the agents themselves, the
//! per-tick [`Frame`] snapshot, and the wire shapes the backend consumes.
//!
//! # Modules
//!
//! - [`ids`] -- Stable agent identifiers (`boid-000`, `boid-001`, ...)
//! - [`structs`] -- Vector math, agents, and the frame snapshot
//! - [`wire`] -- Serializable payload shapes (envelope, data frame, records)

pub mod ids;
pub mod structs;
pub mod wire;

// Re-export all public types at crate root for convenience.
pub use ids::BoidId;
pub use structs::{Agent, Frame, Vec2, heading_degrees};
pub use wire::{
    AgentRecord, Annotation, BoidSummary, Cell, DataFrame, Envelope, Field, FieldType,
    Orientation, Payload,
};
