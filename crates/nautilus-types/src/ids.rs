//! Agent identifiers.
//!
//! Identity is assigned once when the population is created and never
//! changes. IDs are a zero-padded sequence so log lines and dashboard
//! legends sort naturally.

use serde::{Deserialize, Serialize};

/// Stable identifier for a single boid.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoidId(String);

impl BoidId {
    /// Build the identifier for the agent at position `index` in the
    /// population (`boid-000`, `boid-001`, ...).
    pub fn from_index(index: usize) -> Self {
        Self(format!("boid-{index:03}"))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for BoidId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BoidId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}
