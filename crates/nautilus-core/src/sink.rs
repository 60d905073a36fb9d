//! The delivery seam between the scheduler and the transports.
//!
//! A [`FrameSink`] owns a channel to the backend and accepts one encoded
//! frame per tick. Sinks decide locally how to react to a failed delivery;
//! what they report back is a [`DeliveryError`] whose
//! [`is_fatal`](DeliveryError::is_fatal) flag tells the scheduler whether
//! the run can continue. Nothing is ever retried.

use std::future::Future;

use crate::encode::{EncodeError, Encoding, WireFrame};

/// Outcome of a single successful `deliver` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Written to the connection before `deliver` returned.
    Sent,
    /// Handed to a detached task; its outcome is logged there.
    Detached,
    /// Discarded without an attempt (no capacity for another request).
    Dropped,
}

/// A failed delivery attempt.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The frame could not be serialized. The tick is skipped.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// The sink was handed an encoding it cannot carry.
    #[error("{sink} cannot carry {frame} frames")]
    Unsupported {
        /// Sink name.
        sink: &'static str,
        /// Wire frame kind.
        frame: &'static str,
    },

    /// The backend answered but refused the frame.
    #[error("backend rejected frame: {0}")]
    Rejected(String),

    /// A transient network failure. The tick is lost, the link is not.
    #[error("transport error: {0}")]
    Transport(String),

    /// The persistent connection is gone. The run must stop.
    #[error("connection lost: {0}")]
    ConnectionLost(String),
}

impl DeliveryError {
    /// Whether the scheduler must stop after this error.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::ConnectionLost(_))
    }
}

/// A destination that accepts one encoded frame per tick.
///
/// Implementations are driven exclusively by the scheduler task.
pub trait FrameSink {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// The encoding this sink expects.
    fn encoding(&self) -> Encoding;

    /// Deliver one frame.
    ///
    /// Must complete within the sink's own deadline; a sink never blocks
    /// indefinitely.
    fn deliver(
        &mut self,
        frame: WireFrame,
    ) -> impl Future<Output = Result<Delivery, DeliveryError>> + Send;

    /// Release the connection. Called once when the run ends.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}
