//! Error types for sink construction.
//!
//! Steady-state failures are reported per frame as
//! [`DeliveryError`](nautilus_core::sink::DeliveryError). The errors here
//! only occur while a sink is being built, and every one of them is fatal
//! to the process.

/// Errors that can occur while building or connecting a sink.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// A destination setting is malformed.
    #[error("config error: {0}")]
    Config(String),

    /// The initial handshake or dial failed.
    #[error("failed to connect to {target}: {reason}")]
    Connect {
        /// Where the sink tried to connect.
        target: String,
        /// Why the attempt failed.
        reason: String,
    },
}
