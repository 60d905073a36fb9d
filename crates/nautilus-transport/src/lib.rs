//! Frame sinks for the Nautilus simulator.
//!
//! Three transports deliver encoded frames to a dashboard backend:
//!
//! - [`batch_push`] -- one detached HTTP POST per tick.
//! - [`live_socket`] -- a persistent authenticated WebSocket.
//! - [`pubsub`] -- one broker message per agent per tick.
//!
//! [`Sink`] selects between them from [`TransportConfig`] and is what the
//! engine hands to the scheduler.

pub mod batch_push;
pub mod error;
pub mod live_socket;
pub mod pubsub;

use nautilus_core::config::{TransportConfig, TransportKind};
use nautilus_core::encode::{Encoding, WireFrame};
use nautilus_core::sink::{Delivery, DeliveryError, FrameSink};
use tracing::info;

pub use batch_push::BatchPush;
pub use error::TransportError;
pub use live_socket::{LinkState, LiveSocket};
pub use pubsub::PubSub;

/// The configured transport.
///
/// Uses enum dispatch so the scheduler stays generic over a single
/// concrete [`FrameSink`].
#[derive(Debug)]
pub enum Sink {
    /// HTTP batch push.
    BatchPush(BatchPush),
    /// Persistent WebSocket.
    LiveSocket(LiveSocket),
    /// Broker publisher.
    PubSub(PubSub),
}

impl Sink {
    /// Build and connect the sink selected by `config.kind`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the destination is malformed or the
    /// initial connection fails.
    pub async fn connect(config: &TransportConfig) -> Result<Self, TransportError> {
        let sink = match config.kind {
            TransportKind::BatchPush => Self::BatchPush(BatchPush::new(config)?),
            TransportKind::LiveSocket => Self::LiveSocket(LiveSocket::connect(config).await?),
            TransportKind::PubSub => Self::PubSub(PubSub::connect(config).await?),
        };
        info!(
            sink = sink.name(),
            encoding = ?sink.encoding(),
            "sink ready"
        );
        Ok(sink)
    }
}

impl FrameSink for Sink {
    fn name(&self) -> &'static str {
        match self {
            Self::BatchPush(sink) => sink.name(),
            Self::LiveSocket(sink) => sink.name(),
            Self::PubSub(sink) => sink.name(),
        }
    }

    fn encoding(&self) -> Encoding {
        match self {
            Self::BatchPush(sink) => sink.encoding(),
            Self::LiveSocket(sink) => sink.encoding(),
            Self::PubSub(sink) => sink.encoding(),
        }
    }

    async fn deliver(&mut self, frame: WireFrame) -> Result<Delivery, DeliveryError> {
        match self {
            Self::BatchPush(sink) => sink.deliver(frame).await,
            Self::LiveSocket(sink) => sink.deliver(frame).await,
            Self::PubSub(sink) => sink.deliver(frame).await,
        }
    }

    async fn close(&mut self) {
        match self {
            Self::BatchPush(sink) => sink.close().await,
            Self::LiveSocket(sink) => sink.close().await,
            Self::PubSub(sink) => sink.close().await,
        }
    }
}
