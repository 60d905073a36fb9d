//! Per-agent messages on a broker subject.
//!
//! Each tick publishes one message per agent, either a line-protocol
//! record or a JSON record, to the configured subject. Publishing is
//! at-most-once with nothing retained. The client reconnects on its own.
//! While it is away each tick is dropped without touching the client, and
//! a batch that cannot be handed over within the write deadline is
//! abandoned and reported as a non-fatal failure.

use std::time::Duration;

use async_nats::connection::State;
use async_nats::{Client, ConnectOptions, Event};
use nautilus_core::config::TransportConfig;
use nautilus_core::encode::{Encoding, WireFrame};
use nautilus_core::sink::{Delivery, DeliveryError, FrameSink};
use tracing::{debug, info, warn};

use crate::error::TransportError;

/// Broker publisher.
#[derive(Debug, Clone)]
pub struct PubSub {
    client: Client,
    subject: String,
    encoding: Encoding,
    publish_timeout: Duration,
    flush_timeout: Duration,
}

impl PubSub {
    /// Connect to the broker.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Config`] for an empty subject and
    /// [`TransportError::Connect`] if the broker cannot be reached within
    /// the connect timeout.
    pub async fn connect(config: &TransportConfig) -> Result<Self, TransportError> {
        let subject = subject(config)?;

        info!(
            url = config.broker_url.as_str(),
            subject = subject.as_str(),
            client = config.client_name.as_str(),
            "connecting to broker"
        );
        let client = options(config)
            .connect(config.broker_url.as_str())
            .await
            .map_err(|e| TransportError::Connect {
                target: config.broker_url.clone(),
                reason: e.to_string(),
            })?;
        info!("broker connection ready");

        Ok(Self::with_client(client, subject, config))
    }

    fn with_client(client: Client, subject: String, config: &TransportConfig) -> Self {
        Self {
            client,
            subject,
            encoding: config.effective_encoding(),
            publish_timeout: config.write_timeout(),
            flush_timeout: config.connect_timeout(),
        }
    }

    /// The subject messages are published on.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Whether the client currently holds a live broker connection.
    pub fn is_connected(&self) -> bool {
        matches!(self.client.connection_state(), State::Connected)
    }

    async fn publish_all(&self, messages: Vec<Vec<u8>>) -> Result<(), DeliveryError> {
        let total = messages.len();
        let mut failed: usize = 0;
        let mut last_error = None;
        for payload in messages {
            if let Err(e) = self
                .client
                .publish(self.subject.clone(), payload.into())
                .await
            {
                failed = failed.saturating_add(1);
                last_error = Some(e);
            }
        }

        match last_error {
            None => Ok(()),
            Some(e) => Err(DeliveryError::Transport(format!(
                "{failed} of {total} publishes failed: {e}"
            ))),
        }
    }
}

/// Trimmed subject from `config`; empty is a configuration error.
fn subject(config: &TransportConfig) -> Result<String, TransportError> {
    let subject = config.topic.trim();
    if subject.is_empty() {
        return Err(TransportError::Config(String::from(
            "pub/sub subject is empty",
        )));
    }
    Ok(subject.to_owned())
}

fn options(config: &TransportConfig) -> ConnectOptions {
    let options = ConnectOptions::new()
        .name(&config.client_name)
        .connection_timeout(config.connect_timeout())
        .event_callback(|event| async move {
            match event {
                Event::Connected => info!("broker connection established"),
                Event::Disconnected => warn!("broker connection lost, reconnecting"),
                other => debug!(event = %other, "broker event"),
            }
        });
    if config.token.is_empty() {
        options
    } else {
        options.token(config.token.clone())
    }
}

impl FrameSink for PubSub {
    fn name(&self) -> &'static str {
        "pubsub"
    }

    fn encoding(&self) -> Encoding {
        self.encoding
    }

    async fn deliver(&mut self, frame: WireFrame) -> Result<Delivery, DeliveryError> {
        if !matches!(frame, WireFrame::Lines(_) | WireFrame::Records(_)) {
            return Err(DeliveryError::Unsupported {
                sink: self.name(),
                frame: frame.kind(),
            });
        }
        if !self.is_connected() {
            debug!(subject = self.subject.as_str(), "broker unavailable, dropping tick");
            return Ok(Delivery::Dropped);
        }

        let messages = frame.messages()?;
        match tokio::time::timeout(self.publish_timeout, self.publish_all(messages)).await {
            Ok(Ok(())) => Ok(Delivery::Sent),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(DeliveryError::Transport(format!(
                "publish batch not accepted within {}ms",
                self.publish_timeout.as_millis()
            ))),
        }
    }

    async fn close(&mut self) {
        match tokio::time::timeout(self.flush_timeout, self.client.flush()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "broker flush failed"),
            Err(_) => warn!(
                timeout = ?self.flush_timeout,
                "broker flush timed out, abandoning unsent messages"
            ),
        }
        info!(subject = self.subject.as_str(), "broker publisher closed");
    }
}
