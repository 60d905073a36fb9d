//! HTTP batch push to the dashboard's live push endpoint.
//!
//! Every tick becomes one `POST {endpoint}/api/live/push/{stream}` carrying
//! the whole population. Requests run on detached tasks so the tick loop
//! never waits for the network; at most `max_in_flight` requests are
//! outstanding at once and further frames are dropped until one finishes.

use std::sync::Arc;
use std::time::Duration;

use nautilus_core::config::TransportConfig;
use nautilus_core::encode::{Encoding, WireFrame};
use nautilus_core::sink::{Delivery, DeliveryError, FrameSink};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::error::TransportError;

/// Path prefix of the live push API.
const PUSH_PATH: &str = "/api/live/push";

/// Fire-and-forget HTTP sink.
#[derive(Debug, Clone)]
pub struct BatchPush {
    client: reqwest::Client,
    url: String,
    token: Arc<str>,
    encoding: Encoding,
    in_flight: Arc<Semaphore>,
    max_in_flight: usize,
    request_timeout: Duration,
}

impl BatchPush {
    /// Build the sink. No request is made until the first frame.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Config`] if the endpoint is not an
    /// `http(s)` URL or the HTTP client cannot be built.
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let url = push_url(&config.endpoint, &config.stream)?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| TransportError::Config(format!("failed to build HTTP client: {e}")))?;
        let max_in_flight = config.max_in_flight.max(1);

        info!(
            url = url.as_str(),
            max_in_flight = max_in_flight,
            timeout_ms = config.request_timeout_ms,
            "batch push sink ready"
        );

        Ok(Self {
            client,
            url,
            token: Arc::from(config.token.as_str()),
            encoding: config.effective_encoding(),
            in_flight: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
            request_timeout: config.request_timeout(),
        })
    }

    /// The full push URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Number of requests currently outstanding.
    pub fn in_flight(&self) -> usize {
        self.max_in_flight
            .saturating_sub(self.in_flight.available_permits())
    }

    fn request(&self, body: Vec<u8>) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .body(body);
        if !self.token.is_empty() {
            request = request.header("Authorization", format!("Bearer {}", self.token));
        }
        request
    }
}

impl FrameSink for BatchPush {
    fn name(&self) -> &'static str {
        "batch-push"
    }

    fn encoding(&self) -> Encoding {
        self.encoding
    }

    async fn deliver(&mut self, frame: WireFrame) -> Result<Delivery, DeliveryError> {
        if !matches!(frame, WireFrame::Envelope(_) | WireFrame::DataFrame(_)) {
            return Err(DeliveryError::Unsupported {
                sink: self.name(),
                frame: frame.kind(),
            });
        }
        let body = frame.body()?;

        let Ok(permit) = Arc::clone(&self.in_flight).try_acquire_owned() else {
            warn!(
                in_flight = self.max_in_flight,
                "push capacity exhausted, dropping frame"
            );
            return Ok(Delivery::Dropped);
        };

        let request = self.request(body);
        tokio::spawn(async move {
            if let Err(e) = send(request).await {
                warn!(error = %e, "batch push failed");
            }
            drop(permit);
        });
        Ok(Delivery::Detached)
    }

    async fn close(&mut self) {
        let outstanding = self.in_flight();
        if outstanding == 0 {
            return;
        }
        debug!(outstanding = outstanding, "waiting for in-flight pushes");
        let permits = u32::try_from(self.max_in_flight).unwrap_or(u32::MAX);
        match tokio::time::timeout(self.request_timeout, self.in_flight.acquire_many(permits))
            .await
        {
            Ok(Ok(_all)) => debug!("in-flight pushes drained"),
            Ok(Err(e)) => warn!(error = %e, "push semaphore closed"),
            Err(_elapsed) => warn!(
                outstanding = self.in_flight(),
                "abandoning in-flight pushes"
            ),
        }
        self.in_flight.close();
    }
}

/// Send one push request and classify the outcome.
///
/// # Errors
///
/// Returns [`DeliveryError::Transport`] when the request never got an
/// answer and [`DeliveryError::Rejected`] on a non-2xx status.
pub async fn send(request: reqwest::RequestBuilder) -> Result<(), DeliveryError> {
    let response = request
        .send()
        .await
        .map_err(|e| DeliveryError::Transport(format!("push request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read error body".to_owned());
        return Err(DeliveryError::Rejected(format!(
            "push returned {status}: {error_body}"
        )));
    }
    Ok(())
}

/// Build `{endpoint}/api/live/push/{stream}`.
///
/// # Errors
///
/// Returns [`TransportError::Config`] if the endpoint scheme is not
/// `http` or `https`, or the stream name is empty.
pub fn push_url(endpoint: &str, stream: &str) -> Result<String, TransportError> {
    let endpoint = endpoint.trim_end_matches('/');
    if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
        return Err(TransportError::Config(format!(
            "batch push endpoint must be an http(s) URL, got {endpoint:?}"
        )));
    }
    let stream = stream.trim_matches('/');
    if stream.is_empty() {
        return Err(TransportError::Config(String::from(
            "batch push stream name is empty",
        )));
    }
    Ok(format!("{endpoint}{PUSH_PATH}/{stream}"))
}
