//! Persistent WebSocket link to the dashboard's live channel.
//!
//! One authenticated socket is opened at startup and reused for every
//! tick. Each frame is written as a publish message on
//! `stream/{stream}`. Two background tasks share the link with the
//! scheduler: a keepalive that pings at a fixed period and a reader that
//! drains server traffic. Either one marks the link [`LinkState::Closed`]
//! when the socket fails, and the next `deliver` reports
//! [`DeliveryError::ConnectionLost`]. There is no reconnect.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use nautilus_core::config::TransportConfig;
use nautilus_core::encode::{EncodeError, Encoding, WireFrame};
use nautilus_core::sink::{Delivery, DeliveryError, FrameSink};
use nautilus_types::DataFrame;
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use crate::error::TransportError;

/// Path of the live WebSocket API.
const LIVE_PATH: &str = "/api/live/ws";

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = Arc<Mutex<SplitSink<WsStream, Message>>>;

/// Lifecycle of the socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Not yet dialed.
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Ready for frames.
    Connected,
    /// Failed or shut down. Terminal.
    Closed,
}

/// Publish request understood by the live channel.
#[derive(Debug, Serialize)]
struct PublishMessage<'a> {
    action: &'static str,
    channel: &'a str,
    data: &'a DataFrame,
}

/// Channel subscription sent right after the handshake.
#[derive(Debug, Serialize)]
struct SubscribeMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    channel: &'a str,
}

/// WebSocket sink over a single long-lived connection.
pub struct LiveSocket {
    writer: WsWriter,
    state: Arc<watch::Sender<LinkState>>,
    channel: String,
    encoding: Encoding,
    write_timeout: Duration,
    keepalive: JoinHandle<()>,
    reader: JoinHandle<()>,
}

impl std::fmt::Debug for LiveSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveSocket")
            .field("channel", &self.channel)
            .field("state", &self.state())
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

impl LiveSocket {
    /// Dial the live endpoint, authenticate, and start the background
    /// tasks.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Config`] for a malformed endpoint or
    /// token, and [`TransportError::Connect`] if the handshake fails or
    /// does not finish within the connect timeout.
    pub async fn connect(config: &TransportConfig) -> Result<Self, TransportError> {
        let url = websocket_url(&config.endpoint)?;
        let request = handshake_request(&url, &config.token, config.org_id)?;
        let channel = channel_name(&config.stream)?;
        let (state, _) = watch::channel(LinkState::Disconnected);
        let state = Arc::new(state);

        state.send_replace(LinkState::Connecting);
        info!(url = url.as_str(), channel = channel.as_str(), "connecting live socket");

        let (stream, response) = tokio::time::timeout(config.connect_timeout(), connect_async(request))
            .await
            .map_err(|elapsed| TransportError::Connect {
                target: url.clone(),
                reason: format!("handshake timed out: {elapsed}"),
            })?
            .map_err(|e| TransportError::Connect {
                target: url.clone(),
                reason: e.to_string(),
            })?;
        debug!(status = %response.status(), "live socket handshake complete");

        let (writer, reader) = stream.split();
        let writer: WsWriter = Arc::new(Mutex::new(writer));

        if config.subscribe_on_connect {
            let subscribe = serde_json::to_string(&SubscribeMessage {
                kind: "subscribe",
                channel: &channel,
            })
            .map_err(|e| TransportError::Config(format!("failed to encode subscribe: {e}")))?;
            write_text(&writer, subscribe, config.write_timeout())
                .await
                .map_err(|reason| TransportError::Connect {
                    target: url.clone(),
                    reason: format!("subscribe failed: {reason}"),
                })?;
            debug!(channel = channel.as_str(), "subscribed to live channel");
        }

        state.send_replace(LinkState::Connected);
        info!(url = url.as_str(), "live socket connected");

        let keepalive = tokio::spawn(keepalive(
            Arc::clone(&writer),
            Arc::clone(&state),
            config.keepalive_interval(),
            config.write_timeout(),
        ));
        let reader = tokio::spawn(read_loop(reader, Arc::clone(&state)));

        Ok(Self {
            writer,
            state,
            channel,
            encoding: config.effective_encoding(),
            write_timeout: config.write_timeout(),
            keepalive,
            reader,
        })
    }

    /// Current link state.
    pub fn state(&self) -> LinkState {
        *self.state.borrow()
    }

    /// The channel frames are published on.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    fn mark_closed(&self) {
        self.state.send_replace(LinkState::Closed);
    }
}

impl FrameSink for LiveSocket {
    fn name(&self) -> &'static str {
        "live-socket"
    }

    fn encoding(&self) -> Encoding {
        self.encoding
    }

    async fn deliver(&mut self, frame: WireFrame) -> Result<Delivery, DeliveryError> {
        if self.state() == LinkState::Closed {
            return Err(DeliveryError::ConnectionLost(String::from(
                "live socket is closed",
            )));
        }
        let kind = frame.kind();
        let WireFrame::DataFrame(data) = frame else {
            return Err(DeliveryError::Unsupported {
                sink: self.name(),
                frame: kind,
            });
        };

        let text = serde_json::to_string(&PublishMessage {
            action: "publish",
            channel: &self.channel,
            data: &data,
        })
        .map_err(|source| EncodeError {
            what: "data frame",
            source,
        })?;

        match write_text(&self.writer, text, self.write_timeout).await {
            Ok(()) => Ok(Delivery::Sent),
            Err(reason) => {
                self.mark_closed();
                Err(DeliveryError::ConnectionLost(reason))
            }
        }
    }

    async fn close(&mut self) {
        self.keepalive.abort();
        if self.state() != LinkState::Closed {
            let mut writer = self.writer.lock().await;
            if let Ok(Err(e)) =
                tokio::time::timeout(self.write_timeout, writer.send(Message::Close(None))).await
            {
                debug!(error = %e, "close frame not sent");
            }
            if let Ok(Err(e)) = tokio::time::timeout(self.write_timeout, writer.close()).await {
                debug!(error = %e, "socket close failed");
            }
        }
        self.reader.abort();
        self.mark_closed();
        info!(channel = self.channel.as_str(), "live socket closed");
    }
}

impl Drop for LiveSocket {
    fn drop(&mut self) {
        self.keepalive.abort();
        self.reader.abort();
    }
}

/// Write one text message under the write deadline.
async fn write_text(writer: &WsWriter, text: String, deadline: Duration) -> Result<(), String> {
    let mut writer = writer.lock().await;
    match tokio::time::timeout(deadline, writer.send(Message::Text(text.into()))).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(format!("write failed: {e}")),
        Err(elapsed) => Err(format!("write deadline exceeded: {elapsed}")),
    }
}

/// Ping at a fixed period until the link closes.
async fn keepalive(
    writer: WsWriter,
    state: Arc<watch::Sender<LinkState>>,
    period: Duration,
    deadline: Duration,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick completes immediately; the handshake just proved the link.
    ticker.tick().await;

    let closed = wait_closed(state.subscribe());
    tokio::pin!(closed);

    loop {
        tokio::select! {
            () = &mut closed => return,
            _ = ticker.tick() => {}
        }

        let result = {
            let mut writer = writer.lock().await;
            tokio::time::timeout(deadline, writer.send(Message::Ping(Vec::<u8>::new().into())))
                .await
        };
        match result {
            Ok(Ok(())) => debug!("keepalive ping sent"),
            Ok(Err(e)) => {
                warn!(error = %e, "keepalive ping failed");
                state.send_replace(LinkState::Closed);
                return;
            }
            Err(elapsed) => {
                warn!(error = %elapsed, "keepalive ping timed out");
                state.send_replace(LinkState::Closed);
                return;
            }
        }
    }
}

/// Drain server messages so control frames are processed.
async fn read_loop(mut reader: SplitStream<WsStream>, state: Arc<watch::Sender<LinkState>>) {
    while let Some(message) = reader.next().await {
        match message {
            Ok(Message::Text(text)) => debug!(len = text.len(), "live socket message"),
            Ok(Message::Close(frame)) => {
                info!(frame = ?frame, "live socket closed by server");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "live socket read failed");
                break;
            }
        }
    }
    state.send_replace(LinkState::Closed);
}

/// Resolve once the link state becomes [`LinkState::Closed`].
async fn wait_closed(mut state: watch::Receiver<LinkState>) {
    loop {
        let closed = *state.borrow_and_update() == LinkState::Closed;
        if closed || state.changed().await.is_err() {
            return;
        }
    }
}

/// Turn an `http(s)` or `ws(s)` endpoint into the live socket URL.
///
/// # Errors
///
/// Returns [`TransportError::Config`] for any other scheme.
pub fn websocket_url(endpoint: &str) -> Result<String, TransportError> {
    let endpoint = endpoint.trim_end_matches('/');
    let base = if let Some(rest) = endpoint.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = endpoint.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if endpoint.starts_with("ws://") || endpoint.starts_with("wss://") {
        endpoint.to_owned()
    } else {
        return Err(TransportError::Config(format!(
            "live socket endpoint must be an http(s) or ws(s) URL, got {endpoint:?}"
        )));
    };
    if base.ends_with(LIVE_PATH) {
        Ok(base)
    } else {
        Ok(format!("{base}{LIVE_PATH}"))
    }
}

/// `stream/{stream}`, the channel frames are published on.
///
/// # Errors
///
/// Returns [`TransportError::Config`] if the stream name is empty.
pub fn channel_name(stream: &str) -> Result<String, TransportError> {
    let stream = stream.trim_matches('/');
    if stream.is_empty() {
        return Err(TransportError::Config(String::from(
            "live socket stream name is empty",
        )));
    }
    Ok(format!("stream/{stream}"))
}

/// Build the upgrade request with bearer auth and the optional org header.
fn handshake_request(
    url: &str,
    token: &str,
    org_id: Option<u32>,
) -> Result<Request, TransportError> {
    let mut request = url
        .into_client_request()
        .map_err(|e| TransportError::Config(format!("invalid live socket URL {url}: {e}")))?;
    let headers = request.headers_mut();
    let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| TransportError::Config(format!("invalid token: {e}")))?;
    headers.insert("authorization", bearer);
    if let Some(org_id) = org_id {
        headers.insert("x-grafana-org-id", HeaderValue::from(org_id));
    }
    Ok(request)
}
