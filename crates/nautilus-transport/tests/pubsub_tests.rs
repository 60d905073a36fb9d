//! Integration tests for the pub/sub sink.
//!
//! A minimal in-process broker speaks just enough of the NATS text protocol
//! for a client to connect and publish: it greets with `INFO`, answers
//! every `PING`, and records each `PUB` it reads.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use nautilus_core::config::{PopulationConfig, TransportConfig, TransportKind, WorldConfig};
use nautilus_core::encode::{Encoder, Encoding, WireFrame};
use nautilus_core::motion::MotionParams;
use nautilus_core::population::Population;
use nautilus_core::sink::{Delivery, FrameSink};
use nautilus_transport::PubSub;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

const INFO: &str = concat!(
    r#"INFO {"server_id":"nautilus-test","server_name":"nautilus-test","#,
    r#""version":"2.10.0","go":"go1.22","host":"127.0.0.1","port":4222,"#,
    r#""headers":true,"auth_required":false,"tls_required":false,"#,
    r#""max_payload":1048576,"proto":1,"client_id":1,"client_ip":"127.0.0.1"}"#,
    "\r\n"
);

#[derive(Debug, Clone)]
struct Published {
    subject: String,
    payload: Vec<u8>,
}

#[derive(Clone, Default)]
struct Broker {
    published: Arc<Mutex<Vec<Published>>>,
}

impl Broker {
    fn published(&self) -> Vec<Published> {
        self.published.lock().unwrap().clone()
    }
}

/// Serve one client. With `vanish` set the connection is dropped as soon
/// as the connect handshake has been answered.
async fn handle_client(stream: TcpStream, broker: Broker, vanish: bool) {
    let (read, mut write) = stream.into_split();
    let mut reader = BufReader::new(read);
    if write.write_all(INFO.as_bytes()).await.is_err() {
        return;
    }

    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        let op = line.trim_end();
        if op.starts_with("PING") {
            if write.write_all(b"PONG\r\n").await.is_err() || vanish {
                return;
            }
        } else if let Some(args) = op.strip_prefix("PUB ") {
            let parts: Vec<&str> = args.split_whitespace().collect();
            let len: usize = parts.last().unwrap().parse().unwrap();
            let mut payload = vec![0_u8; len];
            let mut crlf = [0_u8; 2];
            if reader.read_exact(&mut payload).await.is_err()
                || reader.read_exact(&mut crlf).await.is_err()
            {
                return;
            }
            broker.published.lock().unwrap().push(Published {
                subject: parts[0].to_owned(),
                payload,
            });
        }
    }
}

async fn serve(broker: Broker) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(handle_client(stream, broker.clone(), false));
        }
    });
    addr
}

/// Accept exactly one client, complete its handshake, then go away for
/// good: the socket is dropped and the port stops listening.
async fn serve_once(broker: Broker) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Ok((stream, _)) = listener.accept().await {
            drop(listener);
            handle_client(stream, broker, true).await;
        }
    });
    addr
}

fn config(addr: SocketAddr) -> TransportConfig {
    TransportConfig {
        kind: TransportKind::PubSub,
        broker_url: format!("nats://{addr}"),
        topic: String::from("boids.positions"),
        connect_timeout_ms: 500,
        write_timeout_ms: 200,
        ..TransportConfig::default()
    }
}

fn population(size: usize) -> Population {
    let config = PopulationConfig {
        size,
        ..PopulationConfig::default()
    };
    Population::spawn(&config, &WorldConfig::default(), 5)
}

/// Poll until `check` holds or two seconds pass.
async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

#[tokio::test]
async fn one_message_per_agent_on_the_subject() {
    let broker = Broker::default();
    let addr = serve(broker.clone()).await;
    let mut config = config(addr);
    config.encoding = Some(Encoding::LineProtocol);
    let mut sink = PubSub::connect(&config).await.unwrap();
    assert!(eventually(|| sink.is_connected()).await);
    assert_eq!(sink.encoding(), Encoding::LineProtocol);

    let wire = Encoder::new(Encoding::LineProtocol).encode(&population(3).snapshot(1, 1_000));
    assert_eq!(sink.deliver(wire).await.unwrap(), Delivery::Sent);
    sink.close().await;

    assert!(eventually(|| broker.published().len() == 3).await);
    let published = broker.published();
    assert!(published.iter().all(|p| p.subject == "boids.positions"));
    assert!(published[0].payload.starts_with(b"boids,id=boid-000 "));
    assert!(published[2].payload.starts_with(b"boids,id=boid-002 "));
}

#[tokio::test]
async fn agent_records_are_published_as_json() {
    let broker = Broker::default();
    let addr = serve(broker.clone()).await;
    let mut sink = PubSub::connect(&config(addr)).await.unwrap();
    assert!(eventually(|| sink.is_connected()).await);
    assert_eq!(sink.encoding(), Encoding::AgentJson);

    let wire = Encoder::new(Encoding::AgentJson).encode(&population(2).snapshot(4, 2_000));
    assert!(matches!(wire, WireFrame::Records(_)));
    assert_eq!(sink.deliver(wire).await.unwrap(), Delivery::Sent);
    sink.close().await;

    assert!(eventually(|| broker.published().len() == 2).await);
    let record: Value = serde_json::from_slice(&broker.published()[1].payload).unwrap();
    assert_eq!(record["id"], "boid-001");
    assert!(record["rotation"].is_number());
}

#[tokio::test]
async fn broker_outage_drops_ticks_without_stalling() {
    let addr = serve_once(Broker::default()).await;
    let config = config(addr);
    let mut sink = PubSub::connect(&config).await.unwrap();
    let encoder = Encoder::new(Encoding::LineProtocol);
    let mut population = population(50);

    // Every deliver must come back promptly, whatever it reports, and once
    // the client notices the broker is gone ticks are dropped.
    let outcome = tokio::time::timeout(Duration::from_secs(5), async {
        for tick in 1..=500 {
            population.advance(&MotionParams::default());
            let wire = encoder.encode(&population.snapshot(tick, 0));
            if let Ok(Delivery::Dropped) = sink.deliver(wire).await {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    })
    .await;
    assert!(matches!(outcome, Ok(true)));
    assert!(!sink.is_connected());

    let closed = tokio::time::timeout(Duration::from_millis(1_500), sink.close()).await;
    assert!(closed.is_ok());
}
