//! Tick scheduler.
//!
//! [`run_simulation`] is the only driver of forward progress. Each tick it
//!
//! 1. advances every agent (sequentially, in population order),
//! 2. snapshots the population into an immutable [`Frame`],
//! 3. encodes the frame for the active sink, and
//! 4. hands it to the sink.
//!
//! The loop ends when `max_ticks` is reached, when the shutdown future
//! resolves, or when the sink reports a fatal delivery error. Non-fatal
//! delivery errors are logged and counted; the next tick runs as usual.
//!
//! [`Frame`]: nautilus_types::Frame

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::SchedulerConfig;
use crate::encode::{Encoder, Encoding};
use crate::motion::MotionParams;
use crate::population::Population;
use crate::sink::{Delivery, DeliveryError, FrameSink};

/// Errors that end a simulation run early.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The sink lost its connection.
    #[error("fatal delivery failure at tick {tick}: {source}")]
    Delivery {
        /// The tick whose frame could not be delivered.
        tick: u64,
        /// The underlying delivery error.
        #[source]
        source: DeliveryError,
    },

    /// The encoder and the sink disagree on the wire format.
    #[error("encoder produces {encoder:?} but sink `{sink}` expects {expected:?}")]
    EncodingMismatch {
        /// What the encoder produces.
        encoder: Encoding,
        /// Sink name.
        sink: &'static str,
        /// What the sink expects.
        expected: Encoding,
    },
}

/// Why a run ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationEndReason {
    /// Reached the configured `max_ticks`.
    MaxTicksReached,
    /// The shutdown future resolved.
    Shutdown,
}

/// Tick period and run length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunBounds {
    /// Period of the tick source.
    pub tick_interval: Duration,
    /// Stop after this many ticks (0 = unbounded).
    pub max_ticks: u64,
}

impl From<&SchedulerConfig> for RunBounds {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            tick_interval: config.tick_interval(),
            max_ticks: config.max_ticks,
        }
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationResult {
    /// Why the run ended.
    pub end_reason: SimulationEndReason,
    /// Ticks executed.
    pub total_ticks: u64,
    /// Frames sent or handed to a detached task.
    pub delivered: u64,
    /// Frames discarded by the sink without an attempt.
    pub dropped: u64,
    /// Frames lost to non-fatal delivery errors.
    pub failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    total_ticks: u64,
    delivered: u64,
    dropped: u64,
    failed: u64,
}

/// Run the tick loop until a termination condition is met.
///
/// The sink is closed before this function returns, on every path.
///
/// # Errors
///
/// Returns [`RunnerError::EncodingMismatch`] before the first tick if the
/// encoder and sink disagree, or [`RunnerError::Delivery`] when the sink
/// reports a fatal error.
pub async fn run_simulation<S, F>(
    population: &mut Population,
    params: &MotionParams,
    encoder: &Encoder,
    sink: &mut S,
    bounds: &RunBounds,
    shutdown: F,
) -> Result<SimulationResult, RunnerError>
where
    S: FrameSink,
    F: Future<Output = ()>,
{
    if encoder.encoding() != sink.encoding() {
        sink.close().await;
        return Err(RunnerError::EncodingMismatch {
            encoder: encoder.encoding(),
            sink: sink.name(),
            expected: sink.encoding(),
        });
    }

    info!(
        agents = population.len(),
        seed = population.seed(),
        sink = sink.name(),
        tick_interval_ms = bounds.tick_interval.as_millis(),
        max_ticks = bounds.max_ticks,
        "Simulation starting"
    );

    tokio::pin!(shutdown);
    let mut interval = tokio::time::interval(bounds.tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut counters = Counters::default();

    let outcome = loop {
        tokio::select! {
            biased;
            () = &mut shutdown => {
                info!(tick = counters.total_ticks, "Shutdown requested");
                break Ok(SimulationEndReason::Shutdown);
            }
            _ = interval.tick() => {}
        }

        let tick = counters.total_ticks.saturating_add(1);
        population.advance(params);
        let frame = population.snapshot(tick, Utc::now().timestamp_millis());
        let wire = encoder.encode(&frame);

        match sink.deliver(wire).await {
            Ok(Delivery::Sent | Delivery::Detached) => {
                counters.delivered = counters.delivered.saturating_add(1);
            }
            Ok(Delivery::Dropped) => {
                counters.dropped = counters.dropped.saturating_add(1);
                debug!(tick, "Frame dropped by sink");
            }
            Err(e) if e.is_fatal() => {
                error!(tick, sink = sink.name(), error = %e, "Fatal delivery failure");
                break Err(RunnerError::Delivery { tick, source: e });
            }
            Err(e) => {
                counters.failed = counters.failed.saturating_add(1);
                warn!(tick, sink = sink.name(), error = %e, "Frame delivery failed");
            }
        }

        counters.total_ticks = tick;

        if bounds.max_ticks > 0 && tick >= bounds.max_ticks {
            info!(tick, max_ticks = bounds.max_ticks, "Tick limit reached");
            break Ok(SimulationEndReason::MaxTicksReached);
        }
    };

    sink.close().await;

    outcome.map(|end_reason| SimulationResult {
        end_reason,
        total_ticks: counters.total_ticks,
        delivered: counters.delivered,
        dropped: counters.dropped,
        failed: counters.failed,
    })
}

/// Log the end of a run.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        delivered = result.delivered,
        dropped = result.dropped,
        failed = result.failed,
        "Simulation ended"
    );
}
