//! Configuration loading and typed config structures for the simulator.
//!
//! The canonical configuration lives in `nautilus-config.yaml`. Every field
//! has a default, so the file is optional: a deployment can run from the
//! environment alone. Environment variables override the destination
//! settings after parsing:
//!
//! | variable | field |
//! |---|---|
//! | `NAUTILUS_TRANSPORT` | `transport.kind` |
//! | `GRAFANA_URL` | `transport.endpoint` |
//! | `GRAFANA_TOKEN` | `transport.token` |
//! | `GRAFANA_STREAM` | `transport.stream` |
//! | `BROKER_URL` | `transport.broker_url` |
//! | `BROKER_TOPIC` | `transport.topic` |
//! | `NAUTILUS_SEED` | `simulation.seed` |
//!
//! [`SimulationConfig::validate`] must pass before the config is handed to
//! the scheduler or a sink.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::encode::Encoding;

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A setting required by the selected transport is empty.
    #[error("missing required setting `{field}`")]
    Missing {
        /// Dotted path of the missing setting.
        field: &'static str,
    },

    /// A setting is present but out of range or unparseable.
    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending setting.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The chosen encoding cannot be carried by the chosen transport.
    #[error("transport {transport:?} cannot carry {encoding:?} frames")]
    Incompatible {
        /// The configured transport.
        transport: TransportKind,
        /// The configured encoding.
        encoding: Encoding,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulator configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Scheduling and reproducibility settings.
    #[serde(default)]
    pub simulation: SchedulerConfig,

    /// Population size and initial speed band.
    #[serde(default)]
    pub population: PopulationConfig,

    /// World extent and motion parameters.
    #[serde(default)]
    pub world: WorldConfig,

    /// Destination and delivery settings.
    #[serde(default)]
    pub transport: TransportConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if an override cannot be parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if an override cannot be parsed.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Build a configuration from defaults plus environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if an override cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if an override cannot be parsed.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if an override cannot be parsed.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(val) = get("NAUTILUS_TRANSPORT") {
            self.transport.kind = val.parse()?;
        }
        if let Some(val) = get("GRAFANA_URL") {
            self.transport.endpoint = val;
        }
        if let Some(val) = get("GRAFANA_TOKEN") {
            self.transport.token = val;
        }
        if let Some(val) = get("GRAFANA_STREAM") {
            self.transport.stream = val;
        }
        if let Some(val) = get("BROKER_URL") {
            self.transport.broker_url = val;
        }
        if let Some(val) = get("BROKER_TOPIC") {
            self.transport.topic = val;
        }
        if let Some(val) = get("NAUTILUS_SEED") {
            let seed = val.trim().parse().map_err(|e| ConfigError::Invalid {
                field: "simulation.seed",
                reason: format!("{e}"),
            })?;
            self.simulation.seed = Some(seed);
        }
        Ok(())
    }

    /// Check ranges and the settings the selected transport needs.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulation.tick_interval_ms == 0 {
            return Err(invalid("simulation.tick_interval_ms", "must be at least 1"));
        }
        if self.population.size == 0 {
            return Err(invalid("population.size", "must be at least 1"));
        }
        if !(self.population.speed_min >= 0.0
            && self.population.speed_min <= self.population.speed_max
            && self.population.speed_max.is_finite())
        {
            return Err(invalid(
                "population.speed_min",
                "speed band must satisfy 0 <= speed_min <= speed_max",
            ));
        }
        if !(self.world.half_width > 0.0 && self.world.half_height > 0.0) {
            return Err(invalid("world.half_width", "half extents must be positive"));
        }
        if !(0.0..1.0).contains(&self.world.margin) {
            return Err(invalid("world.margin", "must be in [0, 1)"));
        }
        if !(self.world.speed_limit > 0.0 && self.world.speed_limit.is_finite()) {
            return Err(invalid("world.speed_limit", "must be positive"));
        }
        if !(self.world.turn_factor >= 0.0 && self.world.turn_factor.is_finite()) {
            return Err(invalid("world.turn_factor", "must be non-negative"));
        }

        self.transport.validate()
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_owned(),
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Tick scheduling and reproducibility settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SchedulerConfig {
    /// Seed for population initialization. `None` draws a fresh seed.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Real-time milliseconds between ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Stop after this many ticks (0 = run until shut down).
    #[serde(default)]
    pub max_ticks: u64,
}

impl SchedulerConfig {
    /// Tick period as a [`Duration`].
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            seed: None,
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Population
// ---------------------------------------------------------------------------

/// Population size and initial speed band.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PopulationConfig {
    /// Number of agents, fixed for the lifetime of the run.
    #[serde(default = "default_population_size")]
    pub size: usize,

    /// Lower bound of the initial speed draw.
    #[serde(default = "default_speed_min")]
    pub speed_min: f64,

    /// Upper bound of the initial speed draw.
    #[serde(default = "default_speed_max")]
    pub speed_max: f64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: default_population_size(),
            speed_min: default_speed_min(),
            speed_max: default_speed_max(),
        }
    }
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// World extent and motion parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldConfig {
    /// Half of the world width; x spans `[-half_width, half_width]`.
    #[serde(default = "default_half_extent")]
    pub half_width: f64,

    /// Half of the world height; y spans `[-half_height, half_height]`.
    #[serde(default = "default_half_extent")]
    pub half_height: f64,

    /// Fraction of the half extent, measured in from each edge, inside
    /// which boundary steering applies.
    #[serde(default = "default_margin")]
    pub margin: f64,

    /// Velocity nudge applied per tick inside the margin.
    #[serde(default = "default_turn_factor")]
    pub turn_factor: f64,

    /// Maximum velocity magnitude.
    #[serde(default = "default_speed_limit")]
    pub speed_limit: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            half_width: default_half_extent(),
            half_height: default_half_extent(),
            margin: default_margin(),
            turn_factor: default_turn_factor(),
            speed_limit: default_speed_limit(),
        }
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Which delivery discipline carries frames to the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// One HTTP `POST` per tick, detached from the tick loop.
    #[default]
    BatchPush,
    /// A persistent WebSocket, one frame written per tick.
    LiveSocket,
    /// A persistent broker client, one message per agent per tick.
    PubSub,
}

impl TransportKind {
    /// Encoding used when none is configured.
    pub const fn default_encoding(self) -> Encoding {
        match self {
            Self::BatchPush => Encoding::Envelope,
            Self::LiveSocket => Encoding::DataFrameRows,
            Self::PubSub => Encoding::AgentJson,
        }
    }

    /// Whether this transport can carry frames in `encoding`.
    pub const fn accepts(self, encoding: Encoding) -> bool {
        match self {
            Self::BatchPush => matches!(
                encoding,
                Encoding::Envelope | Encoding::DataFrameRows | Encoding::DataFrameColumns
            ),
            Self::LiveSocket => {
                matches!(encoding, Encoding::DataFrameRows | Encoding::DataFrameColumns)
            }
            Self::PubSub => matches!(encoding, Encoding::LineProtocol | Encoding::AgentJson),
        }
    }
}

impl core::str::FromStr for TransportKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "batch_push" | "http" | "push" => Ok(Self::BatchPush),
            "live_socket" | "websocket" | "ws" => Ok(Self::LiveSocket),
            "pub_sub" | "pubsub" | "nats" | "broker" => Ok(Self::PubSub),
            other => Err(ConfigError::Invalid {
                field: "transport.kind",
                reason: format!("unknown transport: {other}"),
            }),
        }
    }
}

/// Destination and delivery settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransportConfig {
    /// Active transport.
    #[serde(default)]
    pub kind: TransportKind,

    /// Wire encoding; `None` selects the transport's default.
    #[serde(default)]
    pub encoding: Option<Encoding>,

    /// Backend base URL (`https://grafana.example.com`).
    #[serde(default)]
    pub endpoint: String,

    /// Bearer token sent with every request or handshake.
    #[serde(default)]
    pub token: String,

    /// Live stream name (`/api/live/push/{stream}`, `stream/{stream}`).
    #[serde(default = "default_stream")]
    pub stream: String,

    /// Optional `X-Grafana-Org-Id` header value for the live socket.
    #[serde(default)]
    pub org_id: Option<u32>,

    /// Send a `subscribe` control message right after the handshake.
    #[serde(default)]
    pub subscribe_on_connect: bool,

    /// Broker URL for the pub/sub transport (`nats://host:4222`).
    #[serde(default)]
    pub broker_url: String,

    /// Broker subject each agent record is published on.
    #[serde(default)]
    pub topic: String,

    /// Client name announced to the broker.
    #[serde(default = "default_client_name")]
    pub client_name: String,

    /// Measurement name for line-protocol records.
    #[serde(default = "default_measurement")]
    pub measurement: String,

    /// Attach an annotation record to batch push envelopes.
    #[serde(default)]
    pub annotate: bool,

    /// Per-request timeout for batch push.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Maximum concurrently outstanding batch push requests.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Deadline for a single live socket write.
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,

    /// Deadline for the initial handshake or broker connect.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Interval between live socket keepalive pings.
    #[serde(default = "default_keepalive_interval_ms")]
    pub keepalive_interval_ms: u64,
}

impl TransportConfig {
    /// The configured encoding, or the transport's default.
    pub fn effective_encoding(&self) -> Encoding {
        self.encoding.unwrap_or_else(|| self.kind.default_encoding())
    }

    /// Batch push request timeout.
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Per-tick write deadline for the live socket and pub/sub sinks.
    pub const fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    /// Initial connect deadline.
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Keepalive ping period.
    pub const fn keepalive_interval(&self) -> Duration {
        Duration::from_millis(self.keepalive_interval_ms)
    }

    /// Check the settings the selected transport requires.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] for an empty required setting,
    /// [`ConfigError::Invalid`] for a zero timeout, or
    /// [`ConfigError::Incompatible`] for an encoding the transport cannot
    /// carry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let encoding = self.effective_encoding();
        if !self.kind.accepts(encoding) {
            return Err(ConfigError::Incompatible {
                transport: self.kind,
                encoding,
            });
        }

        match self.kind {
            TransportKind::BatchPush => {
                require(&self.endpoint, "transport.endpoint")?;
                require(&self.stream, "transport.stream")?;
                if self.request_timeout_ms == 0 {
                    return Err(invalid("transport.request_timeout_ms", "must be at least 1"));
                }
                if self.max_in_flight == 0 {
                    return Err(invalid("transport.max_in_flight", "must be at least 1"));
                }
            }
            TransportKind::LiveSocket => {
                require(&self.endpoint, "transport.endpoint")?;
                require(&self.token, "transport.token")?;
                require(&self.stream, "transport.stream")?;
                if self.write_timeout_ms == 0 {
                    return Err(invalid("transport.write_timeout_ms", "must be at least 1"));
                }
                if self.keepalive_interval_ms == 0 {
                    return Err(invalid("transport.keepalive_interval_ms", "must be at least 1"));
                }
            }
            TransportKind::PubSub => {
                require(&self.broker_url, "transport.broker_url")?;
                require(&self.topic, "transport.topic")?;
            }
        }

        if self.connect_timeout_ms == 0 {
            return Err(invalid("transport.connect_timeout_ms", "must be at least 1"));
        }
        Ok(())
    }
}

fn require(value: &str, field: &'static str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::Missing { field })
    } else {
        Ok(())
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::default(),
            encoding: None,
            endpoint: String::new(),
            token: String::new(),
            stream: default_stream(),
            org_id: None,
            subscribe_on_connect: false,
            broker_url: String::new(),
            topic: String::new(),
            client_name: default_client_name(),
            measurement: default_measurement(),
            annotate: false,
            request_timeout_ms: default_request_timeout_ms(),
            max_in_flight: default_max_in_flight(),
            write_timeout_ms: default_write_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            keepalive_interval_ms: default_keepalive_interval_ms(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_tick_interval_ms() -> u64 {
    10
}

const fn default_population_size() -> usize {
    100
}

const fn default_speed_min() -> f64 {
    0.005
}

const fn default_speed_max() -> f64 {
    0.010
}

const fn default_half_extent() -> f64 {
    1.0
}

const fn default_margin() -> f64 {
    0.1
}

const fn default_turn_factor() -> f64 {
    0.001
}

const fn default_speed_limit() -> f64 {
    0.2
}

fn default_stream() -> String {
    String::from("nautilus_stream")
}

fn default_client_name() -> String {
    String::from("boids-simulator")
}

fn default_measurement() -> String {
    String::from("boids")
}

const fn default_request_timeout_ms() -> u64 {
    5000
}

const fn default_max_in_flight() -> usize {
    64
}

const fn default_write_timeout_ms() -> u64 {
    1000
}

const fn default_connect_timeout_ms() -> u64 {
    10_000
}

const fn default_keepalive_interval_ms() -> u64 {
    15_000
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn parse_without_env(yaml: &str) -> SimulationConfig {
        serde_yml::from_str(yaml).unwrap_or_default()
    }

    #[test]
    fn defaults_match_reference_constants() {
        let config = SimulationConfig::default();
        assert_eq!(config.population.size, 100);
        assert_eq!(config.simulation.tick_interval_ms, 10);
        assert_eq!(config.simulation.max_ticks, 0);
        assert!((config.world.margin - 0.1).abs() < f64::EPSILON);
        assert!((config.world.turn_factor - 0.001).abs() < f64::EPSILON);
        assert!((config.world.speed_limit - 0.2).abs() < f64::EPSILON);
        assert_eq!(config.transport.kind, TransportKind::BatchPush);
        assert_eq!(config.transport.stream, "nautilus_stream");
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
simulation:
  seed: 99
  tick_interval_ms: 50
  max_ticks: 20

population:
  size: 12
  speed_min: 0.001
  speed_max: 0.002

world:
  half_width: 448.0
  half_height: 298.5
  margin: 0.05
  turn_factor: 0.01
  speed_limit: 0.5

transport:
  kind: live_socket
  encoding: data_frame_columns
  endpoint: "https://grafana.local"
  token: "secret"
  stream: "boids"
  org_id: 1
  subscribe_on_connect: true
  write_timeout_ms: 250
"#;
        let config = parse_without_env(yaml);
        assert_eq!(config.simulation.seed, Some(99));
        assert_eq!(config.simulation.max_ticks, 20);
        assert_eq!(config.population.size, 12);
        assert!((config.world.half_width - 448.0).abs() < f64::EPSILON);
        assert_eq!(config.transport.kind, TransportKind::LiveSocket);
        assert_eq!(config.transport.effective_encoding(), Encoding::DataFrameColumns);
        assert_eq!(config.transport.org_id, Some(1));
        assert_eq!(config.transport.write_timeout(), Duration::from_millis(250));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_minimal_yaml_keeps_defaults() {
        let config = parse_without_env("population:\n  size: 3\n");
        assert_eq!(config.population.size, 3);
        assert_eq!(config.simulation.tick_interval_ms, 10);
        assert!((config.population.speed_max - 0.010).abs() < f64::EPSILON);
    }

    #[test]
    fn env_overrides_destination() {
        let mut config = SimulationConfig::default();
        let result = config.apply_overrides(lookup(&[
            ("NAUTILUS_TRANSPORT", "pubsub"),
            ("BROKER_URL", "nats://broker:4222"),
            ("BROKER_TOPIC", "boids.positions"),
            ("NAUTILUS_SEED", "7"),
        ]));
        assert!(result.is_ok());
        assert_eq!(config.transport.kind, TransportKind::PubSub);
        assert_eq!(config.transport.broker_url, "nats://broker:4222");
        assert_eq!(config.transport.topic, "boids.positions");
        assert_eq!(config.simulation.seed, Some(7));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = SimulationConfig::default();
        config.transport.endpoint = String::from("http://kept");
        let result = config.apply_overrides(lookup(&[("GRAFANA_URL", "  ")]));
        assert!(result.is_ok());
        assert_eq!(config.transport.endpoint, "http://kept");
    }

    #[test]
    fn bad_seed_override_is_rejected() {
        let mut config = SimulationConfig::default();
        let result = config.apply_overrides(lookup(&[("NAUTILUS_SEED", "forty-two")]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "simulation.seed",
                ..
            })
        ));
    }

    #[test]
    fn unknown_transport_is_rejected() {
        assert!("carrier-pigeon".parse::<TransportKind>().is_err());
        assert_eq!("WebSocket".parse::<TransportKind>().ok(), Some(TransportKind::LiveSocket));
        assert_eq!("batch-push".parse::<TransportKind>().ok(), Some(TransportKind::BatchPush));
    }

    #[test]
    fn batch_push_requires_endpoint() {
        let config = SimulationConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing {
                field: "transport.endpoint"
            })
        ));
    }

    #[test]
    fn live_socket_requires_token() {
        let mut config = SimulationConfig::default();
        config.transport.kind = TransportKind::LiveSocket;
        config.transport.endpoint = String::from("http://grafana:3000");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing {
                field: "transport.token"
            })
        ));
    }

    #[test]
    fn pub_sub_requires_topic() {
        let mut config = SimulationConfig::default();
        config.transport.kind = TransportKind::PubSub;
        config.transport.broker_url = String::from("nats://localhost:4222");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing {
                field: "transport.topic"
            })
        ));
    }

    #[test]
    fn incompatible_encoding_is_rejected() {
        let mut config = SimulationConfig::default();
        config.transport.endpoint = String::from("http://grafana:3000");
        config.transport.encoding = Some(Encoding::LineProtocol);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Incompatible {
                transport: TransportKind::BatchPush,
                encoding: Encoding::LineProtocol,
            })
        ));
    }

    #[test]
    fn out_of_range_motion_parameters_are_rejected() {
        let mut config = SimulationConfig::default();
        config.transport.endpoint = String::from("http://grafana:3000");
        assert!(config.validate().is_ok());

        config.world.margin = 1.0;
        assert!(config.validate().is_err());

        config.world.margin = 0.1;
        config.world.speed_limit = 0.0;
        assert!(config.validate().is_err());

        config.world.speed_limit = 0.2;
        config.population.speed_min = 0.02;
        assert!(config.validate().is_err());
    }

    #[test]
    fn every_transport_accepts_its_default_encoding() {
        for kind in [
            TransportKind::BatchPush,
            TransportKind::LiveSocket,
            TransportKind::PubSub,
        ] {
            assert!(kind.accepts(kind.default_encoding()));
        }
    }

    #[test]
    fn shipped_config_file_is_valid() {
        let yaml = include_str!("../../../nautilus-config.yaml");
        let config: Result<SimulationConfig, _> = serde_yml::from_str(yaml);
        assert!(config.is_ok_and(|c| c.validate().is_ok()));
    }
}
