//! Error types for the simulator binary.
//!
//! [`EngineError`] wraps every failure that can end the process early so
//! `main` can propagate with `?`.

/// Top-level error for the simulator binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: nautilus_core::config::ConfigError,
    },

    /// The sink could not be built or connected.
    #[error("transport error: {source}")]
    Transport {
        /// The underlying transport error.
        #[from]
        source: nautilus_transport::TransportError,
    },

    /// The run ended on a fatal error.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: nautilus_core::runner::RunnerError,
    },
}
