//! Motion model, population, frame encoding, and tick scheduling for the
//! Nautilus simulator.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `nautilus-config.yaml` plus
//!   environment overrides.
//! - [`motion`] -- The per-agent update: Euler step, boundary steering,
//!   speed clamp, heading.
//! - [`population`] -- Seeded population initialization and snapshots.
//! - [`encode`] -- Projection of a frame into the wire shape a sink needs.
//! - [`sink`] -- The [`FrameSink`] seam implemented by the transports.
//! - [`runner`] -- The fixed-interval tick loop.
//!
//! [`FrameSink`]: sink::FrameSink

pub mod config;
pub mod encode;
pub mod motion;
pub mod population;
pub mod runner;
pub mod sink;
