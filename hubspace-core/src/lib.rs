//! Board-agnostic engine for the HubSpace fan/light bridge
//!
//! This crate contains all protocol logic that does not depend on
//! specific hardware:
//!
//! - Paced, coalescing command queue with response timeouts
//! - Keepalive scheduling and the power-up boot sequence
//! - Echo suppression for self-issued changes (reconciliation)
//! - The [`ProtocolEngine`] tying them to a [`hubspace_hal::SerialLink`]
//! - Fan and light adapters for the host-facing side
//! - Configuration type definitions and parsing

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod boot;
pub mod config;
pub mod engine;
pub mod keepalive;
pub mod queue;
pub mod reconcile;
pub mod state;

pub use config::{parse_config, ConfigError, EngineConfig};
pub use engine::{ApplianceControl, DeviceStateSink, EngineError, LinkStats, ProtocolEngine};
pub use queue::{CommandQueue, QueueError, QueuedCommand};
pub use reconcile::{ChangeReconciler, PendingChange};
pub use state::{DeviceStatus, FanState, LightState};
