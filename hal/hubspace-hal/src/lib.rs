//! HubSpace Hardware Abstraction Layer
//!
//! This crate defines the narrow hardware interface the protocol engine
//! consumes. Board crates (the RP2040 firmware, host simulators, test
//! doubles) implement these traits so the same engine code runs
//! everywhere.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  hubspace-core (ProtocolEngine)         │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  hubspace-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ RP2040 UART   │       │ test doubles  │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::SerialLink`] - Non-blocking byte transport to the appliance
//! - [`clock::Clock`] - Monotonic millisecond clock

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use clock::Clock;
pub use uart::{DataBits, Parity, SerialLink, StopBits, UartConfig};
