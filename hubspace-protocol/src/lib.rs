//! HubSpace Appliance Serial Protocol
//!
//! This crate defines the UART protocol between the controller and the
//! combined fan/light appliance. The link is half-duplex at 9600 8N1 and
//! every message is a fixed-length frame: there is no length prefix, no
//! escaping and no sequence numbering.
//!
//! # Protocol Overview
//!
//! Controller → appliance (command, 5 bytes):
//! ```text
//! ┌───────┬─────┬──────┬─────┬──────────┐
//! │ START │ CMD │ HIGH │ LOW │ CHECKSUM │
//! │ 1B    │ 1B  │ 1B   │ 1B  │ 1B       │
//! └───────┴─────┴──────┴─────┴──────────┘
//! ```
//!
//! Appliance → controller (status, 12 bytes):
//! ```text
//! ┌───────┬──────┬──────┬─────┬────────┬───────┬────────┬──────┬───────┬──────────┐
//! │ START │ RESP │ RSVD │ FAN │ BRIGHT │ COLOR │ TIMER  │ RSVD │ STAGE │ CHECKSUM │
//! │ 1B    │ 1B   │ 2B   │ 1B  │ 1B     │ 1B    │ 2B LE  │ 1B   │ 1B    │ 1B       │
//! └───────┴──────┴──────┴─────┴────────┴───────┴────────┴──────┴───────┴──────────┘
//! ```
//!
//! In both directions the checksum is the XOR of every preceding byte,
//! start marker included.

#![cfg_attr(not(any(feature = "std", test)), no_std)]
#![deny(unsafe_code)]

pub mod codes;
pub mod frame;
pub mod reassembler;

pub use codes::{BootCode, ColorTemp, CommandCode, FanDirection, FanSpeed, Stage};
pub use frame::{
    checksum, CommandFrame, FrameError, StatusFrame, COMMAND_FRAME_LEN, FRAME_START,
    STATUS_FRAME_LEN,
};
pub use reassembler::{Reassembled, StreamReassembler};
