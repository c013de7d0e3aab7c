//! Engine configuration
//!
//! Timing constants and the boot command list. Stored as TOML text
//! embedded in the firmware, or as postcard binary data with the
//! `serde` feature.

pub mod parse;
pub mod types;

pub use parse::parse_config;
pub use types::*;
