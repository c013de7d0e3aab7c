//! Embedded engine configuration
//!
//! hubspace.toml is compiled into the image; build.rs has already
//! checked it, so a parse failure here means the two validators
//! disagree. In that case the built-in defaults are used.

use defmt::*;

use hubspace_core::{parse_config, EngineConfig};

/// Embedded configuration (edit hubspace.toml and rebuild to customize)
const EMBEDDED_CONFIG: &str = include_str!("../hubspace.toml");

/// Parse the embedded configuration, falling back to defaults
pub fn load() -> EngineConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!(
                "Config: timeout={}ms spacing={}ms keepalive={}ms boot={} cmds",
                config.response_timeout_ms,
                config.min_spacing_ms,
                config.keepalive_interval_ms,
                config.boot_commands.len()
            );
            config
        }
        Err(e) => {
            error!("Failed to parse embedded config: {}", e);
            error!("Using built-in defaults");
            EngineConfig::default()
        }
    }
}
