//! Configuration type definitions

use heapless::Vec;
use hubspace_protocol::codes::{BOOT_CODE_FIRST, BOOT_CODE_LAST};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum number of boot-sequence commands
pub const MAX_BOOT_COMMANDS: usize = 8;

/// Default wait for a command's status response
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u32 = 1000;

/// Default minimum gap between two transmissions
pub const DEFAULT_MIN_SPACING_MS: u32 = 50;

/// Default keepalive period
pub const DEFAULT_KEEPALIVE_INTERVAL_MS: u32 = 200;

/// Default pause after each boot command
pub const DEFAULT_BOOT_SETTLE_MS: u32 = 100;

/// Default lifetime of an unconfirmed expectation
pub const DEFAULT_EXPECTATION_TIMEOUT_MS: u32 = 5000;

/// Default silence after which the link is reported unhealthy
pub const DEFAULT_LINK_TIMEOUT_MS: u32 = 3000;

/// Boot codes sent by default, in order
pub const DEFAULT_BOOT_COMMANDS: [u8; 5] = [0x09, 0x0A, 0x0B, 0x0C, 0x0D];

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Unknown `[section]` header
    InvalidSection,
    /// Key not recognised in its section
    UnknownKey,
    /// Value could not be parsed for its key
    InvalidValue,
    /// Boot command outside 0x09-0x0E
    BootCodeOutOfRange(u8),
    /// More than [`MAX_BOOT_COMMANDS`] boot commands
    TooManyBootCommands,
    /// A timing value that must be non-zero is zero
    ZeroInterval,
    /// Serialization failed
    Serialize,
    /// Deserialization failed
    Deserialize,
}

/// Engine timing and boot configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EngineConfig {
    /// How long to wait for the status answering a command
    pub response_timeout_ms: u32,
    /// Minimum gap between any two transmissions
    pub min_spacing_ms: u32,
    /// Keepalive period
    pub keepalive_interval_ms: u32,
    /// Pause after each boot command
    pub boot_settle_ms: u32,
    /// Drop an unconfirmed expectation after this long (0 = never)
    pub expectation_timeout_ms: u32,
    /// Link is unhealthy after this long without a valid frame
    pub link_timeout_ms: u32,
    /// Re-send the last known fan speed and brightness after boot
    pub restore_on_boot: bool,
    /// Boot command codes, sent in order with zero payload
    pub boot_commands: Vec<u8, MAX_BOOT_COMMANDS>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let mut boot_commands = Vec::new();
        for code in DEFAULT_BOOT_COMMANDS {
            // Capacity exceeds the default list
            let _ = boot_commands.push(code);
        }

        Self {
            response_timeout_ms: DEFAULT_RESPONSE_TIMEOUT_MS,
            min_spacing_ms: DEFAULT_MIN_SPACING_MS,
            keepalive_interval_ms: DEFAULT_KEEPALIVE_INTERVAL_MS,
            boot_settle_ms: DEFAULT_BOOT_SETTLE_MS,
            expectation_timeout_ms: DEFAULT_EXPECTATION_TIMEOUT_MS,
            link_timeout_ms: DEFAULT_LINK_TIMEOUT_MS,
            restore_on_boot: false,
            boot_commands,
        }
    }
}

impl EngineConfig {
    /// Configuration with no boot sequence (useful for tests and warm restarts)
    pub fn without_boot() -> Self {
        Self {
            boot_commands: Vec::new(),
            ..Self::default()
        }
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.response_timeout_ms == 0 || self.keepalive_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if let Some(&code) = self
            .boot_commands
            .iter()
            .find(|&&code| !(BOOT_CODE_FIRST..=BOOT_CODE_LAST).contains(&code))
        {
            return Err(ConfigError::BootCodeOutOfRange(code));
        }
        Ok(())
    }

    /// Serialize to postcard binary
    ///
    /// Returns the used part of `buf`.
    #[cfg(feature = "serde")]
    pub fn to_postcard<'a>(&self, buf: &'a mut [u8]) -> Result<&'a mut [u8], ConfigError> {
        postcard::to_slice(self, buf).map_err(|_| ConfigError::Serialize)
    }

    /// Deserialize from postcard binary and validate
    #[cfg(feature = "serde")]
    pub fn from_postcard(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = postcard::from_bytes(bytes).map_err(|_| ConfigError::Deserialize)?;
        config.validate()?;
        Ok(config)
    }
}
