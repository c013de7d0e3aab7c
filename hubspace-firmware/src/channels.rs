//! Inter-task communication channels
//!
//! The engine task owns the protocol engine and both adapters. Other
//! tasks reach it only through these statics.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use hubspace_core::adapters::{FanAdapter, FanCall, LightAdapter, LightCall};

/// Channel capacity for adapter intents
const INTENT_CHANNEL_SIZE: usize = 8;

/// A request for the appliance
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdapterIntent {
    Fan(FanCall),
    Light(LightCall),
    /// Step to the next fan speed, wrapping through off
    CycleFanSpeed,
    /// Full brightness if off, off otherwise
    ToggleLight,
}

/// Requests from buttons or a host integration
pub static INTENT_CHANNEL: Channel<CriticalSectionRawMutex, AdapterIntent, INTENT_CHANNEL_SIZE> =
    Channel::new();

/// Fan state as last shown to the user (updated by engine task)
pub static FAN_STATE: Signal<CriticalSectionRawMutex, FanAdapter> = Signal::new();

/// Light state as last shown to the user (updated by engine task)
pub static LIGHT_STATE: Signal<CriticalSectionRawMutex, LightAdapter> = Signal::new();

/// Link health (updated by engine task on change)
pub static LINK_HEALTHY: Signal<CriticalSectionRawMutex, bool> = Signal::new();
