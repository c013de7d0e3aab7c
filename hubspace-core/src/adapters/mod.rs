//! Fan and light adapters
//!
//! Translate between a user-facing fan/light model (speed levels, on/off,
//! 0.0-1.0 brightness, mireds) and the engine's wire-level state. The
//! host framework owns the adapters and forwards its calls here.

pub mod fan;
pub mod light;

pub use fan::{FanAdapter, FanCall, FanIntent, FanTraits};
pub use light::{kelvin_to_mired, mired_to_kelvin, LightAdapter, LightCall, LightIntent, LightTraits};

use crate::engine::DeviceStateSink;
use crate::state::{FanState, LightState};

/// A fan adapter and a light adapter sharing one engine
#[derive(Debug, Clone, Default)]
pub struct FanLightAdapters {
    pub fan: FanAdapter,
    pub light: LightAdapter,
}

impl DeviceStateSink for FanLightAdapters {
    fn on_fan_update(&mut self, fan: &FanState) {
        self.fan.update_from_device(fan);
    }

    fn on_light_update(&mut self, light: &LightState) {
        self.light.update_from_device(light);
    }
}
