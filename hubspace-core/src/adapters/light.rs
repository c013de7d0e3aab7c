//! Light adapter
//!
//! The host models the light as a 0.0-1.0 brightness plus a color
//! temperature in mireds. The appliance only knows whole percent and six
//! fixed temperatures, so requests snap to the nearest step.

use hubspace_protocol::ColorTemp;

use crate::engine::ApplianceControl;
use crate::queue::QueueError;
use crate::state::LightState;

/// Convert kelvin to mireds
pub fn kelvin_to_mired(kelvin: f32) -> f32 {
    1_000_000.0 / kelvin
}

/// Convert mireds to kelvin
pub fn mired_to_kelvin(mired: f32) -> f32 {
    1_000_000.0 / mired
}

/// Capabilities advertised to the host
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LightTraits {
    /// Coolest temperature (6500K)
    pub min_mireds: f32,
    /// Warmest temperature (2700K)
    pub max_mireds: f32,
}

/// A host request
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LightCall {
    /// Brightness 0.0-1.0
    pub brightness: Option<f32>,
    pub color_temp_mireds: Option<f32>,
}

/// Engine commands produced by a [`LightCall`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LightIntent {
    pub brightness: u8,
    pub color_temp: ColorTemp,
}

impl LightIntent {
    /// Queue the commands on the engine
    pub fn dispatch<C: ApplianceControl + ?Sized>(&self, control: &mut C) -> Result<(), QueueError> {
        control.send_brightness(self.brightness)?;
        control.send_color_temp(self.color_temp)
    }
}

/// Host-visible light state
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LightAdapter {
    /// Brightness 0.0-1.0
    pub brightness: f32,
    pub color_temp_mireds: f32,
}

impl Default for LightAdapter {
    fn default() -> Self {
        Self {
            brightness: 0.0,
            color_temp_mireds: kelvin_to_mired(ColorTemp::default().kelvin() as f32),
        }
    }
}

impl LightAdapter {
    pub fn traits() -> LightTraits {
        LightTraits {
            min_mireds: kelvin_to_mired(ColorTemp::MAX_KELVIN as f32),
            max_mireds: kelvin_to_mired(ColorTemp::MIN_KELVIN as f32),
        }
    }

    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a host request and work out what to send
    ///
    /// Brightness and color temperature always go out together, as the
    /// host writes the complete light state on every change.
    pub fn apply_call(&mut self, call: &LightCall) -> LightIntent {
        if let Some(brightness) = call.brightness {
            self.brightness = brightness.clamp(0.0, 1.0);
        }
        if let Some(mireds) = call.color_temp_mireds {
            if mireds > 0.0 {
                self.color_temp_mireds = mireds;
            }
        }

        LightIntent {
            brightness: (self.brightness * 100.0) as u8,
            color_temp: ColorTemp::from_kelvin(mired_to_kelvin(self.color_temp_mireds)),
        }
    }

    /// Apply a call and queue the resulting commands
    pub fn control<C: ApplianceControl + ?Sized>(
        &mut self,
        call: &LightCall,
        control: &mut C,
    ) -> Result<LightIntent, QueueError> {
        let intent = self.apply_call(call);
        intent.dispatch(control)?;
        Ok(intent)
    }

    /// Take reconciled device state; returns true if anything visible changed
    pub fn update_from_device(&mut self, light: &LightState) -> bool {
        let brightness = f32::from(light.brightness) / 100.0;
        let mireds = kelvin_to_mired(f32::from(light.kelvin()));
        let changed = self.brightness != brightness || self.color_temp_mireds != mireds;

        self.brightness = brightness;
        self.color_temp_mireds = mireds;
        changed
    }

    pub fn is_on(&self) -> bool {
        self.brightness > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hubspace_protocol::FanSpeed;

    #[derive(Default)]
    struct Recorder {
        brightness: std::vec::Vec<u8>,
        color: std::vec::Vec<ColorTemp>,
    }

    impl ApplianceControl for Recorder {
        fn send_fan_speed(&mut self, _speed: FanSpeed) -> Result<(), QueueError> {
            Ok(())
        }
        fn send_brightness(&mut self, percent: u8) -> Result<(), QueueError> {
            self.brightness.push(percent);
            Ok(())
        }
        fn send_direction(&mut self, _reverse: bool) -> Result<(), QueueError> {
            Ok(())
        }
        fn send_color_temp(&mut self, color_temp: ColorTemp) -> Result<(), QueueError> {
            self.color.push(color_temp);
            Ok(())
        }
    }

    #[test]
    fn test_mired_conversion() {
        assert_eq!(kelvin_to_mired(2500.0), 400.0);
        assert_eq!(mired_to_kelvin(250.0), 4000.0);
    }

    #[test]
    fn test_traits_range() {
        let traits = LightAdapter::traits();
        assert!(traits.min_mireds < traits.max_mireds);
        assert!((traits.min_mireds - 153.85).abs() < 0.01);
        assert!((traits.max_mireds - 370.37).abs() < 0.01);
    }

    #[test]
    fn test_write_state_sends_both() {
        let mut light = LightAdapter::new();
        let mut recorder = Recorder::default();
        let call = LightCall {
            brightness: Some(0.8),
            color_temp_mireds: Some(kelvin_to_mired(3500.0)),
        };

        let intent = light.control(&call, &mut recorder).unwrap();
        assert_eq!(intent.color_temp, ColorTemp::K3500);
        assert_eq!(recorder.brightness, [intent.brightness]);
        assert_eq!(recorder.color, [ColorTemp::K3500]);
    }

    #[test]
    fn test_color_snaps_to_nearest_step() {
        let mut light = LightAdapter::new();
        let intent = light.apply_call(&LightCall {
            brightness: Some(1.0),
            color_temp_mireds: Some(kelvin_to_mired(4300.0)),
        });
        assert_eq!(intent.brightness, 100);
        assert_eq!(intent.color_temp, ColorTemp::K4000);
    }

    #[test]
    fn test_brightness_is_clamped() {
        let mut light = LightAdapter::new();
        let intent = light.apply_call(&LightCall {
            brightness: Some(1.7),
            ..Default::default()
        });
        assert_eq!(intent.brightness, 100);
    }

    #[test]
    fn test_update_from_device() {
        let mut light = LightAdapter::new();
        let state = LightState {
            brightness: 50,
            color_temp: ColorTemp::K5000,
        };
        assert!(light.update_from_device(&state));
        assert_eq!(light.brightness, 0.5);
        assert_eq!(light.color_temp_mireds, 200.0);
        assert!(light.is_on());
        assert!(!light.update_from_device(&state));
    }
}
