//! Normalized device state
//!
//! [`DeviceStatus`] is what the engine believes the appliance is doing.
//! It is double-buffered in [`StatusSnapshot`] so the engine can tell
//! whether a reconciled status frame actually changed anything.

use hubspace_protocol::{ColorTemp, FanDirection, FanSpeed, StatusFrame};

/// Normalized appliance state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceStatus {
    pub fan_speed: FanSpeed,
    pub direction: FanDirection,
    /// Light brightness, 0-100
    pub brightness: u8,
    pub color_temp: ColorTemp,
}

impl DeviceStatus {
    /// Normalize the fields of a status frame
    pub fn from_frame(frame: &StatusFrame) -> Self {
        Self {
            fan_speed: frame.fan_speed(),
            direction: frame.direction(),
            brightness: frame.brightness_percent(),
            color_temp: frame.color_temp(),
        }
    }

    pub fn fan(&self) -> FanState {
        FanState {
            speed: self.fan_speed,
            direction: self.direction,
        }
    }

    pub fn light(&self) -> LightState {
        LightState {
            brightness: self.brightness,
            color_temp: self.color_temp,
        }
    }
}

/// Fan half of the device state, as handed to fan adapters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FanState {
    pub speed: FanSpeed,
    pub direction: FanDirection,
}

impl FanState {
    pub fn is_on(&self) -> bool {
        self.speed.is_on()
    }

    /// Speed level 0-6
    pub fn level(&self) -> u8 {
        self.speed.level()
    }
}

/// Light half of the device state, as handed to light adapters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LightState {
    /// Brightness, 0-100
    pub brightness: u8,
    pub color_temp: ColorTemp,
}

impl LightState {
    pub fn is_on(&self) -> bool {
        self.brightness > 0
    }

    pub fn kelvin(&self) -> u16 {
        self.color_temp.kelvin()
    }
}

/// Current and previous device state
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusSnapshot {
    current: DeviceStatus,
    previous: DeviceStatus,
    has_baseline: bool,
}

impl StatusSnapshot {
    pub const fn new() -> Self {
        Self {
            current: DeviceStatus {
                fan_speed: FanSpeed::Off,
                direction: FanDirection::Forward,
                brightness: 0,
                color_temp: ColorTemp::K3500,
            },
            previous: DeviceStatus {
                fan_speed: FanSpeed::Off,
                direction: FanDirection::Forward,
                brightness: 0,
                color_temp: ColorTemp::K3500,
            },
            has_baseline: false,
        }
    }

    pub fn current(&self) -> &DeviceStatus {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut DeviceStatus {
        &mut self.current
    }

    pub fn previous(&self) -> &DeviceStatus {
        &self.previous
    }

    /// False until the first status frame has been committed
    pub fn has_baseline(&self) -> bool {
        self.has_baseline
    }

    pub fn fan_changed(&self) -> bool {
        self.current.fan() != self.previous.fan()
    }

    pub fn light_changed(&self) -> bool {
        self.current.light() != self.previous.light()
    }

    /// Make the current state the comparison baseline
    pub fn commit(&mut self) {
        self.previous = self.current;
        self.has_baseline = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_frame() {
        let frame = StatusFrame {
            fan_code: 0x64,
            brightness: 40,
            color_code: 0x06,
            stage: 0x80,
            ..Default::default()
        };
        let status = DeviceStatus::from_frame(&frame);

        assert_eq!(status.fan_speed, FanSpeed::Level6);
        assert_eq!(status.direction, FanDirection::Reverse);
        assert_eq!(status.brightness, 40);
        assert_eq!(status.color_temp, ColorTemp::K6500);
        assert_eq!(status.fan().level(), 6);
        assert_eq!(status.light().kelvin(), 6500);
    }

    #[test]
    fn test_snapshot_change_tracking() {
        let mut snapshot = StatusSnapshot::new();
        assert!(!snapshot.has_baseline());
        assert_eq!(*snapshot.current(), DeviceStatus::default());

        snapshot.current_mut().brightness = 20;
        assert!(snapshot.light_changed());
        assert!(!snapshot.fan_changed());

        snapshot.commit();
        assert!(snapshot.has_baseline());
        assert!(!snapshot.light_changed());
        assert_eq!(snapshot.previous().brightness, 20);
    }

    #[test]
    fn test_light_on_follows_brightness() {
        let light = LightState {
            brightness: 0,
            color_temp: ColorTemp::K2700,
        };
        assert!(!light.is_on());
        assert!(LightState { brightness: 1, ..light }.is_on());
    }
}
