//! Fan adapter

use hubspace_protocol::{FanDirection, FanSpeed};

use crate::engine::ApplianceControl;
use crate::queue::QueueError;
use crate::state::FanState;

/// Capabilities advertised to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FanTraits {
    pub oscillation: bool,
    pub speed: bool,
    pub direction: bool,
    pub speed_count: u8,
}

/// A host request; `None` fields are left unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FanCall {
    pub state: Option<bool>,
    /// Speed level 1-6 (0 = off)
    pub speed: Option<u8>,
    pub direction: Option<FanDirection>,
}

/// Engine commands produced by a [`FanCall`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FanIntent {
    pub speed: Option<FanSpeed>,
    pub direction: Option<FanDirection>,
}

impl FanIntent {
    /// Queue the commands on the engine
    pub fn dispatch<C: ApplianceControl + ?Sized>(&self, control: &mut C) -> Result<(), QueueError> {
        if let Some(direction) = self.direction {
            control.send_direction(direction.is_reverse())?;
        }
        if let Some(speed) = self.speed {
            control.send_fan_speed(speed)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.speed.is_none() && self.direction.is_none()
    }
}

/// Host-visible fan state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FanAdapter {
    /// On/off as shown to the user
    pub state: bool,
    /// Speed level 0-6
    pub speed: u8,
    pub direction: FanDirection,
}

impl FanAdapter {
    /// Six speeds and reversible, no oscillation
    pub const TRAITS: FanTraits = FanTraits {
        oscillation: false,
        speed: true,
        direction: true,
        speed_count: FanSpeed::LEVELS,
    };

    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a host request to the displayed state and work out what to send
    ///
    /// The displayed state changes optimistically; the engine holds back
    /// stale reports until the appliance catches up. Any change to state
    /// or speed re-sends the speed; off or level 0 both send "off".
    pub fn apply_call(&mut self, call: &FanCall) -> FanIntent {
        let mut intent = FanIntent::default();
        let mut speed_touched = false;

        if let Some(state) = call.state {
            self.state = state;
            speed_touched = true;
        }
        if let Some(speed) = call.speed {
            self.speed = speed.min(FanSpeed::LEVELS);
            speed_touched = true;
        }
        if let Some(direction) = call.direction {
            self.direction = direction;
            intent.direction = Some(direction);
        }

        if speed_touched {
            intent.speed = Some(if !self.state || self.speed == 0 {
                FanSpeed::Off
            } else {
                FanSpeed::from_level(self.speed)
            });
        }
        intent
    }

    /// Apply a call and queue the resulting commands
    pub fn control<C: ApplianceControl + ?Sized>(
        &mut self,
        call: &FanCall,
        control: &mut C,
    ) -> Result<FanIntent, QueueError> {
        let intent = self.apply_call(call);
        intent.dispatch(control)?;
        Ok(intent)
    }

    /// Take reconciled device state; returns true if anything visible changed
    pub fn update_from_device(&mut self, fan: &FanState) -> bool {
        let new_speed = fan.level();
        let new_state = new_speed > 0;
        let changed =
            self.state != new_state || self.speed != new_speed || self.direction != fan.direction;

        self.state = new_state;
        self.speed = new_speed;
        self.direction = fan.direction;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hubspace_protocol::ColorTemp;

    #[derive(Default)]
    struct Recorder {
        speeds: std::vec::Vec<FanSpeed>,
        directions: std::vec::Vec<bool>,
    }

    impl ApplianceControl for Recorder {
        fn send_fan_speed(&mut self, speed: FanSpeed) -> Result<(), QueueError> {
            self.speeds.push(speed);
            Ok(())
        }
        fn send_brightness(&mut self, _percent: u8) -> Result<(), QueueError> {
            Ok(())
        }
        fn send_direction(&mut self, reverse: bool) -> Result<(), QueueError> {
            self.directions.push(reverse);
            Ok(())
        }
        fn send_color_temp(&mut self, _color_temp: ColorTemp) -> Result<(), QueueError> {
            Ok(())
        }
    }

    #[test]
    fn test_turn_on_at_level() {
        let mut fan = FanAdapter::new();
        let mut recorder = Recorder::default();
        let call = FanCall {
            state: Some(true),
            speed: Some(4),
            direction: None,
        };

        let intent = fan.control(&call, &mut recorder).unwrap();
        assert_eq!(intent.speed, Some(FanSpeed::Level4));
        assert_eq!(recorder.speeds, [FanSpeed::Level4]);
        assert!(recorder.directions.is_empty());
        assert!(fan.state);
    }

    #[test]
    fn test_turn_off_keeps_level() {
        let mut fan = FanAdapter {
            state: true,
            speed: 3,
            direction: FanDirection::Forward,
        };
        let intent = fan.apply_call(&FanCall {
            state: Some(false),
            ..Default::default()
        });
        assert_eq!(intent.speed, Some(FanSpeed::Off));
        assert_eq!(fan.speed, 3);
    }

    #[test]
    fn test_level_zero_is_off() {
        let mut fan = FanAdapter {
            state: true,
            ..Default::default()
        };
        let intent = fan.apply_call(&FanCall {
            speed: Some(0),
            ..Default::default()
        });
        assert_eq!(intent.speed, Some(FanSpeed::Off));
    }

    #[test]
    fn test_direction_only() {
        let mut fan = FanAdapter::new();
        let mut recorder = Recorder::default();
        let intent = fan
            .control(
                &FanCall {
                    direction: Some(FanDirection::Reverse),
                    ..Default::default()
                },
                &mut recorder,
            )
            .unwrap();

        assert!(intent.speed.is_none());
        assert_eq!(recorder.directions, [true]);
        assert!(recorder.speeds.is_empty());
    }

    #[test]
    fn test_empty_call() {
        let mut fan = FanAdapter::new();
        assert!(fan.apply_call(&FanCall::default()).is_empty());
    }

    #[test]
    fn test_update_from_device() {
        let mut fan = FanAdapter::new();
        let state = FanState {
            speed: FanSpeed::Level5,
            direction: FanDirection::Reverse,
        };
        assert!(fan.update_from_device(&state));
        assert_eq!((fan.state, fan.speed), (true, 5));
        assert!(!fan.update_from_device(&state));
    }

    #[test]
    fn test_traits() {
        assert_eq!(FanAdapter::TRAITS.speed_count, 6);
        assert!(!FanAdapter::TRAITS.oscillation);
    }
}
