//! Wire codes for commands and device state
//!
//! The byte values here are fixed by the appliance firmware. The fan
//! speed codes are deliberately non-linear: they are the appliance's own
//! motor calibration points, not a typo.

/// Command codes sent from the controller to the appliance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandCode {
    /// No-op, asserts link liveness and solicits a status frame
    Keepalive,
    /// Set fan speed (HIGH = fan code)
    FanSpeed,
    /// Set light brightness (HIGH = percent)
    Brightness,
    /// Set fan direction (HIGH = 1 for reverse)
    Direction,
    /// Set light color temperature (HIGH = color code)
    ColorTemp,
    /// One of the fixed initialization codes sent at power-up
    Boot(BootCode),
}

// Wire format values
const CMD_KEEPALIVE: u8 = 0x01;
const CMD_FAN_SPEED: u8 = 0x02;
const CMD_BRIGHTNESS: u8 = 0x03;
const CMD_DIRECTION: u8 = 0x04;
const CMD_COLOR_TEMP: u8 = 0x08;

/// First boot-sequence command code
pub const BOOT_CODE_FIRST: u8 = 0x09;
/// Last boot-sequence command code
pub const BOOT_CODE_LAST: u8 = 0x0E;

impl CommandCode {
    /// Parse a command code from its wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            CMD_KEEPALIVE => Some(CommandCode::Keepalive),
            CMD_FAN_SPEED => Some(CommandCode::FanSpeed),
            CMD_BRIGHTNESS => Some(CommandCode::Brightness),
            CMD_DIRECTION => Some(CommandCode::Direction),
            CMD_COLOR_TEMP => Some(CommandCode::ColorTemp),
            BOOT_CODE_FIRST..=BOOT_CODE_LAST => Some(CommandCode::Boot(BootCode(byte))),
            _ => None,
        }
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        match self {
            CommandCode::Keepalive => CMD_KEEPALIVE,
            CommandCode::FanSpeed => CMD_FAN_SPEED,
            CommandCode::Brightness => CMD_BRIGHTNESS,
            CommandCode::Direction => CMD_DIRECTION,
            CommandCode::ColorTemp => CMD_COLOR_TEMP,
            CommandCode::Boot(code) => code.to_byte(),
        }
    }

    /// Returns true for the periodic no-op command
    pub fn is_keepalive(&self) -> bool {
        matches!(self, CommandCode::Keepalive)
    }
}

/// A power-up command code, always within 0x09-0x0E
///
/// The range sits clear of every regular command code, so a boot
/// command can never be mistaken for one on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BootCode(u8);

impl BootCode {
    /// Returns `None` outside the boot range
    pub const fn new(code: u8) -> Option<Self> {
        if code >= BOOT_CODE_FIRST && code <= BOOT_CODE_LAST {
            Some(BootCode(code))
        } else {
            None
        }
    }

    pub const fn to_byte(self) -> u8 {
        self.0
    }
}

/// Discrete fan speed settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FanSpeed {
    #[default]
    Off,
    Level1,
    Level2,
    Level3,
    Level4,
    Level5,
    Level6,
}

const FAN_OFF: u8 = 0x00;
const FAN_LEVEL_1: u8 = 0x10;
const FAN_LEVEL_2: u8 = 0x21;
const FAN_LEVEL_3: u8 = 0x32;
const FAN_LEVEL_4: u8 = 0x42;
const FAN_LEVEL_5: u8 = 0x53;
const FAN_LEVEL_6: u8 = 0x64;

impl FanSpeed {
    /// Number of non-off speed levels
    pub const LEVELS: u8 = 6;

    /// Parse a fan code as reported by the appliance
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            FAN_OFF => Some(FanSpeed::Off),
            FAN_LEVEL_1 => Some(FanSpeed::Level1),
            FAN_LEVEL_2 => Some(FanSpeed::Level2),
            FAN_LEVEL_3 => Some(FanSpeed::Level3),
            FAN_LEVEL_4 => Some(FanSpeed::Level4),
            FAN_LEVEL_5 => Some(FanSpeed::Level5),
            FAN_LEVEL_6 => Some(FanSpeed::Level6),
            _ => None,
        }
    }

    /// Wire code for this speed
    pub fn code(self) -> u8 {
        match self {
            FanSpeed::Off => FAN_OFF,
            FanSpeed::Level1 => FAN_LEVEL_1,
            FanSpeed::Level2 => FAN_LEVEL_2,
            FanSpeed::Level3 => FAN_LEVEL_3,
            FanSpeed::Level4 => FAN_LEVEL_4,
            FanSpeed::Level5 => FAN_LEVEL_5,
            FanSpeed::Level6 => FAN_LEVEL_6,
        }
    }

    /// Speed from a 0-6 level, where 0 (and anything above 6) is off
    pub fn from_level(level: u8) -> Self {
        match level {
            1 => FanSpeed::Level1,
            2 => FanSpeed::Level2,
            3 => FanSpeed::Level3,
            4 => FanSpeed::Level4,
            5 => FanSpeed::Level5,
            6 => FanSpeed::Level6,
            _ => FanSpeed::Off,
        }
    }

    /// Level 0-6 (0 = off)
    pub fn level(self) -> u8 {
        match self {
            FanSpeed::Off => 0,
            FanSpeed::Level1 => 1,
            FanSpeed::Level2 => 2,
            FanSpeed::Level3 => 3,
            FanSpeed::Level4 => 4,
            FanSpeed::Level5 => 5,
            FanSpeed::Level6 => 6,
        }
    }

    pub fn is_on(self) -> bool {
        self != FanSpeed::Off
    }
}

/// Light color temperature steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ColorTemp {
    K2700,
    K3000,
    #[default]
    K3500,
    K4000,
    K5000,
    K6500,
}

const TEMP_2700K: u8 = 0x01;
const TEMP_3000K: u8 = 0x02;
const TEMP_3500K: u8 = 0x03;
const TEMP_4000K: u8 = 0x04;
const TEMP_5000K: u8 = 0x05;
const TEMP_6500K: u8 = 0x06;

impl ColorTemp {
    /// Warmest supported temperature in kelvin
    pub const MIN_KELVIN: u16 = 2700;
    /// Coolest supported temperature in kelvin
    pub const MAX_KELVIN: u16 = 6500;

    /// Parse a color code as reported by the appliance
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            TEMP_2700K => Some(ColorTemp::K2700),
            TEMP_3000K => Some(ColorTemp::K3000),
            TEMP_3500K => Some(ColorTemp::K3500),
            TEMP_4000K => Some(ColorTemp::K4000),
            TEMP_5000K => Some(ColorTemp::K5000),
            TEMP_6500K => Some(ColorTemp::K6500),
            _ => None,
        }
    }

    /// Wire code for this temperature
    pub fn code(self) -> u8 {
        match self {
            ColorTemp::K2700 => TEMP_2700K,
            ColorTemp::K3000 => TEMP_3000K,
            ColorTemp::K3500 => TEMP_3500K,
            ColorTemp::K4000 => TEMP_4000K,
            ColorTemp::K5000 => TEMP_5000K,
            ColorTemp::K6500 => TEMP_6500K,
        }
    }

    pub fn kelvin(self) -> u16 {
        match self {
            ColorTemp::K2700 => 2700,
            ColorTemp::K3000 => 3000,
            ColorTemp::K3500 => 3500,
            ColorTemp::K4000 => 4000,
            ColorTemp::K5000 => 5000,
            ColorTemp::K6500 => 6500,
        }
    }

    /// Nearest supported step for an arbitrary kelvin value
    ///
    /// Boundaries sit halfway between neighbouring steps.
    pub fn from_kelvin(kelvin: f32) -> Self {
        if kelvin <= 2850.0 {
            ColorTemp::K2700
        } else if kelvin <= 3250.0 {
            ColorTemp::K3000
        } else if kelvin <= 3750.0 {
            ColorTemp::K3500
        } else if kelvin <= 4500.0 {
            ColorTemp::K4000
        } else if kelvin <= 5750.0 {
            ColorTemp::K5000
        } else {
            ColorTemp::K6500
        }
    }
}

/// Fan rotation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FanDirection {
    #[default]
    Forward,
    Reverse,
}

impl FanDirection {
    pub fn from_reverse(reverse: bool) -> Self {
        if reverse {
            FanDirection::Reverse
        } else {
            FanDirection::Forward
        }
    }

    pub fn is_reverse(self) -> bool {
        self == FanDirection::Reverse
    }
}

/// Motor stage decoded from the two high bits of the status stage byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stage {
    /// `00xxxxxx`
    ForwardIdle,
    /// `01xxxxxx`
    ForwardToReverse,
    /// `10xxxxxx`
    ReverseIdle,
    /// `11xxxxxx`
    ReverseToForward,
}

const STAGE_REVERSE_BIT: u8 = 0x80;
const STAGE_TRANSITION_BIT: u8 = 0x40;

impl Stage {
    pub fn from_byte(stage: u8) -> Self {
        match (stage & STAGE_REVERSE_BIT != 0, stage & STAGE_TRANSITION_BIT != 0) {
            (false, false) => Stage::ForwardIdle,
            (false, true) => Stage::ForwardToReverse,
            (true, false) => Stage::ReverseIdle,
            (true, true) => Stage::ReverseToForward,
        }
    }

    /// Direction the fan is in or heading towards
    ///
    /// Idle stages follow the top bit (set = reverse). A transition
    /// reports the direction the motor is reversing into.
    pub fn direction(self) -> FanDirection {
        match self {
            Stage::ForwardIdle | Stage::ReverseToForward => FanDirection::Forward,
            Stage::ReverseIdle | Stage::ForwardToReverse => FanDirection::Reverse,
        }
    }

    pub fn is_transitioning(self) -> bool {
        matches!(self, Stage::ForwardToReverse | Stage::ReverseToForward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_code_roundtrip() {
        let codes = [
            CommandCode::Keepalive,
            CommandCode::FanSpeed,
            CommandCode::Brightness,
            CommandCode::Direction,
            CommandCode::ColorTemp,
            CommandCode::Boot(BootCode::new(0x09).unwrap()),
            CommandCode::Boot(BootCode::new(0x0E).unwrap()),
        ];

        for code in codes {
            assert_eq!(CommandCode::from_byte(code.to_byte()), Some(code));
        }
    }

    #[test]
    fn test_boot_code_range() {
        assert!(BootCode::new(0x08).is_none());
        assert!(BootCode::new(0x0F).is_none());
        // Regular command codes cannot pose as boot codes
        for byte in [0x01, 0x02, 0x03, 0x04] {
            assert!(BootCode::new(byte).is_none());
        }
        assert_eq!(BootCode::new(0x0B).map(BootCode::to_byte), Some(0x0B));
    }

    #[test]
    fn test_unknown_command_code() {
        assert!(CommandCode::from_byte(0x00).is_none());
        assert!(CommandCode::from_byte(0x05).is_none());
        assert!(CommandCode::from_byte(0x0F).is_none());
    }

    #[test]
    fn test_fan_speed_codes() {
        assert_eq!(FanSpeed::Off.code(), 0x00);
        assert_eq!(FanSpeed::Level1.code(), 0x10);
        assert_eq!(FanSpeed::Level4.code(), 0x42);
        assert_eq!(FanSpeed::Level6.code(), 0x64);
        assert_eq!(FanSpeed::from_code(0x53), Some(FanSpeed::Level5));
        assert_eq!(FanSpeed::from_code(0x40), None);
    }

    #[test]
    fn test_fan_speed_levels() {
        for level in 0..=FanSpeed::LEVELS {
            assert_eq!(FanSpeed::from_level(level).level(), level);
        }
        assert_eq!(FanSpeed::from_level(7), FanSpeed::Off);
        assert!(!FanSpeed::Off.is_on());
        assert!(FanSpeed::Level1.is_on());
    }

    #[test]
    fn test_color_temp_from_kelvin() {
        assert_eq!(ColorTemp::from_kelvin(2700.0), ColorTemp::K2700);
        assert_eq!(ColorTemp::from_kelvin(2850.0), ColorTemp::K2700);
        assert_eq!(ColorTemp::from_kelvin(2851.0), ColorTemp::K3000);
        assert_eq!(ColorTemp::from_kelvin(3500.0), ColorTemp::K3500);
        assert_eq!(ColorTemp::from_kelvin(4200.0), ColorTemp::K4000);
        assert_eq!(ColorTemp::from_kelvin(5000.0), ColorTemp::K5000);
        assert_eq!(ColorTemp::from_kelvin(9000.0), ColorTemp::K6500);
    }

    #[test]
    fn test_color_temp_codes() {
        assert_eq!(ColorTemp::K2700.code(), 0x01);
        assert_eq!(ColorTemp::K6500.code(), 0x06);
        assert_eq!(ColorTemp::from_code(0x03), Some(ColorTemp::K3500));
        assert_eq!(ColorTemp::from_code(0x07), None);
    }

    #[test]
    fn test_stage_decoding() {
        assert_eq!(Stage::from_byte(0x00), Stage::ForwardIdle);
        assert_eq!(Stage::from_byte(0x3F), Stage::ForwardIdle);
        assert_eq!(Stage::from_byte(0x40), Stage::ForwardToReverse);
        assert_eq!(Stage::from_byte(0x80), Stage::ReverseIdle);
        assert_eq!(Stage::from_byte(0xC5), Stage::ReverseToForward);
    }

    #[test]
    fn test_stage_direction_uses_top_bit() {
        assert_eq!(Stage::ForwardIdle.direction(), FanDirection::Forward);
        assert_eq!(Stage::ForwardToReverse.direction(), FanDirection::Reverse);
        assert_eq!(Stage::ReverseIdle.direction(), FanDirection::Reverse);
        assert_eq!(Stage::ReverseToForward.direction(), FanDirection::Forward);
        assert!(Stage::ForwardToReverse.is_transitioning());
        assert!(!Stage::ReverseIdle.is_transitioning());
    }
}
