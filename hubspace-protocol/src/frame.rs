//! Frame encoding and decoding for the appliance protocol.
//!
//! Command frame (controller → appliance):
//! - START (1 byte): 0xAA synchronization byte
//! - CMD (1 byte): command code
//! - HIGH, LOW (1 byte each): command arguments
//! - CHECKSUM (1 byte): XOR of the four preceding bytes
//!
//! Status frame (appliance → controller), 12 bytes:
//! - START, RESPONSE_CMD, 2 reserved, FAN, BRIGHTNESS, COLOR,
//!   TIMER (u16 little-endian), 1 reserved, STAGE, CHECKSUM
//!
//! The status checksum is the XOR of the eleven preceding bytes.

use crate::codes::{ColorTemp, CommandCode, FanDirection, FanSpeed, Stage};

/// Frame synchronization byte
pub const FRAME_START: u8 = 0xAA;

/// Length of an outbound command frame
pub const COMMAND_FRAME_LEN: usize = 5;

/// Length of an inbound status frame
pub const STATUS_FRAME_LEN: usize = 12;

/// Errors that can occur while decoding a status frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// First byte is not [`FRAME_START`]
    BadStart,
    /// Buffer is not exactly [`STATUS_FRAME_LEN`] bytes
    LengthMismatch,
    /// Trailing byte does not match the XOR of the preceding bytes
    ChecksumMismatch,
}

/// XOR of every byte in `bytes`
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, &byte| acc ^ byte)
}

/// An encoded command frame, immutable once built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandFrame {
    bytes: [u8; COMMAND_FRAME_LEN],
}

impl CommandFrame {
    /// Build a command frame
    pub fn encode(cmd: CommandCode, high: u8, low: u8) -> Self {
        Self::from_raw(cmd.to_byte(), high, low)
    }

    /// Build a command frame from a raw command byte
    pub fn from_raw(cmd: u8, high: u8, low: u8) -> Self {
        let mut bytes = [FRAME_START, cmd, high, low, 0];
        bytes[4] = checksum(&bytes[..4]);
        Self { bytes }
    }

    /// Raw command byte
    pub fn cmd(&self) -> u8 {
        self.bytes[1]
    }

    pub fn high(&self) -> u8 {
        self.bytes[2]
    }

    pub fn low(&self) -> u8 {
        self.bytes[3]
    }

    /// Bytes to put on the wire
    pub fn as_bytes(&self) -> &[u8; COMMAND_FRAME_LEN] {
        &self.bytes
    }
}

/// A validated status frame as reported by the appliance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusFrame {
    /// Command code this frame answers
    pub response_cmd: u8,
    /// Bytes 2-3, meaning unknown
    pub reserved: [u8; 2],
    /// Raw fan speed code
    pub fan_code: u8,
    /// Light brightness, percent
    pub brightness: u8,
    /// Raw color temperature code
    pub color_code: u8,
    /// Sleep timer in minutes
    pub timer_minutes: u16,
    /// Byte 9, meaning unknown
    pub reserved_tail: u8,
    /// Motor stage byte, see [`Stage`]
    pub stage: u8,
}

impl StatusFrame {
    /// Validate and parse a complete status frame
    pub fn decode(buffer: &[u8]) -> Result<Self, FrameError> {
        let first = *buffer.first().ok_or(FrameError::LengthMismatch)?;
        if first != FRAME_START {
            return Err(FrameError::BadStart);
        }
        if buffer.len() != STATUS_FRAME_LEN {
            return Err(FrameError::LengthMismatch);
        }
        let last = STATUS_FRAME_LEN - 1;
        if buffer[last] != checksum(&buffer[..last]) {
            return Err(FrameError::ChecksumMismatch);
        }

        Ok(Self {
            response_cmd: buffer[1],
            reserved: [buffer[2], buffer[3]],
            fan_code: buffer[4],
            brightness: buffer[5],
            color_code: buffer[6],
            timer_minutes: u16::from_le_bytes([buffer[7], buffer[8]]),
            reserved_tail: buffer[9],
            stage: buffer[10],
        })
    }

    /// Encode as the appliance would send it (used by simulators and tests)
    pub fn encode(&self) -> [u8; STATUS_FRAME_LEN] {
        let timer = self.timer_minutes.to_le_bytes();
        let mut bytes = [
            FRAME_START,
            self.response_cmd,
            self.reserved[0],
            self.reserved[1],
            self.fan_code,
            self.brightness,
            self.color_code,
            timer[0],
            timer[1],
            self.reserved_tail,
            self.stage,
            0,
        ];
        bytes[STATUS_FRAME_LEN - 1] = checksum(&bytes[..STATUS_FRAME_LEN - 1]);
        bytes
    }

    /// The command this frame acknowledges, if the code is known
    pub fn response_code(&self) -> Option<CommandCode> {
        CommandCode::from_byte(self.response_cmd)
    }

    /// True if this frame answers a keepalive rather than a real command
    pub fn is_keepalive_response(&self) -> bool {
        self.response_code() == Some(CommandCode::Keepalive)
    }

    /// Reported fan speed; unknown codes read as off
    pub fn fan_speed(&self) -> FanSpeed {
        FanSpeed::from_code(self.fan_code).unwrap_or_default()
    }

    /// Reported brightness, clamped to 100
    pub fn brightness_percent(&self) -> u8 {
        self.brightness.min(100)
    }

    /// Reported color temperature; unknown codes read as 3500K
    pub fn color_temp(&self) -> ColorTemp {
        ColorTemp::from_code(self.color_code).unwrap_or_default()
    }

    pub fn motor_stage(&self) -> Stage {
        Stage::from_byte(self.stage)
    }

    pub fn direction(&self) -> FanDirection {
        self.motor_stage().direction()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_status() -> StatusFrame {
        StatusFrame {
            response_cmd: 0x02,
            reserved: [0x00, 0x00],
            fan_code: 0x42,
            brightness: 80,
            color_code: 0x03,
            timer_minutes: 0x0102,
            reserved_tail: 0x00,
            stage: 0x80,
        }
    }

    #[test]
    fn test_command_frame_encode() {
        let frame = CommandFrame::encode(CommandCode::FanSpeed, 0x42, 0x00);
        let bytes = frame.as_bytes();

        assert_eq!(bytes[0], FRAME_START);
        assert_eq!(bytes[1], 0x02);
        assert_eq!(bytes[2], 0x42);
        assert_eq!(bytes[3], 0x00);
        assert_eq!(bytes[4], 0xAA ^ 0x02 ^ 0x42);
    }

    #[test]
    fn test_keepalive_frame() {
        let frame = CommandFrame::encode(CommandCode::Keepalive, 0, 0);
        assert_eq!(frame.as_bytes(), &[0xAA, 0x01, 0x00, 0x00, 0xAB]);
    }

    #[test]
    fn test_status_decode_fields() {
        let bytes = sample_status().encode();
        let status = StatusFrame::decode(&bytes).unwrap();

        assert_eq!(status.response_cmd, 0x02);
        assert_eq!(status.fan_speed(), FanSpeed::Level4);
        assert_eq!(status.brightness_percent(), 80);
        assert_eq!(status.color_temp(), ColorTemp::K3500);
        assert_eq!(status.timer_minutes, 0x0102);
        assert_eq!(status.direction(), FanDirection::Reverse);
        assert!(!status.is_keepalive_response());
    }

    #[test]
    fn test_timer_is_little_endian() {
        let mut bytes = sample_status().encode();
        bytes[7] = 0x2C;
        bytes[8] = 0x01;
        bytes[11] = checksum(&bytes[..11]);

        let status = StatusFrame::decode(&bytes).unwrap();
        assert_eq!(status.timer_minutes, 300);
    }

    #[test]
    fn test_decode_bad_start() {
        let mut bytes = sample_status().encode();
        bytes[0] = 0x55;
        assert_eq!(StatusFrame::decode(&bytes), Err(FrameError::BadStart));
    }

    #[test]
    fn test_decode_length_mismatch() {
        let bytes = sample_status().encode();
        assert_eq!(
            StatusFrame::decode(&bytes[..11]),
            Err(FrameError::LengthMismatch)
        );
        assert_eq!(StatusFrame::decode(&[]), Err(FrameError::LengthMismatch));

        let mut long = [0u8; 13];
        long[..12].copy_from_slice(&bytes);
        assert_eq!(StatusFrame::decode(&long), Err(FrameError::LengthMismatch));
    }

    #[test]
    fn test_decode_checksum_mismatch() {
        let mut bytes = sample_status().encode();
        bytes[11] ^= 0xFF;
        assert_eq!(
            StatusFrame::decode(&bytes),
            Err(FrameError::ChecksumMismatch)
        );
    }

    #[test]
    fn test_unknown_codes_normalize() {
        let status = StatusFrame {
            fan_code: 0x77,
            color_code: 0x09,
            brightness: 150,
            ..Default::default()
        };
        assert_eq!(status.fan_speed(), FanSpeed::Off);
        assert_eq!(status.color_temp(), ColorTemp::K3500);
        assert_eq!(status.brightness_percent(), 100);
    }

    prop_compose! {
        fn any_status()(
            response_cmd in any::<u8>(),
            reserved in any::<[u8; 2]>(),
            fan_code in any::<u8>(),
            brightness in any::<u8>(),
            color_code in any::<u8>(),
            timer_minutes in any::<u16>(),
            reserved_tail in any::<u8>(),
            stage in any::<u8>(),
        ) -> StatusFrame {
            StatusFrame {
                response_cmd,
                reserved,
                fan_code,
                brightness,
                color_code,
                timer_minutes,
                reserved_tail,
                stage,
            }
        }
    }

    proptest! {
        #[test]
        fn prop_status_decode_reproduces_fields(status in any_status()) {
            let bytes = status.encode();
            prop_assert_eq!(StatusFrame::decode(&bytes), Ok(status));
        }

        #[test]
        fn prop_single_byte_mutation_is_rejected(
            status in any_status(),
            index in 0usize..STATUS_FRAME_LEN - 1,
            flip in 1u8..=255,
        ) {
            let original = status.encode();
            let mut mutated = original;
            mutated[index] ^= flip;

            prop_assert_ne!(
                checksum(&mutated[..STATUS_FRAME_LEN - 1]),
                original[STATUS_FRAME_LEN - 1]
            );
            prop_assert!(StatusFrame::decode(&mutated).is_err());
        }

        #[test]
        fn prop_command_checksum_covers_header(cmd in any::<u8>(), high in any::<u8>(), low in any::<u8>()) {
            let frame = CommandFrame::from_raw(cmd, high, low);
            prop_assert_eq!(checksum(frame.as_bytes()), 0);
        }
    }
}
