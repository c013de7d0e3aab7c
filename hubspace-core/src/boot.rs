//! One-shot power-up sequence
//!
//! The appliance expects a fixed list of initialization commands, each
//! followed by a settle pause, before it accepts normal traffic. This is
//! a small state machine driven from the engine tick so the control
//! loop never blocks; [`crate::ProtocolEngine::boot_blocking`] wraps it
//! for hosts that prefer to wait.

use heapless::Vec;
use hubspace_protocol::{BootCode, CommandCode, CommandFrame};

use crate::config::MAX_BOOT_COMMANDS;

/// Position in the boot sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootStep {
    /// Nothing sent yet
    NotStarted,
    /// Send command `index` (or finish, past the end) at `deadline`
    Pending { index: usize, deadline: u64 },
    Done,
}

/// What the engine should do this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootPoll {
    /// Transmit this frame now
    Send(CommandFrame),
    /// Settling, come back later
    Wait,
    /// The sequence just completed (reported once)
    Finished,
    /// Already complete
    Idle,
}

#[derive(Debug, Clone)]
pub struct BootSequence {
    commands: Vec<BootCode, MAX_BOOT_COMMANDS>,
    settle_ms: u32,
    step: BootStep,
}

impl BootSequence {
    /// Codes outside the boot range are skipped
    pub fn new(commands: &[u8], settle_ms: u32) -> Self {
        let mut list = Vec::new();
        for code in commands.iter().filter_map(|&c| BootCode::new(c)) {
            if list.push(code).is_err() {
                break;
            }
        }
        Self {
            commands: list,
            settle_ms,
            step: BootStep::NotStarted,
        }
    }

    pub fn step(&self) -> BootStep {
        self.step
    }

    pub fn is_done(&self) -> bool {
        self.step == BootStep::Done
    }

    /// Milliseconds until the next action is due (0 if due now or done)
    pub fn remaining_ms(&self, now: u64) -> u64 {
        match self.step {
            BootStep::Pending { deadline, .. } => deadline.saturating_sub(now),
            BootStep::NotStarted | BootStep::Done => 0,
        }
    }

    pub fn poll(&mut self, now: u64) -> BootPoll {
        let (index, deadline) = match self.step {
            BootStep::Done => return BootPoll::Idle,
            BootStep::NotStarted => (0, now),
            BootStep::Pending { index, deadline } => (index, deadline),
        };

        if now < deadline {
            self.step = BootStep::Pending { index, deadline };
            return BootPoll::Wait;
        }

        match self.commands.get(index) {
            Some(&code) => {
                self.step = BootStep::Pending {
                    index: index + 1,
                    deadline: now + u64::from(self.settle_ms),
                };
                BootPoll::Send(CommandFrame::encode(CommandCode::Boot(code), 0, 0))
            }
            None => {
                self.step = BootStep::Done;
                BootPoll::Finished
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_order_and_spacing() {
        let mut boot = BootSequence::new(&[0x09, 0x0A], 100);

        match boot.poll(0) {
            BootPoll::Send(frame) => assert_eq!(frame.cmd(), 0x09),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(boot.poll(50), BootPoll::Wait);
        assert_eq!(boot.remaining_ms(50), 50);

        match boot.poll(100) {
            BootPoll::Send(frame) => assert_eq!(frame.cmd(), 0x0A),
            other => panic!("unexpected {:?}", other),
        }
        // Last command also gets its settle time
        assert_eq!(boot.poll(150), BootPoll::Wait);
        assert_eq!(boot.poll(200), BootPoll::Finished);
        assert!(boot.is_done());
        assert_eq!(boot.poll(300), BootPoll::Idle);
    }

    #[test]
    fn test_empty_sequence_finishes_immediately() {
        let mut boot = BootSequence::new(&[], 100);
        assert_eq!(boot.poll(0), BootPoll::Finished);
        assert!(boot.is_done());
    }

    #[test]
    fn test_out_of_range_codes_skipped() {
        let mut boot = BootSequence::new(&[0x01, 0x0A, 0x21], 10);
        match boot.poll(0) {
            BootPoll::Send(frame) => assert_eq!(frame.cmd(), 0x0A),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(boot.poll(10), BootPoll::Finished);
    }

    #[test]
    fn test_boot_frames_have_zero_payload() {
        let mut boot = BootSequence::new(&[0x0E], 10);
        match boot.poll(5) {
            BootPoll::Send(frame) => {
                assert_eq!(frame.as_bytes(), &[0xAA, 0x0E, 0x00, 0x00, 0xAA ^ 0x0E])
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
