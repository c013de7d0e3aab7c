//! Byte-stream reassembly of status frames
//!
//! The appliance stream carries no length prefix and no escaping. Frame
//! sync relies on the start marker plus the fixed frame length: anything
//! that does not decode at exactly [`STATUS_FRAME_LEN`] bytes is thrown
//! away and the reassembler waits for the next start marker.

use heapless::Vec;

use crate::frame::{FrameError, StatusFrame, FRAME_START, STATUS_FRAME_LEN};

/// Outcome of feeding a byte that completed (or broke) a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reassembled {
    /// A valid status frame
    Frame(StatusFrame),
    /// Twelve bytes were collected but did not decode
    Rejected(FrameError),
    /// The buffer was already full when a byte arrived
    ///
    /// `feed` decodes and clears at exactly [`STATUS_FRAME_LEN`] bytes,
    /// so a garbled stream shows up as `Rejected`. This only reports a
    /// broken buffer invariant; the buffer is cleared and sync restarts.
    Overflow,
}

/// Accumulates bytes into status frames
#[derive(Debug, Clone, Default)]
pub struct StreamReassembler {
    buffer: Vec<u8, STATUS_FRAME_LEN>,
}

impl StreamReassembler {
    /// Create an idle reassembler
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Drop any partially collected frame
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// True while waiting for a start marker
    pub fn is_idle(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Number of bytes collected towards the current frame
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    /// Feed a single byte
    ///
    /// Returns `None` while a frame is still being collected or while
    /// stray bytes are being skipped.
    pub fn feed(&mut self, byte: u8) -> Option<Reassembled> {
        if self.buffer.is_empty() && byte != FRAME_START {
            return None;
        }

        if self.buffer.push(byte).is_err() {
            self.buffer.clear();
            return Some(Reassembled::Overflow);
        }

        if self.buffer.len() < STATUS_FRAME_LEN {
            return None;
        }

        let result = match StatusFrame::decode(&self.buffer) {
            Ok(frame) => Reassembled::Frame(frame),
            Err(e) => Reassembled::Rejected(e),
        };
        self.buffer.clear();
        Some(result)
    }

    /// Feed a slice, invoking `on_event` for every completed or broken frame
    pub fn feed_all<F>(&mut self, bytes: &[u8], mut on_event: F)
    where
        F: FnMut(Reassembled),
    {
        for &byte in bytes {
            if let Some(event) = self.feed(byte) {
                on_event(event);
            }
        }
    }
}
