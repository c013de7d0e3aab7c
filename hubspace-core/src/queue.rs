//! Paced command dispatch
//!
//! The wire protocol has no sequence numbers, so "waiting for a
//! response" is tracked by command code plus a wall-clock timeout. At
//! most one command is in flight, and consecutive transmissions are kept
//! at least `min_spacing_ms` apart so the half-duplex link never floods.

use heapless::Vec;
use hubspace_protocol::{CommandCode, CommandFrame};

/// Queue capacity; entries coalesce per command code, so the four
/// control codes never fill it
pub const QUEUE_CAPACITY: usize = 8;

/// Queue errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QueueError {
    /// No free slot for a new command code
    Full,
}

/// A command waiting to be transmitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QueuedCommand {
    pub cmd: CommandCode,
    pub high: u8,
    pub low: u8,
    /// Time of the most recent enqueue for this code
    pub enqueued_at: u64,
}

impl QueuedCommand {
    pub fn frame(&self) -> CommandFrame {
        CommandFrame::encode(self.cmd, self.high, self.low)
    }
}

/// The command currently awaiting its status response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InFlight {
    pub cmd: CommandCode,
    pub sent_at: u64,
}

/// Result of one [`CommandQueue::tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Dispatch {
    /// Command whose response wait expired during this tick
    pub timed_out: Option<CommandCode>,
    /// Command to put on the wire now
    pub send: Option<QueuedCommand>,
}

/// Coalescing FIFO of outbound commands
#[derive(Debug, Clone)]
pub struct CommandQueue {
    entries: Vec<QueuedCommand, QUEUE_CAPACITY>,
    in_flight: Option<InFlight>,
    last_sent_at: Option<u64>,
    response_timeout_ms: u32,
    min_spacing_ms: u32,
}

impl CommandQueue {
    pub fn new(response_timeout_ms: u32, min_spacing_ms: u32) -> Self {
        Self {
            entries: Vec::new(),
            in_flight: None,
            last_sent_at: None,
            response_timeout_ms,
            min_spacing_ms,
        }
    }

    /// Queue a command, replacing any queued entry with the same code
    ///
    /// A replaced entry keeps its position; only payload and timestamp
    /// change.
    pub fn enqueue(&mut self, cmd: CommandCode, high: u8, low: u8, now: u64) -> Result<(), QueueError> {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.cmd == cmd) {
            entry.high = high;
            entry.low = low;
            entry.enqueued_at = now;
            return Ok(());
        }

        self.entries
            .push(QueuedCommand {
                cmd,
                high,
                low,
                enqueued_at: now,
            })
            .map_err(|_| QueueError::Full)
    }

    /// Service the queue
    ///
    /// Does nothing while empty. Otherwise waits out an in-flight
    /// response (or its timeout) and the minimum spacing, then pops the
    /// front entry and marks it in flight.
    pub fn tick(&mut self, now: u64) -> Dispatch {
        let mut dispatch = Dispatch::default();

        if self.entries.is_empty() {
            return dispatch;
        }

        if self.in_flight.is_some() {
            dispatch.timed_out = self.expire_response(now);
            if dispatch.timed_out.is_none() {
                return dispatch;
            }
        }

        if !self.spacing_elapsed(now) {
            return dispatch;
        }

        let entry = self.entries.remove(0);
        self.record_send(entry.cmd, now);
        dispatch.send = Some(entry);
        dispatch
    }

    /// Clear the in-flight marker if its response wait has run out
    ///
    /// Returns the abandoned command. The command is not retried.
    pub fn expire_response(&mut self, now: u64) -> Option<CommandCode> {
        let in_flight = self.in_flight?;
        if now.saturating_sub(in_flight.sent_at) > u64::from(self.response_timeout_ms) {
            self.in_flight = None;
            Some(in_flight.cmd)
        } else {
            None
        }
    }

    /// Note a status frame answering `cmd`
    ///
    /// Returns true if it matched the in-flight command.
    pub fn acknowledge(&mut self, cmd: CommandCode) -> bool {
        match self.in_flight {
            Some(in_flight) if in_flight.cmd == cmd => {
                self.in_flight = None;
                true
            }
            _ => false,
        }
    }

    /// Mark `cmd` as transmitted at `now` and awaiting a response
    pub fn record_send(&mut self, cmd: CommandCode, now: u64) {
        self.in_flight = Some(InFlight { cmd, sent_at: now });
        self.last_sent_at = Some(now);
    }

    /// Note a transmission that expects no response (boot commands)
    pub fn record_unacknowledged_send(&mut self, now: u64) {
        self.last_sent_at = Some(now);
    }

    /// True once the minimum inter-send spacing has passed
    pub fn spacing_elapsed(&self, now: u64) -> bool {
        match self.last_sent_at {
            Some(last) => now.saturating_sub(last) >= u64::from(self.min_spacing_ms),
            None => true,
        }
    }

    pub fn in_flight(&self) -> Option<InFlight> {
        self.in_flight
    }

    pub fn is_awaiting_response(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Queued entries, front first
    pub fn entries(&self) -> &[QueuedCommand] {
        &self.entries
    }
}
