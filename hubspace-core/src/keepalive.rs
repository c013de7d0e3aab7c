//! Periodic keepalive timing

/// Decides when a keepalive is due
///
/// The engine additionally requires an empty queue, no response in
/// flight and the minimum send spacing before it actually transmits.
#[derive(Debug, Clone, Copy)]
pub struct KeepaliveScheduler {
    interval_ms: u32,
    last_sent_at: Option<u64>,
}

impl KeepaliveScheduler {
    pub fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms,
            last_sent_at: None,
        }
    }

    /// True if a full interval has passed since the last keepalive
    pub fn is_due(&self, now: u64) -> bool {
        match self.last_sent_at {
            Some(last) => now.saturating_sub(last) >= u64::from(self.interval_ms),
            None => true,
        }
    }

    pub fn record(&mut self, now: u64) {
        self.last_sent_at = Some(now);
    }
}
