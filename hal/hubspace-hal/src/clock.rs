//! Monotonic time source

/// Monotonic millisecond clock
///
/// The engine only ever subtracts two readings, so the epoch is
/// arbitrary (boot time on the firmware, zero in tests).
pub trait Clock {
    /// Milliseconds since an arbitrary fixed epoch
    fn now_ms(&self) -> u64;
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}
