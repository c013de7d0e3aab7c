//! Echo suppression for self-issued changes
//!
//! After the engine sends "fan to level 4" the appliance may still
//! report level 3 for a frame or two: that status was produced before
//! the command was applied. Accepting it would overwrite the new value
//! and bounce the adapters back and forth. Each tracked attribute
//! therefore carries an expectation; a reported value is only accepted
//! once it matches (or there is nothing pending).

use hubspace_protocol::{ColorTemp, FanDirection, FanSpeed};

use crate::state::DeviceStatus;

/// Tracked device attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Attribute {
    FanSpeed,
    Direction,
    Brightness,
    ColorTemp,
}

/// What to do with one reported attribute value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Verdict<T> {
    /// Take the reported value; `confirmed` if it cleared an expectation
    Accept { value: T, confirmed: bool },
    /// Stale echo of the pre-command state, keep waiting for `expected`
    Suppress { expected: T },
}

impl<T: Copy> Verdict<T> {
    pub fn accepted(&self) -> Option<T> {
        match self {
            Verdict::Accept { value, .. } => Some(*value),
            Verdict::Suppress { .. } => None,
        }
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self, Verdict::Suppress { .. })
    }
}

/// Expected value for one attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PendingChange<T> {
    expected: Option<T>,
    since: u64,
}

impl<T> Default for PendingChange<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PendingChange<T> {
    pub const fn new() -> Self {
        Self {
            expected: None,
            since: 0,
        }
    }
}

impl<T: Copy + PartialEq> PendingChange<T> {
    /// Expect the appliance to report `value` from now on
    pub fn expect(&mut self, value: T, now: u64) {
        self.expected = Some(value);
        self.since = now;
    }

    pub fn has_expectation(&self) -> bool {
        self.expected.is_some()
    }

    pub fn expected(&self) -> Option<T> {
        self.expected
    }

    pub fn clear(&mut self) {
        self.expected = None;
    }

    /// Judge a reported value against the expectation
    pub fn reconcile(&mut self, reported: T) -> Verdict<T> {
        match self.expected {
            None => Verdict::Accept {
                value: reported,
                confirmed: false,
            },
            Some(expected) if expected == reported => {
                self.expected = None;
                Verdict::Accept {
                    value: reported,
                    confirmed: true,
                }
            }
            Some(expected) => Verdict::Suppress { expected },
        }
    }

    /// Drop an expectation older than `timeout_ms`
    ///
    /// Returns true if one was dropped.
    pub fn expire(&mut self, now: u64, timeout_ms: u32) -> bool {
        if self.expected.is_some() && now.saturating_sub(self.since) > u64::from(timeout_ms) {
            self.expected = None;
            true
        } else {
            false
        }
    }
}

/// Per-attribute verdicts for one status frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reconciled {
    pub fan_speed: Verdict<FanSpeed>,
    pub direction: Verdict<FanDirection>,
    pub brightness: Verdict<u8>,
    pub color_temp: Verdict<ColorTemp>,
}

impl Reconciled {
    /// Write accepted values into `status`
    pub fn apply_to(&self, status: &mut DeviceStatus) {
        if let Some(speed) = self.fan_speed.accepted() {
            status.fan_speed = speed;
        }
        if let Some(direction) = self.direction.accepted() {
            status.direction = direction;
        }
        if let Some(brightness) = self.brightness.accepted() {
            status.brightness = brightness;
        }
        if let Some(color_temp) = self.color_temp.accepted() {
            status.color_temp = color_temp;
        }
    }

    /// At least one fan attribute was accepted
    pub fn fan_accepted(&self) -> bool {
        !self.fan_speed.is_suppressed() || !self.direction.is_suppressed()
    }

    /// At least one light attribute was accepted
    pub fn light_accepted(&self) -> bool {
        !self.brightness.is_suppressed() || !self.color_temp.is_suppressed()
    }

    /// Number of attributes held back as stale echoes
    pub fn suppressed_count(&self) -> u32 {
        [
            self.fan_speed.is_suppressed(),
            self.direction.is_suppressed(),
            self.brightness.is_suppressed(),
            self.color_temp.is_suppressed(),
        ]
        .iter()
        .filter(|&&s| s)
        .count() as u32
    }
}

/// Expectations for every tracked attribute
#[derive(Debug, Clone, Default)]
pub struct ChangeReconciler {
    pub fan_speed: PendingChange<FanSpeed>,
    pub direction: PendingChange<FanDirection>,
    pub brightness: PendingChange<u8>,
    pub color_temp: PendingChange<ColorTemp>,
}

impl ChangeReconciler {
    pub const fn new() -> Self {
        Self {
            fan_speed: PendingChange::new(),
            direction: PendingChange::new(),
            brightness: PendingChange::new(),
            color_temp: PendingChange::new(),
        }
    }

    /// Judge every attribute of a reported status
    pub fn reconcile(&mut self, reported: &DeviceStatus) -> Reconciled {
        let result = Reconciled {
            fan_speed: self.fan_speed.reconcile(reported.fan_speed),
            direction: self.direction.reconcile(reported.direction),
            brightness: self.brightness.reconcile(reported.brightness),
            color_temp: self.color_temp.reconcile(reported.color_temp),
        };

        #[cfg(feature = "defmt")]
        {
            log_verdict(Attribute::FanSpeed, &result.fan_speed);
            log_verdict(Attribute::Direction, &result.direction);
            log_verdict(Attribute::Brightness, &result.brightness);
            log_verdict(Attribute::ColorTemp, &result.color_temp);
        }

        result
    }

    /// Drop every expectation older than `timeout_ms` (0 disables)
    ///
    /// Returns the number dropped.
    pub fn expire(&mut self, now: u64, timeout_ms: u32) -> u32 {
        if timeout_ms == 0 {
            return 0;
        }
        [
            self.fan_speed.expire(now, timeout_ms),
            self.direction.expire(now, timeout_ms),
            self.brightness.expire(now, timeout_ms),
            self.color_temp.expire(now, timeout_ms),
        ]
        .iter()
        .filter(|&&dropped| dropped)
        .count() as u32
    }

    /// `status` with every outstanding expectation laid over it
    ///
    /// This is what the adapters already display, so it is what they are
    /// told while the appliance catches up.
    pub fn overlay(&self, status: &DeviceStatus) -> DeviceStatus {
        DeviceStatus {
            fan_speed: self.fan_speed.expected().unwrap_or(status.fan_speed),
            direction: self.direction.expected().unwrap_or(status.direction),
            brightness: self.brightness.expected().unwrap_or(status.brightness),
            color_temp: self.color_temp.expected().unwrap_or(status.color_temp),
        }
    }

    pub fn is_pending(&self, attribute: Attribute) -> bool {
        match attribute {
            Attribute::FanSpeed => self.fan_speed.has_expectation(),
            Attribute::Direction => self.direction.has_expectation(),
            Attribute::Brightness => self.brightness.has_expectation(),
            Attribute::ColorTemp => self.color_temp.has_expectation(),
        }
    }

    pub fn any_pending(&self) -> bool {
        self.fan_speed.has_expectation()
            || self.direction.has_expectation()
            || self.brightness.has_expectation()
            || self.color_temp.has_expectation()
    }
}

#[cfg(feature = "defmt")]
fn log_verdict<T: Copy + defmt::Format>(attribute: Attribute, verdict: &Verdict<T>) {
    match verdict {
        Verdict::Accept {
            value,
            confirmed: true,
        } => defmt::trace!("{}: appliance confirmed {}", attribute, value),
        Verdict::Suppress { expected } => {
            defmt::trace!("{}: ignoring stale report, waiting for {}", attribute, expected)
        }
        Verdict::Accept { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_expectation_accepts() {
        let mut pending = PendingChange::<u8>::new();
        assert_eq!(
            pending.reconcile(40),
            Verdict::Accept {
                value: 40,
                confirmed: false
            }
        );
    }

    #[test]
    fn test_mismatch_suppresses_and_keeps_expectation() {
        let mut pending = PendingChange::new();
        pending.expect(FanSpeed::Level4, 0);

        assert_eq!(
            pending.reconcile(FanSpeed::Level3),
            Verdict::Suppress {
                expected: FanSpeed::Level4
            }
        );
        assert_eq!(pending.expected(), Some(FanSpeed::Level4));
    }

    #[test]
    fn test_match_confirms_and_clears() {
        let mut pending = PendingChange::new();
        pending.expect(FanDirection::Reverse, 0);

        assert_eq!(
            pending.reconcile(FanDirection::Reverse),
            Verdict::Accept {
                value: FanDirection::Reverse,
                confirmed: true
            }
        );
        assert!(!pending.has_expectation());

        // Later reports are taken as-is
        assert_eq!(
            pending.reconcile(FanDirection::Forward).accepted(),
            Some(FanDirection::Forward)
        );
    }

    #[test]
    fn test_newer_expectation_replaces_older() {
        let mut pending = PendingChange::new();
        pending.expect(30u8, 0);
        pending.expect(60u8, 10);

        assert!(pending.reconcile(30).is_suppressed());
        assert!(!pending.reconcile(60).is_suppressed());
    }

    #[test]
    fn test_expire() {
        let mut pending = PendingChange::new();
        pending.expect(ColorTemp::K5000, 100);

        assert!(!pending.expire(5100, 5000));
        assert!(pending.has_expectation());
        assert!(pending.expire(5101, 5000));
        assert!(!pending.has_expectation());
    }

    #[test]
    fn test_reconciler_mixed_frame() {
        let mut reconciler = ChangeReconciler::new();
        reconciler.fan_speed.expect(FanSpeed::Level4, 0);
        reconciler.brightness.expect(80, 0);

        let reported = DeviceStatus {
            fan_speed: FanSpeed::Level3,
            direction: FanDirection::Reverse,
            brightness: 80,
            color_temp: ColorTemp::K2700,
        };
        let result = reconciler.reconcile(&reported);

        assert!(result.fan_speed.is_suppressed());
        assert_eq!(result.direction.accepted(), Some(FanDirection::Reverse));
        assert_eq!(
            result.brightness,
            Verdict::Accept {
                value: 80,
                confirmed: true
            }
        );
        assert_eq!(result.suppressed_count(), 1);
        assert!(result.fan_accepted());
        assert!(result.light_accepted());
        assert!(reconciler.is_pending(Attribute::FanSpeed));
        assert!(!reconciler.is_pending(Attribute::Brightness));

        let mut status = DeviceStatus {
            fan_speed: FanSpeed::Level4,
            ..Default::default()
        };
        result.apply_to(&mut status);
        assert_eq!(status.fan_speed, FanSpeed::Level4);
        assert_eq!(status.direction, FanDirection::Reverse);
        assert_eq!(status.color_temp, ColorTemp::K2700);
    }

    #[test]
    fn test_overlay_prefers_expectations() {
        let mut reconciler = ChangeReconciler::new();
        reconciler.brightness.expect(75, 0);

        let accepted = DeviceStatus {
            fan_speed: FanSpeed::Level2,
            brightness: 10,
            ..Default::default()
        };
        let shown = reconciler.overlay(&accepted);
        assert_eq!(shown.brightness, 75);
        assert_eq!(shown.fan_speed, FanSpeed::Level2);
    }

    #[test]
    fn test_reconciler_expire_disabled_with_zero() {
        let mut reconciler = ChangeReconciler::new();
        reconciler.color_temp.expect(ColorTemp::K4000, 0);
        assert_eq!(reconciler.expire(1_000_000, 0), 0);
        assert!(reconciler.any_pending());
        assert_eq!(reconciler.expire(1_000_000, 10), 1);
        assert!(!reconciler.any_pending());
    }
}
