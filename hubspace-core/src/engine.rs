//! Protocol engine
//!
//! Owns every piece of mutable protocol state and advances it from a
//! single [`ProtocolEngine::tick`]. Each tick, in order:
//!
//! 1. runs the boot sequence until it completes, otherwise
//! 2. services the command queue,
//! 3. sends a keepalive if one is due and the link is idle,
//! 4. drains received bytes into the reassembler and reconciles every
//!    completed status frame.
//!
//! Step 4 runs even when a transmit in steps 1-3 fails; the write error
//! is returned after the receive side has been serviced.
//!
//! Nothing in here blocks (apart from [`ProtocolEngine::boot_blocking`],
//! which callers opt into) and nothing is fatal: garbled frames and
//! missing responses are counted in [`LinkStats`] and skipped.

use embedded_hal::delay::DelayNs;
use hubspace_hal::{Clock, SerialLink};
use hubspace_protocol::{
    ColorTemp, CommandCode, CommandFrame, FanDirection, FanSpeed, Reassembled, StatusFrame,
    StreamReassembler,
};

use crate::boot::{BootPoll, BootSequence, BootStep};
use crate::config::EngineConfig;
use crate::keepalive::KeepaliveScheduler;
use crate::queue::{CommandQueue, QueueError};
use crate::reconcile::ChangeReconciler;
use crate::state::{DeviceStatus, FanState, LightState, StatusSnapshot};

/// Receiver of reconciled device state
///
/// Implemented by the fan and light adapters. Both methods default to
/// no-ops so a fan-only or light-only adapter only overrides one.
pub trait DeviceStateSink {
    /// Fan state changed (or a fan command was acknowledged)
    fn on_fan_update(&mut self, _fan: &FanState) {}

    /// Light state changed (or a light command was acknowledged)
    fn on_light_update(&mut self, _light: &LightState) {}
}

/// No adapters attached
impl DeviceStateSink for () {}

/// Commands the adapters may issue
///
/// Every call only enqueues; transmission happens on a later tick.
pub trait ApplianceControl {
    fn send_fan_speed(&mut self, speed: FanSpeed) -> Result<(), QueueError>;

    /// Brightness in percent; values above 100 are clamped
    fn send_brightness(&mut self, percent: u8) -> Result<(), QueueError>;

    fn send_direction(&mut self, reverse: bool) -> Result<(), QueueError>;

    fn send_color_temp(&mut self, color_temp: ColorTemp) -> Result<(), QueueError>;
}

/// Engine errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineError<E> {
    /// Transport read/write failed
    Link(E),
    /// Command could not be queued
    Queue(QueueError),
}

impl<E> From<QueueError> for EngineError<E> {
    fn from(e: QueueError) -> Self {
        EngineError::Queue(e)
    }
}

/// Link health counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStats {
    /// Valid status frames received
    pub frames_ok: u32,
    /// 12-byte windows that failed to decode
    pub checksum_errors: u32,
    /// Reassembly buffer overruns
    pub overflows: u32,
    /// Commands abandoned after the response timeout
    pub response_timeouts: u32,
    /// Real commands transmitted (boot commands included)
    pub commands_sent: u32,
    pub keepalives_sent: u32,
    /// Attribute reports held back as stale echoes
    pub stale_echoes: u32,
    /// Expectations dropped without confirmation
    pub expired_expectations: u32,
}

/// The protocol engine
pub struct ProtocolEngine<L, S = ()>
where
    L: SerialLink,
    S: DeviceStateSink,
{
    link: L,
    sink: Option<S>,
    config: EngineConfig,
    boot: BootSequence,
    queue: CommandQueue,
    keepalive: KeepaliveScheduler,
    reassembler: StreamReassembler,
    reconciler: ChangeReconciler,
    status: StatusSnapshot,
    stats: LinkStats,
    last_frame_at: Option<u64>,
    now: u64,
}

impl<L: SerialLink> ProtocolEngine<L> {
    /// Create an engine with no adapters attached
    pub fn new(link: L, config: EngineConfig) -> Self {
        Self::build(link, config, None)
    }
}

impl<L, S> ProtocolEngine<L, S>
where
    L: SerialLink,
    S: DeviceStateSink,
{
    fn build(link: L, config: EngineConfig, sink: Option<S>) -> Self {
        Self {
            link,
            sink,
            boot: BootSequence::new(&config.boot_commands, config.boot_settle_ms),
            queue: CommandQueue::new(config.response_timeout_ms, config.min_spacing_ms),
            keepalive: KeepaliveScheduler::new(config.keepalive_interval_ms),
            reassembler: StreamReassembler::new(),
            reconciler: ChangeReconciler::new(),
            status: StatusSnapshot::new(),
            stats: LinkStats::default(),
            last_frame_at: None,
            now: 0,
            config,
        }
    }

    /// Create an engine with adapters attached
    pub fn with_sink(link: L, config: EngineConfig, sink: S) -> Self {
        Self::build(link, config, Some(sink))
    }

    /// Attach (or replace) the adapters
    pub fn set_sink(&mut self, sink: S) {
        self.sink = Some(sink);
    }

    pub fn take_sink(&mut self) -> Option<S> {
        self.sink.take()
    }

    pub fn sink(&self) -> Option<&S> {
        self.sink.as_ref()
    }

    pub fn sink_mut(&mut self) -> Option<&mut S> {
        self.sink.as_mut()
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Reconciled device state
    pub fn status(&self) -> &DeviceStatus {
        self.status.current()
    }

    /// Reconciled state with outstanding expectations applied
    pub fn effective_status(&self) -> DeviceStatus {
        self.reconciler.overlay(self.status.current())
    }

    pub fn fan_state(&self) -> FanState {
        self.status.current().fan()
    }

    pub fn light_state(&self) -> LightState {
        self.status.current().light()
    }

    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }

    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    pub fn reconciler(&self) -> &ChangeReconciler {
        &self.reconciler
    }

    pub fn boot_step(&self) -> BootStep {
        self.boot.step()
    }

    pub fn is_booted(&self) -> bool {
        self.boot.is_done()
    }

    /// True if a valid status frame arrived within `link_timeout_ms`
    pub fn is_link_healthy(&self, now: u64) -> bool {
        match self.last_frame_at {
            Some(at) => now.saturating_sub(at) <= u64::from(self.config.link_timeout_ms),
            None => false,
        }
    }

    /// Advance the engine to `now` (milliseconds, monotonic)
    pub fn tick(&mut self, now: u64) -> Result<(), EngineError<L::Error>> {
        self.now = now;

        let sent = if self.boot.is_done() {
            self.expire_expectations(now);
            self.service_queue(now)
                .and_then(|()| self.service_keepalive(now))
        } else {
            self.service_boot(now)
        };

        self.drain_link(now)?;
        sent
    }

    /// Run the boot sequence to completion, sleeping between steps
    ///
    /// Blocks for roughly `boot_commands.len() * boot_settle_ms`.
    /// Received bytes are still processed while waiting.
    pub fn boot_blocking<C, D>(&mut self, clock: &C, delay: &mut D) -> Result<(), EngineError<L::Error>>
    where
        C: Clock,
        D: DelayNs,
    {
        while !self.boot.is_done() {
            let now = clock.now_ms();
            self.tick(now)?;

            let wait = self.boot.remaining_ms(now);
            if wait > 0 {
                delay.delay_ms(u32::try_from(wait).unwrap_or(u32::MAX));
            }
        }
        Ok(())
    }

    fn service_boot(&mut self, now: u64) -> Result<(), EngineError<L::Error>> {
        match self.boot.poll(now) {
            BootPoll::Send(frame) => {
                self.transmit(&frame)?;
                self.queue.record_unacknowledged_send(now);
                self.stats.commands_sent += 1;

                #[cfg(feature = "defmt")]
                defmt::debug!("boot command 0x{:02x} sent", frame.cmd());
            }
            BootPoll::Finished => {
                #[cfg(feature = "defmt")]
                defmt::info!("boot sequence complete");

                // Nothing to restore before the first status frame
                if self.config.restore_on_boot && self.status.has_baseline() {
                    let restore = *self.status.current();
                    self.send_fan_speed(restore.fan_speed)?;
                    self.send_brightness(restore.brightness)?;
                }
            }
            BootPoll::Wait | BootPoll::Idle => {}
        }
        Ok(())
    }

    fn expire_expectations(&mut self, now: u64) {
        let dropped = self
            .reconciler
            .expire(now, self.config.expectation_timeout_ms);
        if dropped > 0 {
            self.stats.expired_expectations += dropped;

            #[cfg(feature = "defmt")]
            defmt::warn!("{} expectation(s) never confirmed, dropped", dropped);
        }
    }

    fn service_queue(&mut self, now: u64) -> Result<(), EngineError<L::Error>> {
        let dispatch = self.queue.tick(now);

        if let Some(_cmd) = dispatch.timed_out {
            self.stats.response_timeouts += 1;

            #[cfg(feature = "defmt")]
            defmt::warn!("no response to {}, moving on", _cmd);
        }

        if let Some(entry) = dispatch.send {
            self.transmit(&entry.frame())?;
            self.stats.commands_sent += 1;

            #[cfg(feature = "defmt")]
            defmt::debug!("sent {} ({:02x} {:02x})", entry.cmd, entry.high, entry.low);
        }
        Ok(())
    }

    fn service_keepalive(&mut self, now: u64) -> Result<(), EngineError<L::Error>> {
        // The queue only checks its timeout while it has work
        if let Some(_cmd) = self.queue.expire_response(now) {
            self.stats.response_timeouts += 1;

            #[cfg(feature = "defmt")]
            defmt::warn!("no response to {}, moving on", _cmd);
        }

        let link_idle = self.queue.is_empty()
            && !self.queue.is_awaiting_response()
            && self.queue.spacing_elapsed(now);
        if !link_idle || !self.keepalive.is_due(now) {
            return Ok(());
        }

        // Recorded before the write: a failed attempt also waits out the interval
        self.queue.record_send(CommandCode::Keepalive, now);
        self.keepalive.record(now);
        self.transmit(&CommandFrame::encode(CommandCode::Keepalive, 0, 0))?;
        self.stats.keepalives_sent += 1;
        Ok(())
    }

    fn transmit(&mut self, frame: &CommandFrame) -> Result<(), EngineError<L::Error>> {
        self.link
            .write_bytes(frame.as_bytes())
            .map_err(EngineError::Link)?;
        self.link.flush().map_err(EngineError::Link)
    }

    fn drain_link(&mut self, now: u64) -> Result<(), EngineError<L::Error>> {
        while self.link.bytes_available() > 0 {
            let byte = self.link.read_byte().map_err(EngineError::Link)?;

            match self.reassembler.feed(byte) {
                Some(Reassembled::Frame(frame)) => self.handle_status(&frame, now),
                Some(Reassembled::Rejected(_e)) => {
                    self.stats.checksum_errors += 1;

                    #[cfg(feature = "defmt")]
                    defmt::warn!("status frame dropped: {}", _e);
                }
                Some(Reassembled::Overflow) => {
                    self.stats.overflows += 1;

                    #[cfg(feature = "defmt")]
                    defmt::warn!("reassembly overflow, buffer reset");
                }
                None => {}
            }
        }
        Ok(())
    }

    fn handle_status(&mut self, frame: &StatusFrame, now: u64) {
        self.stats.frames_ok += 1;
        self.last_frame_at = Some(now);

        if let Some(code) = frame.response_code() {
            self.queue.acknowledge(code);
        }

        let reported = DeviceStatus::from_frame(frame);
        let verdicts = self.reconciler.reconcile(&reported);
        self.stats.stale_echoes += verdicts.suppressed_count();
        verdicts.apply_to(self.status.current_mut());

        // First frame: nothing to compare against. Command responses:
        // always report what was accepted. Keepalive responses: only
        // report real changes.
        let first = !self.status.has_baseline();
        let acknowledges_command = !frame.is_keepalive_response();
        let notify_fan =
            first || (acknowledges_command && verdicts.fan_accepted()) || self.status.fan_changed();
        let notify_light = first
            || (acknowledges_command && verdicts.light_accepted())
            || self.status.light_changed();

        if let Some(sink) = self.sink.as_mut() {
            let shown = self.reconciler.overlay(self.status.current());
            if notify_fan {
                sink.on_fan_update(&shown.fan());
            }
            if notify_light {
                sink.on_light_update(&shown.light());
            }
        }

        self.status.commit();
    }
}

impl<L, S> ApplianceControl for ProtocolEngine<L, S>
where
    L: SerialLink,
    S: DeviceStateSink,
{
    fn send_fan_speed(&mut self, speed: FanSpeed) -> Result<(), QueueError> {
        self.queue
            .enqueue(CommandCode::FanSpeed, speed.code(), 0, self.now)?;
        self.reconciler.fan_speed.expect(speed, self.now);
        Ok(())
    }

    fn send_brightness(&mut self, percent: u8) -> Result<(), QueueError> {
        let percent = percent.min(100);
        self.queue
            .enqueue(CommandCode::Brightness, percent, 0, self.now)?;
        self.reconciler.brightness.expect(percent, self.now);
        Ok(())
    }

    fn send_direction(&mut self, reverse: bool) -> Result<(), QueueError> {
        self.queue
            .enqueue(CommandCode::Direction, u8::from(reverse), 0, self.now)?;
        self.reconciler
            .direction
            .expect(FanDirection::from_reverse(reverse), self.now);
        Ok(())
    }

    fn send_color_temp(&mut self, color_temp: ColorTemp) -> Result<(), QueueError> {
        self.queue
            .enqueue(CommandCode::ColorTemp, color_temp.code(), 0, self.now)?;
        self.reconciler.color_temp.expect(color_temp, self.now);
        Ok(())
    }
}
