//! Engine task
//!
//! Owns the protocol engine and both adapters. Every tick advances the
//! engine; intents from other tasks are applied to the adapters and
//! queued on the engine between ticks.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Instant, Ticker};

use hubspace_core::adapters::{FanCall, FanLightAdapters, LightCall};
use hubspace_core::{DeviceStateSink, EngineConfig, FanState, LightState, ProtocolEngine};
use hubspace_protocol::FanSpeed;

use crate::channels::{AdapterIntent, FAN_STATE, INTENT_CHANNEL, LIGHT_STATE, LINK_HEALTHY};
use crate::link::UartLink;

/// Tick interval in milliseconds
pub const TICK_INTERVAL_MS: u64 = 10;

/// Log link statistics this often
const STATS_INTERVAL_MS: u64 = 30_000;

/// Adapters that publish every update to the state signals
#[derive(Default)]
struct PublishingAdapters {
    inner: FanLightAdapters,
}

impl DeviceStateSink for PublishingAdapters {
    fn on_fan_update(&mut self, fan: &FanState) {
        self.inner.on_fan_update(fan);
        FAN_STATE.signal(self.inner.fan);
    }

    fn on_light_update(&mut self, light: &LightState) {
        self.inner.on_light_update(light);
        LIGHT_STATE.signal(self.inner.light);
    }
}

type Engine = ProtocolEngine<UartLink, PublishingAdapters>;

/// Engine task - drives the appliance link
#[embassy_executor::task]
pub async fn engine_task(link: UartLink, config: EngineConfig) {
    info!("Engine task started");

    let mut engine = ProtocolEngine::with_sink(link, config, PublishingAdapters::default());
    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS));
    let mut link_healthy = false;
    let mut next_stats = STATS_INTERVAL_MS;

    loop {
        match select(ticker.next(), INTENT_CHANNEL.receive()).await {
            Either::First(()) => {
                let now = Instant::now().as_millis();

                if let Err(e) = engine.tick(now) {
                    warn!("Engine tick failed: {}", e);
                }

                let healthy = engine.is_link_healthy(now);
                if healthy != link_healthy {
                    link_healthy = healthy;
                    LINK_HEALTHY.signal(healthy);
                }

                if now >= next_stats {
                    next_stats = now + STATS_INTERVAL_MS;
                    info!("Link stats: {}", engine.stats());
                }
            }
            Either::Second(intent) => apply_intent(&mut engine, intent),
        }
    }
}

/// Apply an intent to the adapters and queue the resulting commands
fn apply_intent(engine: &mut Engine, intent: AdapterIntent) {
    let Some(adapters) = engine.sink_mut() else {
        return;
    };

    let result = match intent {
        AdapterIntent::Fan(call) => {
            let intent = adapters.inner.fan.apply_call(&call);
            FAN_STATE.signal(adapters.inner.fan);
            intent.dispatch(engine)
        }
        AdapterIntent::CycleFanSpeed => {
            let call = next_fan_speed(adapters.inner.fan.speed);
            let intent = adapters.inner.fan.apply_call(&call);
            FAN_STATE.signal(adapters.inner.fan);
            intent.dispatch(engine)
        }
        AdapterIntent::Light(call) => {
            let intent = adapters.inner.light.apply_call(&call);
            LIGHT_STATE.signal(adapters.inner.light);
            intent.dispatch(engine)
        }
        AdapterIntent::ToggleLight => {
            let call = LightCall {
                brightness: Some(if adapters.inner.light.is_on() { 0.0 } else { 1.0 }),
                color_temp_mireds: None,
            };
            let intent = adapters.inner.light.apply_call(&call);
            LIGHT_STATE.signal(adapters.inner.light);
            intent.dispatch(engine)
        }
    };

    if let Err(e) = result {
        warn!("Command dropped: {}", e);
    }
}

/// Call for the speed after `level`; off follows the top speed
fn next_fan_speed(level: u8) -> FanCall {
    let next = if level >= FanSpeed::LEVELS { 0 } else { level + 1 };
    FanCall {
        state: Some(next > 0),
        speed: Some(next),
        direction: None,
    }
}
