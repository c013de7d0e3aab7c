//! Status task
//!
//! Logs every state change and mirrors link health on the board LED.

use defmt::*;
use embassy_futures::select::{select3, Either3};
use embassy_rp::gpio::{Level, Output};

use crate::channels::{FAN_STATE, LIGHT_STATE, LINK_HEALTHY};

/// Status task - reports adapter state
#[embassy_executor::task]
pub async fn status_task(mut led: Output<'static>) {
    info!("Status task started");

    loop {
        match select3(FAN_STATE.wait(), LIGHT_STATE.wait(), LINK_HEALTHY.wait()).await {
            Either3::First(fan) => {
                info!(
                    "Fan: on={} speed={} direction={}",
                    fan.state, fan.speed, fan.direction
                );
            }
            Either3::Second(light) => {
                info!(
                    "Light: brightness={}% {}K",
                    (light.brightness * 100.0) as u8,
                    hubspace_core::adapters::mired_to_kelvin(light.color_temp_mireds) as u16
                );
            }
            Either3::Third(healthy) => {
                if healthy {
                    info!("Appliance link up");
                } else {
                    warn!("Appliance link down");
                }
                led.set_level(if healthy { Level::High } else { Level::Low });
            }
        }
    }
}
