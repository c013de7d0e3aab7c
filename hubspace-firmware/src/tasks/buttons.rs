//! Wall-plate button task
//!
//! One button cycles the fan speed, the other toggles the light. Both
//! are active low with the internal pull-up enabled.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_rp::gpio::Input;
use embassy_time::{Duration, Timer};

use crate::channels::{AdapterIntent, INTENT_CHANNEL};

/// Ignore edges for this long after a press
const DEBOUNCE_MS: u64 = 50;

/// Button task - turns presses into adapter intents
#[embassy_executor::task]
pub async fn button_task(mut fan_button: Input<'static>, mut light_button: Input<'static>) {
    info!("Button task started");

    loop {
        let intent = match select(
            fan_button.wait_for_falling_edge(),
            light_button.wait_for_falling_edge(),
        )
        .await
        {
            Either::First(()) => AdapterIntent::CycleFanSpeed,
            Either::Second(()) => AdapterIntent::ToggleLight,
        };

        debug!("Button: {}", intent);
        if INTENT_CHANNEL.try_send(intent).is_err() {
            warn!("Intent channel full, dropping press");
        }

        Timer::after(Duration::from_millis(DEBOUNCE_MS)).await;
    }
}
