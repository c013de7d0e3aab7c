//! HubSpace bridge firmware
//!
//! Drives a combined ceiling fan / light appliance over its 9600 baud
//! serial link from an RP2040. The protocol engine runs in a single
//! task; buttons and any host integration talk to it through the
//! channels in [`channels`].

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{self, BufferedInterruptHandler, Config as UartConfig, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use hubspace_hal::UartConfig as LineConfig;

mod channels;
mod config;
mod link;
mod tasks;

use crate::link::UartLink;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 64]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("HubSpace bridge starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let engine_config = config::load();

    // Appliance UART: GPIO0 TX, GPIO1 RX
    let line = LineConfig::APPLIANCE;
    let uart_config = to_uart_config(&line);
    info!(
        "Appliance UART: {} baud, {}us per byte",
        line.baudrate,
        line.byte_time_us()
    );

    let tx_buf = TX_BUF.init([0u8; 64]);
    let rx_buf = RX_BUF.init([0u8; 64]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();
    let link = UartLink::new(rx, tx);

    info!("UART initialized for appliance link");

    // Wall-plate buttons: GPIO14 fan, GPIO15 light
    let fan_button = Input::new(p.PIN_14, Pull::Up);
    let light_button = Input::new(p.PIN_15, Pull::Up);

    // Onboard LED shows link health
    let led = Output::new(p.PIN_25, Level::Low);

    spawner.spawn(tasks::engine_task(link, engine_config)).unwrap();
    spawner
        .spawn(tasks::button_task(fan_button, light_button))
        .unwrap();
    spawner.spawn(tasks::status_task(led)).unwrap();

    info!("All tasks spawned, bridge running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Translate the line settings into the RP2040 driver's config
fn to_uart_config(line: &LineConfig) -> UartConfig {
    use hubspace_hal::{DataBits, Parity, StopBits};

    let mut cfg = UartConfig::default();
    cfg.baudrate = line.baudrate;
    cfg.data_bits = match line.data_bits {
        DataBits::Seven => uart::DataBits::DataBits7,
        // Nine data bits are not supported by the PL011
        DataBits::Eight | DataBits::Nine => uart::DataBits::DataBits8,
    };
    cfg.parity = match line.parity {
        Parity::None => uart::Parity::ParityNone,
        Parity::Even => uart::Parity::ParityEven,
        Parity::Odd => uart::Parity::ParityOdd,
    };
    cfg.stop_bits = match line.stop_bits {
        StopBits::One => uart::StopBits::STOP1,
        StopBits::Two => uart::StopBits::STOP2,
    };
    cfg
}
