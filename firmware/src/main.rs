#![no_std]
#![no_main]

mod led;

use defmt::{info, unwrap};
use embassy_executor::Spawner;
use embassy_rp::gpio::{Level, Output, OutputOpenDrain};
use pico_cec::address::FixedPhysicalAddress;
use pico_cec::config::{CecConfig, ConfigError, ConfigStore};
use pico_cec::line::CecPin;
use pico_cec::task;
use {defmt_rtt as _, panic_probe as _};

/// The CEC line on GP3, wired to HDMI pin 13 through the open-drain
/// level circuit.
struct CecGpio(OutputOpenDrain<'static>);

impl CecPin for CecGpio {
    fn set_low(&mut self) {
        self.0.set_low()
    }

    fn set_high(&mut self) {
        self.0.set_high()
    }

    fn is_low(&mut self) -> bool {
        self.0.is_low()
    }

    fn is_high(&mut self) -> bool {
        self.0.is_high()
    }

    async fn wait_for_falling_edge(&mut self) {
        self.0.wait_for_falling_edge().await
    }

    async fn wait_for_rising_edge(&mut self) {
        self.0.wait_for_rising_edge().await
    }

    async fn wait_for_high(&mut self) {
        self.0.wait_for_high().await
    }
}

/// Stand-in for the non-volatile store: compile-time defaults.
struct BuiltinConfig;

impl ConfigStore for BuiltinConfig {
    fn load(&mut self) -> Result<CecConfig, ConfigError> {
        Ok(CecConfig::default())
    }
}

#[embassy_executor::task]
async fn cec_line(pin: CecGpio) {
    pico_cec::line::line_handler(pin).await
}

#[embassy_executor::task]
async fn cec_protocol() {
    // TODO: replace the fixed physical address with the DDC EDID
    // reader once the I2C wiring to the sink connector lands.
    task::protocol_task(BuiltinConfig, FixedPhysicalAddress(0x1000)).await
}

/// The USB HID keyboard task consumes this queue; log the events
/// until it is wired up.
#[embassy_executor::task]
async fn hid_keys() {
    let keys = task::key_events();
    loop {
        let key = keys.receive().await;
        info!("hid: key event {:x}", key);
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());

    let cec0 = OutputOpenDrain::new(p.PIN_3, Level::High);
    let led = Output::new(p.PIN_25, Level::Low);

    unwrap!(spawner.spawn(cec_line(CecGpio(cec0))));
    unwrap!(spawner.spawn(cec_protocol()));
    unwrap!(spawner.spawn(hid_keys()));
    unwrap!(spawner.spawn(led::indicator_led(led)));

    info!("Pico-CEC up");
}
