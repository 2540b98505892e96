//! On-board LED as the status indicator: slow blink while idle, 2 Hz
//! while active source, solid while a key is held, fast blink on
//! fault.

use embassy_futures::select::{select, Either};
use embassy_rp::gpio::Output;
use embassy_time::{Duration, Timer};
use pico_cec::indicator::{self, IndicatorState};

/// Half-period per state; `None` holds the LED on.
fn blink_period(state: IndicatorState) -> Option<Duration> {
    match state {
        IndicatorState::Idle => Some(Duration::from_millis(500)),
        IndicatorState::Active => Some(Duration::from_millis(250)),
        IndicatorState::KeyPressed => None,
        IndicatorState::Fault => Some(Duration::from_millis(100)),
    }
}

#[embassy_executor::task]
pub async fn indicator_led(mut led: Output<'static>) {
    let mut state = IndicatorState::Idle;
    let mut lit = false;
    loop {
        match blink_period(state) {
            Some(period) => match select(indicator::next(), Timer::after(period)).await {
                Either::First(next) => state = next,
                Either::Second(()) => {
                    lit = !lit;
                    if lit {
                        led.set_high();
                    } else {
                        led.set_low();
                    }
                }
            },
            None => {
                led.set_high();
                lit = true;
                state = indicator::next().await;
            }
        }
    }
}
