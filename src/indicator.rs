//! Status indicator interface. The engine asserts a state on every
//! transition; whatever drives the LEDs consumes the latest one.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum IndicatorState {
    /// Powered but not selected as the active source.
    Idle,
    /// This node is the active source.
    Active,
    /// A remote key is currently held down.
    KeyPressed,
    /// Unrecoverable startup failure.
    Fault,
}

static INDICATOR: Signal<CriticalSectionRawMutex, IndicatorState> = Signal::new();

pub fn set(state: IndicatorState) {
    INDICATOR.signal(state);
}

/// Latest state change. Intermediate states may be coalesced.
pub async fn next() -> IndicatorState {
    INDICATOR.wait().await
}
