//! The protocol-engine task: startup sequence and the
//! receive-dispatch loop tying the engine to the line driver, the
//! key-event queue and the indicator.

use defmt::{error, info, warn};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver};
use embassy_time::{with_timeout, Duration, Timer};

use crate::address::{self, PhysicalAddressSource};
use crate::cec_types::PADDR_UNKNOWN;
use crate::config::{CecConfig, ConfigStore};
use crate::engine::{Action, CecEngine};
use crate::frame::LogicalAddress;
use crate::indicator::{self, IndicatorState};
use crate::line;

/// Depth of the key-event queue feeding the HID task.
pub const KEY_QUEUE_DEPTH: usize = 8;

/// Grace period before a key event is dropped on a full queue.
const KEY_ENQUEUE_TIMEOUT: Duration = Duration::from_millis(10);

static KEY_EVENTS: Channel<CriticalSectionRawMutex, u8, KEY_QUEUE_DEPTH> = Channel::new();

/// Consuming end of the key-event queue, for the HID task.
pub fn key_events() -> Receiver<'static, CriticalSectionRawMutex, u8, KEY_QUEUE_DEPTH> {
    KEY_EVENTS.receiver()
}

async fn resolve_physical_address(
    config: &CecConfig,
    edid: &mut impl PhysicalAddressSource,
) -> u16 {
    if config.physical_address != PADDR_UNKNOWN {
        config.physical_address
    } else {
        edid.physical_address().await
    }
}

/// Claim a logical address by polling the candidates for our device
/// type. A poll nobody ACKs means the address is free.
async fn claim_logical_address(config: &CecConfig) -> LogicalAddress {
    if let Some(fixed) = config.fixed_logical_address() {
        return fixed;
    }
    for cand in address::probe_order(config.device_type) {
        info!("cec: probing logical address {}", cand);
        if !line::ping(cand).await {
            return cand;
        }
    }
    warn!("cec: no free logical address, staying unregistered");
    LogicalAddress::BROADCAST
}

async fn readdress(
    engine: &mut CecEngine,
    config: &CecConfig,
    edid: &mut impl PhysicalAddressSource,
) {
    let paddr = resolve_physical_address(config, edid).await;
    let laddr = claim_logical_address(config).await;
    line::set_local_address(laddr);
    engine.set_addresses(laddr, paddr);
    info!("cec: logical address {}, physical address {:x}", laddr, paddr);
}

async fn perform(action: Action) {
    match action {
        Action::Transmit(frame) => {
            if let Err(err) = line::send_with_result(frame).await {
                warn!("cec: transmit failed: {}", err);
            }
        }
        Action::HidKey(key) => {
            if with_timeout(KEY_ENQUEUE_TIMEOUT, KEY_EVENTS.send(key))
                .await
                .is_err()
            {
                warn!("hid: key queue full, dropping {:x}", key);
            }
        }
        Action::Indicate(state) => indicator::set(state),
        // Re-addressing is handled in the dispatch loop; it needs the
        // config and the EDID source.
        Action::Readdress(_) => {}
    }
}

async fn park_fault() -> ! {
    indicator::set(IndicatorState::Fault);
    loop {
        core::future::pending::<()>().await;
    }
}

/// Protocol engine entry point, spawned alongside
/// [`line::line_handler`]. Never returns.
pub async fn protocol_task(
    mut store: impl ConfigStore,
    mut edid: impl PhysicalAddressSource,
) -> ! {
    let config = match store.load() {
        Ok(config) => config,
        Err(err) => {
            error!("cec: configuration load failed: {}", err);
            park_fault().await
        }
    };

    let mut subscriber = match line::subscribe_incoming() {
        Ok(subscriber) => subscriber,
        Err(_) => {
            error!("cec: no incoming subscriber slot left");
            park_fault().await
        }
    };

    // Let the sink settle before the first DDC read.
    Timer::after(Duration::from_millis(config.edid_delay_ms as u64)).await;

    let mut engine = CecEngine::new(config.device_type, config.keymap.clone());
    readdress(&mut engine, &config, &mut edid).await;
    indicator::set(IndicatorState::Idle);

    loop {
        let frame = line::recv_frame(&mut subscriber).await;
        for action in engine.handle_frame(&frame) {
            if let Action::Readdress(cause) = action {
                readdress(&mut engine, &config, &mut edid).await;
                for follow_up in engine.after_readdress(cause) {
                    perform(follow_up).await;
                }
            } else {
                perform(action).await;
            }
        }
    }
}
