//! Logical address candidates and the physical address seam.

use crate::cec_types::CecDeviceType;
use crate::frame::LogicalAddress;

pub const NUM_CANDIDATES: usize = 4;

/// Logical address candidates per device type, probed in order. 0x0f
/// means give up and stay unregistered.
const CANDIDATES: [[u8; NUM_CANDIDATES]; 6] = [
    [0x00, 0x00, 0x00, 0x00], // TV
    [0x01, 0x02, 0x09, 0x0f], // Recording Device
    [0x0f, 0x0f, 0x0f, 0x0f], // Reserved
    [0x03, 0x06, 0x07, 0x0f], // Tuner
    [0x04, 0x08, 0x0b, 0x0f], // Playback Device
    [0x05, 0x05, 0x05, 0x05], // Audio System
];

pub fn candidates(device_type: CecDeviceType) -> &'static [u8; NUM_CANDIDATES] {
    &CANDIDATES[device_type as u8 as usize]
}

/// Source of the 16-bit CEC physical address, normally the EDID
/// vendor-specific data block of the downstream sink read over DDC.
/// Returns [`crate::cec_types::PADDR_UNKNOWN`] when nothing could be
/// read.
#[allow(async_fn_in_trait)]
pub trait PhysicalAddressSource {
    async fn physical_address(&mut self) -> u16;
}

/// Fixed address, for configurations that override EDID lookup and
/// for bring-up without a sink attached.
pub struct FixedPhysicalAddress(pub u16);

impl PhysicalAddressSource for FixedPhysicalAddress {
    async fn physical_address(&mut self) -> u16 {
        self.0
    }
}

/// Candidates to probe, in order. The 0x0f padding terminates the
/// sequence: probing the broadcast address is meaningless.
pub fn probe_order(device_type: CecDeviceType) -> impl Iterator<Item = LogicalAddress> {
    candidates(device_type)
        .iter()
        .map(|&cand| LogicalAddress(cand))
        .take_while(|cand| !cand.is_broadcast())
}
