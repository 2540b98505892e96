//! Device configuration, loaded once at startup from an external
//! store (non-volatile flash in the full system; out of scope here,
//! only the seam is defined).

use crate::cec_types::{CecDeviceType, PADDR_UNKNOWN};
use crate::frame::LogicalAddress;
use crate::keymap::KeyMap;

#[derive(Clone)]
pub struct CecConfig {
    pub device_type: CecDeviceType,
    /// 0x00 or 0x0f request auto-allocation, anything else is used
    /// verbatim.
    pub logical_address: u8,
    /// 0x0000 requests EDID-derived lookup.
    pub physical_address: u16,
    /// Delay before the first DDC read, to let the sink settle.
    pub edid_delay_ms: u32,
    pub keymap: KeyMap,
}

impl CecConfig {
    /// The configured logical address when it is an explicit override.
    pub fn fixed_logical_address(&self) -> Option<LogicalAddress> {
        match self.logical_address {
            0x00 | 0x0f => None,
            la => Some(LogicalAddress(la)),
        }
    }
}

impl Default for CecConfig {
    fn default() -> CecConfig {
        CecConfig {
            device_type: CecDeviceType::PLAYBACK_DEVICE,
            logical_address: 0x0f,
            physical_address: PADDR_UNKNOWN,
            edid_delay_ms: 5000,
            keymap: KeyMap::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum ConfigError {
    /// The store could not be read at all.
    Unavailable,
    /// The store was read but its contents do not parse.
    Corrupt,
}

/// The external configuration store. Load failure is fatal: the
/// engine does not start and the indicator goes to fault.
pub trait ConfigStore {
    fn load(&mut self) -> Result<CecConfig, ConfigError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_allocation_markers() {
        let mut config = CecConfig::default();
        assert_eq!(config.fixed_logical_address(), None);
        config.logical_address = 0x00;
        assert_eq!(config.fixed_logical_address(), None);
        config.logical_address = 0x08;
        assert_eq!(config.fixed_logical_address(), Some(LogicalAddress(8)));
    }
}
