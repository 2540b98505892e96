//! Wire-level CEC identifiers: opcodes, device types, operand codes.
//!
//! Values are bit-exact per HDMI CEC v1.3a, named after the standard's
//! messages so the dispatch in [`crate::engine`] reads like the
//! protocol tables.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// CEC version operand reported in `CEC_VERSION`: 1.3a.
pub const CEC_VERSION_1_3A: u8 = 0x04;

/// IEEE OUI reported in `DEVICE_VENDOR_ID`.
pub const VENDOR_ID: u32 = 0x0010FA;

/// ASCII name reported in `SET_OSD_NAME`.
pub const OSD_NAME: &[u8] = b"Pico-CEC";

/// Physical address value meaning "unknown / not assigned".
pub const PADDR_UNKNOWN: u16 = 0x0000;

/// `REPORT_AUDIO_STATUS` operand: volume 50 %, not muted.
pub const AUDIO_STATUS_50_PCT: u8 = 0x32;

#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive, defmt::Format)]
pub enum CecOpCode {
    FEATURE_ABORT = 0x00,
    IMAGE_VIEW_ON = 0x04,
    TEXT_VIEW_ON = 0x0D,
    STANDBY = 0x36,
    USER_CONTROL_PRESSED = 0x44,
    USER_CONTROL_RELEASED = 0x45,
    GIVE_OSD_NAME = 0x46,
    SET_OSD_NAME = 0x47,
    SYSTEM_AUDIO_MODE_REQUEST = 0x70,
    GIVE_AUDIO_STATUS = 0x71,
    SET_SYSTEM_AUDIO_MODE = 0x72,
    REPORT_AUDIO_STATUS = 0x7A,
    GIVE_SYSTEM_AUDIO_MODE_STATUS = 0x7D,
    SYSTEM_AUDIO_MODE_STATUS = 0x7E,
    ROUTING_CHANGE = 0x80,
    ACTIVE_SOURCE = 0x82,
    GIVE_PHYSICAL_ADDRESS = 0x83,
    REPORT_PHYSICAL_ADDRESS = 0x84,
    REQUEST_ACTIVE_SOURCE = 0x85,
    SET_STREAM_PATH = 0x86,
    DEVICE_VENDOR_ID = 0x87,
    GIVE_DEVICE_VENDOR_ID = 0x8C,
    MENU_REQUEST = 0x8D,
    MENU_STATUS = 0x8E,
    GIVE_DEVICE_POWER_STATUS = 0x8F,
    REPORT_POWER_STATUS = 0x90,
    GET_MENU_LANGUAGE = 0x91,
    INACTIVE_SOURCE = 0x9D,
    CEC_VERSION = 0x9E,
    GET_CEC_VERSION = 0x9F,
    VENDOR_COMMAND_WITH_ID = 0xA0,
    ABORT = 0xFF,
}

/// Device type as configured and as reported in `REPORT_PHYSICAL_ADDRESS`.
#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive, defmt::Format)]
pub enum CecDeviceType {
    TV = 0,
    RECORDING_DEVICE = 1,
    RESERVED = 2,
    TUNER = 3,
    PLAYBACK_DEVICE = 4,
    AUDIO_SYSTEM = 5,
}

/// Reason operand of `FEATURE_ABORT`.
#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive, defmt::Format)]
pub enum CecAbortReason {
    UNRECOGNIZED_OPCODE = 0,
    NOT_IN_CORRECT_MODE = 1,
    CANNOT_PROVIDE_SOURCE = 2,
    INVALID_OPERAND = 3,
    REFUSED = 4,
    UNABLE_TO_DETERMINE = 5,
}

/// Operand of `MENU_REQUEST`.
#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive, defmt::Format)]
pub enum CecMenuRequest {
    ACTIVATE = 0,
    DEACTIVATE = 1,
    QUERY = 2,
}

/// Operand of `MENU_STATUS`.
#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive, defmt::Format)]
pub enum CecMenuState {
    ACTIVATED = 0,
    DEACTIVATED = 1,
}

/// Operand of `REPORT_POWER_STATUS`.
#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive, defmt::Format)]
pub enum CecPowerStatus {
    ON = 0,
    STANDBY = 1,
    TRANSITION_STANDBY_TO_ON = 2,
    TRANSITION_ON_TO_STANDBY = 3,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_values_are_wire_exact() {
        assert_eq!(u8::from(CecOpCode::FEATURE_ABORT), 0x00);
        assert_eq!(u8::from(CecOpCode::SET_STREAM_PATH), 0x86);
        assert_eq!(u8::from(CecOpCode::GIVE_OSD_NAME), 0x46);
        assert_eq!(u8::from(CecOpCode::ABORT), 0xFF);
        assert_eq!(CecOpCode::try_from(0x8Du8).unwrap(), CecOpCode::MENU_REQUEST);
        assert!(CecOpCode::try_from(0xC0u8).is_err());
    }

    #[test]
    fn abort_reasons_match_table() {
        assert_eq!(u8::from(CecAbortReason::UNRECOGNIZED_OPCODE), 0);
        assert_eq!(u8::from(CecAbortReason::REFUSED), 4);
        assert_eq!(u8::from(CecAbortReason::UNABLE_TO_DETERMINE), 5);
    }
}
