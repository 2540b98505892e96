//! CEC user-control code to USB HID keycode mapping.
//!
//! A flat 256-entry table, one slot per possible user-control code.
//! An unmapped slot is `None`, which is distinct from mapping to the
//! HID "no key" code 0x00 used as the key-up sentinel.

use num_enum::TryFromPrimitive;

/// HID "no key" sentinel, enqueued on User Control Released.
pub const HID_KEY_NONE: u8 = 0x00;

// HID keyboard usage IDs referenced by the default map.
pub const HID_KEY_ENTER: u8 = 0x28;
pub const HID_KEY_ESCAPE: u8 = 0x29;
pub const HID_KEY_SPACE: u8 = 0x2C;
pub const HID_KEY_RIGHT_ARROW: u8 = 0x4F;
pub const HID_KEY_LEFT_ARROW: u8 = 0x50;
pub const HID_KEY_DOWN_ARROW: u8 = 0x51;
pub const HID_KEY_UP_ARROW: u8 = 0x52;
pub const HID_KEY_PAGE_UP: u8 = 0x4B;
pub const HID_KEY_PAGE_DOWN: u8 = 0x4E;
pub const HID_KEY_MUTE: u8 = 0x7F;
pub const HID_KEY_VOLUME_UP: u8 = 0x80;
pub const HID_KEY_VOLUME_DOWN: u8 = 0x81;
pub const HID_KEY_F1: u8 = 0x3A;
pub const HID_KEY_F2: u8 = 0x3B;
pub const HID_KEY_F3: u8 = 0x3C;
pub const HID_KEY_F4: u8 = 0x3D;

/// The user-control codes the default map covers.
#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, defmt::Format)]
pub enum CecUserControl {
    SELECT = 0x00,
    UP = 0x01,
    DOWN = 0x02,
    LEFT = 0x03,
    RIGHT = 0x04,
    ROOT_MENU = 0x09,
    EXIT = 0x0D,
    NUMBER_0 = 0x20,
    NUMBER_1 = 0x21,
    NUMBER_2 = 0x22,
    NUMBER_3 = 0x23,
    NUMBER_4 = 0x24,
    NUMBER_5 = 0x25,
    NUMBER_6 = 0x26,
    NUMBER_7 = 0x27,
    NUMBER_8 = 0x28,
    NUMBER_9 = 0x29,
    CHANNEL_UP = 0x30,
    CHANNEL_DOWN = 0x31,
    DISPLAY_INFO = 0x35,
    VOLUME_UP = 0x41,
    VOLUME_DOWN = 0x42,
    MUTE = 0x43,
    PLAY = 0x44,
    STOP = 0x45,
    PAUSE = 0x46,
    REWIND = 0x48,
    FAST_FORWARD = 0x49,
    SUB_PICTURE = 0x51,
    F1_BLUE = 0x71,
    F2_RED = 0x72,
    F3_GREEN = 0x73,
    F4_YELLOW = 0x74,
}

#[derive(Clone)]
pub struct KeyMap([Option<u8>; 256]);

impl KeyMap {
    pub const fn empty() -> KeyMap {
        KeyMap([None; 256])
    }

    /// HID keycode for a user-control code, `None` when unmapped.
    pub fn get(&self, code: u8) -> Option<u8> {
        self.0[code as usize]
    }

    pub fn set(&mut self, code: u8, key: u8) {
        self.0[code as usize] = Some(key);
    }

    pub fn clear(&mut self, code: u8) {
        self.0[code as usize] = None;
    }
}

impl Default for KeyMap {
    /// Navigation and transport mapping for a media-player PC.
    fn default() -> KeyMap {
        let mut map = KeyMap::empty();
        let entries: &[(CecUserControl, u8)] = &[
            (CecUserControl::SELECT, HID_KEY_ENTER),
            (CecUserControl::UP, HID_KEY_UP_ARROW),
            (CecUserControl::DOWN, HID_KEY_DOWN_ARROW),
            (CecUserControl::LEFT, HID_KEY_LEFT_ARROW),
            (CecUserControl::RIGHT, HID_KEY_RIGHT_ARROW),
            (CecUserControl::ROOT_MENU, 0x06),  // 'c', context menu
            (CecUserControl::EXIT, HID_KEY_ESCAPE),
            (CecUserControl::NUMBER_0, 0x27),
            (CecUserControl::NUMBER_1, 0x1E),
            (CecUserControl::NUMBER_2, 0x1F),
            (CecUserControl::NUMBER_3, 0x20),
            (CecUserControl::NUMBER_4, 0x21),
            (CecUserControl::NUMBER_5, 0x22),
            (CecUserControl::NUMBER_6, 0x23),
            (CecUserControl::NUMBER_7, 0x24),
            (CecUserControl::NUMBER_8, 0x25),
            (CecUserControl::NUMBER_9, 0x26),
            (CecUserControl::CHANNEL_UP, HID_KEY_PAGE_UP),
            (CecUserControl::CHANNEL_DOWN, HID_KEY_PAGE_DOWN),
            (CecUserControl::DISPLAY_INFO, 0x0C), // 'i'
            (CecUserControl::VOLUME_UP, HID_KEY_VOLUME_UP),
            (CecUserControl::VOLUME_DOWN, HID_KEY_VOLUME_DOWN),
            (CecUserControl::MUTE, HID_KEY_MUTE),
            (CecUserControl::PLAY, HID_KEY_SPACE),
            (CecUserControl::STOP, 0x1B), // 'x'
            (CecUserControl::PAUSE, HID_KEY_SPACE),
            (CecUserControl::REWIND, 0x15), // 'r'
            (CecUserControl::FAST_FORWARD, 0x09), // 'f'
            (CecUserControl::SUB_PICTURE, 0x17), // 't', subtitles
            (CecUserControl::F1_BLUE, HID_KEY_F1),
            (CecUserControl::F2_RED, HID_KEY_F2),
            (CecUserControl::F3_GREEN, HID_KEY_F3),
            (CecUserControl::F4_YELLOW, HID_KEY_F4),
        ];
        for (code, key) in entries {
            map.set(*code as u8, *key);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_map_covers_navigation() {
        let map = KeyMap::default();
        assert_eq!(map.get(CecUserControl::UP as u8), Some(HID_KEY_UP_ARROW));
        assert_eq!(map.get(CecUserControl::SELECT as u8), Some(HID_KEY_ENTER));
        assert_eq!(map.get(CecUserControl::EXIT as u8), Some(HID_KEY_ESCAPE));
    }

    #[test]
    fn unmapped_is_distinct_from_no_key() {
        let mut map = KeyMap::empty();
        assert_eq!(map.get(0x60), None);
        map.set(0x60, HID_KEY_NONE);
        assert_eq!(map.get(0x60), Some(HID_KEY_NONE));
        map.clear(0x60);
        assert_eq!(map.get(0x60), None);
    }
}
