//! Protocol engine: consumes received frames, maintains device state,
//! and decides what goes back out.
//!
//! The decision core is synchronous and allocation-free: one received
//! frame in, a short list of [`Action`]s out. The surrounding task
//! (see [`crate::task`]) performs the actions: transmitting frames,
//! feeding the key queue, flipping the indicator, re-running the
//! addressing procedure.

use heapless::Vec;

use crate::cec_types::{
    CecAbortReason, CecDeviceType, CecMenuRequest, CecMenuState, CecOpCode, CecPowerStatus,
    AUDIO_STATUS_50_PCT, CEC_VERSION_1_3A, OSD_NAME, PADDR_UNKNOWN, VENDOR_ID,
};
use crate::frame::{CecFrame, LogicalAddress};
use crate::indicator::IndicatorState;
use crate::keymap::{KeyMap, HID_KEY_NONE};

/// Upper bound on actions from one frame: Set Stream Path emits three
/// frames plus an indicator change.
pub const MAX_ACTIONS: usize = 8;

pub type Actions = Vec<Action, MAX_ACTIONS>;

#[derive(Debug, Clone, PartialEq, Eq, defmt::Format)]
pub enum Action {
    Transmit(CecFrame),
    /// Push one byte onto the key-event queue (a keycode, or
    /// [`HID_KEY_NONE`] for key-up).
    HidKey(u8),
    Indicate(IndicatorState),
    /// Re-run physical-address lookup and logical-address allocation,
    /// then feed the cause back through
    /// [`CecEngine::after_readdress`].
    Readdress(ReaddressCause),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum ReaddressCause {
    /// A `ROUTING_CHANGE` moved the active route.
    RoutingChange,
    /// The TV broadcast its own `REPORT_PHYSICAL_ADDRESS`, typically
    /// after a reset; we mirror ours once re-derived.
    TvAnnounce,
}

pub struct CecEngine {
    device_type: CecDeviceType,
    keymap: KeyMap,
    laddr: LogicalAddress,
    paddr: u16,
    active_source: u16,
    audio_system_mode: bool,
    menu_active: bool,
    active_source_lost: u8,
}

impl CecEngine {
    pub fn new(device_type: CecDeviceType, keymap: KeyMap) -> CecEngine {
        CecEngine {
            device_type,
            keymap,
            laddr: LogicalAddress::BROADCAST,
            paddr: PADDR_UNKNOWN,
            active_source: PADDR_UNKNOWN,
            audio_system_mode: false,
            menu_active: false,
            active_source_lost: 0,
        }
    }

    pub fn set_addresses(&mut self, laddr: LogicalAddress, paddr: u16) {
        self.laddr = laddr;
        self.paddr = paddr;
    }

    pub fn logical_address(&self) -> LogicalAddress {
        self.laddr
    }

    pub fn physical_address(&self) -> u16 {
        self.paddr
    }

    pub fn active_source(&self) -> u16 {
        self.active_source
    }

    pub fn menu_active(&self) -> bool {
        self.menu_active
    }

    /// This node is the one currently providing video.
    fn is_selected(&self) -> bool {
        self.paddr != PADDR_UNKNOWN && self.active_source == self.paddr
    }

    fn reply(&self, dest: LogicalAddress, opcode: CecOpCode, operands: &[u8]) -> CecFrame {
        CecFrame {
            initiator: self.laddr,
            dest,
            opcode: Some(opcode.into()),
            operands: if operands.is_empty() {
                None
            } else {
                Vec::from_slice(operands).ok()
            },
        }
    }

    fn feature_abort(&self, dest: LogicalAddress, opcode: u8, reason: CecAbortReason) -> CecFrame {
        self.reply(dest, CecOpCode::FEATURE_ABORT, &[opcode, reason.into()])
    }

    fn image_view_on(&self) -> CecFrame {
        self.reply(LogicalAddress::TV, CecOpCode::IMAGE_VIEW_ON, &[])
    }

    fn active_source_broadcast(&self) -> CecFrame {
        self.reply(
            LogicalAddress::BROADCAST,
            CecOpCode::ACTIVE_SOURCE,
            &[(self.paddr >> 8) as u8, self.paddr as u8],
        )
    }

    fn device_vendor_id(&self) -> CecFrame {
        self.reply(
            LogicalAddress::BROADCAST,
            CecOpCode::DEVICE_VENDOR_ID,
            &[
                (VENDOR_ID >> 16) as u8,
                (VENDOR_ID >> 8) as u8,
                VENDOR_ID as u8,
            ],
        )
    }

    fn report_physical_address(&self) -> CecFrame {
        self.reply(
            LogicalAddress::BROADCAST,
            CecOpCode::REPORT_PHYSICAL_ADDRESS,
            &[
                (self.paddr >> 8) as u8,
                self.paddr as u8,
                self.device_type.into(),
            ],
        )
    }

    fn menu_status(&self, dest: LogicalAddress) -> CecFrame {
        let state = if self.menu_active {
            CecMenuState::ACTIVATED
        } else {
            CecMenuState::DEACTIVATED
        };
        self.reply(dest, CecOpCode::MENU_STATUS, &[state.into()])
    }

    /// Announce this node as the active source: Image View On to the
    /// TV, then Active Source to everyone.
    fn announce_active(&mut self, actions: &mut Actions) {
        push(actions, Action::Transmit(self.image_view_on()));
        push(actions, Action::Transmit(self.active_source_broadcast()));
        self.active_source_lost = 0;
    }

    /// Dispatch one received frame. The caller has already filtered
    /// on destination (self or broadcast).
    pub fn handle_frame(&mut self, frame: &CecFrame) -> Actions {
        let mut actions = Actions::new();
        let Some(opcode) = frame.opcode else {
            // Polling message; the ACK already happened at the bit
            // layer.
            return actions;
        };
        let initiator = frame.initiator;
        let broadcast = frame.dest.is_broadcast();
        let direct = !broadcast && frame.dest == self.laddr;

        use CecOpCode::*;
        match CecOpCode::try_from(opcode) {
            // Observations that require no reaction.
            Ok(FEATURE_ABORT) | Ok(IMAGE_VIEW_ON) | Ok(TEXT_VIEW_ON) | Ok(MENU_STATUS)
            | Ok(SYSTEM_AUDIO_MODE_STATUS) | Ok(REPORT_POWER_STATUS) | Ok(GET_MENU_LANGUAGE)
            | Ok(INACTIVE_SOURCE) | Ok(CEC_VERSION) | Ok(SET_OSD_NAME)
            | Ok(VENDOR_COMMAND_WITH_ID) | Ok(REPORT_AUDIO_STATUS) => {}

            Ok(STANDBY) => {
                if direct || broadcast {
                    self.active_source = PADDR_UNKNOWN;
                    push(&mut actions, Action::Indicate(IndicatorState::Idle));
                }
            }

            Ok(SYSTEM_AUDIO_MODE_REQUEST) => {
                if direct {
                    let mode = self.audio_system_mode as u8;
                    push(
                        &mut actions,
                        Action::Transmit(self.reply(initiator, SET_SYSTEM_AUDIO_MODE, &[mode])),
                    );
                }
            }

            Ok(GIVE_AUDIO_STATUS) => {
                if direct {
                    push(
                        &mut actions,
                        Action::Transmit(self.reply(
                            initiator,
                            REPORT_AUDIO_STATUS,
                            &[AUDIO_STATUS_50_PCT],
                        )),
                    );
                }
            }

            Ok(SET_SYSTEM_AUDIO_MODE) => {
                if direct || broadcast {
                    self.audio_system_mode = frame.operand(0) == Some(1);
                }
            }

            Ok(GIVE_SYSTEM_AUDIO_MODE_STATUS) => {
                if direct {
                    let mode = self.audio_system_mode as u8;
                    push(
                        &mut actions,
                        Action::Transmit(self.reply(initiator, SYSTEM_AUDIO_MODE_STATUS, &[mode])),
                    );
                }
            }

            // Operands: old paddr, new paddr. Arrives as a broadcast
            // from the switch; no destination check.
            Ok(ROUTING_CHANGE) => {
                if let Some(new_route) = frame.operand_paddr(2) {
                    self.active_source = new_route;
                    push(&mut actions, Action::Readdress(ReaddressCause::RoutingChange));
                }
            }

            Ok(ACTIVE_SOURCE) => {
                if let Some(paddr) = frame.operand_paddr(0) {
                    self.active_source = paddr;
                    self.active_source_lost = 0;
                }
            }

            Ok(REPORT_PHYSICAL_ADDRESS) => {
                if initiator == LogicalAddress::TV && broadcast {
                    push(&mut actions, Action::Readdress(ReaddressCause::TvAnnounce));
                }
            }

            Ok(REQUEST_ACTIVE_SOURCE) => {
                self.active_source_lost = self.active_source_lost.saturating_add(1);
                if self.paddr != PADDR_UNKNOWN
                    && (self.paddr == self.active_source || self.active_source_lost > 2)
                {
                    self.announce_active(&mut actions);
                }
            }

            Ok(SET_STREAM_PATH) => {
                if frame.operand_paddr(0) == Some(self.paddr) && self.paddr != PADDR_UNKNOWN {
                    self.active_source = self.paddr;
                    self.announce_active(&mut actions);
                    self.menu_active = true;
                    push(
                        &mut actions,
                        Action::Transmit(self.menu_status(LogicalAddress::TV)),
                    );
                    push(&mut actions, Action::Indicate(IndicatorState::Active));
                }
            }

            // The TV re-announcing itself: mirror our own vendor id so
            // the bus stays consistent after a TV reset.
            Ok(DEVICE_VENDOR_ID) => {
                if initiator == LogicalAddress::TV && broadcast {
                    push(&mut actions, Action::Transmit(self.device_vendor_id()));
                }
            }

            Ok(GIVE_DEVICE_VENDOR_ID) => {
                if direct {
                    push(&mut actions, Action::Transmit(self.device_vendor_id()));
                }
            }

            Ok(MENU_REQUEST) => {
                if direct {
                    match frame.operand(0).and_then(|op| CecMenuRequest::try_from(op).ok()) {
                        Some(CecMenuRequest::ACTIVATE) => self.menu_active = true,
                        Some(CecMenuRequest::DEACTIVATE) => self.menu_active = false,
                        Some(CecMenuRequest::QUERY) | None => {}
                    }
                    push(&mut actions, Action::Transmit(self.menu_status(initiator)));
                }
            }

            Ok(GIVE_DEVICE_POWER_STATUS) => {
                if direct {
                    let status = if self.active_source == self.paddr {
                        CecPowerStatus::ON
                    } else {
                        CecPowerStatus::STANDBY
                    };
                    push(
                        &mut actions,
                        Action::Transmit(self.reply(
                            initiator,
                            REPORT_POWER_STATUS,
                            &[status.into()],
                        )),
                    );
                }
            }

            Ok(GET_CEC_VERSION) => {
                if direct {
                    push(
                        &mut actions,
                        Action::Transmit(self.reply(initiator, CEC_VERSION, &[CEC_VERSION_1_3A])),
                    );
                }
            }

            Ok(GIVE_OSD_NAME) => {
                if direct {
                    push(
                        &mut actions,
                        Action::Transmit(self.reply(initiator, SET_OSD_NAME, OSD_NAME)),
                    );
                }
            }

            Ok(GIVE_PHYSICAL_ADDRESS) => {
                if direct && self.paddr != PADDR_UNKNOWN {
                    push(
                        &mut actions,
                        Action::Transmit(self.report_physical_address()),
                    );
                }
            }

            Ok(USER_CONTROL_PRESSED) => {
                if direct {
                    if let Some(key) = frame.operand(0).and_then(|code| self.keymap.get(code)) {
                        push(&mut actions, Action::HidKey(key));
                        push(&mut actions, Action::Indicate(IndicatorState::KeyPressed));
                    }
                }
            }

            Ok(USER_CONTROL_RELEASED) => {
                if direct {
                    push(&mut actions, Action::HidKey(HID_KEY_NONE));
                    let state = if self.is_selected() {
                        IndicatorState::Active
                    } else {
                        IndicatorState::Idle
                    };
                    push(&mut actions, Action::Indicate(state));
                }
            }

            Ok(ABORT) => {
                if direct {
                    push(
                        &mut actions,
                        Action::Transmit(self.feature_abort(
                            initiator,
                            opcode,
                            CecAbortReason::REFUSED,
                        )),
                    );
                }
            }

            Err(_) => {
                if direct {
                    push(
                        &mut actions,
                        Action::Transmit(self.feature_abort(
                            initiator,
                            opcode,
                            CecAbortReason::UNRECOGNIZED_OPCODE,
                        )),
                    );
                }
            }
        }
        actions
    }

    /// Follow-up once the task has re-resolved both addresses after a
    /// [`Action::Readdress`].
    pub fn after_readdress(&mut self, cause: ReaddressCause) -> Actions {
        let mut actions = Actions::new();
        match cause {
            ReaddressCause::RoutingChange => {
                if self.paddr != PADDR_UNKNOWN && self.paddr == self.active_source {
                    self.announce_active(&mut actions);
                }
            }
            ReaddressCause::TvAnnounce => {
                if self.paddr != PADDR_UNKNOWN {
                    push(
                        &mut actions,
                        Action::Transmit(self.report_physical_address()),
                    );
                }
            }
        }
        actions
    }
}

// The action vector is sized for the worst dispatch path; overflow
// would mean a new arm outgrew MAX_ACTIONS.
fn push(actions: &mut Actions, action: Action) {
    if actions.push(action).is_err() {
        defmt::error!("action list overflow");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::HID_KEY_UP_ARROW;

    fn playback_engine() -> CecEngine {
        let mut engine = CecEngine::new(CecDeviceType::PLAYBACK_DEVICE, KeyMap::default());
        engine.set_addresses(LogicalAddress(4), 0x1000);
        engine
    }

    fn rx(engine: &mut CecEngine, bytes: &[u8]) -> Actions {
        engine.handle_frame(&CecFrame::from_bytes(bytes).unwrap())
    }

    fn sent(actions: &Actions) -> std::vec::Vec<std::vec::Vec<u8>> {
        actions
            .iter()
            .filter_map(|a| match a {
                Action::Transmit(f) => Some(f.to_bytes().to_vec()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn tv_initiated_selection_via_set_stream_path() {
        let mut engine = playback_engine();
        let actions = rx(&mut engine, &[0x40, 0x86, 0x10, 0x00]);
        assert_eq!(
            sent(&actions),
            [
                vec![0x40, 0x04],             // Image View On to the TV
                vec![0x4F, 0x82, 0x10, 0x00], // Active Source broadcast
                vec![0x40, 0x8E, 0x00],       // Menu Status: activated
            ]
        );
        assert_eq!(
            actions.last(),
            Some(&Action::Indicate(IndicatorState::Active))
        );
        assert!(engine.menu_active());
        assert_eq!(engine.active_source(), 0x1000);
    }

    #[test]
    fn set_stream_path_elsewhere_is_ignored() {
        let mut engine = playback_engine();
        let actions = rx(&mut engine, &[0x40, 0x86, 0x20, 0x00]);
        assert!(actions.is_empty());
        assert!(!engine.menu_active());
    }

    #[test]
    fn remote_key_press_and_release() {
        let mut engine = playback_engine();
        let actions = rx(&mut engine, &[0x04, 0x44, 0x01]);
        assert_eq!(actions[0], Action::HidKey(HID_KEY_UP_ARROW));
        assert_eq!(actions[1], Action::Indicate(IndicatorState::KeyPressed));

        let actions = rx(&mut engine, &[0x04, 0x45]);
        assert_eq!(actions[0], Action::HidKey(HID_KEY_NONE));
        assert_eq!(actions[1], Action::Indicate(IndicatorState::Idle));
    }

    #[test]
    fn unmapped_key_press_is_dropped() {
        let mut engine = playback_engine();
        let actions = rx(&mut engine, &[0x04, 0x44, 0x60]);
        assert!(actions.is_empty());
    }

    #[test]
    fn key_release_while_selected_returns_to_active() {
        let mut engine = playback_engine();
        rx(&mut engine, &[0x40, 0x86, 0x10, 0x00]);
        let actions = rx(&mut engine, &[0x04, 0x45]);
        assert_eq!(actions[1], Action::Indicate(IndicatorState::Active));
    }

    #[test]
    fn unknown_opcode_gets_feature_abort_unrecognized() {
        let mut engine = playback_engine();
        let actions = rx(&mut engine, &[0x04, 0xC0, 0xAA]);
        assert_eq!(sent(&actions), [vec![0x40, 0x00, 0xC0, 0x00]]);
    }

    #[test]
    fn unknown_opcode_broadcast_is_ignored() {
        let mut engine = playback_engine();
        assert!(rx(&mut engine, &[0x0F, 0xC0]).is_empty());
    }

    #[test]
    fn abort_gets_feature_abort_refused() {
        let mut engine = playback_engine();
        let actions = rx(&mut engine, &[0x04, 0xFF]);
        assert_eq!(sent(&actions), [vec![0x40, 0x00, 0xFF, 0x04]]);
    }

    #[test]
    fn tv_vendor_id_broadcast_is_mirrored() {
        let mut engine = playback_engine();
        let actions = rx(&mut engine, &[0x0F, 0x87, 0x00, 0x10, 0xFA]);
        assert_eq!(sent(&actions), [vec![0x4F, 0x87, 0x00, 0x10, 0xFA]]);
    }

    #[test]
    fn vendor_id_from_other_device_is_not_mirrored() {
        let mut engine = playback_engine();
        assert!(rx(&mut engine, &[0x8F, 0x87, 0x00, 0x00, 0x01]).is_empty());
    }

    #[test]
    fn give_device_vendor_id_replies_broadcast() {
        let mut engine = playback_engine();
        let actions = rx(&mut engine, &[0x04, 0x8C]);
        assert_eq!(sent(&actions), [vec![0x4F, 0x87, 0x00, 0x10, 0xFA]]);
    }

    #[test]
    fn standby_clears_active_source() {
        let mut engine = playback_engine();
        rx(&mut engine, &[0x0F, 0x82, 0x10, 0x00]);
        assert_eq!(engine.active_source(), 0x1000);

        let actions = rx(&mut engine, &[0x0F, 0x36]);
        assert_eq!(engine.active_source(), PADDR_UNKNOWN);
        assert_eq!(actions[0], Action::Indicate(IndicatorState::Idle));

        // Direct form behaves the same.
        rx(&mut engine, &[0x0F, 0x82, 0x10, 0x00]);
        let actions = rx(&mut engine, &[0x04, 0x36]);
        assert_eq!(engine.active_source(), PADDR_UNKNOWN);
        assert_eq!(actions[0], Action::Indicate(IndicatorState::Idle));
    }

    #[test]
    fn osd_name_reply_is_literal_ascii() {
        let mut engine = playback_engine();
        let actions = rx(&mut engine, &[0x04, 0x46]);
        assert_eq!(
            sent(&actions),
            [vec![0x40, 0x47, b'P', b'i', b'c', b'o', b'-', b'C', b'E', b'C']]
        );
    }

    #[test]
    fn cec_version_reply_is_1_3a() {
        let mut engine = playback_engine();
        let actions = rx(&mut engine, &[0x04, 0x9F]);
        assert_eq!(sent(&actions), [vec![0x40, 0x9E, 0x04]]);
    }

    #[test]
    fn give_physical_address_reports_when_known() {
        let mut engine = playback_engine();
        let actions = rx(&mut engine, &[0x04, 0x83]);
        assert_eq!(sent(&actions), [vec![0x4F, 0x84, 0x10, 0x00, 0x04]]);
    }

    #[test]
    fn give_physical_address_withheld_until_edid_resolves() {
        let mut engine = CecEngine::new(CecDeviceType::PLAYBACK_DEVICE, KeyMap::default());
        engine.set_addresses(LogicalAddress(4), PADDR_UNKNOWN);
        assert!(rx(&mut engine, &[0x04, 0x83]).is_empty());
    }

    #[test]
    fn audio_mode_request_reports_current_mode() {
        let mut engine = playback_engine();
        let actions = rx(&mut engine, &[0x04, 0x70]);
        assert_eq!(sent(&actions), [vec![0x40, 0x72, 0x00]]);

        rx(&mut engine, &[0x0F, 0x72, 0x01]);
        let actions = rx(&mut engine, &[0x04, 0x70]);
        assert_eq!(sent(&actions), [vec![0x40, 0x72, 0x01]]);

        let actions = rx(&mut engine, &[0x04, 0x7D]);
        assert_eq!(sent(&actions), [vec![0x40, 0x7E, 0x01]]);
    }

    #[test]
    fn give_audio_status_reports_half_volume_unmuted() {
        let mut engine = playback_engine();
        let actions = rx(&mut engine, &[0x04, 0x71]);
        assert_eq!(sent(&actions), [vec![0x40, 0x7A, 0x32]]);
    }

    #[test]
    fn menu_request_drives_menu_state() {
        let mut engine = playback_engine();
        let actions = rx(&mut engine, &[0x04, 0x8D, 0x00]);
        assert!(engine.menu_active());
        assert_eq!(sent(&actions), [vec![0x40, 0x8E, 0x00]]);

        // Query leaves the state alone but still answers.
        let actions = rx(&mut engine, &[0x04, 0x8D, 0x02]);
        assert!(engine.menu_active());
        assert_eq!(sent(&actions), [vec![0x40, 0x8E, 0x00]]);

        let actions = rx(&mut engine, &[0x04, 0x8D, 0x01]);
        assert!(!engine.menu_active());
        assert_eq!(sent(&actions), [vec![0x40, 0x8E, 0x01]]);
    }

    #[test]
    fn power_status_tracks_selection() {
        let mut engine = playback_engine();
        let actions = rx(&mut engine, &[0x04, 0x8F]);
        assert_eq!(sent(&actions), [vec![0x40, 0x90, 0x01]]);

        rx(&mut engine, &[0x0F, 0x82, 0x10, 0x00]);
        let actions = rx(&mut engine, &[0x04, 0x8F]);
        assert_eq!(sent(&actions), [vec![0x40, 0x90, 0x00]]);
    }

    #[test]
    fn request_active_source_answers_when_selected() {
        let mut engine = playback_engine();
        rx(&mut engine, &[0x0F, 0x82, 0x10, 0x00]);
        let actions = rx(&mut engine, &[0x0F, 0x85]);
        assert_eq!(
            sent(&actions),
            [vec![0x40, 0x04], vec![0x4F, 0x82, 0x10, 0x00]]
        );
    }

    #[test]
    fn request_active_source_fallback_after_repeated_silence() {
        let mut engine = playback_engine();
        rx(&mut engine, &[0x0F, 0x82, 0x20, 0x00]);
        assert!(rx(&mut engine, &[0x0F, 0x85]).is_empty());
        assert!(rx(&mut engine, &[0x0F, 0x85]).is_empty());
        // Third unanswered request: claim the source role ourselves.
        let actions = rx(&mut engine, &[0x0F, 0x85]);
        assert_eq!(
            sent(&actions),
            [vec![0x40, 0x04], vec![0x4F, 0x82, 0x10, 0x00]]
        );
        // Counter was reset.
        assert!(rx(&mut engine, &[0x0F, 0x82, 0x20, 0x00]).is_empty());
        assert!(rx(&mut engine, &[0x0F, 0x85]).is_empty());
    }

    #[test]
    fn routing_change_readdresses_and_announces_when_routed_here() {
        let mut engine = playback_engine();
        let actions = rx(&mut engine, &[0x0F, 0x80, 0x20, 0x00, 0x10, 0x00]);
        assert_eq!(actions[0], Action::Readdress(ReaddressCause::RoutingChange));
        assert_eq!(engine.active_source(), 0x1000);

        // Task re-resolved addressing (unchanged here), then:
        engine.set_addresses(LogicalAddress(4), 0x1000);
        let actions = engine.after_readdress(ReaddressCause::RoutingChange);
        assert_eq!(
            sent(&actions),
            [vec![0x40, 0x04], vec![0x4F, 0x82, 0x10, 0x00]]
        );
    }

    #[test]
    fn routing_change_away_stays_quiet() {
        let mut engine = playback_engine();
        rx(&mut engine, &[0x0F, 0x80, 0x10, 0x00, 0x20, 0x00]);
        engine.set_addresses(LogicalAddress(4), 0x1000);
        assert!(engine.after_readdress(ReaddressCause::RoutingChange).is_empty());
    }

    #[test]
    fn tv_physical_address_broadcast_is_mirrored() {
        let mut engine = playback_engine();
        let actions = rx(&mut engine, &[0x0F, 0x84, 0x00, 0x00, 0x00]);
        assert_eq!(actions[0], Action::Readdress(ReaddressCause::TvAnnounce));

        engine.set_addresses(LogicalAddress(4), 0x1000);
        let actions = engine.after_readdress(ReaddressCause::TvAnnounce);
        assert_eq!(sent(&actions), [vec![0x4F, 0x84, 0x10, 0x00, 0x04]]);
    }

    #[test]
    fn polling_frame_is_not_an_opcode() {
        let mut engine = playback_engine();
        assert!(rx(&mut engine, &[0x44]).is_empty());
    }

    #[test]
    fn unregistered_node_answers_no_direct_messages() {
        let mut engine = CecEngine::new(CecDeviceType::PLAYBACK_DEVICE, KeyMap::default());
        engine.set_addresses(LogicalAddress::BROADCAST, 0x1000);
        assert!(rx(&mut engine, &[0x04, 0x9F]).is_empty());
        // Broadcasts are still observed.
        rx(&mut engine, &[0x0F, 0x82, 0x20, 0x00]);
        assert_eq!(engine.active_source(), 0x2000);
    }

    #[test]
    fn ignored_observations_do_not_abort() {
        let mut engine = playback_engine();
        for bytes in [
            &[0x04, 0x00, 0x9F, 0x00][..], // Feature Abort for us
            &[0x04, 0x9E, 0x04][..],       // CEC Version
            &[0x04, 0x8E, 0x00][..],       // Menu Status
            &[0x04, 0x90, 0x00][..],       // Report Power Status
            &[0x04, 0x9D, 0x10, 0x00][..], // Inactive Source
            &[0x04, 0x04][..],             // Image View On
        ] {
            assert!(rx(&mut engine, bytes).is_empty());
        }
    }
}
