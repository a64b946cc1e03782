//! Authoritative session state.
//!
//! Owned by the session task, which is its only writer. Everyone else sees
//! [`SessionSnapshot`] values published on a watch channel.

use std::collections::BTreeSet;

use super::message::ServerMessage;
use crate::core::{ItemId, LocationId, ProtocolError};

/// Connection lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionPhase {
    /// No connection.
    #[default]
    Disconnected,
    /// Socket open, waiting for `Connected`.
    Connecting,
    /// Slot authenticated, item list not received yet.
    Connected,
    /// Slot authenticated and the item list is authoritative.
    Synced,
}

impl SessionPhase {
    /// Whether the server will accept checks.
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected | Self::Synced)
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Synced => "synced",
        };
        f.write_str(name)
    }
}

/// Who we are in the room.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotInfo {
    /// Slot number.
    pub slot: u32,
    /// Team number.
    pub team: u32,
    /// Seed of the room.
    pub seed_name: String,
    /// Goal option from slot data.
    pub goal: Option<u32>,
}

/// Point-in-time copy of the session, handed to other tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Connection phase.
    pub phase: SessionPhase,
    /// Number of `Connected` handshakes so far; a new value is a new baseline.
    pub generation: u64,
    /// Items received by this slot, in delivery order.
    pub received_items: Vec<ItemId>,
    /// Locations the server recorded for this slot.
    pub acknowledged_locations: BTreeSet<LocationId>,
    /// Whether the goal was reported in this connection.
    pub goal_reached: bool,
    /// Slot details, once connected.
    pub slot: Option<SlotInfo>,
}

impl SessionSnapshot {
    /// Goal option of the connected slot.
    pub fn goal_option(&self) -> Option<u32> {
        self.slot.as_ref().and_then(|s| s.goal)
    }
}

/// Operator requests to the session task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionControl {
    /// Drop any current connection and connect, optionally to a new address.
    Connect(Option<String>),
    /// Drop the connection and stay offline.
    Disconnect,
}

/// Mutable session state.
#[derive(Debug, Default)]
pub struct SessionState {
    phase: SessionPhase,
    generation: u64,
    received_items: Vec<ItemId>,
    acknowledged_locations: BTreeSet<LocationId>,
    goal_reached: bool,
    seed_name: String,
    slot: Option<SlotInfo>,
}

impl SessionState {
    /// Fresh, disconnected state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of items received.
    pub fn received_count(&self) -> usize {
        self.received_items.len()
    }

    /// Socket opened; waiting for the handshake.
    pub fn begin_connecting(&mut self) {
        self.clear();
        self.phase = SessionPhase::Connecting;
    }

    /// Connection gone. Everything the server owns is forgotten; the next
    /// `Connected` re-delivers it.
    pub fn reset(&mut self) {
        self.clear();
        self.phase = SessionPhase::Disconnected;
    }

    fn clear(&mut self) {
        self.received_items.clear();
        self.acknowledged_locations.clear();
        self.goal_reached = false;
        self.seed_name.clear();
        self.slot = None;
    }

    /// Record that the goal was forwarded to the server.
    ///
    /// Returns `true` the first time.
    pub fn mark_goal_reached(&mut self) -> bool {
        !std::mem::replace(&mut self.goal_reached, true)
    }

    /// Apply one server packet.
    ///
    /// Returns whether the published snapshot changed. On error the state is
    /// untouched.
    pub fn apply(&mut self, message: ServerMessage) -> Result<bool, ProtocolError> {
        match message {
            ServerMessage::RoomInfo(info) => {
                self.seed_name = info.seed_name;
                Ok(false)
            }
            ServerMessage::Connected(connected) => {
                let seed_name = std::mem::take(&mut self.seed_name);
                self.clear();
                self.seed_name = seed_name.clone();
                self.generation += 1;
                self.phase = SessionPhase::Connected;
                self.acknowledged_locations = connected.checked_locations.iter().copied().collect();
                self.slot = Some(SlotInfo {
                    slot: connected.slot,
                    team: connected.team,
                    seed_name,
                    goal: connected.goal_option(),
                });
                Ok(true)
            }
            ServerMessage::ConnectionRefused(_) => Err(ProtocolError::Unexpected {
                cmd: "ConnectionRefused",
                reason: "refusals are handled by the connection task",
            }),
            ServerMessage::ReceivedItems(received) => {
                if !self.phase.is_connected() {
                    return Err(ProtocolError::Unexpected {
                        cmd: "ReceivedItems",
                        reason: "no slot is connected",
                    });
                }
                let held = self.received_items.len() as u64;
                let items = received.items.iter().map(|i| i.item);
                if received.index == 0 {
                    self.received_items = items.collect();
                } else if received.index == held {
                    self.received_items.extend(items);
                } else {
                    return Err(ProtocolError::IndexGap {
                        index: received.index,
                        expected: held,
                    });
                }
                self.phase = SessionPhase::Synced;
                Ok(true)
            }
            ServerMessage::RoomUpdate(update) => {
                if !self.phase.is_connected() {
                    return Ok(false);
                }
                let before = self.acknowledged_locations.len();
                self.acknowledged_locations
                    .extend(update.checked_locations.iter().copied());
                Ok(self.acknowledged_locations.len() != before)
            }
            ServerMessage::Other => Ok(false),
        }
    }

    /// Copy for publication.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            generation: self.generation,
            received_items: self.received_items.clone(),
            acknowledged_locations: self.acknowledged_locations.clone(),
            goal_reached: self.goal_reached,
            slot: self.slot.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::message::{Connected, NetworkItem, ReceivedItems, RoomInfo, RoomUpdate};

    fn connected(checked: &[LocationId]) -> ServerMessage {
        ServerMessage::Connected(Connected {
            team: 0,
            slot: 1,
            checked_locations: checked.to_vec(),
            missing_locations: Vec::new(),
            slot_data: serde_json::json!({"goal": 0}),
        })
    }

    fn received(index: u64, items: &[ItemId]) -> ServerMessage {
        ServerMessage::ReceivedItems(ReceivedItems {
            index,
            items: items
                .iter()
                .map(|&item| NetworkItem {
                    item,
                    location: 0,
                    player: 1,
                    flags: 0,
                })
                .collect(),
        })
    }

    #[test]
    fn test_connected_sets_baseline_and_generation() {
        let mut state = SessionState::new();
        state.begin_connecting();
        state
            .apply(ServerMessage::RoomInfo(RoomInfo {
                seed_name: "S1".into(),
                password: false,
            }))
            .unwrap();
        assert!(state.apply(connected(&[2, 3])).unwrap());

        let snap = state.snapshot();
        assert_eq!(snap.phase, SessionPhase::Connected);
        assert_eq!(snap.generation, 1);
        assert_eq!(snap.acknowledged_locations, BTreeSet::from([2, 3]));
        assert_eq!(snap.slot.as_ref().unwrap().seed_name, "S1");
        assert_eq!(snap.goal_option(), Some(0));
    }

    #[test]
    fn test_received_items_replace_then_append() {
        let mut state = SessionState::new();
        state.apply(connected(&[])).unwrap();

        state.apply(received(0, &[1, 2])).unwrap();
        state.apply(received(2, &[1])).unwrap();
        assert_eq!(state.snapshot().received_items, vec![1, 2, 1]);
        assert_eq!(state.phase(), SessionPhase::Synced);

        // Full replay after a Sync replaces, it does not duplicate.
        state.apply(received(0, &[1, 2, 1])).unwrap();
        assert_eq!(state.snapshot().received_items, vec![1, 2, 1]);
    }

    #[test]
    fn test_received_items_gap_is_rejected() {
        let mut state = SessionState::new();
        state.apply(connected(&[])).unwrap();
        state.apply(received(0, &[1])).unwrap();

        let err = state.apply(received(3, &[2])).unwrap_err();
        assert!(matches!(err, ProtocolError::IndexGap { index: 3, expected: 1 }));
        assert_eq!(state.snapshot().received_items, vec![1]);
    }

    #[test]
    fn test_received_items_before_connected_is_rejected() {
        let mut state = SessionState::new();
        assert!(state.apply(received(0, &[1])).is_err());
        assert!(state.snapshot().received_items.is_empty());
    }

    #[test]
    fn test_room_update_unions_checked_locations() {
        let mut state = SessionState::new();
        state.apply(connected(&[1])).unwrap();

        assert!(
            state
                .apply(ServerMessage::RoomUpdate(RoomUpdate {
                    checked_locations: vec![1, 4],
                }))
                .unwrap()
        );
        assert!(
            !state
                .apply(ServerMessage::RoomUpdate(RoomUpdate {
                    checked_locations: vec![4],
                }))
                .unwrap()
        );
        assert_eq!(
            state.snapshot().acknowledged_locations,
            BTreeSet::from([1, 4])
        );
    }

    #[test]
    fn test_reset_clears_server_owned_collections() {
        let mut state = SessionState::new();
        state.apply(connected(&[1])).unwrap();
        state.apply(received(0, &[1, 2])).unwrap();
        state.mark_goal_reached();

        state.reset();
        let snap = state.snapshot();
        assert_eq!(snap.phase, SessionPhase::Disconnected);
        assert!(snap.received_items.is_empty());
        assert!(snap.acknowledged_locations.is_empty());
        assert!(!snap.goal_reached);
        // Generation survives so the next Connected is recognisably new.
        assert_eq!(snap.generation, 1);
    }

    #[test]
    fn test_mark_goal_reached_once() {
        let mut state = SessionState::new();
        assert!(state.mark_goal_reached());
        assert!(!state.mark_goal_reached());
    }
}
