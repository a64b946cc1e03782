//! Multiworld wire messages.
//!
//! Every websocket text frame carries a JSON array of packets, each an
//! object tagged by its `cmd` field:
//!
//! ```text
//! [{"cmd": "LocationChecks", "locations": [1, 5]}, {"cmd": "Sync"}]
//! ```

use serde::{Deserialize, Serialize, Serializer};

use crate::core::{
    ItemId, LocationId, ProtocolError, CLIENT_STATUS_GOAL, GAME_NAME,
    ITEMS_HANDLING_FULL_REMOTE, PROTOCOL_VERSION,
};

/// Packets this client sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "cmd")]
pub enum ClientMessage {
    /// Authenticate as a slot.
    Connect(ConnectRequest),
    /// Report checked locations.
    LocationChecks {
        /// Location ids, ascending.
        locations: Vec<LocationId>,
    },
    /// Report a client status change.
    StatusUpdate {
        /// New status.
        status: ClientStatus,
    },
    /// Ask the server to replay the full received-item list.
    Sync,
}

impl ClientMessage {
    /// Packet name, for logging.
    pub fn cmd(&self) -> &'static str {
        match self {
            Self::Connect(_) => "Connect",
            Self::LocationChecks { .. } => "LocationChecks",
            Self::StatusUpdate { .. } => "StatusUpdate",
            Self::Sync => "Sync",
        }
    }

    /// `StatusUpdate` announcing the goal.
    pub fn goal() -> Self {
        Self::StatusUpdate {
            status: ClientStatus::Goal,
        }
    }

    /// Whether this message announces the goal.
    pub fn is_goal(&self) -> bool {
        matches!(
            self,
            Self::StatusUpdate {
                status: ClientStatus::Goal
            }
        )
    }
}

/// Client status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientStatus {
    /// Connected, not yet playing.
    Connected,
    /// Ready to start.
    Ready,
    /// Playing.
    Playing,
    /// Goal completed.
    Goal,
}

impl ClientStatus {
    /// Numeric code on the wire.
    pub fn code(self) -> u8 {
        match self {
            Self::Connected => 5,
            Self::Ready => 10,
            Self::Playing => 20,
            Self::Goal => CLIENT_STATUS_GOAL,
        }
    }
}

impl Serialize for ClientStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

/// Body of `Connect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectRequest {
    /// Room password, empty when none.
    pub password: String,
    /// Game name of the slot.
    pub game: String,
    /// Slot name.
    pub name: String,
    /// Stable id of this client install.
    pub uuid: String,
    /// Protocol version.
    pub version: NetworkVersion,
    /// Which items the server should send us.
    pub items_handling: u8,
    /// Client tags.
    pub tags: Vec<String>,
    /// Request slot data in `Connected`.
    pub slot_data: bool,
}

impl ConnectRequest {
    /// Request for `slot_name` with this game's defaults.
    pub fn new(slot_name: impl Into<String>, password: Option<&str>, uuid: impl Into<String>) -> Self {
        Self {
            password: password.unwrap_or_default().to_string(),
            game: GAME_NAME.to_string(),
            name: slot_name.into(),
            uuid: uuid.into(),
            version: NetworkVersion::default(),
            items_handling: ITEMS_HANDLING_FULL_REMOTE,
            tags: Vec::new(),
            slot_data: true,
        }
    }
}

/// Version triple with its wire class tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkVersion {
    /// Major.
    pub major: u32,
    /// Minor.
    pub minor: u32,
    /// Build.
    pub build: u32,
    /// Always `"Version"`.
    #[serde(rename = "class", default = "NetworkVersion::class_name")]
    pub class: String,
}

impl NetworkVersion {
    fn class_name() -> String {
        "Version".to_string()
    }
}

impl Default for NetworkVersion {
    fn default() -> Self {
        let (major, minor, build) = PROTOCOL_VERSION;
        Self {
            major,
            minor,
            build,
            class: Self::class_name(),
        }
    }
}

/// Packets this client understands. Anything else decodes as [`ServerMessage::Other`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "cmd")]
pub enum ServerMessage {
    /// First packet after the socket opens.
    RoomInfo(RoomInfo),
    /// Slot authentication succeeded.
    Connected(Connected),
    /// Slot authentication failed.
    ConnectionRefused(ConnectionRefused),
    /// Items for this slot.
    ReceivedItems(ReceivedItems),
    /// Room state changed.
    RoomUpdate(RoomUpdate),
    /// Chat, bounces, data packages and the rest.
    #[serde(other)]
    Other,
}

impl ServerMessage {
    /// Packet name, for logging.
    pub fn cmd(&self) -> &'static str {
        match self {
            Self::RoomInfo(_) => "RoomInfo",
            Self::Connected(_) => "Connected",
            Self::ConnectionRefused(_) => "ConnectionRefused",
            Self::ReceivedItems(_) => "ReceivedItems",
            Self::RoomUpdate(_) => "RoomUpdate",
            Self::Other => "Other",
        }
    }
}

/// Body of `RoomInfo`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RoomInfo {
    /// Seed of the room.
    #[serde(default)]
    pub seed_name: String,
    /// Whether the room wants a password.
    #[serde(default)]
    pub password: bool,
}

/// Body of `Connected`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Connected {
    /// Our team.
    pub team: u32,
    /// Our slot number.
    pub slot: u32,
    /// Locations the server already recorded for us.
    #[serde(default)]
    pub checked_locations: Vec<LocationId>,
    /// Locations still open.
    #[serde(default)]
    pub missing_locations: Vec<LocationId>,
    /// Per-slot options.
    #[serde(default)]
    pub slot_data: serde_json::Value,
}

impl Connected {
    /// The slot's goal option, if present in slot data.
    pub fn goal_option(&self) -> Option<u32> {
        self.slot_data
            .get("goal")
            .and_then(serde_json::Value::as_u64)
            .and_then(|g| u32::try_from(g).ok())
    }
}

/// Body of `ConnectionRefused`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConnectionRefused {
    /// Reasons, e.g. `InvalidSlot`, `InvalidPassword`.
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Body of `ReceivedItems`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReceivedItems {
    /// Position of the first item in the full list; 0 means a full replay.
    pub index: u64,
    /// Items, in delivery order.
    pub items: Vec<NetworkItem>,
}

/// One item grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct NetworkItem {
    /// Item id.
    pub item: ItemId,
    /// Location it came from.
    pub location: LocationId,
    /// Slot that found it.
    pub player: u32,
    /// Classification flags.
    #[serde(default)]
    pub flags: u32,
}

/// Body of `RoomUpdate`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RoomUpdate {
    /// Newly checked locations of our slot.
    #[serde(default)]
    pub checked_locations: Vec<LocationId>,
}

/// Encode packets into one text frame.
pub fn encode_packets(messages: &[ClientMessage]) -> Result<String, serde_json::Error> {
    serde_json::to_string(messages)
}

/// Decode one text frame.
///
/// A frame that is not a JSON array fails as a whole. Inside the array each
/// packet decodes on its own, so one bad packet does not drop its siblings.
pub fn decode_packets(text: &str) -> Result<Vec<Result<ServerMessage, ProtocolError>>, ProtocolError> {
    let raw: Vec<serde_json::Value> = serde_json::from_str(text)?;
    Ok(raw
        .into_iter()
        .map(|value| serde_json::from_value(value).map_err(ProtocolError::from))
        .collect())
}
