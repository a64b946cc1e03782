//! Fixed values of the game bridge and the multiworld protocol.

use std::time::Duration;

// =============================================================================
// GAME BRIDGE FILES
// =============================================================================

/// Items granted to the player; written by us, read by the game.
pub const DELIVERY_FILE_NAME: &str = "ap_in.json";

/// Progress tokens reached in game; written by the game, read by us.
pub const PROGRESS_FILE_NAME: &str = "ap_out.json";

/// Content of a freshly initialized bridge file.
pub const EMPTY_TOKEN_ARRAY: &[u8] = b"[]";

/// Interval between reconciler ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(3);

// =============================================================================
// MULTIWORLD PROTOCOL
// =============================================================================

/// Game name announced in `Connect`.
pub const GAME_NAME: &str = "Baldur's Gate 3";

/// Receive items from other worlds, our own world, and our starting inventory.
pub const ITEMS_HANDLING_FULL_REMOTE: u8 = 0b111;

/// `ClientStatus` value for a completed goal.
pub const CLIENT_STATUS_GOAL: u8 = 30;

/// Default port of a multiworld server.
pub const DEFAULT_SERVER_PORT: u16 = 38281;

/// Protocol version announced in `Connect` (major, minor, build).
pub const PROTOCOL_VERSION: (u32, u32, u32) = (0, 6, 1);

/// Time allowed between opening the socket and receiving `Connected`.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(15);

// =============================================================================
// RECONNECT BACKOFF
// =============================================================================

/// First delay after a lost connection.
pub const INITIAL_RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Upper bound on the reconnect delay.
pub const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(60);

/// Growth factor of the reconnect delay.
pub const RECONNECT_BACKOFF_MULTIPLIER: u32 = 2;
