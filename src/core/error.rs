//! Error types shared across the bridge.

use std::path::PathBuf;

use thiserror::Error;

use super::ItemId;

/// Errors from the file bridge with the game.
///
/// Every variant is transient from the reconciler's point of view: the tick
/// that hit it is abandoned and the next tick retries from the files.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Reading or writing a bridge file failed.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A bridge file did not contain a JSON array of strings.
    #[error("malformed bridge file {}: {source}", path.display())]
    Malformed {
        /// File that failed to parse.
        path: PathBuf,
        /// Parse error.
        #[source]
        source: serde_json::Error,
    },

    /// The bridge directory does not exist.
    #[error("bridge directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),
}

impl BridgeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors in messages received from the multiworld server.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Packet was not valid JSON or did not match the expected shape.
    #[error("malformed packet: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Packet arrived in a session phase where it makes no sense.
    #[error("unexpected `{cmd}` packet: {reason}")]
    Unexpected {
        /// Packet command name.
        cmd: &'static str,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// `ReceivedItems` did not continue the item list we hold.
    #[error("received items index {index} does not follow local count {expected}")]
    IndexGap {
        /// Index carried by the packet.
        index: u64,
        /// Number of items held locally.
        expected: u64,
    },
}

/// Errors loading or validating a translation table.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// Table file could not be read.
    #[error("failed to read translation table: {0}")]
    Io(#[from] std::io::Error),

    /// Table file was not valid JSON.
    #[error("failed to parse translation table: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two item names share one id.
    #[error("item id {0} is assigned to more than one item")]
    DuplicateItemId(ItemId),

    /// An item has an id but no game token.
    #[error("item `{0}` has no game token")]
    MissingItemToken(String),

    /// The repeatable counter item is not a known item.
    #[error("counter item `{0}` is not in the item table")]
    UnknownCounterItem(String),

    /// A goal refers to a location that is neither a check nor an event.
    #[error("goal location `{0}` is neither a location nor an event")]
    UnknownGoalLocation(String),
}
