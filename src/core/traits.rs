//! Port traits between the reconciler and the outside world.
//!
//! The game is reachable only through two files and the server only through
//! a message mailbox. Both sides are traits so the reconciler can run against
//! in-memory fakes.

use tokio::sync::mpsc;

use super::error::BridgeError;
use crate::session::{ClientMessage, SessionError};

/// Source of the game's progress tokens (the outbound file).
pub trait ProgressSource {
    /// Read every token the game has reported so far.
    ///
    /// Implementations re-read from scratch on each call; the game may
    /// rewrite the file at any time.
    fn read_progress(&self) -> Result<Vec<String>, BridgeError>;
}

/// Sink for the item tokens the game should hold (the inbound file).
pub trait DeliverySink {
    /// Replace the delivered inventory with `tokens`.
    ///
    /// MUST be all-or-nothing: a concurrent reader sees either the previous
    /// or the new list, never a prefix.
    fn write_delivery(&self, tokens: &[String]) -> Result<(), BridgeError>;
}

/// Outbound mailbox toward the multiworld server.
///
/// Sending is fire-and-forget: a message that is lost with the connection is
/// re-derived by the reconciler after the next `Connected`.
pub trait MessageSink {
    /// Queue a message for the server.
    fn send(&self, message: ClientMessage) -> Result<(), SessionError>;
}

impl<T: ProgressSource + ?Sized> ProgressSource for &T {
    fn read_progress(&self) -> Result<Vec<String>, BridgeError> {
        (**self).read_progress()
    }
}

impl<T: DeliverySink + ?Sized> DeliverySink for &T {
    fn write_delivery(&self, tokens: &[String]) -> Result<(), BridgeError> {
        (**self).write_delivery(tokens)
    }
}

impl MessageSink for mpsc::UnboundedSender<ClientMessage> {
    fn send(&self, message: ClientMessage) -> Result<(), SessionError> {
        mpsc::UnboundedSender::send(self, message).map_err(|_| SessionError::Closed)
    }
}
