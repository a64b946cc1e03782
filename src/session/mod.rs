//! Multiworld server session.
//!
//! - [`message`]: wire packets and frame codec
//! - [`state`]: authoritative session state and snapshots
//! - `client`: websocket task and its handle (requires the `session` feature)

mod error;
pub mod message;
pub mod state;

#[cfg(feature = "session")]
mod backoff;
#[cfg(feature = "session")]
mod client;

pub use error::SessionError;
pub use message::{ClientMessage, ClientStatus, ServerMessage};
pub use state::{SessionControl, SessionPhase, SessionSnapshot, SessionState, SlotInfo};

#[cfg(feature = "session")]
pub use backoff::ReconnectBackoff;
#[cfg(feature = "session")]
pub use client::{
    normalize_address, RemoteSession, SessionConfig, SessionConfigBuilder, SessionHandle,
};
