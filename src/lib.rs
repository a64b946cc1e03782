//! # bg3-bridge
//!
//! Multiworld bridge for Baldur's Gate 3.
//!
//! The game runs a Script Extender mod that can only talk to the outside
//! world through two JSON files it polls. This crate keeps those files and a
//! remote multiworld server consistent:
//!
//! - **Checks**: progress tokens the game appends to `ap_out.json` become
//!   `LocationChecks`, each location sent once per session
//! - **Items**: the server's received-item list is rewritten in full to
//!   `ap_in.json` whenever it changes
//! - **Goal**: completing the slot's goal location sends the goal status once
//! - **Recovery**: disconnects, restarts, missing files and replayed item
//!   lists converge without double grants or lost checks
//!
//! ## Feature Flags
//!
//! - `session` (default): websocket client for the multiworld server
//! - `cli` (default): the `bg3-client` binary
//!
//! ## Modules
//!
//! - [`core`]: identifiers, constants, error types and port traits (always included)
//! - [`bridge`]: the two game files, plus an in-memory stand-in
//! - [`translate`]: server ids and names to game tokens and back
//! - [`session`]: wire packets and session state; the client needs `session`
//! - [`sync`]: the periodic reconciler
//! - [`command`]: operator console commands
//! - [`config`]: client configuration
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use bg3_bridge::prelude::*;
//! use tokio::sync::mpsc;
//!
//! let store = MemoryBridgeStore::new();
//! store.set_progress(["TUT_NautiloidEscape-LearnedHelm_Laezel"]);
//!
//! let (outbound, mut sent) = mpsc::unbounded_channel();
//! let translator = IdentifierTranslator::new(Arc::new(TranslationTable::bg3()));
//! let mut reconciler =
//!     ProgressReconciler::new(store.clone(), store.clone(), outbound, translator, SyncFlag::new());
//!
//! let snapshot = SessionSnapshot {
//!     phase: SessionPhase::Synced,
//!     generation: 1,
//!     received_items: vec![1, 1, 2],
//!     ..Default::default()
//! };
//! let report = reconciler.tick(&snapshot).unwrap();
//!
//! assert_eq!(report.locations_sent, vec![1]);
//! assert_eq!(store.delivery(), ["LevelUp1_0", "LevelUp1_1", "Gold-100"]);
//! assert!(matches!(sent.try_recv(), Ok(ClientMessage::LocationChecks { .. })));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core module (always included)
pub mod core;

pub mod bridge;
pub mod command;
pub mod config;
pub mod session;
pub mod sync;
pub mod translate;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::bridge::{FileBridgeStore, MemoryBridgeStore};
    pub use crate::command::{parse_command, Command, CommandSurface};
    pub use crate::config::{BridgeConfig, BridgeConfigBuilder, ConfigError};
    pub use crate::core::*;
    pub use crate::session::{
        ClientMessage, ServerMessage, SessionControl, SessionError, SessionPhase, SessionSnapshot,
    };
    pub use crate::sync::{ProgressReconciler, SyncFlag, TickError, TickReport};
    pub use crate::translate::{IdentifierTranslator, ResolvedLocation, TranslationTable};

    #[cfg(feature = "session")]
    pub use crate::session::{RemoteSession, SessionConfig, SessionHandle};
}

// Re-export commonly used items at crate root
pub use crate::core::{BridgeError, ItemId, LocationId, ProtocolError, TranslateError};
pub use crate::sync::{ProgressReconciler, TickReport};
