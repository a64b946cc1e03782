//! Reconciliation between the game's files and the multiworld session.
//!
//! Implements:
//! - Progress diffing against server-acknowledged locations
//! - Exactly-once goal reporting per session generation
//! - Full-inventory delivery writes from the authoritative item list
//! - Operator-requested resync

mod flag;
mod reconciler;
mod tracker;

pub use flag::*;
pub use reconciler::*;
pub use tracker::*;
