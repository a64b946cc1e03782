//! Core types, constants, errors and port traits.

mod constants;
mod error;
mod traits;

pub use constants::*;
pub use error::*;
pub use traits::*;

/// Numeric item identifier assigned by the multiworld server.
pub type ItemId = i64;

/// Numeric location identifier assigned by the multiworld server.
pub type LocationId = i64;
