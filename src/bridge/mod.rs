//! Game bridge - the two polled files shared with the game.
//!
//! - [`FileBridgeStore`]: the real files in the Script Extender directory
//! - [`MemoryBridgeStore`]: in-memory stand-in implementing the same ports

mod file;
mod memory;

pub use file::*;
pub use memory::*;
