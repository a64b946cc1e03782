//! Identifier translation between the multiworld server and the game.
//!
//! - [`TranslationTable`]: static name/id/token data (built-in or JSON)
//! - [`IdentifierTranslator`]: item expansion and progress resolution

mod bg3;
mod table;
mod translator;

pub use table::TranslationTable;
pub use translator::*;
