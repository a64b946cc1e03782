//! Translation table between server identifiers and game tokens.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::bg3;
use crate::core::{ItemId, LocationId, TranslateError};

/// Static mapping data, supplied by the world definition.
///
/// Serializable so a newer table can be dropped in as JSON without a rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationTable {
    /// Item name to server id.
    pub items: BTreeMap<String, ItemId>,
    /// Item name to the base token the game understands.
    pub item_tokens: BTreeMap<String, String>,
    /// Item whose grants carry a `_<n>` counter suffix.
    #[serde(default)]
    pub counter_item: Option<String>,
    /// Location name to server id.
    pub locations: BTreeMap<String, LocationId>,
    /// Location names with no id that still mean something (goal events).
    #[serde(default)]
    pub events: BTreeSet<String>,
    /// Goal option value to the location that completes it.
    #[serde(default)]
    pub goals: BTreeMap<u32, String>,
    /// Game progress token to the locations it satisfies.
    pub progress_tokens: BTreeMap<String, Vec<String>>,
}

impl TranslationTable {
    /// Built-in Baldur's Gate 3 table.
    pub fn bg3() -> Self {
        Self {
            items: bg3::ITEMS
                .iter()
                .map(|(name, id, _)| (name.to_string(), *id))
                .collect(),
            item_tokens: bg3::ITEMS
                .iter()
                .map(|(name, _, token)| (name.to_string(), token.to_string()))
                .collect(),
            counter_item: Some(bg3::COUNTER_ITEM.to_string()),
            locations: bg3::LOCATIONS
                .iter()
                .map(|(name, id)| (name.to_string(), *id))
                .collect(),
            events: bg3::EVENTS.iter().map(|name| name.to_string()).collect(),
            goals: bg3::GOALS
                .iter()
                .map(|(goal, name)| (*goal, name.to_string()))
                .collect(),
            progress_tokens: bg3::PROGRESS_TOKENS
                .iter()
                .map(|(token, names)| {
                    (
                        token.to_string(),
                        names.iter().map(|n| n.to_string()).collect(),
                    )
                })
                .collect(),
        }
    }

    /// Load and validate a table from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, TranslateError> {
        let data = std::fs::read(path)?;
        Self::from_json_slice(&data)
    }

    /// Parse and validate a table from JSON bytes.
    pub fn from_json_slice(data: &[u8]) -> Result<Self, TranslateError> {
        let table: Self = serde_json::from_slice(data)?;
        table.validate()?;
        Ok(table)
    }

    /// Check the table is internally consistent.
    ///
    /// Progress tokens pointing at unknown locations are tolerated here; they
    /// are reported at runtime the first time the game emits them.
    pub fn validate(&self) -> Result<(), TranslateError> {
        let mut seen = BTreeSet::new();
        for (name, id) in &self.items {
            if !seen.insert(*id) {
                return Err(TranslateError::DuplicateItemId(*id));
            }
            if !self.item_tokens.contains_key(name) {
                return Err(TranslateError::MissingItemToken(name.clone()));
            }
        }
        if let Some(counter) = &self.counter_item {
            if !self.items.contains_key(counter) {
                return Err(TranslateError::UnknownCounterItem(counter.clone()));
            }
        }
        for name in self.goals.values() {
            if !self.is_known_location(name) {
                return Err(TranslateError::UnknownGoalLocation(name.clone()));
            }
        }
        Ok(())
    }

    /// Id of a location, `None` for events and unknown names.
    pub fn location_id(&self, name: &str) -> Option<LocationId> {
        self.locations.get(name).copied()
    }

    /// Whether `name` is a location or an event.
    pub fn is_known_location(&self, name: &str) -> bool {
        self.locations.contains_key(name) || self.events.contains(name)
    }

    /// Location that completes `goal`, falling back to the lowest goal
    /// option when the slot did not say or named one we do not know.
    pub fn goal_location(&self, goal: Option<u32>) -> Option<&str> {
        goal.and_then(|g| self.goals.get(&g))
            .or_else(|| self.goals.values().next())
            .map(String::as_str)
    }

    /// Server item id to game token, derived from the name tables.
    pub(crate) fn item_token_index(&self) -> HashMap<ItemId, ItemToken> {
        self.items
            .iter()
            .filter_map(|(name, id)| {
                let base = self.item_tokens.get(name)?.clone();
                let counted = self.counter_item.as_deref() == Some(name.as_str());
                Some((*id, ItemToken { base, counted }))
            })
            .collect()
    }
}

impl Default for TranslationTable {
    fn default() -> Self {
        Self::bg3()
    }
}

/// Game token for one item id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ItemToken {
    pub(crate) base: String,
    pub(crate) counted: bool,
}
