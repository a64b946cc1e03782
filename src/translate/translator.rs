//! Mapping between server identifiers and game tokens.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{error, warn};

use super::table::{ItemToken, TranslationTable};
use crate::core::{ItemId, LocationId};

/// One location satisfied by a game progress token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocation {
    /// Location name.
    pub name: String,
    /// Server id, `None` for events such as the goal.
    pub id: Option<LocationId>,
}

/// Translates in both directions and reports table gaps once each.
///
/// The reported sets live on the instance, so two translators (two sessions
/// in one process, or two tests) never silence each other.
#[derive(Debug)]
pub struct IdentifierTranslator {
    table: Arc<TranslationTable>,
    item_tokens: HashMap<ItemId, ItemToken>,
    reported_tokens: HashSet<String>,
    reported_locations: HashSet<String>,
    reported_items: HashSet<ItemId>,
    diagnostics: usize,
}

impl IdentifierTranslator {
    /// Translator over `table`.
    pub fn new(table: Arc<TranslationTable>) -> Self {
        let item_tokens = table.item_token_index();
        Self {
            table,
            item_tokens,
            reported_tokens: HashSet::new(),
            reported_locations: HashSet::new(),
            reported_items: HashSet::new(),
            diagnostics: 0,
        }
    }

    /// The underlying table.
    pub fn table(&self) -> &TranslationTable {
        &self.table
    }

    /// Number of diagnostics emitted so far.
    pub fn diagnostic_count(&self) -> usize {
        self.diagnostics
    }

    /// Game tokens for the full received-item list, in delivery order.
    ///
    /// The counter item becomes `<base>_<n>` where `n` counts only that
    /// item's earlier occurrences in `items`. The output depends on `items`
    /// alone. Unknown ids produce no token.
    pub fn expand_received(&mut self, items: &[ItemId]) -> Vec<String> {
        let mut tokens = Vec::with_capacity(items.len());
        let mut counter = 0usize;
        for id in items {
            match self.item_tokens.get(id) {
                Some(ItemToken {
                    base,
                    counted: true,
                }) => {
                    tokens.push(format!("{base}_{counter}"));
                    counter += 1;
                }
                Some(ItemToken { base, .. }) => tokens.push(base.clone()),
                None => {
                    if self.reported_items.insert(*id) {
                        self.diagnostics += 1;
                        warn!(item = id, "received an item the translation table does not know; it will not reach the game");
                    }
                }
            }
        }
        tokens
    }

    /// Locations satisfied by one game progress token.
    ///
    /// Unknown tokens are inert and reported once per translator. A mapped
    /// name that is neither a location nor an event is a table defect,
    /// reported once and skipped.
    pub fn translate_progress(&mut self, token: &str) -> Vec<ResolvedLocation> {
        let Some(names) = self.table.progress_tokens.get(token) else {
            if self.reported_tokens.insert(token.to_owned()) {
                self.diagnostics += 1;
                warn!(token, "game reported a progress token with no mapping; it was not handled");
            }
            return Vec::new();
        };

        let mut resolved = Vec::with_capacity(names.len());
        for name in names {
            if let Some(id) = self.table.location_id(name) {
                resolved.push(ResolvedLocation {
                    name: name.clone(),
                    id: Some(id),
                });
            } else if self.table.events.contains(name) {
                resolved.push(ResolvedLocation {
                    name: name.clone(),
                    id: None,
                });
            } else if self.reported_locations.insert(name.clone()) {
                self.diagnostics += 1;
                error!(
                    token,
                    location = %name,
                    "progress token maps to a location missing from the table; the server may need a manual send_location for this run"
                );
            }
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translator() -> IdentifierTranslator {
        IdentifierTranslator::new(Arc::new(TranslationTable::bg3()))
    }

    fn ids(table: &TranslationTable, names: &[&str]) -> Vec<ItemId> {
        names.iter().map(|n| table.items[*n]).collect()
    }

    #[test]
    fn test_expand_received_level_ups_and_gold() {
        let mut t = translator();
        let items = ids(t.table(), &["Level Up", "Level Up", "100 Gold"]);

        assert_eq!(
            t.expand_received(&items),
            vec!["LevelUp1_0", "LevelUp1_1", "Gold-100"]
        );
    }

    #[test]
    fn test_expand_received_is_pure() {
        let mut t = translator();
        let items = ids(
            t.table(),
            &["100 Gold", "Level Up", "Lockpick", "Level Up", "Level Up"],
        );

        let first = t.expand_received(&items);
        let second = t.expand_received(&items);
        assert_eq!(first, second);
        assert_eq!(
            first,
            vec![
                "Gold-100",
                "LevelUp1_0",
                "6d0d9e73-a922-47e8-88b8-842b977ecb20",
                "LevelUp1_1",
                "LevelUp1_2",
            ]
        );
    }

    #[test]
    fn test_expand_received_prefix_is_stable() {
        let mut t = translator();
        let items = ids(t.table(), &["Level Up", "Supply Pack", "Level Up"]);

        let short = t.expand_received(&items[..2]);
        let long = t.expand_received(&items);
        assert_eq!(&long[..2], &short[..]);
    }

    #[test]
    fn test_expand_received_unknown_item_reported_once() {
        let mut t = translator();

        assert_eq!(t.expand_received(&[99, 2, 99]), vec!["Gold-100"]);
        t.expand_received(&[99]);
        assert_eq!(t.diagnostic_count(), 1);
    }

    #[test]
    fn test_translate_single_location() {
        let mut t = translator();
        let resolved = t.translate_progress("TUT_NautiloidEscape-LearnedHelm_Laezel");

        assert_eq!(
            resolved,
            vec![ResolvedLocation {
                name: "Tut: Learn about the Helm".into(),
                id: Some(1),
            }]
        );
    }

    #[test]
    fn test_translate_token_with_two_locations() {
        let mut t = translator();
        let resolved = t.translate_progress("TUT_ShadowheartEscape-UsedForce");

        let got: Vec<_> = resolved.iter().map(|r| r.id).collect();
        assert_eq!(got, vec![Some(5), Some(6)]);
    }

    #[test]
    fn test_translate_mapped_to_nothing_is_silent() {
        let mut t = translator();
        assert!(t.translate_progress("TUT_NautiloidEscape-Start").is_empty());
        assert_eq!(t.diagnostic_count(), 0);
    }

    #[test]
    fn test_translate_event_has_no_id() {
        let mut t = translator();
        let resolved = t.translate_progress("GLO_Tadpole-WokeAtCrash");

        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].id, None);
        assert_eq!(resolved[0].name, "Act1-Over: Woke on Beach");
    }

    #[test]
    fn test_unknown_token_reported_once() {
        let mut t = translator();
        for _ in 0..5 {
            assert!(t.translate_progress("CRE_Unmapped-Event").is_empty());
        }
        t.translate_progress("CRE_Other-Event");
        assert_eq!(t.diagnostic_count(), 2);
    }

    #[test]
    fn test_reports_are_per_instance() {
        let mut a = translator();
        let mut b = translator();
        a.translate_progress("CRE_Unmapped-Event");
        b.translate_progress("CRE_Unmapped-Event");

        assert_eq!(a.diagnostic_count(), 1);
        assert_eq!(b.diagnostic_count(), 1);
    }

    #[test]
    fn test_typo_in_table_skipped_and_reported_once() {
        let mut table = TranslationTable::bg3();
        table.progress_tokens.insert(
            "TUT_Typo".into(),
            vec!["Tut: Reach the Hlem".into(), "Tut: Reach the Helm".into()],
        );
        let mut t = IdentifierTranslator::new(Arc::new(table));

        let first = t.translate_progress("TUT_Typo");
        let second = t.translate_progress("TUT_Typo");
        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, Some(2));
        assert_eq!(t.diagnostic_count(), 1);
    }
}
