//! Built-in Baldur's Gate 3 identifier data.
//!
//! Mirrors the world's generation tables. Ids are assigned by the world and
//! must never be renumbered once a seed is out.

use crate::core::{ItemId, LocationId};

/// `(item name, item id, game token)`.
pub(super) const ITEMS: &[(&str, ItemId, &str)] = &[
    ("Level Up", 1, "LevelUp1"),
    ("100 Gold", 2, "Gold-100"),
    ("Silver Pendant", 3, "8b5fb90f-f957-4a1a-b8eb-2baff0c3b40b"),
    ("Helldusk Armour", 4, "7ae705fd-1cfd-4482-a584-d2e68f9c1262"),
    ("Lockpick", 5, "6d0d9e73-a922-47e8-88b8-842b977ecb20"),
    ("Supply Pack", 6, "a24a2ca2-a213-424c-833d-47c79934c0ce"),
    ("Is that blood? No, nevermind.", 7, "af808d7c-c8d6-4924-94a9-35bffd450803"),
];

/// Item granted repeatedly; each grant needs a distinct token in game.
pub(super) const COUNTER_ITEM: &str = "Level Up";

/// `(location name, location id)`.
pub(super) const LOCATIONS: &[(&str, LocationId)] = &[
    ("Tut: Learn about the Helm", 1),
    ("Tut: Reach the Helm", 2),
    ("Tut: Connect the Transponder", 3),
    ("Tut-SH: Find Captive", 4),
    ("Tut-SH: Find the Rune", 5),
    ("Tut-SH: Open the Pod", 6),
    ("Tut-SH: Recruit Captive", 7),
];

/// Locations that exist only as events (no id, never sent as checks).
pub(super) const EVENTS: &[&str] = &["Act1-Over: Woke on Beach"];

/// `(goal option value, goal location)`. Option 0 is "escape the nautiloid".
pub(super) const GOALS: &[(u32, &str)] = &[(0, "Act1-Over: Woke on Beach")];

/// `(game progress token, locations it satisfies)`.
pub(super) const PROGRESS_TOKENS: &[(&str, &[&str])] = &[
    ("TUT_NautiloidEscape-Start", &[]),
    ("TUT_NautiloidEscape-LearnedHelm_Laezel", &["Tut: Learn about the Helm"]),
    ("TUT_NautiloidEscape-LearnedHelm_AltGuide", &["Tut: Learn about the Helm"]),
    ("TUT_NautiloidEscape-LearnedHelm_Devourer", &["Tut: Learn about the Helm"]),
    ("TUT_NautiloidEscape-ReachedHelm", &["Tut: Reach the Helm"]),
    ("TUT_NautiloidEscape-EscapedHell", &["Tut: Connect the Transponder"]),
    ("TUT_ShadowheartEscape-FindCaptive", &["Tut-SH: Find Captive"]),
    ("TUT_ShadowheartEscape-UsedRune", &["Tut-SH: Open the Pod"]),
    (
        "TUT_ShadowheartEscape-UsedForce",
        &["Tut-SH: Find the Rune", "Tut-SH: Open the Pod"],
    ),
    ("TUT_ShadowheartEscape-FreedAndRecruited", &["Tut-SH: Recruit Captive"]),
    ("TUT_ShadowheartEscape-FreedDidNotRecruit", &[]),
    ("TUT_ShadowheartEscape-FreedLeftBehind", &[]),
    ("TUT_ShadowheartEscape-LeftBehind", &[]),
    ("TUT_ShadowheartEscape-FoundRune", &["Tut-SH: Find the Rune"]),
    ("GLO_Tadpole-WokeAtCrash", &["Act1-Over: Woke on Beach"]),
];
