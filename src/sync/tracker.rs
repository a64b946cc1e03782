//! Progress tracker
//!
//! Remembers what the reconciler already told the server and the game, so a
//! tick only acts on what changed since the last one.

use std::collections::BTreeSet;

use crate::core::LocationId;
use crate::session::SessionSnapshot;

/// Reconciler bookkeeping (one per reconciler)
///
/// - `generation`: session generation the cache was built against
/// - `acknowledged`: locations sent by us or recorded by the server
/// - `goal_reported`: goal status already sent in this generation
/// - `delivered`: last token list successfully written to the game
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    generation: u64,
    acknowledged: BTreeSet<LocationId>,
    goal_reported: bool,
    delivered: Option<Vec<String>>,
}

impl ProgressTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation of the current baseline
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Fold a session snapshot into the cache.
    ///
    /// A new generation replaces the cache with the server's baseline; the
    /// same generation only adds what the server recorded since. Returns
    /// `true` when the baseline was replaced.
    pub fn rebase(&mut self, snapshot: &SessionSnapshot) -> bool {
        if snapshot.generation != self.generation {
            self.generation = snapshot.generation;
            self.acknowledged = snapshot.acknowledged_locations.clone();
            self.goal_reported = snapshot.goal_reached;
            return true;
        }
        self.acknowledged
            .extend(snapshot.acknowledged_locations.iter().copied());
        self.goal_reported |= snapshot.goal_reached;
        false
    }

    /// Whether a location needs no further sending
    pub fn is_acknowledged(&self, id: LocationId) -> bool {
        self.acknowledged.contains(&id)
    }

    /// Record locations as sent
    pub fn acknowledge(&mut self, ids: impl IntoIterator<Item = LocationId>) {
        self.acknowledged.extend(ids);
    }

    /// Number of locations in the cache
    pub fn acknowledged_count(&self) -> usize {
        self.acknowledged.len()
    }

    /// Whether the goal was already sent
    pub fn goal_reported(&self) -> bool {
        self.goal_reported
    }

    /// Record the goal as sent
    pub fn mark_goal_reported(&mut self) {
        self.goal_reported = true;
    }

    /// Whether `tokens` differs from the last successful delivery
    pub fn delivery_changed(&self, tokens: &[String]) -> bool {
        self.delivered.as_deref() != Some(tokens)
    }

    /// Record a successful delivery
    pub fn record_delivery(&mut self, tokens: Vec<String>) {
        self.delivered = Some(tokens);
    }

    /// Reset to the initial state
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
