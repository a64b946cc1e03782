//! Progress reconciler
//!
//! Runs on a fixed interval. Each tick diffs the game's progress file against
//! what the server already knows, queues the missing checks, and rewrites the
//! game's delivery file from the server's item list.

use std::collections::BTreeSet;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::flag::SyncFlag;
use super::tracker::ProgressTracker;
use crate::core::{BridgeError, DeliverySink, LocationId, MessageSink, ProgressSource};
use crate::session::{ClientMessage, SessionError, SessionPhase, SessionSnapshot};
use crate::translate::IdentifierTranslator;

/// Errors that abandon (part of) a tick.
#[derive(Debug, Error)]
pub enum TickError {
    /// A bridge file could not be read or written.
    #[error("bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// The outbound mailbox is gone.
    #[error("send error: {0}")]
    Send(#[from] SessionError),
}

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Location ids sent in `LocationChecks`, ascending.
    pub locations_sent: Vec<LocationId>,
    /// Goal status sent.
    pub goal_sent: bool,
    /// Delivery file rewritten.
    pub delivery_written: bool,
    /// `Sync` sent.
    pub sync_sent: bool,
}

impl TickReport {
    /// Whether the tick changed nothing.
    pub fn is_idle(&self) -> bool {
        self.locations_sent.is_empty() && !self.goal_sent && !self.delivery_written && !self.sync_sent
    }
}

/// Reconciles game progress with the multiworld session.
///
/// Generic over the two file ports and the outbound mailbox so it can run
/// against [`MemoryBridgeStore`](crate::bridge::MemoryBridgeStore) and a plain
/// channel in tests.
pub struct ProgressReconciler<P, D, M> {
    progress: P,
    delivery: D,
    outbound: M,
    translator: IdentifierTranslator,
    tracker: ProgressTracker,
    sync_flag: SyncFlag,
}

impl<P, D, M> ProgressReconciler<P, D, M>
where
    P: ProgressSource,
    D: DeliverySink,
    M: MessageSink,
{
    /// Create a reconciler.
    pub fn new(
        progress: P,
        delivery: D,
        outbound: M,
        translator: IdentifierTranslator,
        sync_flag: SyncFlag,
    ) -> Self {
        Self {
            progress,
            delivery,
            outbound,
            translator,
            tracker: ProgressTracker::new(),
            sync_flag,
        }
    }

    /// Bookkeeping, for inspection.
    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    /// The translator, for inspection.
    pub fn translator(&self) -> &IdentifierTranslator {
        &self.translator
    }

    /// Run one reconciliation against `snapshot`.
    ///
    /// The progress half only runs while a slot is connected. The delivery
    /// half runs regardless and only writes a `Synced` item list. Both halves
    /// are attempted; the first error is returned.
    pub fn tick(&mut self, snapshot: &SessionSnapshot) -> Result<TickReport, TickError> {
        let mut report = TickReport::default();
        let mut first_err = None;

        if snapshot.phase.is_connected() {
            if self.tracker.rebase(snapshot) {
                debug!(
                    generation = snapshot.generation,
                    acknowledged = self.tracker.acknowledged_count(),
                    "new session baseline"
                );
            }
            if let Err(err) = self.send_sync(&mut report) {
                first_err.get_or_insert(err);
            }
            if let Err(err) = self.report_progress(snapshot, &mut report) {
                first_err.get_or_insert(err);
            }
        }

        if let Err(err) = self.deliver(snapshot, &mut report) {
            first_err.get_or_insert(err);
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(report),
        }
    }

    fn send_sync(&mut self, report: &mut TickReport) -> Result<(), TickError> {
        if !self.sync_flag.take() {
            return Ok(());
        }
        if let Err(err) = self.outbound.send(ClientMessage::Sync) {
            self.sync_flag.request();
            return Err(err.into());
        }
        info!("resync requested from server");
        report.sync_sent = true;
        Ok(())
    }

    fn report_progress(
        &mut self,
        snapshot: &SessionSnapshot,
        report: &mut TickReport,
    ) -> Result<(), TickError> {
        let tokens = self.progress.read_progress()?;
        let goal = self
            .translator
            .table()
            .goal_location(snapshot.goal_option())
            .map(str::to_owned);

        let mut pending = BTreeSet::new();
        let mut goal_seen = false;
        for token in &tokens {
            for location in self.translator.translate_progress(token) {
                if goal.as_deref() == Some(location.name.as_str()) {
                    goal_seen = true;
                }
                if let Some(id) = location.id {
                    if !self.tracker.is_acknowledged(id) {
                        pending.insert(id);
                    }
                }
            }
        }

        if !pending.is_empty() {
            let locations: Vec<LocationId> = pending.into_iter().collect();
            self.outbound.send(ClientMessage::LocationChecks {
                locations: locations.clone(),
            })?;
            self.tracker.acknowledge(locations.iter().copied());
            info!(count = locations.len(), ?locations, "sent location checks");
            report.locations_sent = locations;
        }

        if goal_seen && !self.tracker.goal_reported() {
            self.outbound.send(ClientMessage::goal())?;
            self.tracker.mark_goal_reported();
            info!(goal = goal.as_deref().unwrap_or_default(), "goal completed");
            report.goal_sent = true;
        }
        Ok(())
    }

    fn deliver(&mut self, snapshot: &SessionSnapshot, report: &mut TickReport) -> Result<(), TickError> {
        if snapshot.phase != SessionPhase::Synced {
            return Ok(());
        }
        let tokens = self.translator.expand_received(&snapshot.received_items);
        if !self.tracker.delivery_changed(&tokens) {
            return Ok(());
        }
        self.delivery.write_delivery(&tokens)?;
        debug!(items = tokens.len(), "delivery file updated");
        self.tracker.record_delivery(tokens);
        report.delivery_written = true;
        Ok(())
    }

    /// Tick every `period` until `shutdown` turns true or its sender drops.
    ///
    /// Tick errors are logged and never end the loop.
    pub async fn run(
        mut self,
        snapshots: watch::Receiver<SessionSnapshot>,
        mut shutdown: watch::Receiver<bool>,
        period: Duration,
    ) {
        let mut interval = tokio::time::interval(period.max(Duration::from_millis(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }

            let snapshot = snapshots.borrow().clone();
            match self.tick(&snapshot) {
                Ok(report) if report.is_idle() => {}
                Ok(report) => debug!(?report, "tick"),
                Err(err) => warn!(error = %err, "tick abandoned, retrying next interval"),
            }
        }
        debug!("reconciler stopped");
    }
}
