//! Pipeline reconciliation loop.
//!
//! The production jobs advance items server-side; this loop re-reads their
//! authoritative state on an interval and publishes interpreted snapshots.
//! Two explicit states: `Polling` while the view is visible, `Paused` while
//! it is hidden. Resuming from hidden performs one immediate catch-up
//! refresh before the timer restarts. At most one fetch is ever in flight;
//! ticks that land during an outstanding fetch are dropped, not queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::database::models::ContentItemRecord;
use crate::database::StoreError;

use super::gating::{script_gate, ScriptGate};
use super::stage::{classify, StageView};

// ============================================================================
// Types
// ============================================================================

/// Read side of the content-item store, as the loop sees it.
#[async_trait]
pub trait ItemSource: Send + Sync + 'static {
    async fn fetch_items(&self, channel_id: i64) -> Result<Vec<ContentItemRecord>, StoreError>;
}

/// One interpreted pipeline row: the persisted record plus the derived
/// facts the presentation layer renders.
#[derive(Debug, Clone)]
pub struct ItemView {
    pub item: ContentItemRecord,
    pub stage: StageView,
    pub gate: ScriptGate,
}

impl ItemView {
    pub fn from_record(item: ContentItemRecord) -> Self {
        let stage = classify(&item.status);
        let gate = script_gate(&item);
        Self { item, stage, gate }
    }
}

/// Snapshot published to observers after every refresh.
#[derive(Debug, Clone, Default)]
pub struct ReconcileSnapshot {
    pub items: Vec<ItemView>,
    /// True only during a loud refresh (initial load, operator refresh).
    /// Silent periodic ticks never flip this, so the view does not flicker.
    pub loading: bool,
    /// Last refresh error. Errors never stop the timer; the slot clears on
    /// the next successful refresh.
    pub last_error: Option<String>,
    pub last_refreshed: Option<DateTime<Utc>>,
}

enum LoopCommand {
    SetVisible(bool),
    Refresh,
}

// ============================================================================
// Handle
// ============================================================================

/// Handle to a running reconciliation loop.
pub struct ReconcileHandle {
    cmd_tx: mpsc::UnboundedSender<LoopCommand>,
    snapshot_rx: watch::Receiver<ReconcileSnapshot>,
    task: JoinHandle<()>,
}

impl ReconcileHandle {
    /// Report a visibility change. Hiding pauses the timer; showing again
    /// triggers one immediate catch-up refresh and resumes it.
    pub fn set_visible(&self, visible: bool) {
        let _ = self.cmd_tx.send(LoopCommand::SetVisible(visible));
    }

    /// Operator-initiated (loud) refresh.
    pub fn refresh(&self) {
        let _ = self.cmd_tx.send(LoopCommand::Refresh);
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> ReconcileSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Subscribe to snapshot updates.
    pub fn subscribe(&self) -> watch::Receiver<ReconcileSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Stop the loop. In-flight fetch results are discarded.
    pub fn shutdown(self) {
        self.task.abort();
    }
}

// ============================================================================
// Loop
// ============================================================================

/// Spawn the reconciliation loop for one channel's view. The loop starts
/// visible and performs an initial loud refresh immediately.
pub fn spawn_reconciliation(
    source: Arc<dyn ItemSource>,
    channel_id: i64,
    interval: Duration,
) -> ReconcileHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel();
    let (snapshot_tx, snapshot_rx) = watch::channel(ReconcileSnapshot::default());
    let snapshot_tx = Arc::new(snapshot_tx);
    let in_flight = Arc::new(AtomicBool::new(false));

    let task = tokio::spawn({
        let snapshot_tx = Arc::clone(&snapshot_tx);
        let in_flight = Arc::clone(&in_flight);
        async move {
            // First interval tick is scheduled one full period out; the
            // initial load below covers "now".
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut visible = true;

            spawn_refresh(&source, channel_id, &snapshot_tx, &in_flight, true);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if visible {
                            spawn_refresh(&source, channel_id, &snapshot_tx, &in_flight, false);
                        }
                    }
                    cmd = cmd_rx.recv() => match cmd {
                        Some(LoopCommand::SetVisible(now_visible)) => {
                            if now_visible && !visible {
                                // Catch up immediately, then poll on a fresh
                                // interval from this moment.
                                ticker.reset();
                                spawn_refresh(&source, channel_id, &snapshot_tx, &in_flight, false);
                            }
                            visible = now_visible;
                        }
                        Some(LoopCommand::Refresh) => {
                            spawn_refresh(&source, channel_id, &snapshot_tx, &in_flight, true);
                        }
                        None => break,
                    }
                }
            }
        }
    });

    ReconcileHandle {
        cmd_tx,
        snapshot_rx,
        task,
    }
}

/// Start one refresh unless another is outstanding. Loud and silent
/// refreshes share this routine; only the loading-indicator toggling
/// differs.
fn spawn_refresh(
    source: &Arc<dyn ItemSource>,
    channel_id: i64,
    snapshot_tx: &Arc<watch::Sender<ReconcileSnapshot>>,
    in_flight: &Arc<AtomicBool>,
    loud: bool,
) {
    if in_flight
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        log::debug!("Refresh already in flight for channel {channel_id}, dropping tick");
        return;
    }

    if loud {
        snapshot_tx.send_modify(|s| s.loading = true);
    }

    let source = Arc::clone(source);
    let snapshot_tx = Arc::clone(snapshot_tx);
    let in_flight = Arc::clone(in_flight);

    tokio::spawn(async move {
        let result = source.fetch_items(channel_id).await;

        snapshot_tx.send_modify(|snapshot| {
            match result {
                Ok(records) => {
                    snapshot.items = records.into_iter().map(ItemView::from_record).collect();
                    snapshot.last_error = None;
                    snapshot.last_refreshed = Some(Utc::now());
                }
                Err(e) => {
                    log::warn!("Pipeline refresh failed for channel {channel_id}: {e}");
                    snapshot.last_error = Some(e.to_string());
                }
            }
            if loud {
                snapshot.loading = false;
            }
        });

        in_flight.store(false, Ordering::SeqCst);
    });
}
