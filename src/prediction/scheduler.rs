use crate::prediction::interval::resolve_next_delay_ms;
use crate::prediction::notify::{batch_summary_notification, paused_notification, NotificationSink};
use crate::prediction::predictor::Predictor;
use crate::prediction::selection::{SelectionHandle, SelectionSnapshot};
use crate::prediction::store::LogStore;
use crate::prediction::types::{
    now_unix_ms, EngineConfig, LogEntry, LogStatus, BATCH_MAX_SIGNALS, BATCH_MIN_SIGNALS,
    SWEEP_INTERVAL_MS,
};
use chrono::Utc;
use futures_util::future::join_all;
use rand::Rng;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Everything a tick or sweep needs, cheap to clone into spawned tasks.
#[derive(Clone)]
pub struct EngineShared {
    pub config: EngineConfig,
    pub store: Arc<LogStore>,
    pub selection: SelectionHandle,
    pub predictor: Arc<dyn Predictor>,
    pub sink: Arc<dyn NotificationSink>,
    next_id: Arc<AtomicU64>,
    in_flight: Arc<AtomicBool>,
}

impl EngineShared {
    pub fn new(
        config: EngineConfig,
        store: Arc<LogStore>,
        selection: SelectionHandle,
        predictor: Arc<dyn Predictor>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            config,
            store,
            selection,
            predictor,
            sink,
            next_id: Arc::new(AtomicU64::new(0)),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }
}

struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs the scheduling loop and the eviction sweeper until cancellation.
///
/// The loop itself is fatal-free: every skip branch and every per-entry fetch
/// failure falls through to the next resolved delay. Cancellation stops the
/// timer and the sweeper; an in-flight batch finishes on its own and its
/// results are conditionally discarded at reconciliation.
pub async fn run_prediction_engine(shared: EngineShared, cancel_token: CancellationToken) {
    let sweeper_shared = shared.clone();
    let sweeper_cancel = cancel_token.clone();
    let sweeper_handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_millis(SWEEP_INTERVAL_MS));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = sweeper_cancel.cancelled() => break,
                _ = ticker.tick() => run_sweep(&sweeper_shared),
            }
        }
    });

    while !cancel_token.is_cancelled() {
        let delay_ms = resolve_next_delay_ms(shared.config.refresh_interval, Utc::now());
        debug!(delay_ms, "next prediction tick scheduled");

        tokio::select! {
            _ = cancel_token.cancelled() => break,
            _ = tokio::time::sleep(Duration::from_millis(delay_ms)) => on_tick_fired(&shared),
        }
    }

    let _ = sweeper_handle.await;
    info!("prediction engine stopped");
}

/// Skip gates evaluated at fire time; each skip just lets the loop resolve
/// the next delay (implicit retry-by-rescheduling, no retry subsystem).
fn on_tick_fired(shared: &EngineShared) {
    if shared.in_flight.load(Ordering::Acquire) {
        debug!("previous batch still in flight; skipping tick");
        return;
    }

    let selection = shared.selection.snapshot();
    if selection.instruments.is_empty() {
        debug!("no instruments selected; skipping tick");
        return;
    }

    if !selection.pips.is_valid() {
        warn!("pip ranges invalid; prediction tick paused");
        shared.sink.notify(paused_notification());
        return;
    }

    shared.in_flight.store(true, Ordering::Release);
    let task_shared = shared.clone();
    // Deliberately not tied to the cancellation token: in-flight fetches are
    // never cancelled, only reconciled against the then-current selection.
    tokio::spawn(async move {
        let _guard = InFlightGuard(Arc::clone(&task_shared.in_flight));
        dispatch_and_reconcile(&task_shared, selection).await;
    });
}

/// One batch: synthesize k ∈ [1, 10] pending entries per selected instrument
/// (one shared parameter snapshot), fan out a fetch per entry, await them
/// all, then resolve/delete/discard in a single atomic store mutation.
pub(crate) async fn dispatch_and_reconcile(shared: &EngineShared, selection: SelectionSnapshot) {
    let created_at_ms = now_unix_ms();
    let mut batch = Vec::new();
    {
        let mut rng = rand::thread_rng();
        for &instrument in &selection.instruments {
            let count = rng.gen_range(BATCH_MIN_SIGNALS..=BATCH_MAX_SIGNALS);
            for _ in 0..count {
                let id = shared.next_id.fetch_add(1, Ordering::Relaxed) + 1;
                batch.push(LogEntry::pending(
                    id,
                    created_at_ms,
                    instrument,
                    selection.pips,
                ));
            }
        }
    }
    debug!(
        entries = batch.len(),
        instruments = selection.instruments.len(),
        "dispatching prediction batch"
    );

    let evicted = shared.store.insert_batch(batch.clone());
    if shared.selection.clear_focused_if(&evicted) {
        debug!("focused entry evicted by capacity during dispatch");
    }

    let fetches = batch.iter().map(|entry| {
        let id = entry.id;
        let instrument = entry.instrument;
        let future = shared.predictor.predict(instrument, entry.parameters);
        async move { (id, instrument, future.await) }
    });
    let results = join_all(fetches).await;

    // Reconcile against the selection as it is *now*, not as it was at
    // dispatch time; the user may have deselected mid-flight.
    let current = shared.selection.snapshot();
    let resolved_at_ms = now_unix_ms();
    let config = shared.config;
    let mut success_count = 0_usize;
    let mut error_count = 0_usize;

    let removed = shared.store.mutate(|entries| {
        for (id, instrument, result) in results {
            let Some(position) = entries.iter().position(|entry| entry.id == id) else {
                // Already evicted while in flight; the result is discarded.
                continue;
            };

            if !current.is_selected(instrument) {
                entries.remove(position);
                continue;
            }

            let entry = &mut entries[position];
            match result {
                Ok(outcome) => {
                    entry.status = LogStatus::Success;
                    entry.outcome = Some(outcome);
                    entry.expires_at_ms = Some(random_expiry_ms(resolved_at_ms, &config));
                    success_count += 1;
                }
                Err(error) => {
                    entry.status = LogStatus::Error;
                    entry.failure_reason = Some(error.to_string());
                    error_count += 1;
                }
            }
        }
    });
    if shared.selection.clear_focused_if(&removed) {
        debug!("focused entry removed during reconciliation");
    }

    info!(success_count, error_count, "prediction batch reconciled");
    if let Some(notification) = batch_summary_notification(success_count, error_count) {
        shared.sink.notify(notification);
    }
}

fn random_expiry_ms(now_ms: i64, config: &EngineConfig) -> i64 {
    let min_secs = config.min_lifetime_secs;
    let max_secs = config.max_lifetime_secs.max(min_secs);
    let lifetime_secs = rand::thread_rng().gen_range(min_secs..=max_secs);
    now_ms + lifetime_secs * 1_000
}

/// One sweep pass: deselection always removes, regardless of status.
pub(crate) fn run_sweep(shared: &EngineShared) {
    let selection = shared.selection.snapshot();
    let removed = shared
        .store
        .mutate(|entries| entries.retain(|entry| selection.is_selected(entry.instrument)));

    if removed.is_empty() {
        return;
    }

    debug!(removed = removed.len(), "swept entries for deselected instruments");
    if shared.selection.clear_focused_if(&removed) {
        debug!("focused entry cleared by sweep");
    }
}
