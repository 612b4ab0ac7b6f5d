//! The payout processor: discovery and processing loops over a shared queue.
//!
//! Discovery polls the store for `PENDING` records and merges them into the
//! queue. Processing takes a bounded batch of idle items, fetches the payer
//! sequence once, signs every payment, and executes the signed ones
//! concurrently over one ledger connection. Signed payments take contiguous
//! sequences from `base`; a payment that cannot be built is recorded as
//! `locINVALID_PAYMENT` without consuming one. Processing is single-flight:
//! a tick that finds a cycle still running does nothing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use quizpay_network::{LedgerConnection, LedgerGateway};
use quizpay_store::RewardStore;
use quizpay_types::RewardStatus;

use crate::config::PayoutSettings;
use crate::executor::{PayoutExecutor, PayoutOutcome};
use crate::queue::{expire_stuck, PayoutQueue};
use crate::recent::RecentResults;
use crate::shutdown::{ShutdownController, ShutdownSignal};
use crate::stats::PayoutCounters;
use crate::NodeError;

/// What one processing tick did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CycleReport {
    /// Another cycle was still running.
    AlreadyRunning,
    /// No idle items; no connection was opened.
    Idle,
    Completed(BatchSummary),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Signed payments sent to the ledger.
    pub dispatched: usize,
    /// Sequence of the first signed payment; the batch used
    /// `base..base + dispatched`.
    pub base_sequence: u32,
    /// Items whose payment could not be built; recorded as failed unsent.
    pub rejected: usize,
    pub succeeded: usize,
    pub submitted: usize,
    pub failed: usize,
    pub discarded: usize,
    pub expired: usize,
}

impl BatchSummary {
    fn tally(&mut self, outcome: &PayoutOutcome) {
        if outcome.discarded {
            self.discarded += 1;
            return;
        }
        match outcome.status {
            RewardStatus::Success => self.succeeded += 1,
            RewardStatus::Submitted => self.submitted += 1,
            _ => self.failed += 1,
        }
    }
}

/// Clears the in-flight flag when a cycle ends, however it ends.
struct FlightGuard<'a>(&'a AtomicBool);

impl<'a> FlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct PayoutProcessor<G: LedgerGateway> {
    settings: Arc<PayoutSettings>,
    store: Arc<dyn RewardStore>,
    gateway: Arc<G>,
    queue: Arc<Mutex<PayoutQueue>>,
    recent: Arc<Mutex<RecentResults>>,
    counters: Arc<PayoutCounters>,
    executor: Arc<PayoutExecutor>,
    processing: Arc<AtomicBool>,
}

impl<G: LedgerGateway> Clone for PayoutProcessor<G> {
    fn clone(&self) -> Self {
        Self {
            settings: Arc::clone(&self.settings),
            store: Arc::clone(&self.store),
            gateway: Arc::clone(&self.gateway),
            queue: Arc::clone(&self.queue),
            recent: Arc::clone(&self.recent),
            counters: Arc::clone(&self.counters),
            executor: Arc::clone(&self.executor),
            processing: Arc::clone(&self.processing),
        }
    }
}

impl<G: LedgerGateway + 'static> PayoutProcessor<G> {
    pub fn new(settings: PayoutSettings, store: Arc<dyn RewardStore>, gateway: G) -> Self {
        let settings = Arc::new(settings);
        let queue = Arc::new(Mutex::new(PayoutQueue::new()));
        let recent = Arc::new(Mutex::new(RecentResults::new(
            settings.recent_capacity,
            settings.recent_ttl,
        )));
        let counters = Arc::new(PayoutCounters::new());
        let executor = Arc::new(PayoutExecutor::new(
            Arc::clone(&settings),
            Arc::clone(&store),
            Arc::clone(&queue),
            Arc::clone(&recent),
            Arc::clone(&counters),
        ));
        Self {
            settings,
            store,
            gateway: Arc::new(gateway),
            queue,
            recent,
            counters,
            executor,
            processing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn queue(&self) -> &Arc<Mutex<PayoutQueue>> {
        &self.queue
    }

    pub fn recent(&self) -> &Arc<Mutex<RecentResults>> {
        &self.recent
    }

    pub fn counters(&self) -> &PayoutCounters {
        &self.counters
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }

    /// Merge the store's pending records into the queue. Returns the number
    /// of newly tracked items.
    pub async fn discover(&self) -> Result<usize, NodeError> {
        // Held across the fetch so a completion cannot release an item
        // between the read and the merge. The fetch is a synchronous store
        // scan run inline on this worker; its cost is bounded by the pending
        // set, and completions wait on the lock for its duration.
        let mut queue = self.queue.lock().await;
        let records = self.store.fetch_pending()?;
        let added = queue.merge(&records, Instant::now());
        let (tracked, in_flight) = (queue.len(), queue.in_flight_count());
        drop(queue);

        self.counters.add_discovered(added as u64);
        if added > 0 {
            info!(added, pending = records.len(), tracked, in_flight, "discovered rewards");
        } else {
            debug!(pending = records.len(), tracked, "no new rewards");
        }
        Ok(added)
    }

    /// Run one processing cycle.
    pub async fn process_cycle(&self) -> Result<CycleReport, NodeError> {
        let Some(_guard) = FlightGuard::acquire(&self.processing) else {
            self.counters.inc_skipped_cycles();
            debug!("previous cycle still running, skipping");
            return Ok(CycleReport::AlreadyRunning);
        };
        self.counters.inc_cycles();

        if self.queue.lock().await.idle_count() == 0 {
            debug!("queue empty");
            return Ok(CycleReport::Idle);
        }

        let connection = self.gateway.connect().await?;
        let result = self.run_batch(&connection).await;
        connection.close().await;
        result
    }

    async fn run_batch(&self, connection: &G::Connection) -> Result<CycleReport, NodeError> {
        let base_sequence = connection.account_sequence(&self.settings.account).await?;
        let ledger_index = connection.current_ledger_index().await?;
        let last_ledger = ledger_index.saturating_add(self.settings.max_ledgers);

        let batch = self.queue.lock().await.select_batch(self.settings.batch_size);
        if batch.is_empty() {
            return Ok(CycleReport::Idle);
        }

        // Sign in queue order; only signed payments advance the sequence.
        let mut signed = Vec::with_capacity(batch.len());
        let mut rejected = 0;
        for item in &batch {
            let sequence = base_sequence.wrapping_add(signed.len() as u32);
            match self.executor.sign(item, sequence, last_ledger) {
                Ok(tx) => signed.push((item, tx)),
                Err(e) => {
                    self.executor.reject(item, &e).await;
                    rejected += 1;
                }
            }
        }

        self.counters.add_dispatched(signed.len() as u64);
        info!(
            batch = batch.len(),
            signed = signed.len(),
            rejected,
            base_sequence,
            last_ledger,
            "processing batch"
        );

        let expiries: Vec<JoinHandle<bool>> = signed
            .iter()
            .map(|(item, _)| {
                expire_stuck(
                    Arc::clone(&self.queue),
                    item.identity.clone(),
                    item.attempt,
                    self.settings.stuck_timeout,
                )
            })
            .collect();

        let outcomes = join_all(
            signed
                .iter()
                .map(|(item, tx)| self.executor.submit_signed(item, connection, tx)),
        )
        .await;

        let mut summary = BatchSummary {
            dispatched: signed.len(),
            base_sequence,
            rejected,
            ..BatchSummary::default()
        };
        for handle in expiries {
            if handle.is_finished() {
                if let Ok(true) = handle.await {
                    summary.expired += 1;
                    self.counters.inc_expired();
                }
            } else {
                handle.abort();
            }
        }
        for outcome in &outcomes {
            summary.tally(outcome);
        }
        info!(
            dispatched = summary.dispatched,
            rejected = summary.rejected,
            succeeded = summary.succeeded,
            submitted = summary.submitted,
            failed = summary.failed,
            discarded = summary.discarded,
            "batch done"
        );
        Ok(CycleReport::Completed(summary))
    }

    /// Log the recent-results cache and counters.
    pub async fn log_recent(&self) {
        let snapshot = self.recent.lock().await.snapshot(Instant::now());
        for entry in &snapshot {
            debug!(
                identity = %entry.identity,
                destination = %entry.recipient,
                amount = %entry.amount,
                sequence = ?entry.sequence,
                tx_hash = ?entry.tx_hash,
                engine_result = ?entry.engine_result,
                phase = %entry.phase,
                "recent payout"
            );
        }
        let counters = self.counters.snapshot();
        info!(recent = snapshot.len(), ?counters, "payout stats");
    }

    /// Spawn the discovery and processing loops. Both stop at the next tick
    /// after `shutdown` fires; the processing loop waits for a running cycle
    /// to finish first.
    pub fn start(&self, shutdown: &ShutdownController) -> Vec<JoinHandle<()>> {
        vec![
            self.spawn_discovery(shutdown.subscribe()),
            self.spawn_processing(shutdown.subscribe()),
        ]
    }

    fn spawn_discovery(&self, mut shutdown: ShutdownSignal) -> JoinHandle<()> {
        let processor = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(processor.settings.discovery_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.triggered() => {
                        info!("discovery loop shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        if let Err(e) = processor.discover().await {
                            error!(error = %e, "discovery failed");
                        }
                    }
                }
            }
        })
    }

    fn spawn_processing(&self, mut shutdown: ShutdownSignal) -> JoinHandle<()> {
        let processor = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(processor.settings.processing_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut cycles: Vec<JoinHandle<()>> = Vec::new();
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.triggered() => {
                        info!("processing loop shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        cycles.retain(|c| !c.is_finished());
                        let cycle = processor.clone();
                        cycles.push(tokio::spawn(async move {
                            match cycle.process_cycle().await {
                                Ok(CycleReport::AlreadyRunning) => {}
                                Ok(_) => cycle.log_recent().await,
                                Err(e) => warn!(error = %e, "processing cycle failed"),
                            }
                        }));
                    }
                }
            }
            for cycle in cycles {
                if let Err(e) = cycle.await {
                    error!(error = %e, "processing cycle panicked");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flight_guard_is_exclusive_and_released_on_drop() {
        let flag = AtomicBool::new(false);
        let guard = FlightGuard::acquire(&flag).unwrap();
        assert!(FlightGuard::acquire(&flag).is_none());
        drop(guard);
        assert!(FlightGuard::acquire(&flag).is_some());
    }

    #[test]
    fn summary_tallies_by_status() {
        let outcome = |status, discarded| PayoutOutcome {
            identity: quizpay_types::RewardId::new("u1_q5").unwrap(),
            success: status == RewardStatus::Success,
            status,
            engine_result: String::new(),
            tx_hash: None,
            discarded,
        };
        let mut summary = BatchSummary::default();
        summary.tally(&outcome(RewardStatus::Success, false));
        summary.tally(&outcome(RewardStatus::Submitted, false));
        summary.tally(&outcome(RewardStatus::Failed, false));
        summary.tally(&outcome(RewardStatus::Success, true));
        assert_eq!(
            (summary.succeeded, summary.submitted, summary.failed, summary.discarded),
            (1, 1, 1, 1)
        );
    }
}
