//! Builds, signs and submits one payment per queued reward, then writes the
//! outcome back to the store.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use quizpay_network::LedgerConnection;
use quizpay_store::{AttemptOutcome, RewardStore};
use quizpay_transactions::{
    sign_payment, IssuedAmount, Memo, Payment, SignedTransaction, TransactionError,
};
use quizpay_types::{RewardId, RewardStatus};

use crate::config::PayoutSettings;
use crate::queue::{PayoutQueue, QueueItem};
use crate::recent::{RecentPhase, RecentResult, RecentResults};
use crate::stats::PayoutCounters;

/// The payment could not be built or signed; nothing was sent.
pub const LOC_INVALID_PAYMENT: &str = "locINVALID_PAYMENT";

/// The submit request failed in transit; the ledger may or may not have it.
pub const LOC_SUBMIT_FAILED: &str = "locSUBMIT_FAILED";

/// Result of one attempt as seen by the processing cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayoutOutcome {
    pub identity: RewardId,
    pub success: bool,
    pub status: RewardStatus,
    pub engine_result: String,
    pub tx_hash: Option<String>,
    /// The attempt had been force-expired; nothing was written.
    pub discarded: bool,
}

pub struct PayoutExecutor {
    settings: Arc<PayoutSettings>,
    store: Arc<dyn RewardStore>,
    queue: Arc<Mutex<PayoutQueue>>,
    recent: Arc<Mutex<RecentResults>>,
    counters: Arc<PayoutCounters>,
}

impl PayoutExecutor {
    pub fn new(
        settings: Arc<PayoutSettings>,
        store: Arc<dyn RewardStore>,
        queue: Arc<Mutex<PayoutQueue>>,
        recent: Arc<Mutex<RecentResults>>,
        counters: Arc<PayoutCounters>,
    ) -> Self {
        Self {
            settings,
            store,
            queue,
            recent,
            counters,
        }
    }

    /// The unsigned payment for `item`.
    pub fn build_payment(&self, item: &QueueItem, sequence: u32, last_ledger: u32) -> Payment {
        let mut memos = vec![Memo::new("TransactionSubType: Learning")];
        if let Some(memo) = &self.settings.memo {
            memos.push(Memo::new(memo.clone()));
        }
        memos.push(Memo::new(format!("Quiz ID: {}", item.quiz)));
        memos.push(Memo::new(format!("Your Grade: {}%", item.grade)));

        Payment {
            account: self.settings.account.clone(),
            destination: item.recipient.clone(),
            amount: IssuedAmount {
                currency: self.settings.currency.clone(),
                issuer: self.settings.issuer.clone(),
                value: item.amount.clone(),
            },
            fee: self.settings.fee,
            sequence,
            last_ledger_sequence: last_ledger,
            memos,
        }
    }

    /// Build and sign the payment for `item`. Nothing is sent.
    pub fn sign(
        &self,
        item: &QueueItem,
        sequence: u32,
        last_ledger: u32,
    ) -> Result<SignedTransaction, TransactionError> {
        sign_payment(&self.build_payment(item, sequence, last_ledger), &self.settings.keys)
    }

    /// Record an item whose payment could not be built as
    /// `locINVALID_PAYMENT` and release it. No sequence number is consumed.
    pub async fn reject(&self, item: &QueueItem, error: &TransactionError) -> PayoutOutcome {
        warn!(identity = %item.identity, amount = %item.amount, error = %error, "payment could not be signed");
        let outcome = AttemptOutcome::new(LOC_INVALID_PAYMENT, None).with_message(error.to_string());
        self.finish(item, None, outcome).await
    }

    /// Submit an already signed payment and record the answer. Never retries.
    pub async fn submit_signed<C>(
        &self,
        item: &QueueItem,
        connection: &C,
        signed: &SignedTransaction,
    ) -> PayoutOutcome
    where
        C: LedgerConnection + ?Sized,
    {
        let sequence = Some(signed.sequence);
        self.note(item, sequence, Some(signed.hash.clone()), None, RecentPhase::Submitting)
            .await;
        info!(
            identity = %item.identity,
            destination = %item.recipient,
            amount = %item.amount,
            sequence = signed.sequence,
            tx_hash = %signed.hash,
            "submitting payout"
        );

        let outcome = self.submit(connection, item, signed).await;
        self.finish(item, sequence, outcome).await
    }

    /// Sign and submit in one step; every path ends in a recorded outcome or
    /// a discard.
    pub async fn execute<C>(
        &self,
        item: &QueueItem,
        connection: &C,
        sequence: u32,
        last_ledger: u32,
    ) -> PayoutOutcome
    where
        C: LedgerConnection + ?Sized,
    {
        match self.sign(item, sequence, last_ledger) {
            Ok(signed) => self.submit_signed(item, connection, &signed).await,
            Err(e) => self.reject(item, &e).await,
        }
    }

    async fn submit<C>(&self, connection: &C, item: &QueueItem, signed: &SignedTransaction) -> AttemptOutcome
    where
        C: LedgerConnection + ?Sized,
    {
        match connection.submit(signed).await {
            Ok(result) => {
                if result.tx_hash != signed.hash {
                    warn!(
                        identity = %item.identity,
                        local = %signed.hash,
                        remote = %result.tx_hash,
                        "ledger reported a different transaction hash"
                    );
                }
                let outcome = AttemptOutcome::new(result.engine_result, Some(result.tx_hash));
                match result.engine_result_message {
                    Some(message) => outcome.with_message(message),
                    None => outcome,
                }
            }
            Err(e) => {
                warn!(identity = %item.identity, tx_hash = %signed.hash, error = %e, "submit failed");
                AttemptOutcome::new(LOC_SUBMIT_FAILED, Some(signed.hash.clone())).with_message(e.to_string())
            }
        }
    }

    /// Write the outcome and release the item, unless the attempt was
    /// force-expired in the meantime.
    async fn finish(
        &self,
        item: &QueueItem,
        sequence: Option<u32>,
        outcome: AttemptOutcome,
    ) -> PayoutOutcome {
        let status = outcome.status();
        let mut result = PayoutOutcome {
            identity: item.identity.clone(),
            success: status == RewardStatus::Success,
            status,
            engine_result: outcome.engine_result.clone(),
            tx_hash: outcome.tx_hash.clone(),
            discarded: false,
        };

        // The queue stays locked across the write so expiry and discovery
        // cannot interleave with it.
        let mut queue = self.queue.lock().await;
        if !queue.is_current(&item.identity, item.attempt) {
            drop(queue);
            result.discarded = true;
            self.counters.inc_discarded();
            if status == RewardStatus::Success {
                error!(
                    identity = %item.identity,
                    tx_hash = ?outcome.tx_hash,
                    "payout succeeded after its attempt was expired; record left PENDING"
                );
            } else {
                warn!(
                    identity = %item.identity,
                    engine_result = %outcome.engine_result,
                    "late result of expired attempt discarded"
                );
            }
            self.note(item, sequence, outcome.tx_hash, Some(outcome.engine_result), RecentPhase::Discarded)
                .await;
            return result;
        }

        if let Err(e) = self.store.record_outcome(&item.identity, &outcome) {
            error!(
                identity = %item.identity,
                tx_hash = ?outcome.tx_hash,
                engine_result = %outcome.engine_result,
                error = %e,
                "reconciliation hazard: outcome not persisted"
            );
        }
        queue.release(&item.identity, item.attempt);
        drop(queue);

        let phase = match status {
            RewardStatus::Success => {
                self.counters.inc_succeeded();
                RecentPhase::Success
            }
            RewardStatus::Submitted => {
                self.counters.inc_submitted();
                RecentPhase::Submitted
            }
            _ => {
                self.counters.inc_failed();
                RecentPhase::Failed
            }
        };
        info!(
            identity = %item.identity,
            engine_result = %outcome.engine_result,
            tx_hash = ?outcome.tx_hash,
            status = %status,
            "payout finished"
        );
        self.note(item, sequence, outcome.tx_hash, Some(outcome.engine_result), phase)
            .await;
        result
    }

    async fn note(
        &self,
        item: &QueueItem,
        sequence: Option<u32>,
        tx_hash: Option<String>,
        engine_result: Option<String>,
        phase: RecentPhase,
    ) {
        debug!(identity = %item.identity, %phase, "recent result");
        self.recent.lock().await.record(RecentResult {
            identity: item.identity.clone(),
            recipient: item.recipient.clone(),
            amount: item.amount.clone(),
            sequence,
            tx_hash,
            engine_result,
            phase,
            recorded_at: Instant::now(),
        });
    }
}
