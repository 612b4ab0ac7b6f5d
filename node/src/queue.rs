//! In-memory payout queue: dedup, batch selection and attempt tracking.
//!
//! The queue is the only coordination point between discovery and
//! processing. It tracks at most one [`QueueItem`] per identity. An item
//! selected for a batch is marked in flight under a fresh attempt number;
//! only a completion carrying that same number may release it, so a late
//! result from a force-expired attempt cannot touch a newer entry.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use quizpay_types::{AccountAddress, RewardId, RewardRecord, RewardStatus, TokenValue};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Attempt numbers are unique for the lifetime of a queue.
pub type AttemptId = u64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueItem {
    pub identity: RewardId,
    pub recipient: AccountAddress,
    pub amount: TokenValue,
    pub grade: u8,
    pub quiz: String,
    pub processing: bool,
    pub enqueued_at: Instant,
    /// Zero until the item is first selected.
    pub attempt: AttemptId,
}

impl QueueItem {
    fn from_record(record: &RewardRecord, now: Instant) -> Self {
        Self {
            identity: record.identity.clone(),
            recipient: record.recipient.clone(),
            amount: record.amount.clone(),
            grade: record.grade,
            quiz: record.quiz.clone(),
            processing: false,
            enqueued_at: now,
            attempt: 0,
        }
    }
}

#[derive(Debug, Default)]
pub struct PayoutQueue {
    items: HashMap<RewardId, QueueItem>,
    order: VecDeque<RewardId>,
    last_attempt: AttemptId,
}

impl PayoutQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track every `PENDING` record not already tracked. Returns how many
    /// items were added.
    pub fn merge(&mut self, records: &[RewardRecord], now: Instant) -> usize {
        let mut added = 0;
        for record in records {
            if record.status != RewardStatus::Pending || self.items.contains_key(&record.identity) {
                continue;
            }
            self.items
                .insert(record.identity.clone(), QueueItem::from_record(record, now));
            self.order.push_back(record.identity.clone());
            added += 1;
        }
        added
    }

    /// Mark up to `max` idle items as in flight, oldest first, and return
    /// copies of them.
    pub fn select_batch(&mut self, max: usize) -> Vec<QueueItem> {
        let mut batch = Vec::new();
        for identity in &self.order {
            if batch.len() == max {
                break;
            }
            let Some(item) = self.items.get_mut(identity) else {
                continue;
            };
            if item.processing {
                continue;
            }
            self.last_attempt += 1;
            item.processing = true;
            item.attempt = self.last_attempt;
            batch.push(item.clone());
        }
        batch
    }

    /// Remove the item after a terminal outcome. No-op unless `attempt` is
    /// still the item's current attempt.
    pub fn release(&mut self, identity: &RewardId, attempt: AttemptId) -> bool {
        if !self.is_current(identity, attempt) {
            return false;
        }
        self.remove(identity);
        true
    }

    /// Forced removal of an attempt that never completed. No-op if the
    /// attempt already finished or was superseded.
    pub fn expire(&mut self, identity: &RewardId, attempt: AttemptId) -> bool {
        self.release(identity, attempt)
    }

    /// Whether `attempt` is the in-flight attempt for `identity`.
    pub fn is_current(&self, identity: &RewardId, attempt: AttemptId) -> bool {
        self.items
            .get(identity)
            .is_some_and(|item| item.processing && item.attempt == attempt)
    }

    pub fn contains(&self, identity: &RewardId) -> bool {
        self.items.contains_key(identity)
    }

    pub fn get(&self, identity: &RewardId) -> Option<&QueueItem> {
        self.items.get(identity)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn idle_count(&self) -> usize {
        self.items.values().filter(|item| !item.processing).count()
    }

    pub fn in_flight_count(&self) -> usize {
        self.items.values().filter(|item| item.processing).count()
    }

    fn remove(&mut self, identity: &RewardId) {
        self.items.remove(identity);
        self.order.retain(|id| id != identity);
    }
}

/// Schedule a forced removal of `identity` if `attempt` is still in flight
/// after `after`. The store is not touched, so the record stays `PENDING`
/// and the next discovery picks it up again.
///
/// The task resolves to whether it removed the item.
pub fn expire_stuck(
    queue: Arc<Mutex<PayoutQueue>>,
    identity: RewardId,
    attempt: AttemptId,
    after: Duration,
) -> JoinHandle<bool> {
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        let expired = queue.lock().await.expire(&identity, attempt);
        if expired {
            tracing::warn!(identity = %identity, attempt, ?after, "force-expired stuck payout");
        }
        expired
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizpay_types::{StatusDetail, Timestamp};

    fn record(id: &str, status: RewardStatus) -> RewardRecord {
        RewardRecord {
            identity: RewardId::new(id).unwrap(),
            recipient: AccountAddress::parse("rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh").unwrap(),
            amount: TokenValue::parse("10").unwrap(),
            grade: 90,
            quiz: "q5".into(),
            course: String::new(),
            lesson: String::new(),
            status,
            status_detail: (status != RewardStatus::Pending).then(|| StatusDetail {
                engine_result: "tecPATH_DRY".into(),
                engine_message: None,
                tx_hash: None,
            }),
            created_at: Timestamp::new(1),
            processed_at: None,
        }
    }

    fn id(s: &str) -> RewardId {
        RewardId::new(s).unwrap()
    }

    #[test]
    fn merge_dedups_by_identity() {
        let mut queue = PayoutQueue::new();
        let now = Instant::now();
        let records = vec![record("u1_q5", RewardStatus::Pending)];
        assert_eq!(queue.merge(&records, now), 1);
        assert_eq!(queue.merge(&records, now), 0);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn merge_ignores_non_pending() {
        let mut queue = PayoutQueue::new();
        let records = vec![
            record("a_q1", RewardStatus::Failed),
            record("b_q1", RewardStatus::Success),
            record("c_q1", RewardStatus::Pending),
        ];
        assert_eq!(queue.merge(&records, Instant::now()), 1);
        assert!(queue.contains(&id("c_q1")));
    }

    #[test]
    fn merge_does_not_reset_in_flight_item() {
        let mut queue = PayoutQueue::new();
        let records = vec![record("u1_q5", RewardStatus::Pending)];
        queue.merge(&records, Instant::now());
        let batch = queue.select_batch(5);
        queue.merge(&records, Instant::now());
        let item = queue.get(&id("u1_q5")).unwrap();
        assert!(item.processing);
        assert_eq!(item.attempt, batch[0].attempt);
    }

    #[test]
    fn select_batch_respects_order_and_limit() {
        let mut queue = PayoutQueue::new();
        let records: Vec<_> = ["a_q1", "b_q1", "c_q1"]
            .iter()
            .map(|s| record(s, RewardStatus::Pending))
            .collect();
        queue.merge(&records, Instant::now());

        let first = queue.select_batch(2);
        let ids: Vec<_> = first.iter().map(|i| i.identity.as_str()).collect();
        assert_eq!(ids, ["a_q1", "b_q1"]);
        assert!(first.iter().all(|i| i.processing));

        let second = queue.select_batch(2);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].identity.as_str(), "c_q1");
        assert!(queue.select_batch(2).is_empty());
        assert_eq!(queue.in_flight_count(), 3);
        assert_eq!(queue.idle_count(), 0);
    }

    #[test]
    fn attempt_numbers_are_unique() {
        let mut queue = PayoutQueue::new();
        let records: Vec<_> = ["a_q1", "b_q1"]
            .iter()
            .map(|s| record(s, RewardStatus::Pending))
            .collect();
        queue.merge(&records, Instant::now());
        let batch = queue.select_batch(2);
        assert_ne!(batch[0].attempt, batch[1].attempt);
        assert!(batch.iter().all(|i| i.attempt > 0));
    }

    #[test]
    fn release_requires_current_attempt() {
        let mut queue = PayoutQueue::new();
        queue.merge(&[record("u1_q5", RewardStatus::Pending)], Instant::now());
        let attempt = queue.select_batch(1)[0].attempt;

        assert!(!queue.release(&id("u1_q5"), attempt + 1));
        assert!(queue.contains(&id("u1_q5")));
        assert!(queue.release(&id("u1_q5"), attempt));
        assert!(queue.is_empty());
        assert!(!queue.release(&id("u1_q5"), attempt));
    }

    #[test]
    fn idle_item_cannot_be_released() {
        let mut queue = PayoutQueue::new();
        queue.merge(&[record("u1_q5", RewardStatus::Pending)], Instant::now());
        assert!(!queue.release(&id("u1_q5"), 0));
        assert!(queue.contains(&id("u1_q5")));
    }

    #[test]
    fn stale_completion_after_expiry_leaves_new_entry() {
        let mut queue = PayoutQueue::new();
        let records = vec![record("u1_q5", RewardStatus::Pending)];
        queue.merge(&records, Instant::now());
        let old = queue.select_batch(1)[0].attempt;

        assert!(queue.expire(&id("u1_q5"), old));
        assert!(!queue.contains(&id("u1_q5")));

        queue.merge(&records, Instant::now());
        let new = queue.select_batch(1)[0].attempt;
        assert_ne!(old, new);

        assert!(!queue.is_current(&id("u1_q5"), old));
        assert!(!queue.release(&id("u1_q5"), old));
        assert!(queue.is_current(&id("u1_q5"), new));
    }

    #[tokio::test(start_paused = true)]
    async fn expire_stuck_fires_after_timeout() {
        let queue = Arc::new(Mutex::new(PayoutQueue::new()));
        let attempt = {
            let mut q = queue.lock().await;
            q.merge(&[record("u1_q5", RewardStatus::Pending)], Instant::now());
            q.select_batch(1)[0].attempt
        };
        let handle = expire_stuck(queue.clone(), id("u1_q5"), attempt, Duration::from_secs(60));

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert!(queue.lock().await.contains(&id("u1_q5")));

        assert!(handle.await.unwrap());
        assert!(!queue.lock().await.contains(&id("u1_q5")));
    }

    #[tokio::test(start_paused = true)]
    async fn expire_stuck_ignores_released_item() {
        let queue = Arc::new(Mutex::new(PayoutQueue::new()));
        let attempt = {
            let mut q = queue.lock().await;
            q.merge(&[record("u1_q5", RewardStatus::Pending)], Instant::now());
            q.select_batch(1)[0].attempt
        };
        let handle = expire_stuck(queue.clone(), id("u1_q5"), attempt, Duration::from_secs(60));
        queue.lock().await.release(&id("u1_q5"), attempt);
        assert!(!handle.await.unwrap());
    }

    #[test]
    fn expire_after_release_is_noop() {
        let mut queue = PayoutQueue::new();
        queue.merge(&[record("u1_q5", RewardStatus::Pending)], Instant::now());
        let attempt = queue.select_batch(1)[0].attempt;
        assert!(queue.release(&id("u1_q5"), attempt));
        assert!(!queue.expire(&id("u1_q5"), attempt));
    }
}
