//! Nullable reward store - thread-safe in-memory storage for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use quizpay_store::{new_record, reopen, AttemptOutcome, RewardStore, StoreError};
use quizpay_types::{NewReward, RewardId, RewardRecord, RewardStatus, Timestamp};

/// An in-memory reward store.
/// Thread-safe for use with tokio's multi-threaded runtime.
pub struct NullRewardStore {
    records: Mutex<HashMap<RewardId, RewardRecord>>,
    outcomes: Mutex<Vec<(RewardId, AttemptOutcome)>>,
    fetches: AtomicU64,
    clock: AtomicU64,
    fail_writes: AtomicBool,
    fail_fetches: AtomicBool,
}

impl NullRewardStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            outcomes: Mutex::new(Vec::new()),
            fetches: AtomicU64::new(0),
            clock: AtomicU64::new(1),
            fail_writes: AtomicBool::new(false),
            fail_fetches: AtomicBool::new(false),
        }
    }

    /// Insert or replace a record as-is.
    pub fn put_record(&self, record: RewardRecord) {
        self.records
            .lock()
            .unwrap()
            .insert(record.identity.clone(), record);
    }

    /// Every `record_outcome` call, in call order, including failed writes.
    pub fn outcomes(&self) -> Vec<(RewardId, AttemptOutcome)> {
        self.outcomes.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Make `record_outcome` fail (after recording the call).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    /// Monotonic fake time so records keep their insertion order.
    fn tick(&self) -> Timestamp {
        Timestamp::new(self.clock.fetch_add(1, Ordering::SeqCst))
    }

    fn sorted(&self, filter: impl Fn(&RewardRecord) -> bool) -> Vec<RewardRecord> {
        let mut records: Vec<RewardRecord> = self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| filter(r))
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.identity.cmp(&b.identity))
        });
        records
    }
}

impl Default for NullRewardStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RewardStore for NullRewardStore {
    fn insert_reward(&self, reward: &NewReward) -> Result<RewardRecord, StoreError> {
        let record = new_record(reward, self.tick())?;
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&record.identity) {
            return Err(StoreError::Duplicate(record.identity.to_string()));
        }
        records.insert(record.identity.clone(), record.clone());
        Ok(record)
    }

    fn fetch_pending(&self) -> Result<Vec<RewardRecord>, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected fetch failure".into()));
        }
        Ok(self.sorted(|r| r.status == RewardStatus::Pending))
    }

    fn record_outcome(
        &self,
        identity: &RewardId,
        outcome: &AttemptOutcome,
    ) -> Result<(), StoreError> {
        self.outcomes
            .lock()
            .unwrap()
            .push((identity.clone(), outcome.clone()));
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected write failure".into()));
        }
        let now = self.tick();
        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(identity)
            .ok_or_else(|| StoreError::NotFound(identity.to_string()))?;
        outcome.apply_to(record, now);
        Ok(())
    }

    fn retry(&self, identity: &RewardId) -> Result<RewardRecord, StoreError> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(identity)
            .ok_or_else(|| StoreError::NotFound(identity.to_string()))?;
        reopen(record)?;
        Ok(record.clone())
    }

    fn get(&self, identity: &RewardId) -> Result<RewardRecord, StoreError> {
        self.records
            .lock()
            .unwrap()
            .get(identity)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(identity.to_string()))
    }

    fn list(&self, status: Option<RewardStatus>) -> Result<Vec<RewardRecord>, StoreError> {
        Ok(self.sorted(|r| status.map_or(true, |s| r.status == s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizpay_types::{AccountAddress, TokenValue};

    fn reward(quiz: &str) -> NewReward {
        NewReward::new(
            AccountAddress::parse("rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh").unwrap(),
            quiz,
            TokenValue::parse("1").unwrap(),
            75,
        )
        .unwrap()
    }

    #[test]
    fn pending_in_insertion_order() {
        let store = NullRewardStore::new();
        for quiz in ["9", "1", "5"] {
            store.insert_reward(&reward(quiz)).unwrap();
        }
        let quizzes: Vec<_> = store
            .fetch_pending()
            .unwrap()
            .into_iter()
            .map(|r| r.quiz)
            .collect();
        assert_eq!(quizzes, ["9", "1", "5"]);
        assert_eq!(store.fetch_count(), 1);
    }

    #[test]
    fn injected_write_failure_still_records_call() {
        let store = NullRewardStore::new();
        let record = store.insert_reward(&reward("1")).unwrap();
        store.fail_writes(true);
        let outcome = AttemptOutcome::new("tesSUCCESS", Some("AA".into()));
        assert!(store.record_outcome(&record.identity, &outcome).is_err());
        assert_eq!(store.outcomes().len(), 1);
        assert_eq!(store.get(&record.identity).unwrap().status, RewardStatus::Pending);
    }

    #[test]
    fn retry_follows_store_rules() {
        let store = NullRewardStore::new();
        let record = store.insert_reward(&reward("1")).unwrap();
        assert!(store.retry(&record.identity).is_err());
        store
            .record_outcome(&record.identity, &AttemptOutcome::new("tecNO_DST", Some("BB".into())))
            .unwrap();
        assert_eq!(store.retry(&record.identity).unwrap().status, RewardStatus::Pending);
    }
}
