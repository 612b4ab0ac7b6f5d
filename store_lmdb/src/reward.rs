//! LMDB implementation of RewardStore.

use heed::types::{Bytes, Str};
use heed::{Database, Env};

use quizpay_crypto::CipherKey;
use quizpay_store::{new_record, reopen, AttemptOutcome, RewardStore, StoreError};
use quizpay_types::{NewReward, RewardId, RewardRecord, RewardStatus, Timestamp};

use crate::{LmdbError, StoredReward};

pub struct LmdbRewardStore {
    pub(crate) env: Env,
    pub(crate) rewards_db: Database<Str, Bytes>,
    pub(crate) key: CipherKey,
}

impl LmdbRewardStore {
    /// Decode every stored reward matching `filter`, skipping (and logging)
    /// entries that cannot be decoded.
    fn scan(
        &self,
        filter: impl Fn(&StoredReward) -> bool,
    ) -> Result<Vec<RewardRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self.rewards_db.iter(&rtxn).map_err(LmdbError::from)?;

        let mut records = Vec::new();
        for entry in iter {
            let (identity, bytes) = entry.map_err(LmdbError::from)?;
            let stored = match StoredReward::from_bytes(bytes) {
                Ok(stored) => stored,
                Err(e) => {
                    tracing::warn!(identity, error = %e, "skipping unreadable reward entry");
                    continue;
                }
            };
            if !filter(&stored) {
                continue;
            }
            match stored.open(&self.key) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(
                    identity,
                    status = %stored.status,
                    status_line = %stored.status_line,
                    created_at = stored.created_at,
                    error = %e,
                    "skipping reward with undecodable payload"
                ),
            }
        }
        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.identity.cmp(&b.identity))
        });
        Ok(records)
    }

    fn load(&self, identity: &RewardId) -> Result<RewardRecord, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let bytes = self
            .rewards_db
            .get(&rtxn, identity.as_str())
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(identity.to_string()))?;
        let record = StoredReward::from_bytes(bytes)?.open(&self.key)?;
        Ok(record)
    }

    /// Read-modify-write of one record inside a single write transaction.
    fn update(
        &self,
        identity: &RewardId,
        change: impl FnOnce(&mut RewardRecord) -> Result<(), StoreError>,
    ) -> Result<RewardRecord, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let bytes = self
            .rewards_db
            .get(&wtxn, identity.as_str())
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(identity.to_string()))?;
        let mut record = StoredReward::from_bytes(bytes)?.open(&self.key)?;

        change(&mut record)?;

        let sealed = StoredReward::seal(&record, &self.key)?.to_bytes()?;
        self.rewards_db
            .put(&mut wtxn, identity.as_str(), &sealed)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(record)
    }
}

impl RewardStore for LmdbRewardStore {
    fn insert_reward(&self, reward: &NewReward) -> Result<RewardRecord, StoreError> {
        let record = new_record(reward, Timestamp::now())?;
        let sealed = StoredReward::seal(&record, &self.key)?.to_bytes()?;

        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let exists = self
            .rewards_db
            .get(&wtxn, record.identity.as_str())
            .map_err(LmdbError::from)?
            .is_some();
        if exists {
            return Err(StoreError::Duplicate(record.identity.to_string()));
        }
        self.rewards_db
            .put(&mut wtxn, record.identity.as_str(), &sealed)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;

        tracing::debug!(identity = %record.identity, "reward stored");
        Ok(record)
    }

    fn fetch_pending(&self) -> Result<Vec<RewardRecord>, StoreError> {
        self.scan(|stored| stored.status == RewardStatus::Pending)
    }

    fn record_outcome(
        &self,
        identity: &RewardId,
        outcome: &AttemptOutcome,
    ) -> Result<(), StoreError> {
        self.update(identity, |record| {
            outcome.apply_to(record, Timestamp::now());
            Ok(())
        })?;
        Ok(())
    }

    fn retry(&self, identity: &RewardId) -> Result<RewardRecord, StoreError> {
        self.update(identity, reopen)
    }

    fn get(&self, identity: &RewardId) -> Result<RewardRecord, StoreError> {
        self.load(identity)
    }

    fn list(&self, status: Option<RewardStatus>) -> Result<Vec<RewardRecord>, StoreError> {
        self.scan(|stored| status.map_or(true, |s| stored.status == s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbEnvironment;
    use quizpay_types::{AccountAddress, TokenValue};

    const KEY: &str = "lbwyBzfgzUIvXZFShJuikaWvLJhIVq36";
    const ADDR: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";

    fn temp_store() -> (tempfile::TempDir, LmdbEnvironment, LmdbRewardStore) {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let env = LmdbEnvironment::open(dir.path(), 4, 10 * 1024 * 1024).expect("failed to open env");
        let store = env.reward_store(CipherKey::from_secret(KEY).unwrap());
        (dir, env, store)
    }

    fn reward(quiz: &str) -> NewReward {
        NewReward::new(
            AccountAddress::parse(ADDR).unwrap(),
            quiz,
            TokenValue::parse("10").unwrap(),
            92,
        )
        .unwrap()
        .with_context("Intro to Ledgers", "Lesson 1")
    }

    fn id(quiz: &str) -> RewardId {
        RewardId::new(format!("{ADDR}_{quiz}")).unwrap()
    }

    #[test]
    fn insert_then_fetch_pending() {
        let (_dir, _env, store) = temp_store();
        store.insert_reward(&reward("5")).unwrap();

        let pending = store.fetch_pending().unwrap();
        assert_eq!(pending.len(), 1);
        let record = &pending[0];
        assert_eq!(record.identity, id("5"));
        assert_eq!(record.course, "Intro to Ledgers");
        assert_eq!(record.amount.as_str(), "10");
        assert_eq!(record.grade, 92);
        assert_eq!(record.status, RewardStatus::Pending);
    }

    #[test]
    fn duplicate_identity_rejected() {
        let (_dir, _env, store) = temp_store();
        store.insert_reward(&reward("5")).unwrap();
        assert!(matches!(
            store.insert_reward(&reward("5")),
            Err(StoreError::Duplicate(_))
        ));
    }

    #[test]
    fn outcome_moves_record_out_of_pending() {
        let (_dir, _env, store) = temp_store();
        store.insert_reward(&reward("5")).unwrap();
        store.insert_reward(&reward("6")).unwrap();

        let outcome = AttemptOutcome::new("tesSUCCESS", Some("ABCDEF".into()))
            .with_message("The transaction was applied.");
        store.record_outcome(&id("5"), &outcome).unwrap();

        let pending = store.fetch_pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].identity, id("6"));

        let done = store.get(&id("5")).unwrap();
        assert_eq!(done.status, RewardStatus::Success);
        assert_eq!(done.status_line().to_string(), "tesSUCCESS:ABCDEF");
        let detail = done.status_detail.unwrap();
        assert_eq!(detail.engine_message.as_deref(), Some("The transaction was applied."));
        assert!(done.processed_at.is_some());
    }

    #[test]
    fn payload_status_mirrors_status_line() {
        let (_dir, env, store) = temp_store();
        store.insert_reward(&reward("5")).unwrap();
        store
            .record_outcome(&id("5"), &AttemptOutcome::new("tecPATH_DRY", Some("AA11".into())))
            .unwrap();

        let rtxn = env.env().read_txn().unwrap();
        let bytes = env.rewards_db().get(&rtxn, id("5").as_str()).unwrap().unwrap();
        let stored = StoredReward::from_bytes(bytes).unwrap();
        let json = quizpay_crypto::decrypt(&stored.payload, &CipherKey::from_secret(KEY).unwrap()).unwrap();
        let payload: quizpay_types::RewardPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(payload.status, "tecPATH_DRY:AA11");
        assert_eq!(stored.status, RewardStatus::Failed);
    }

    #[test]
    fn record_outcome_is_idempotent() {
        let (_dir, _env, store) = temp_store();
        store.insert_reward(&reward("5")).unwrap();
        let outcome = AttemptOutcome::new("terQUEUED", Some("BEEF".into()));
        store.record_outcome(&id("5"), &outcome).unwrap();
        store.record_outcome(&id("5"), &outcome).unwrap();
        let record = store.get(&id("5")).unwrap();
        assert_eq!(record.status, RewardStatus::Submitted);
        assert_eq!(record.status_line().to_string(), "terQUEUED:BEEF");
    }

    #[test]
    fn retry_from_failed_or_submitted() {
        let (_dir, _env, store) = temp_store();
        store.insert_reward(&reward("5")).unwrap();
        assert!(matches!(store.retry(&id("5")), Err(StoreError::NotRetryable { .. })));

        store
            .record_outcome(&id("5"), &AttemptOutcome::new("locSUBMIT_FAILED", Some("CC".into())))
            .unwrap();
        let reopened = store.retry(&id("5")).unwrap();
        assert_eq!(reopened.status, RewardStatus::Pending);
        assert_eq!(store.fetch_pending().unwrap().len(), 1);

        store.insert_reward(&reward("6")).unwrap();
        store
            .record_outcome(&id("6"), &AttemptOutcome::new("terQUEUED", Some("DD".into())))
            .unwrap();
        assert_eq!(store.retry(&id("6")).unwrap().status, RewardStatus::Pending);
        assert_eq!(store.fetch_pending().unwrap().len(), 2);

        store
            .record_outcome(&id("6"), &AttemptOutcome::new("tesSUCCESS", Some("DD".into())))
            .unwrap();
        assert!(matches!(store.retry(&id("6")), Err(StoreError::NotRetryable { .. })));
    }

    #[test]
    fn unknown_identity_is_not_found() {
        let (_dir, _env, store) = temp_store();
        assert!(matches!(store.get(&id("404")), Err(StoreError::NotFound(_))));
        assert!(matches!(
            store.record_outcome(&id("404"), &AttemptOutcome::new("tesSUCCESS", None)),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn corrupted_payload_is_skipped_not_fatal() {
        let (_dir, env, store) = temp_store();
        store.insert_reward(&reward("5")).unwrap();
        store.insert_reward(&reward("6")).unwrap();

        // Damage the ciphertext of one record.
        {
            let mut wtxn = env.env().write_txn().unwrap();
            let bytes = env.rewards_db().get(&wtxn, id("5").as_str()).unwrap().unwrap();
            let mut stored = StoredReward::from_bytes(bytes).unwrap();
            stored.payload = format!("{}:00", "00".repeat(16));
            let damaged = stored.to_bytes().unwrap();
            env.rewards_db().put(&mut wtxn, id("5").as_str(), &damaged).unwrap();
            wtxn.commit().unwrap();
        }

        let pending = store.fetch_pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].identity, id("6"));
        assert!(matches!(store.get(&id("5")), Err(StoreError::Corruption(_))));
    }

    #[test]
    fn wrong_key_reads_nothing() {
        let (_dir, env, store) = temp_store();
        store.insert_reward(&reward("5")).unwrap();
        let other = env.reward_store(CipherKey::new([9u8; 32]));
        assert!(other.fetch_pending().unwrap().is_empty());
    }

    #[test]
    fn list_filters_and_stats_aggregate() {
        let (_dir, _env, store) = temp_store();
        for quiz in ["1", "2", "3"] {
            store.insert_reward(&reward(quiz)).unwrap();
        }
        store
            .record_outcome(&id("1"), &AttemptOutcome::new("tesSUCCESS", Some("01".into())))
            .unwrap();
        store
            .record_outcome(&id("2"), &AttemptOutcome::new("tecNO_LINE", Some("02".into())))
            .unwrap();

        assert_eq!(store.list(None).unwrap().len(), 3);
        assert_eq!(store.list(Some(RewardStatus::Failed)).unwrap()[0].identity, id("2"));

        let stats = store.stats().unwrap();
        assert_eq!(stats.count(RewardStatus::Success), 1);
        assert_eq!(stats.count(RewardStatus::Pending), 1);
        assert_eq!(stats.tokens_paid, 10.0);
        assert_eq!(stats.learners_paid, 1);
    }

    #[test]
    fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let env = LmdbEnvironment::open(dir.path(), 4, 10 * 1024 * 1024).unwrap();
            let store = env.reward_store(CipherKey::from_secret(KEY).unwrap());
            store.insert_reward(&reward("5")).unwrap();
        }
        let env = LmdbEnvironment::open(dir.path(), 4, 10 * 1024 * 1024).unwrap();
        let store = env.reward_store(CipherKey::from_secret(KEY).unwrap());
        assert_eq!(store.get(&id("5")).unwrap().grade, 92);
    }
}
