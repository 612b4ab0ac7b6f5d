//! Recent payout results, kept for a short time for observability.
//!
//! One entry per identity holding its latest attempt. Entries older than the
//! TTL are pruned on every write and snapshot; when full, the oldest entry is
//! evicted to make room.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::time::Duration;

use quizpay_types::{AccountAddress, RewardId, TokenValue};
use tokio::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecentPhase {
    /// Signed and handed to the ledger, no answer yet.
    Submitting,
    Success,
    /// Queued by the ledger; final outcome unknown.
    Submitted,
    Failed,
    /// Answer arrived after the attempt was force-expired.
    Discarded,
}

impl fmt::Display for RecentPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Submitting => "submitting",
            Self::Success => "success",
            Self::Submitted => "submitted",
            Self::Failed => "failed",
            Self::Discarded => "discarded",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecentResult {
    pub identity: RewardId,
    pub recipient: AccountAddress,
    pub amount: TokenValue,
    /// `None` when no transaction was signed.
    pub sequence: Option<u32>,
    pub tx_hash: Option<String>,
    pub engine_result: Option<String>,
    pub phase: RecentPhase,
    pub recorded_at: Instant,
}

pub struct RecentResults {
    entries: HashMap<RewardId, RecentResult>,
    order: VecDeque<RewardId>,
    capacity: usize,
    ttl: Duration,
}

impl RecentResults {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
            ttl,
        }
    }

    /// Store `result` as the latest entry for its identity.
    pub fn record(&mut self, result: RecentResult) {
        if self.capacity == 0 {
            return;
        }
        self.prune(result.recorded_at);
        if self.entries.contains_key(&result.identity) {
            self.order.retain(|id| id != &result.identity);
        } else if self.order.len() >= self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.entries.remove(&evicted);
            }
        }
        self.order.push_back(result.identity.clone());
        self.entries.insert(result.identity.clone(), result);
    }

    /// Drop entries recorded more than one TTL before `now`.
    pub fn prune(&mut self, now: Instant) {
        while let Some(oldest) = self.order.front() {
            let expired = self
                .entries
                .get(oldest)
                .map_or(true, |e| now.saturating_duration_since(e.recorded_at) >= self.ttl);
            if !expired {
                break;
            }
            if let Some(id) = self.order.pop_front() {
                self.entries.remove(&id);
            }
        }
    }

    pub fn get(&self, identity: &RewardId) -> Option<&RecentResult> {
        self.entries.get(identity)
    }

    /// Live entries, oldest first.
    pub fn snapshot(&mut self, now: Instant) -> Vec<RecentResult> {
        self.prune(now);
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str, phase: RecentPhase, at: Instant) -> RecentResult {
        RecentResult {
            identity: RewardId::new(id).unwrap(),
            recipient: AccountAddress::parse("rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh").unwrap(),
            amount: TokenValue::parse("10").unwrap(),
            sequence: Some(7),
            tx_hash: None,
            engine_result: None,
            phase,
            recorded_at: at,
        }
    }

    #[test]
    fn latest_result_replaces_earlier_one() {
        let mut recent = RecentResults::new(10, Duration::from_secs(60));
        let now = Instant::now();
        recent.record(result("a_q1", RecentPhase::Submitting, now));
        recent.record(result("a_q1", RecentPhase::Success, now));
        assert_eq!(recent.len(), 1);
        let id = RewardId::new("a_q1").unwrap();
        assert_eq!(recent.get(&id).unwrap().phase, RecentPhase::Success);
    }

    #[test]
    fn eviction_at_capacity() {
        let mut recent = RecentResults::new(2, Duration::from_secs(60));
        let now = Instant::now();
        recent.record(result("a_q1", RecentPhase::Success, now));
        recent.record(result("b_q1", RecentPhase::Success, now));
        recent.record(result("c_q1", RecentPhase::Failed, now));
        let ids: Vec<_> = recent
            .snapshot(now)
            .into_iter()
            .map(|r| r.identity.as_str().to_string())
            .collect();
        assert_eq!(ids, ["b_q1", "c_q1"]);
    }

    #[test]
    fn rerecording_moves_entry_to_back() {
        let mut recent = RecentResults::new(2, Duration::from_secs(60));
        let now = Instant::now();
        recent.record(result("a_q1", RecentPhase::Submitting, now));
        recent.record(result("b_q1", RecentPhase::Submitting, now));
        recent.record(result("a_q1", RecentPhase::Success, now));
        recent.record(result("c_q1", RecentPhase::Success, now));
        assert!(recent.get(&RewardId::new("a_q1").unwrap()).is_some());
        assert!(recent.get(&RewardId::new("b_q1").unwrap()).is_none());
    }

    #[test]
    fn entries_expire_after_ttl() {
        let mut recent = RecentResults::new(10, Duration::from_secs(60));
        let start = Instant::now();
        recent.record(result("a_q1", RecentPhase::Success, start));
        recent.record(result("b_q1", RecentPhase::Success, start + Duration::from_secs(30)));

        assert_eq!(recent.snapshot(start + Duration::from_secs(59)).len(), 2);
        let left = recent.snapshot(start + Duration::from_secs(60));
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].identity.as_str(), "b_q1");
        assert!(recent.snapshot(start + Duration::from_secs(120)).is_empty());
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut recent = RecentResults::new(0, Duration::from_secs(60));
        recent.record(result("a_q1", RecentPhase::Success, Instant::now()));
        assert!(recent.is_empty());
    }
}
