//! quizpay payout processor.
//!
//! Polls the reward store for `PENDING` rewards, batches them, and pays each
//! one with a signed token payment on the ledger:
//! - [`queue`]: in-memory dedup and in-flight tracking
//! - [`executor`]: build, sign, submit, record
//! - [`processor`]: discovery and processing loops
//! - [`recent`]: short-lived cache of the latest outcomes

pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod processor;
pub mod queue;
pub mod recent;
pub mod shutdown;
pub mod stats;

pub use config::{PayoutConfig, PayoutSettings};
pub use error::NodeError;
pub use executor::{PayoutExecutor, PayoutOutcome, LOC_INVALID_PAYMENT, LOC_SUBMIT_FAILED};
pub use logging::{init_logging, LogFormat};
pub use processor::{BatchSummary, CycleReport, PayoutProcessor};
pub use queue::{expire_stuck, AttemptId, PayoutQueue, QueueItem};
pub use recent::{RecentPhase, RecentResult, RecentResults};
pub use shutdown::{ShutdownController, ShutdownSignal};
pub use stats::{CountersSnapshot, PayoutCounters};
