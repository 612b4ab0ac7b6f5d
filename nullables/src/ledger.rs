//! Nullable ledger - scripted engine results instead of a live node.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use quizpay_network::{LedgerConnection, LedgerGateway, NetworkError, SubmitResult};
use quizpay_transactions::SignedTransaction;
use quizpay_types::AccountAddress;

/// How the null ledger answers one submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NullSubmit {
    /// The node answers with this engine result.
    Engine(String),
    /// The request is lost in transit.
    TransportError,
}

impl NullSubmit {
    pub fn engine(code: impl Into<String>) -> Self {
        Self::Engine(code.into())
    }
}

struct LedgerState {
    sequence: u32,
    ledger_index: u32,
    default_submit: NullSubmit,
    scripted: HashMap<AccountAddress, VecDeque<NullSubmit>>,
    submit_delay: Duration,
    failing_connects: u32,
    fail_sequence: bool,
    fail_ledger_index: bool,
    submissions: Vec<SignedTransaction>,
    connects: u32,
    closes: u32,
}

/// A test ledger that records submissions instead of sending them.
///
/// Clones share state, so a test can keep one handle while the processor
/// owns another.
#[derive(Clone)]
pub struct NullLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl NullLedger {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(LedgerState {
                sequence: 1,
                ledger_index: 1_000,
                default_submit: NullSubmit::engine("tesSUCCESS"),
                scripted: HashMap::new(),
                submit_delay: Duration::ZERO,
                failing_connects: 0,
                fail_sequence: false,
                fail_ledger_index: false,
                submissions: Vec::new(),
                connects: 0,
                closes: 0,
            })),
        }
    }

    /// Next sequence the payer account reports.
    pub fn set_sequence(&self, sequence: u32) {
        self.state.lock().unwrap().sequence = sequence;
    }

    pub fn set_ledger_index(&self, index: u32) {
        self.state.lock().unwrap().ledger_index = index;
    }

    /// Answer for submissions with no destination-specific script.
    pub fn respond_by_default(&self, response: NullSubmit) {
        self.state.lock().unwrap().default_submit = response;
    }

    /// Queue an answer for the next submission paying `destination`.
    pub fn respond_to(&self, destination: &AccountAddress, response: NullSubmit) {
        self.state
            .lock()
            .unwrap()
            .scripted
            .entry(destination.clone())
            .or_default()
            .push_back(response);
    }

    /// Hold every submission for `delay` before answering.
    pub fn set_submit_delay(&self, delay: Duration) {
        self.state.lock().unwrap().submit_delay = delay;
    }

    pub fn fail_next_connects(&self, count: u32) {
        self.state.lock().unwrap().failing_connects = count;
    }

    pub fn fail_sequence_lookups(&self, fail: bool) {
        self.state.lock().unwrap().fail_sequence = fail;
    }

    pub fn fail_ledger_index_lookups(&self, fail: bool) {
        self.state.lock().unwrap().fail_ledger_index = fail;
    }

    /// Every transaction submitted so far, in submission order.
    pub fn submissions(&self) -> Vec<SignedTransaction> {
        self.state.lock().unwrap().submissions.clone()
    }

    pub fn connect_count(&self) -> u32 {
        self.state.lock().unwrap().connects
    }

    pub fn close_count(&self) -> u32 {
        self.state.lock().unwrap().closes
    }
}

impl Default for NullLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerGateway for NullLedger {
    type Connection = NullLedgerConnection;

    async fn connect(&self) -> Result<NullLedgerConnection, NetworkError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_connects > 0 {
            state.failing_connects -= 1;
            return Err(NetworkError::ConnectionFailed {
                url: "null://ledger".into(),
                attempts: 1,
                reason: "injected connect failure".into(),
            });
        }
        state.connects += 1;
        Ok(NullLedgerConnection {
            state: Arc::clone(&self.state),
            closed: AtomicBool::new(false),
        })
    }
}

pub struct NullLedgerConnection {
    state: Arc<Mutex<LedgerState>>,
    closed: AtomicBool,
}

impl NullLedgerConnection {
    fn ensure_open(&self) -> Result<(), NetworkError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(NetworkError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerConnection for NullLedgerConnection {
    async fn account_sequence(&self, _account: &AccountAddress) -> Result<u32, NetworkError> {
        self.ensure_open()?;
        let state = self.state.lock().unwrap();
        if state.fail_sequence {
            return Err(NetworkError::Rpc {
                command: "account_info".into(),
                error: "actNotFound".into(),
                message: None,
            });
        }
        Ok(state.sequence)
    }

    async fn current_ledger_index(&self) -> Result<u32, NetworkError> {
        self.ensure_open()?;
        let state = self.state.lock().unwrap();
        if state.fail_ledger_index {
            return Err(NetworkError::Offline {
                command: "ledger_current".into(),
                after: Duration::ZERO,
            });
        }
        Ok(state.ledger_index)
    }

    async fn submit(&self, tx: &SignedTransaction) -> Result<SubmitResult, NetworkError> {
        self.ensure_open()?;
        let (response, delay) = {
            let mut state = self.state.lock().unwrap();
            state.submissions.push(tx.clone());
            let scripted = state
                .scripted
                .get_mut(&tx.destination)
                .and_then(VecDeque::pop_front);
            let response = scripted.unwrap_or_else(|| state.default_submit.clone());
            (response, state.submit_delay)
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match response {
            NullSubmit::Engine(code) => Ok(SubmitResult {
                engine_result: code,
                engine_result_message: None,
                tx_hash: tx.hash.clone(),
            }),
            NullSubmit::TransportError => Err(NetworkError::Send("injected transport failure".into())),
        }
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.state.lock().unwrap().closes += 1;
        }
    }
}
