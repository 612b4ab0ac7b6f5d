//! Processor configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use quizpay_crypto::{decode_account_id, CipherKey, PayerKeys};
use quizpay_network::XrplClientConfig;
use quizpay_store_lmdb::{LmdbEnvironment, LmdbRewardStore};
use quizpay_transactions::Currency;
use quizpay_types::{AccountAddress, Drops};

use crate::NodeError;

/// Configuration for the payout processor.
///
/// Can be loaded from a TOML file via [`PayoutConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Secrets and the payer identity
/// have no defaults; [`PayoutConfig::validate`] rejects a config missing any
/// of them.
#[derive(Clone, Serialize, Deserialize)]
pub struct PayoutConfig {
    /// Ledger node WebSocket URL.
    #[serde(default = "default_node_url")]
    pub node_url: String,

    /// Payer account (`r...`).
    #[serde(default)]
    pub account: String,

    /// Payer ed25519 family seed (`sEd...`).
    #[serde(default)]
    pub family_seed: String,

    /// Token issuer account.
    #[serde(default)]
    pub issuer: String,

    /// Token currency code (three letters or 40 hex digits).
    #[serde(default)]
    pub token: String,

    /// 32-byte secret shared with the LMS for payload encryption.
    #[serde(default)]
    pub encrypt_key: String,

    /// Fee per payment in drops, capped at 1000.
    #[serde(default = "default_fee_drops")]
    pub fee_drops: u64,

    /// Free text memo added to every payment; omitted when blank.
    #[serde(default)]
    pub memo: String,

    #[serde(default = "default_discovery_interval_secs")]
    pub discovery_interval_secs: u64,

    #[serde(default = "default_processing_interval_secs")]
    pub processing_interval_secs: u64,

    /// Maximum payments submitted per processing cycle.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Ledgers a payment stays valid for after the current one.
    #[serde(default = "default_max_ledgers")]
    pub max_ledgers: u32,

    /// In-flight items still unresolved after this long are dropped from
    /// the queue.
    #[serde(default = "default_stuck_timeout_secs")]
    pub stuck_timeout_secs: u64,

    #[serde(default = "default_recent_ttl_secs")]
    pub recent_ttl_secs: u64,

    #[serde(default = "default_recent_capacity")]
    pub recent_capacity: usize,

    #[serde(default = "default_max_connection_attempts")]
    pub max_connection_attempts: u32,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_offline_after_secs")]
    pub offline_after_secs: u64,

    /// Data directory for the reward store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in MiB.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_node_url() -> String {
    "wss://xrplcluster.com".to_string()
}

fn default_fee_drops() -> u64 {
    12
}

fn default_discovery_interval_secs() -> u64 {
    30
}

fn default_processing_interval_secs() -> u64 {
    15
}

fn default_batch_size() -> usize {
    5
}

fn default_max_ledgers() -> u32 {
    10
}

fn default_stuck_timeout_secs() -> u64 {
    60
}

fn default_recent_ttl_secs() -> u64 {
    60
}

fn default_recent_capacity() -> usize {
    1024
}

fn default_max_connection_attempts() -> u32 {
    4
}

fn default_connect_timeout_secs() -> u64 {
    4
}

fn default_offline_after_secs() -> u64 {
    20
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./quizpay_data")
}

fn default_map_size_mb() -> usize {
    64
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Validated, typed settings the processor runs with.
#[derive(Clone)]
pub struct PayoutSettings {
    pub account: AccountAddress,
    pub keys: Arc<PayerKeys>,
    pub issuer: AccountAddress,
    pub currency: Currency,
    pub fee: Drops,
    pub memo: Option<String>,
    pub max_ledgers: u32,
    pub batch_size: usize,
    pub discovery_interval: Duration,
    pub processing_interval: Duration,
    pub stuck_timeout: Duration,
    pub recent_ttl: Duration,
    pub recent_capacity: usize,
}

impl fmt::Debug for PayoutSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayoutSettings")
            .field("account", &self.account)
            .field("issuer", &self.issuer)
            .field("currency", &self.currency)
            .field("fee", &self.fee)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

// ── Impl ───────────────────────────────────────────────────────────────

impl PayoutConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(format!("{path}: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Check every field and build the typed settings.
    pub fn validate(&self) -> Result<PayoutSettings, NodeError> {
        let account = parse_account("account", &self.account)?;
        let issuer = parse_account("issuer", &self.issuer)?;

        let family_seed = required("family_seed", &self.family_seed)?;
        let keys = PayerKeys::from_family_seed(family_seed)
            .map_err(|e| NodeError::Config(format!("family_seed: {e}")))?;

        let token = required("token", &self.token)?;
        let currency =
            Currency::parse(token).map_err(|e| NodeError::Config(format!("token: {e}")))?;

        self.cipher_key()?;

        if self.batch_size == 0 {
            return Err(NodeError::Config("batch_size must be at least 1".into()));
        }
        if self.max_ledgers == 0 {
            return Err(NodeError::Config("max_ledgers must be at least 1".into()));
        }
        for (name, secs) in [
            ("discovery_interval_secs", self.discovery_interval_secs),
            ("processing_interval_secs", self.processing_interval_secs),
            ("stuck_timeout_secs", self.stuck_timeout_secs),
        ] {
            if secs == 0 {
                return Err(NodeError::Config(format!("{name} must be at least 1")));
            }
        }

        let fee = Drops::new(self.fee_drops).capped();
        if fee.get() != self.fee_drops {
            tracing::warn!(configured = self.fee_drops, used = fee.get(), "fee_drops capped");
        }

        let memo = Some(self.memo.trim())
            .filter(|m| !m.is_empty())
            .map(str::to_string);

        Ok(PayoutSettings {
            account,
            keys: Arc::new(keys),
            issuer,
            currency,
            fee,
            memo,
            max_ledgers: self.max_ledgers,
            batch_size: self.batch_size,
            discovery_interval: Duration::from_secs(self.discovery_interval_secs),
            processing_interval: Duration::from_secs(self.processing_interval_secs),
            stuck_timeout: Duration::from_secs(self.stuck_timeout_secs),
            recent_ttl: Duration::from_secs(self.recent_ttl_secs),
            recent_capacity: self.recent_capacity,
        })
    }

    /// The payload cipher key.
    pub fn cipher_key(&self) -> Result<CipherKey, NodeError> {
        let secret = required("encrypt_key", &self.encrypt_key)?;
        CipherKey::from_secret(secret).map_err(|e| NodeError::Config(format!("encrypt_key: {e}")))
    }

    /// Connection settings for the ledger client.
    pub fn client_config(&self) -> XrplClientConfig {
        XrplClientConfig {
            url: self.node_url.clone(),
            max_connection_attempts: self.max_connection_attempts,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            offline_after: Duration::from_secs(self.offline_after_secs),
            ..XrplClientConfig::default()
        }
    }

    pub fn map_size_bytes(&self) -> usize {
        self.map_size_mb.saturating_mul(1024 * 1024)
    }

    /// Open the LMDB reward store under `data_dir`.
    pub fn open_store(&self) -> Result<LmdbRewardStore, NodeError> {
        let key = self.cipher_key()?;
        let env = LmdbEnvironment::open(&self.data_dir, 4, self.map_size_bytes())?;
        Ok(env.reward_store(key))
    }
}

fn required<'a>(name: &str, value: &'a str) -> Result<&'a str, NodeError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(NodeError::Config(format!("{name} is required")));
    }
    Ok(value)
}

fn parse_account(name: &str, value: &str) -> Result<AccountAddress, NodeError> {
    let address = AccountAddress::parse(required(name, value)?)
        .map_err(|e| NodeError::Config(format!("{name}: {e}")))?;
    decode_account_id(&address).map_err(|e| NodeError::Config(format!("{name}: {e}")))?;
    Ok(address)
}

impl Default for PayoutConfig {
    fn default() -> Self {
        Self {
            node_url: default_node_url(),
            account: String::new(),
            family_seed: String::new(),
            issuer: String::new(),
            token: String::new(),
            encrypt_key: String::new(),
            fee_drops: default_fee_drops(),
            memo: String::new(),
            discovery_interval_secs: default_discovery_interval_secs(),
            processing_interval_secs: default_processing_interval_secs(),
            batch_size: default_batch_size(),
            max_ledgers: default_max_ledgers(),
            stuck_timeout_secs: default_stuck_timeout_secs(),
            recent_ttl_secs: default_recent_ttl_secs(),
            recent_capacity: default_recent_capacity(),
            max_connection_attempts: default_max_connection_attempts(),
            connect_timeout_secs: default_connect_timeout_secs(),
            offline_after_secs: default_offline_after_secs(),
            data_dir: default_data_dir(),
            map_size_mb: default_map_size_mb(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}

impl fmt::Debug for PayoutConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = |s: &str| if s.is_empty() { "<unset>" } else { "<redacted>" };
        f.debug_struct("PayoutConfig")
            .field("node_url", &self.node_url)
            .field("account", &self.account)
            .field("family_seed", &redacted(&self.family_seed))
            .field("issuer", &self.issuer)
            .field("token", &self.token)
            .field("encrypt_key", &redacted(&self.encrypt_key))
            .field("fee_drops", &self.fee_drops)
            .field("batch_size", &self.batch_size)
            .field("data_dir", &self.data_dir)
            .finish_non_exhaustive()
    }
}
