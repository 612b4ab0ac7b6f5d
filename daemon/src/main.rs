//! quizpay daemon: entry point for the payout processor and operator commands.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use quizpay_network::XrplClient;
use quizpay_node::{init_logging, LogFormat, PayoutConfig, PayoutProcessor, ShutdownController};
use quizpay_store::RewardStore;
use quizpay_types::{AccountAddress, NewReward, RewardId, RewardStatus, TokenValue};

#[derive(Parser)]
#[command(name = "quizpay-daemon", about = "Quiz reward payout processor")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "QUIZPAY_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for the reward store.
    #[arg(long, env = "QUIZPAY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Ledger node WebSocket URL.
    #[arg(long, env = "QUIZPAY_NODE_URL")]
    node_url: Option<String>,

    /// Payer account.
    #[arg(long, env = "QUIZPAY_ACCOUNT")]
    account: Option<String>,

    /// Payer family seed.
    #[arg(long, env = "QUIZPAY_FAMILY_SEED", hide_env_values = true)]
    family_seed: Option<String>,

    /// Token issuer account.
    #[arg(long, env = "QUIZPAY_ISSUER")]
    issuer: Option<String>,

    /// Token currency code.
    #[arg(long, env = "QUIZPAY_TOKEN")]
    token: Option<String>,

    /// 32-byte payload encryption secret.
    #[arg(long, env = "QUIZPAY_ENCRYPT_KEY", hide_env_values = true)]
    encrypt_key: Option<String>,

    /// Fee per payment, in drops.
    #[arg(long, env = "QUIZPAY_FEE_DROPS")]
    fee_drops: Option<u64>,

    /// Free-text memo added to every payment; empty for none.
    #[arg(long, env = "QUIZPAY_MEMO")]
    memo: Option<String>,

    /// Seconds between store scans.
    #[arg(long, env = "QUIZPAY_DISCOVERY_INTERVAL_SECS")]
    discovery_interval_secs: Option<u64>,

    /// Seconds between processing ticks.
    #[arg(long, env = "QUIZPAY_PROCESSING_INTERVAL_SECS")]
    processing_interval_secs: Option<u64>,

    /// Most payouts sent per cycle.
    #[arg(long, env = "QUIZPAY_BATCH_SIZE")]
    batch_size: Option<usize>,

    /// Ledgers a payment stays valid for after the current one.
    #[arg(long, env = "QUIZPAY_MAX_LEDGERS")]
    max_ledgers: Option<u32>,

    /// Seconds before an in-flight payout is force-expired.
    #[arg(long, env = "QUIZPAY_STUCK_TIMEOUT_SECS")]
    stuck_timeout_secs: Option<u64>,

    /// Seconds a recent result is kept.
    #[arg(long, env = "QUIZPAY_RECENT_TTL_SECS")]
    recent_ttl_secs: Option<u64>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "QUIZPAY_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "QUIZPAY_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the discovery and processing loops until SIGINT/SIGTERM.
    Run,
    /// Queue a reward for payout.
    Enqueue {
        #[arg(long)]
        account: String,
        #[arg(long)]
        quiz: String,
        #[arg(long)]
        amount: String,
        #[arg(long)]
        grade: u8,
        #[arg(long, default_value = "")]
        course: String,
        #[arg(long, default_value = "")]
        lesson: String,
    },
    /// Move a FAILED or SUBMITTED reward back to PENDING.
    Retry { identity: String },
    /// List rewards, optionally filtered by status.
    List {
        #[arg(long)]
        status: Option<RewardStatus>,
    },
    /// Print payout statistics as JSON.
    Stats,
}

impl Cli {
    /// File config (if any) with flag and env overrides applied.
    fn payout_config(&self) -> anyhow::Result<PayoutConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let path = path.to_string_lossy();
                PayoutConfig::from_toml_file(&path)
                    .with_context(|| format!("loading config from {path}"))?
            }
            None => PayoutConfig::default(),
        };

        if let Some(data_dir) = &self.data_dir {
            config.data_dir = data_dir.clone();
        }
        let overrides = [
            (&self.node_url, &mut config.node_url),
            (&self.account, &mut config.account),
            (&self.family_seed, &mut config.family_seed),
            (&self.issuer, &mut config.issuer),
            (&self.token, &mut config.token),
            (&self.encrypt_key, &mut config.encrypt_key),
            (&self.memo, &mut config.memo),
            (&self.log_level, &mut config.log_level),
            (&self.log_format, &mut config.log_format),
        ];
        for (flag, field) in overrides {
            if let Some(value) = flag {
                *field = value.clone();
            }
        }
        let numbers = [
            (self.discovery_interval_secs, &mut config.discovery_interval_secs),
            (self.processing_interval_secs, &mut config.processing_interval_secs),
            (self.stuck_timeout_secs, &mut config.stuck_timeout_secs),
            (self.recent_ttl_secs, &mut config.recent_ttl_secs),
            (self.fee_drops, &mut config.fee_drops),
        ];
        for (flag, field) in numbers {
            if let Some(value) = flag {
                *field = value;
            }
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(max_ledgers) = self.max_ledgers {
            config.max_ledgers = max_ledgers;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = cli.payout_config()?;

    let format: LogFormat = config.log_format.parse()?;
    init_logging(format, &config.log_level)?;

    match cli.command {
        Command::Run => run(config).await,
        Command::Enqueue {
            account,
            quiz,
            amount,
            grade,
            course,
            lesson,
        } => {
            let store = config.open_store()?;
            let reward = NewReward::new(
                AccountAddress::parse(account)?,
                quiz,
                TokenValue::parse(amount)?,
                grade,
            )?
            .with_context(course, lesson);
            let record = store.insert_reward(&reward)?;
            println!("{} {}", record.identity, record.status_line());
            Ok(())
        }
        Command::Retry { identity } => {
            let store = config.open_store()?;
            let record = store.retry(&RewardId::new(identity)?)?;
            tracing::warn!(
                identity = %record.identity,
                "reward reopened; the ledger was not checked for an earlier payment"
            );
            println!("{} {}", record.identity, record.status_line());
            Ok(())
        }
        Command::List { status } => {
            let store = config.open_store()?;
            for record in store.list(status)? {
                println!(
                    "{}\t{}\t{}\t{}\t{}%\t{}",
                    record.identity,
                    record.summary(),
                    record.recipient,
                    record.amount,
                    record.grade,
                    record.created_at,
                );
            }
            Ok(())
        }
        Command::Stats => {
            let store = config.open_store()?;
            println!("{}", serde_json::to_string_pretty(&store.stats()?)?);
            Ok(())
        }
    }
}

async fn run(config: PayoutConfig) -> anyhow::Result<()> {
    let settings = config.validate().context("invalid configuration")?;
    let store = Arc::new(config.open_store()?);
    let gateway = XrplClient::new(config.client_config());

    tracing::info!(
        account = %settings.account,
        issuer = %settings.issuer,
        token = %settings.currency,
        node = %config.node_url,
        batch_size = settings.batch_size,
        data_dir = %config.data_dir.display(),
        "starting payout processor"
    );

    let processor = PayoutProcessor::new(settings, store, gateway);
    let shutdown = ShutdownController::new();
    let handles = processor.start(&shutdown);

    shutdown.wait_for_signal().await?;
    for handle in handles {
        handle.await?;
    }
    tracing::info!(counters = ?processor.counters().snapshot(), "payout processor stopped");
    Ok(())
}
