//! WebSocket client for a ledger node.
//!
//! One [`XrplConnection`] carries many in-flight requests: each request gets
//! an id, a reader task routes every response frame to the waiting caller by
//! that id, and writes share the sink behind a mutex.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};

use quizpay_transactions::SignedTransaction;
use quizpay_types::AccountAddress;

use crate::gateway::{LedgerConnection, LedgerGateway, SubmitResult};
use crate::protocol::{self, ACCOUNT_INFO, LEDGER_CURRENT, SUBMIT};
use crate::NetworkError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Value>>>>;

/// Connection settings for [`XrplClient`].
#[derive(Clone, Debug)]
pub struct XrplClientConfig {
    pub url: String,
    pub max_connection_attempts: u32,
    pub connect_timeout: Duration,
    pub retry_delay: Duration,
    /// A request with no answer for this long marks the connection offline.
    pub offline_after: Duration,
}

impl Default for XrplClientConfig {
    fn default() -> Self {
        Self {
            url: "wss://xrplcluster.com".to_string(),
            max_connection_attempts: 4,
            connect_timeout: Duration::from_secs(4),
            retry_delay: Duration::from_millis(500),
            offline_after: Duration::from_secs(20),
        }
    }
}

/// Opens [`XrplConnection`]s to one node.
#[derive(Clone, Debug)]
pub struct XrplClient {
    config: XrplClientConfig,
}

impl XrplClient {
    pub fn new(config: XrplClientConfig) -> Self {
        Self { config }
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }
}

#[async_trait]
impl LedgerGateway for XrplClient {
    type Connection = XrplConnection;

    async fn connect(&self) -> Result<XrplConnection, NetworkError> {
        let url = &self.config.url;
        let attempts = self.config.max_connection_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match timeout(self.config.connect_timeout, connect_async(url.as_str())).await {
                Ok(Ok((ws, _response))) => {
                    info!(url = %url, attempt, "connected to ledger node");
                    return Ok(XrplConnection::start(ws, self.config.offline_after));
                }
                Ok(Err(e)) => last_error = e.to_string(),
                Err(_) => last_error = format!("timed out after {:?}", self.config.connect_timeout),
            }
            warn!(url = %url, attempt, error = %last_error, "ledger connection attempt failed");
            if attempt < attempts {
                tokio::time::sleep(self.config.retry_delay).await;
            }
        }

        Err(NetworkError::ConnectionFailed {
            url: url.clone(),
            attempts,
            reason: last_error,
        })
    }
}

/// A live, multiplexed connection to a ledger node.
pub struct XrplConnection {
    sink: Mutex<SplitSink<WsStream, Message>>,
    pending: PendingMap,
    next_id: AtomicU64,
    offline: AtomicBool,
    offline_after: Duration,
    reader: JoinHandle<()>,
}

impl XrplConnection {
    fn start(ws: WsStream, offline_after: Duration) -> Self {
        let (sink, stream) = ws.split();
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let reader = tokio::spawn(read_loop(stream, Arc::clone(&pending)));
        Self {
            sink: Mutex::new(sink),
            pending,
            next_id: AtomicU64::new(1),
            offline: AtomicBool::new(false),
            offline_after,
            reader,
        }
    }

    /// Whether a request has timed out on this connection.
    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::Acquire)
    }

    async fn request(&self, command: &str, params: Value) -> Result<Value, NetworkError> {
        if self.is_offline() {
            return Err(NetworkError::Offline {
                command: command.to_string(),
                after: self.offline_after,
            });
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        trace!(id, command, "ledger request");
        let frame = protocol::request(id, command, params);
        let sent = self.sink.lock().await.send(Message::Text(frame)).await;
        if let Err(e) = sent {
            self.pending.lock().await.remove(&id);
            return Err(NetworkError::Send(e.to_string()));
        }

        match timeout(self.offline_after, rx).await {
            Ok(Ok(frame)) => protocol::into_result(command, frame),
            Ok(Err(_)) => Err(NetworkError::Closed),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                self.offline.store(true, Ordering::Release);
                warn!(id, command, after = ?self.offline_after, "ledger node stopped answering");
                Err(NetworkError::Offline {
                    command: command.to_string(),
                    after: self.offline_after,
                })
            }
        }
    }
}

#[async_trait]
impl LedgerConnection for XrplConnection {
    async fn account_sequence(&self, account: &AccountAddress) -> Result<u32, NetworkError> {
        let params = json!({ "account": account.as_str(), "ledger_index": "current" });
        let result = self.request(ACCOUNT_INFO, params).await?;
        protocol::parse_account_sequence(&result)
    }

    async fn current_ledger_index(&self) -> Result<u32, NetworkError> {
        let result = self.request(LEDGER_CURRENT, json!({})).await?;
        protocol::parse_ledger_current(&result)
    }

    async fn submit(&self, tx: &SignedTransaction) -> Result<SubmitResult, NetworkError> {
        let result = self.request(SUBMIT, json!({ "tx_blob": tx.blob })).await?;
        protocol::parse_submit(&result, &tx.hash)
    }

    async fn close(&self) {
        if let Err(e) = self.sink.lock().await.close().await {
            debug!(error = %e, "ledger connection close");
        }
        self.reader.abort();
        self.pending.lock().await.clear();
    }
}

impl Drop for XrplConnection {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Route response frames to their waiting requests until the stream ends.
async fn read_loop(mut stream: SplitStream<WsStream>, pending: PendingMap) {
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let frame: Value = match serde_json::from_str(&text) {
                    Ok(frame) => frame,
                    Err(e) => {
                        debug!(error = %e, "ignoring non-JSON frame");
                        continue;
                    }
                };
                let Some(id) = protocol::response_id(&frame) else {
                    trace!("ignoring unsolicited frame");
                    continue;
                };
                match pending.lock().await.remove(&id) {
                    Some(tx) => {
                        let _ = tx.send(frame);
                    }
                    None => debug!(id, "response for unknown or expired request"),
                }
            }
            Ok(Message::Close(_)) => {
                debug!("ledger node closed the connection");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "ledger connection error");
                break;
            }
        }
    }
    // Dropping the senders fails every outstanding request with `Closed`.
    pending.lock().await.clear();
}
