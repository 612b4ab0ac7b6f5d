use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] quizpay_store::StoreError),

    #[error("storage backend error: {0}")]
    Lmdb(#[from] quizpay_store_lmdb::LmdbError),

    #[error("network error: {0}")]
    Network(#[from] quizpay_network::NetworkError),

    #[error("transaction error: {0}")]
    Transaction(#[from] quizpay_transactions::TransactionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
