//! Error types for the wallet ledger

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Invalid input (non-positive amount, bad state transition, etc.)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Debit exceeds current balance; no partial debit is performed
    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        /// Balance at the time of the rejected debit
        available: Decimal,
        /// Amount that was requested
        requested: Decimal,
    },

    /// Campaign not found
    #[error("Campaign not found: {0}")]
    CampaignNotFound(String),

    /// Revenue event not found
    #[error("Revenue event not found: {0}")]
    EventNotFound(String),

    /// Wallet transaction not found
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    /// Distribution not found
    #[error("Distribution not found: {0}")]
    DistributionNotFound(String),

    /// Write conflict (e.g. a revenue event claimed twice)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}
