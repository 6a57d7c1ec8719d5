//! Error types for the distribution engine

use thiserror::Error;

/// Result type for distribution operations
pub type Result<T> = std::result::Result<T, Error>;

/// Distribution errors
#[derive(Error, Debug)]
pub enum Error {
    /// Ledger error
    #[error("Ledger error: {0}")]
    Ledger(#[from] wallet_ledger::Error),

    /// Invalid input or campaign state
    #[error("Validation error: {0}")]
    Validation(String),

    /// Caller is not allowed to act on the resource
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// No unprocessed revenue events for the campaign
    #[error("No unprocessed revenue to distribute")]
    NothingToDistribute,

    /// No holdings exist for the campaign
    #[error("No investors to distribute to")]
    NoInvestors,

    /// Payment gateway error
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
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
