//! Fanledger Wallet Ledger
//!
//! Per-user wallet balances with an append-only transaction log and
//! atomic multi-entity commits for revenue distribution.
//!
//! # Architecture
//!
//! - **Single Writer**: One logical writer task eliminates race conditions
//! - **Balance Audit Trail**: Every mutation snapshots balance before/after
//! - **Atomic Batches**: Multi-wallet payouts commit all-or-nothing
//!
//! # Invariants
//!
//! - `balance = deposited - withdrawn - invested + earned` for every wallet
//! - `balance_after - balance_before == ±amount` for every transaction
//! - One wallet per user; one holding per (campaign, investor) pair
//! - Revenue events are consumed by at most one distribution run

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod actor;
pub mod config;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod storage;
pub mod types;

// Re-exports
pub use config::Config;
pub use error::{Error, Result};
pub use ledger::{BatchOutcome, Operation, OperationBatch, WalletLedger};
pub use storage::Storage;
pub use types::{
    Campaign, CampaignId, Currency, Distribution, FundingStatus, Holding, InvestorShare,
    RevenueEvent, Transaction, TransactionKind, TxnKind, TxnStatus, UserId, Wallet,
    WalletTransaction,
};
