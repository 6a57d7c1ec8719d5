//! Main ledger orchestration layer
//!
//! This module ties together storage, the single-writer actor, and metrics
//! into a high-level API for wallet mutation and campaign bookkeeping.
//!
//! Every mutation goes through the actor, so two racing calls can never
//! interleave between reading a balance and writing it back. Multi-entity
//! mutations are expressed as an [`OperationBatch`] and committed in one
//! RocksDB write: either every staged operation lands or none do.
//!
//! # Example
//!
//! ```no_run
//! use wallet_ledger::{Config, WalletLedger};
//! use wallet_ledger::types::{TxnKind, UserId};
//! use rust_decimal::Decimal;
//!
//! #[tokio::main]
//! async fn main() -> wallet_ledger::Result<()> {
//!     let ledger = WalletLedger::open(Config::default()).await?;
//!
//!     let user = UserId::generate();
//!     let (wallet, txn) = ledger
//!         .credit(user, Decimal::from(1000), TxnKind::Deposit, None, "deposit")
//!         .await?;
//!     assert_eq!(txn.balance_after, wallet.balance);
//!
//!     Ok(())
//! }
//! ```

use crate::{
    actor::{spawn_ledger_actor, LedgerHandle},
    metrics::Metrics,
    types::{
        Campaign, CampaignId, Distribution, Holding, RevenueEvent, Transaction, TxnKind, UserId,
        Wallet, WalletTransaction,
    },
    Config, Error, Result, Storage,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// A single staged mutation inside an [`OperationBatch`]
#[derive(Debug, Clone)]
pub enum Operation {
    /// Credit a wallet, producing one completed wallet transaction
    Credit {
        /// Wallet owner
        user_id: UserId,
        /// Amount to credit (must be positive)
        amount: Decimal,
        /// Transaction kind (selects the lifetime total to bump)
        kind: TxnKind,
        /// Cross-entity reference
        reference: Option<String>,
        /// Human-readable description
        description: String,
    },

    /// Debit a wallet, producing one completed wallet transaction.
    /// Fails the whole batch when the balance cannot cover the amount.
    Debit {
        /// Wallet owner
        user_id: UserId,
        /// Amount to debit (must be positive)
        amount: Decimal,
        /// Transaction kind (selects the lifetime total to bump)
        kind: TxnKind,
        /// Cross-entity reference
        reference: Option<String>,
        /// Human-readable description
        description: String,
    },

    /// Write a campaign state
    PutCampaign(Campaign),

    /// Write a holding
    PutHolding(Holding),

    /// Write a revenue event
    PutRevenueEvent(RevenueEvent),

    /// Claim a revenue event for a distribution run. Re-checks the
    /// processed flag at apply time; a claim on an already-consumed event
    /// fails the whole batch.
    MarkRevenueProcessed {
        /// Campaign the event belongs to
        campaign_id: CampaignId,
        /// Event to claim
        event_id: Uuid,
    },

    /// Write a distribution record
    PutDistribution(Distribution),

    /// Write a legacy transaction record
    PutTransaction(Transaction),
}

/// An ordered set of operations committed atomically
#[derive(Debug, Clone, Default)]
pub struct OperationBatch {
    ops: Vec<Operation>,
}

impl OperationBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a wallet credit
    pub fn credit(
        &mut self,
        user_id: UserId,
        amount: Decimal,
        kind: TxnKind,
        reference: Option<String>,
        description: impl Into<String>,
    ) -> &mut Self {
        self.ops.push(Operation::Credit {
            user_id,
            amount,
            kind,
            reference,
            description: description.into(),
        });
        self
    }

    /// Stage a wallet debit
    pub fn debit(
        &mut self,
        user_id: UserId,
        amount: Decimal,
        kind: TxnKind,
        reference: Option<String>,
        description: impl Into<String>,
    ) -> &mut Self {
        self.ops.push(Operation::Debit {
            user_id,
            amount,
            kind,
            reference,
            description: description.into(),
        });
        self
    }

    /// Stage a campaign write
    pub fn put_campaign(&mut self, campaign: Campaign) -> &mut Self {
        self.ops.push(Operation::PutCampaign(campaign));
        self
    }

    /// Stage a holding write
    pub fn put_holding(&mut self, holding: Holding) -> &mut Self {
        self.ops.push(Operation::PutHolding(holding));
        self
    }

    /// Stage a revenue event write
    pub fn put_revenue_event(&mut self, event: RevenueEvent) -> &mut Self {
        self.ops.push(Operation::PutRevenueEvent(event));
        self
    }

    /// Stage a processed-flag claim on a revenue event
    pub fn mark_revenue_processed(&mut self, campaign_id: CampaignId, event_id: Uuid) -> &mut Self {
        self.ops.push(Operation::MarkRevenueProcessed {
            campaign_id,
            event_id,
        });
        self
    }

    /// Stage a distribution record write
    pub fn put_distribution(&mut self, distribution: Distribution) -> &mut Self {
        self.ops.push(Operation::PutDistribution(distribution));
        self
    }

    /// Stage a legacy transaction write
    pub fn put_transaction(&mut self, txn: Transaction) -> &mut Self {
        self.ops.push(Operation::PutTransaction(txn));
        self
    }

    /// Number of staged operations
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// True when nothing is staged
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Consume the batch into its operations
    pub fn into_ops(self) -> Vec<Operation> {
        self.ops
    }
}

/// Result of an applied batch: post-state wallet and transaction for each
/// Credit/Debit operation, in operation order
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// (wallet after mutation, transaction produced) per wallet operation
    pub wallet_updates: Vec<(Wallet, WalletTransaction)>,
}

/// Main ledger interface
pub struct WalletLedger {
    /// Actor handle for mutations
    handle: LedgerHandle,

    /// Direct storage access (for reads)
    storage: Arc<Storage>,

    /// Metrics collector
    metrics: Metrics,
}

impl WalletLedger {
    /// Open ledger with configuration
    pub async fn open(config: Config) -> Result<Self> {
        let storage = Arc::new(Storage::open(&config)?);
        let handle = spawn_ledger_actor(storage.clone());
        let metrics = Metrics::new()
            .map_err(|e| Error::Config(format!("Failed to create metrics: {}", e)))?;

        Ok(Self {
            handle,
            storage,
            metrics,
        })
    }

    /// Get the user's wallet, creating it with zero balances if absent.
    ///
    /// Idempotent: creation goes through the actor, so two racing first
    /// accesses cannot produce two wallets.
    pub async fn wallet(&self, user_id: UserId) -> Result<Wallet> {
        self.handle.get_or_create_wallet(user_id).await
    }

    /// Credit a wallet, producing exactly one completed transaction
    pub async fn credit(
        &self,
        user_id: UserId,
        amount: Decimal,
        kind: TxnKind,
        reference: Option<String>,
        description: impl Into<String>,
    ) -> Result<(Wallet, WalletTransaction)> {
        validate_amount(amount)?;
        let mut batch = OperationBatch::new();
        batch.credit(user_id, amount, kind, reference, description);
        let mut outcome = self.apply(batch).await?;
        Ok(outcome.wallet_updates.remove(0))
    }

    /// Debit a wallet, producing exactly one completed transaction.
    /// Fails with `InsufficientFunds` (wallet untouched) when the balance
    /// cannot cover the amount.
    pub async fn debit(
        &self,
        user_id: UserId,
        amount: Decimal,
        kind: TxnKind,
        reference: Option<String>,
        description: impl Into<String>,
    ) -> Result<(Wallet, WalletTransaction)> {
        validate_amount(amount)?;
        let mut batch = OperationBatch::new();
        batch.debit(user_id, amount, kind, reference, description);
        let mut outcome = self.apply(batch).await?;
        Ok(outcome.wallet_updates.remove(0))
    }

    /// Record a pending transaction ahead of a gateway call.
    ///
    /// The wallet is created if absent but its balance is untouched; the
    /// entry must later be settled with [`settle_pending`](Self::settle_pending)
    /// or marked failed with [`fail_pending`](Self::fail_pending).
    pub async fn begin_pending(
        &self,
        user_id: UserId,
        kind: TxnKind,
        amount: Decimal,
        reference: Option<String>,
        description: impl Into<String>,
    ) -> Result<WalletTransaction> {
        validate_amount(amount)?;
        self.handle
            .begin_pending(user_id, kind, amount, reference, description.into())
            .await
    }

    /// Settle a pending transaction: credit the wallet and complete the
    /// SAME entry with final balance snapshots, atomically
    pub async fn settle_pending(
        &self,
        user_id: UserId,
        txn_id: Uuid,
    ) -> Result<(Wallet, WalletTransaction)> {
        let result = self.handle.settle_pending(user_id, txn_id).await;
        if result.is_ok() {
            self.metrics.record_transaction();
        }
        result
    }

    /// Mark a pending transaction failed; the balance is untouched
    pub async fn fail_pending(&self, user_id: UserId, txn_id: Uuid) -> Result<WalletTransaction> {
        self.handle.fail_pending(user_id, txn_id).await
    }

    /// Apply an operation batch atomically
    pub async fn apply(&self, batch: OperationBatch) -> Result<BatchOutcome> {
        if batch.is_empty() {
            return Err(Error::Validation("empty operation batch".to_string()));
        }

        let batch_size = batch.len();
        let start = Instant::now();
        let result = self.handle.apply(batch).await;

        match &result {
            Ok(outcome) => {
                self.metrics.record_batch(batch_size);
                self.metrics
                    .record_apply_duration(start.elapsed().as_secs_f64());
                for _ in &outcome.wallet_updates {
                    self.metrics.record_transaction();
                }
            }
            Err(Error::InsufficientFunds { .. }) => {
                self.metrics.record_rejected_debit();
            }
            Err(_) => {}
        }

        result
    }

    // Read paths (straight to storage; the actor serializes writers only)

    /// Wallet transaction history for a user
    pub fn wallet_transactions(&self, user_id: UserId) -> Result<Vec<WalletTransaction>> {
        self.storage.wallet_txns_for(user_id)
    }

    /// Legacy transaction history for a user
    pub fn transactions(&self, user_id: UserId) -> Result<Vec<Transaction>> {
        self.storage.transactions_for(user_id)
    }

    /// Get campaign by ID
    pub fn campaign(&self, campaign_id: CampaignId) -> Result<Campaign> {
        self.storage.get_campaign(campaign_id)
    }

    /// Get a holding for the (campaign, investor) pair
    pub fn holding(&self, campaign_id: CampaignId, investor_id: UserId) -> Result<Option<Holding>> {
        self.storage.get_holding(campaign_id, investor_id)
    }

    /// All holdings for a campaign
    pub fn holdings_for_campaign(&self, campaign_id: CampaignId) -> Result<Vec<Holding>> {
        self.storage.holdings_for_campaign(campaign_id)
    }

    /// All holdings owned by an investor
    pub fn holdings_for_investor(&self, investor_id: UserId) -> Result<Vec<Holding>> {
        self.storage.holdings_for_investor(investor_id)
    }

    /// All revenue events for a campaign
    pub fn revenue_events(&self, campaign_id: CampaignId) -> Result<Vec<RevenueEvent>> {
        self.storage.revenue_events_for(campaign_id)
    }

    /// Revenue events not yet consumed by a distribution run
    pub fn unprocessed_revenue(&self, campaign_id: CampaignId) -> Result<Vec<RevenueEvent>> {
        Ok(self
            .storage
            .revenue_events_for(campaign_id)?
            .into_iter()
            .filter(|e| !e.processed)
            .collect())
    }

    /// Get distribution by ID
    pub fn distribution(&self, distribution_id: Uuid) -> Result<Distribution> {
        self.storage.get_distribution(distribution_id)
    }

    /// All distribution runs for a campaign
    pub fn distributions(&self, campaign_id: CampaignId) -> Result<Vec<Distribution>> {
        self.storage.distributions_for(campaign_id)
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Shutdown ledger
    pub async fn shutdown(self) -> Result<()> {
        self.handle.shutdown().await
    }
}

/// Validate a monetary amount
fn validate_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::Validation("Amount must be positive".to_string()));
    }
    Ok(())
}
