//! Actor-based concurrency for the ledger
//!
//! This module implements the single-writer pattern using Tokio actors:
//! one logical writer task serializes every wallet and campaign mutation,
//! so a balance can never be read, raced, and written back stale. Batches
//! are materialized against current state inside the actor and committed
//! through a single RocksDB write.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │            Distribution engine / callers              │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ LedgerHandle (Clone)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              LedgerActor (Single Task)                │
//! │   materialize ops → stage into WriteBatch → commit    │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       ▼
//!              Storage (RocksDB, atomic write)
//! ```

use crate::ledger::{BatchOutcome, Operation, OperationBatch};
use crate::types::{TxnKind, UserId, Wallet, WalletTransaction};
use crate::{Error, Result, Storage};
use rocksdb::WriteBatch;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Message sent to the ledger actor
pub enum LedgerMessage {
    /// Get a wallet, creating it if absent
    GetOrCreateWallet {
        /// Wallet owner
        user_id: UserId,
        /// Reply channel
        response: oneshot::Sender<Result<Wallet>>,
    },

    /// Apply an operation batch atomically
    Apply {
        /// Batch to apply
        batch: OperationBatch,
        /// Reply channel
        response: oneshot::Sender<Result<BatchOutcome>>,
    },

    /// Record a pending transaction (balance untouched)
    BeginPending {
        /// Wallet owner
        user_id: UserId,
        /// Transaction kind
        kind: TxnKind,
        /// Amount awaiting confirmation
        amount: Decimal,
        /// Cross-entity reference
        reference: Option<String>,
        /// Human-readable description
        description: String,
        /// Reply channel
        response: oneshot::Sender<Result<WalletTransaction>>,
    },

    /// Settle a pending transaction: credit the wallet and complete the
    /// entry with final snapshots in one write
    SettlePending {
        /// Wallet owner
        user_id: UserId,
        /// Pending transaction ID
        txn_id: Uuid,
        /// Reply channel
        response: oneshot::Sender<Result<(Wallet, WalletTransaction)>>,
    },

    /// Mark a pending transaction failed
    FailPending {
        /// Wallet owner
        user_id: UserId,
        /// Pending transaction ID
        txn_id: Uuid,
        /// Reply channel
        response: oneshot::Sender<Result<WalletTransaction>>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that processes ledger messages
pub struct LedgerActor {
    /// Storage backend
    storage: Arc<Storage>,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<LedgerMessage>,
}

impl LedgerActor {
    /// Create new actor
    pub fn new(storage: Arc<Storage>, mailbox: mpsc::Receiver<LedgerMessage>) -> Self {
        Self { storage, mailbox }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                LedgerMessage::Shutdown => break,

                LedgerMessage::GetOrCreateWallet { user_id, response } => {
                    let _ = response.send(self.get_or_create_wallet(user_id));
                }

                LedgerMessage::Apply { batch, response } => {
                    let _ = response.send(self.apply_batch(batch));
                }

                LedgerMessage::BeginPending {
                    user_id,
                    kind,
                    amount,
                    reference,
                    description,
                    response,
                } => {
                    let _ = response.send(self.begin_pending(
                        user_id,
                        kind,
                        amount,
                        reference,
                        description,
                    ));
                }

                LedgerMessage::SettlePending {
                    user_id,
                    txn_id,
                    response,
                } => {
                    let _ = response.send(self.settle_pending(user_id, txn_id));
                }

                LedgerMessage::FailPending {
                    user_id,
                    txn_id,
                    response,
                } => {
                    let _ = response.send(self.fail_pending(user_id, txn_id));
                }
            }
        }
    }

    fn get_or_create_wallet(&self, user_id: UserId) -> Result<Wallet> {
        if let Some(wallet) = self.storage.get_wallet(user_id)? {
            return Ok(wallet);
        }

        let wallet = Wallet::new(user_id);
        self.storage.put_wallet(&wallet)?;
        tracing::debug!(user_id = %user_id, "Wallet created lazily");
        Ok(wallet)
    }

    /// Materialize the batch against current state and commit it in one
    /// RocksDB write. Any failed operation aborts with nothing written.
    fn apply_batch(&self, batch: OperationBatch) -> Result<BatchOutcome> {
        let mut write = WriteBatch::default();
        // Wallet states staged so far, so that a later operation on the
        // same wallet observes earlier ops in this batch
        let mut staged_wallets: HashMap<UserId, Wallet> = HashMap::new();
        // Revenue events claimed within this batch
        let mut claimed_events: HashSet<Uuid> = HashSet::new();
        let mut outcome = BatchOutcome::default();

        for op in batch.into_ops() {
            match op {
                Operation::Credit {
                    user_id,
                    amount,
                    kind,
                    reference,
                    description,
                } => {
                    if amount <= Decimal::ZERO {
                        return Err(Error::Validation("Amount must be positive".to_string()));
                    }
                    let mut wallet = self.staged_wallet(&staged_wallets, user_id)?;
                    let before = wallet.balance;
                    wallet.apply_credit(amount, kind);
                    let txn = WalletTransaction::completed(
                        user_id,
                        kind,
                        amount,
                        before,
                        wallet.balance,
                        description,
                        reference,
                    );
                    self.storage.stage_wallet(&mut write, &wallet)?;
                    self.storage.stage_wallet_txn(&mut write, &txn)?;
                    staged_wallets.insert(user_id, wallet.clone());
                    outcome.wallet_updates.push((wallet, txn));
                }

                Operation::Debit {
                    user_id,
                    amount,
                    kind,
                    reference,
                    description,
                } => {
                    if amount <= Decimal::ZERO {
                        return Err(Error::Validation("Amount must be positive".to_string()));
                    }
                    let mut wallet = self.staged_wallet(&staged_wallets, user_id)?;
                    let before = wallet.balance;
                    wallet.apply_debit(amount, kind)?;
                    let txn = WalletTransaction::completed(
                        user_id,
                        kind,
                        amount,
                        before,
                        wallet.balance,
                        description,
                        reference,
                    );
                    self.storage.stage_wallet(&mut write, &wallet)?;
                    self.storage.stage_wallet_txn(&mut write, &txn)?;
                    staged_wallets.insert(user_id, wallet.clone());
                    outcome.wallet_updates.push((wallet, txn));
                }

                Operation::PutCampaign(campaign) => {
                    self.storage.stage_campaign(&mut write, &campaign)?;
                }

                Operation::PutHolding(holding) => {
                    self.storage.stage_holding(&mut write, &holding)?;
                }

                Operation::PutRevenueEvent(event) => {
                    self.storage.stage_revenue_event(&mut write, &event)?;
                }

                Operation::MarkRevenueProcessed {
                    campaign_id,
                    event_id,
                } => {
                    if !claimed_events.insert(event_id) {
                        return Err(Error::Conflict(format!(
                            "revenue event {} claimed twice in one batch",
                            event_id
                        )));
                    }
                    let mut event = self.storage.get_revenue_event(campaign_id, event_id)?;
                    event.mark_processed()?;
                    self.storage.stage_revenue_event(&mut write, &event)?;
                }

                Operation::PutDistribution(distribution) => {
                    self.storage.stage_distribution(&mut write, &distribution)?;
                }

                Operation::PutTransaction(txn) => {
                    self.storage.stage_transaction(&mut write, &txn)?;
                }
            }
        }

        self.storage.commit(write)?;

        tracing::debug!(
            wallet_updates = outcome.wallet_updates.len(),
            "Batch committed"
        );

        Ok(outcome)
    }

    /// Current wallet state as seen by this batch: staged if an earlier
    /// operation touched it, stored otherwise, fresh if absent
    fn staged_wallet(
        &self,
        staged: &HashMap<UserId, Wallet>,
        user_id: UserId,
    ) -> Result<Wallet> {
        if let Some(wallet) = staged.get(&user_id) {
            return Ok(wallet.clone());
        }
        Ok(self
            .storage
            .get_wallet(user_id)?
            .unwrap_or_else(|| Wallet::new(user_id)))
    }

    fn begin_pending(
        &self,
        user_id: UserId,
        kind: TxnKind,
        amount: Decimal,
        reference: Option<String>,
        description: String,
    ) -> Result<WalletTransaction> {
        let wallet = self.get_or_create_wallet(user_id)?;
        let txn = WalletTransaction::pending(
            user_id,
            kind,
            amount,
            wallet.balance,
            description,
            reference,
        );
        self.storage.put_wallet_txn(&txn)?;

        tracing::debug!(user_id = %user_id, txn_id = %txn.id, "Pending transaction recorded");

        Ok(txn)
    }

    fn settle_pending(&self, user_id: UserId, txn_id: Uuid) -> Result<(Wallet, WalletTransaction)> {
        let mut txn = self.storage.get_wallet_txn(txn_id)?;
        if txn.user_id != user_id {
            return Err(Error::Validation(format!(
                "transaction {} does not belong to user {}",
                txn_id, user_id
            )));
        }

        let mut wallet = self.get_or_create_wallet(user_id)?;
        let before = wallet.balance;
        wallet.apply_credit(txn.amount, txn.kind);
        txn.complete(before, wallet.balance)?;

        let mut write = WriteBatch::default();
        self.storage.stage_wallet(&mut write, &wallet)?;
        self.storage.stage_wallet_txn(&mut write, &txn)?;
        self.storage.commit(write)?;

        tracing::debug!(user_id = %user_id, txn_id = %txn_id, "Pending transaction settled");

        Ok((wallet, txn))
    }

    fn fail_pending(&self, user_id: UserId, txn_id: Uuid) -> Result<WalletTransaction> {
        let mut txn = self.storage.get_wallet_txn(txn_id)?;
        if txn.user_id != user_id {
            return Err(Error::Validation(format!(
                "transaction {} does not belong to user {}",
                txn_id, user_id
            )));
        }
        txn.fail()?;
        self.storage.put_wallet_txn(&txn)?;

        tracing::debug!(user_id = %user_id, txn_id = %txn_id, "Pending transaction failed");

        Ok(txn)
    }
}

/// Handle for sending messages to the actor
#[derive(Clone)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerMessage>,
}

impl LedgerHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<LedgerMessage>) -> Self {
        Self { sender }
    }

    /// Get a wallet, creating it if absent
    pub async fn get_or_create_wallet(&self, user_id: UserId) -> Result<Wallet> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(LedgerMessage::GetOrCreateWallet {
                user_id,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Apply an operation batch atomically
    pub async fn apply(&self, batch: OperationBatch) -> Result<BatchOutcome> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(LedgerMessage::Apply {
                batch,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Record a pending transaction
    pub async fn begin_pending(
        &self,
        user_id: UserId,
        kind: TxnKind,
        amount: Decimal,
        reference: Option<String>,
        description: String,
    ) -> Result<WalletTransaction> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(LedgerMessage::BeginPending {
                user_id,
                kind,
                amount,
                reference,
                description,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Settle a pending transaction
    pub async fn settle_pending(
        &self,
        user_id: UserId,
        txn_id: Uuid,
    ) -> Result<(Wallet, WalletTransaction)> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(LedgerMessage::SettlePending {
                user_id,
                txn_id,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Mark a pending transaction failed
    pub async fn fail_pending(&self, user_id: UserId, txn_id: Uuid) -> Result<WalletTransaction> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(LedgerMessage::FailPending {
                user_id,
                txn_id,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(LedgerMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the ledger actor
pub fn spawn_ledger_actor(storage: Arc<Storage>) -> LedgerHandle {
    let (tx, rx) = mpsc::channel(1000); // Bounded channel for backpressure
    let actor = LedgerActor::new(storage, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    LedgerHandle::new(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;

    fn test_storage() -> (Arc<Storage>, tempfile::TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        (Arc::new(Storage::open(&config).unwrap()), temp_dir)
    }

    #[tokio::test]
    async fn test_actor_spawn_and_shutdown() {
        let (storage, _temp) = test_storage();
        let handle = spawn_ledger_actor(storage);
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_actor_serializes_concurrent_credits() {
        let (storage, _temp) = test_storage();
        let handle = spawn_ledger_actor(storage);
        let user = UserId::generate();

        // Fire 20 concurrent credits; the single writer must serialize
        // them so every snapshot pair chains exactly.
        let mut joins = Vec::new();
        for _ in 0..20 {
            let handle = handle.clone();
            joins.push(tokio::spawn(async move {
                let mut batch = OperationBatch::new();
                batch.credit(user, Decimal::from(10), TxnKind::Deposit, None, "deposit");
                handle.apply(batch).await
            }));
        }
        for join in joins {
            join.await.unwrap().unwrap();
        }

        let wallet = handle.get_or_create_wallet(user).await.unwrap();
        assert_eq!(wallet.balance, Decimal::from(200));
        assert_eq!(wallet.total_deposited, Decimal::from(200));

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_debits_never_overdraw() {
        let (storage, _temp) = test_storage();
        let handle = spawn_ledger_actor(storage);
        let user = UserId::generate();

        let mut batch = OperationBatch::new();
        batch.credit(user, Decimal::from(100), TxnKind::Deposit, None, "deposit");
        handle.apply(batch).await.unwrap();

        // 5 concurrent debits of 30 against a balance of 100: at most 3
        // can succeed, and the balance must never go negative.
        let mut joins = Vec::new();
        for _ in 0..5 {
            let handle = handle.clone();
            joins.push(tokio::spawn(async move {
                let mut batch = OperationBatch::new();
                batch.debit(user, Decimal::from(30), TxnKind::Withdrawal, None, "withdrawal");
                handle.apply(batch).await
            }));
        }

        let mut successes = 0;
        for join in joins {
            if join.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 3);

        let wallet = handle.get_or_create_wallet(user).await.unwrap();
        assert_eq!(wallet.balance, Decimal::from(10));
        assert!(wallet.balance >= Decimal::ZERO);

        handle.shutdown().await.unwrap();
    }
}
