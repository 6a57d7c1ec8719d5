//! Property-based tests for ledger invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Snapshot arithmetic: balance_after - balance_before == ±amount
//! - Lifetime totals: balance = deposited - withdrawn - invested + earned
//! - Insufficient funds: rejected debits leave the wallet untouched

use proptest::prelude::*;
use rust_decimal::Decimal;
use wallet_ledger::{
    types::{TxnKind, UserId},
    Config, Error, WalletLedger,
};

/// Strategy for generating valid amounts (positive decimals, two places)
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1u64..1_000_000_00u64).prop_map(|cents| Decimal::new(cents as i64, 2))
}

/// A random wallet operation
#[derive(Debug, Clone)]
enum WalletOp {
    Deposit(Decimal),
    Withdraw(Decimal),
    Invest(Decimal),
    Payout(Decimal),
}

fn op_strategy() -> impl Strategy<Value = WalletOp> {
    prop_oneof![
        amount_strategy().prop_map(WalletOp::Deposit),
        amount_strategy().prop_map(WalletOp::Withdraw),
        amount_strategy().prop_map(WalletOp::Invest),
        amount_strategy().prop_map(WalletOp::Payout),
    ]
}

/// Create test ledger with temp directory
async fn create_test_ledger() -> (WalletLedger, tempfile::TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.data_dir = temp_dir.path().to_path_buf();
    (WalletLedger::open(config).await.unwrap(), temp_dir)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: every accepted mutation snapshots the balance exactly
    #[test]
    fn prop_snapshots_chain_exactly(ops in prop::collection::vec(op_strategy(), 1..30)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let (ledger, _temp) = create_test_ledger().await;
            let user = UserId::generate();

            for op in &ops {
                let result = match op {
                    WalletOp::Deposit(amount) => {
                        ledger.credit(user, *amount, TxnKind::Deposit, None, "deposit").await
                    }
                    WalletOp::Payout(amount) => {
                        ledger.credit(user, *amount, TxnKind::Payout, None, "payout").await
                    }
                    WalletOp::Withdraw(amount) => {
                        ledger.debit(user, *amount, TxnKind::Withdrawal, None, "withdrawal").await
                    }
                    WalletOp::Invest(amount) => {
                        ledger.debit(user, *amount, TxnKind::Investment, None, "investment").await
                    }
                };

                if let Ok((wallet, txn)) = result {
                    let delta = txn.balance_after - txn.balance_before;
                    match op {
                        WalletOp::Deposit(amount) | WalletOp::Payout(amount) => {
                            prop_assert_eq!(delta, *amount);
                        }
                        WalletOp::Withdraw(amount) | WalletOp::Invest(amount) => {
                            prop_assert_eq!(delta, -*amount);
                        }
                    }
                    prop_assert_eq!(txn.balance_after, wallet.balance);
                }
            }

            ledger.shutdown().await.unwrap();
            Ok(())
        })?;
    }

    /// Property: lifetime totals stay consistent under arbitrary sequences
    #[test]
    fn prop_lifetime_totals_invariant(ops in prop::collection::vec(op_strategy(), 1..30)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let (ledger, _temp) = create_test_ledger().await;
            let user = UserId::generate();

            for op in &ops {
                // Rejected debits are allowed; they must simply change nothing
                let _ = match op {
                    WalletOp::Deposit(amount) => {
                        ledger.credit(user, *amount, TxnKind::Deposit, None, "deposit").await
                    }
                    WalletOp::Payout(amount) => {
                        ledger.credit(user, *amount, TxnKind::Payout, None, "payout").await
                    }
                    WalletOp::Withdraw(amount) => {
                        ledger.debit(user, *amount, TxnKind::Withdrawal, None, "withdrawal").await
                    }
                    WalletOp::Invest(amount) => {
                        ledger.debit(user, *amount, TxnKind::Investment, None, "investment").await
                    }
                };

                let wallet = ledger.wallet(user).await.unwrap();
                prop_assert!(wallet.totals_consistent());
                prop_assert!(wallet.balance >= Decimal::ZERO);
            }

            ledger.shutdown().await.unwrap();
            Ok(())
        })?;
    }

    /// Property: a rejected debit leaves the wallet and history untouched
    #[test]
    fn prop_rejected_debit_is_noop(
        deposit in amount_strategy(),
        extra in amount_strategy(),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let (ledger, _temp) = create_test_ledger().await;
            let user = UserId::generate();

            ledger
                .credit(user, deposit, TxnKind::Deposit, None, "deposit")
                .await
                .unwrap();
            let before = ledger.wallet(user).await.unwrap();

            let result = ledger
                .debit(user, deposit + extra, TxnKind::Withdrawal, None, "withdrawal")
                .await;
            prop_assert!(matches!(result, Err(Error::InsufficientFunds { .. })));

            let after = ledger.wallet(user).await.unwrap();
            prop_assert_eq!(after.balance, before.balance);
            prop_assert_eq!(after.total_withdrawn, before.total_withdrawn);
            prop_assert_eq!(ledger.wallet_transactions(user).unwrap().len(), 1);

            ledger.shutdown().await.unwrap();
            Ok(())
        })?;
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use wallet_ledger::OperationBatch;

    #[tokio::test]
    async fn test_multi_wallet_batch_is_all_or_nothing() {
        let (ledger, _temp) = create_test_ledger().await;
        let users: Vec<UserId> = (0..4).map(|_| UserId::generate()).collect();

        // Fund the first wallet only
        ledger
            .credit(users[0], Decimal::from(100), TxnKind::Deposit, None, "deposit")
            .await
            .unwrap();

        // Fan-out credits followed by an overdrawing debit
        let mut batch = OperationBatch::new();
        for user in &users[1..] {
            batch.credit(*user, Decimal::from(25), TxnKind::Payout, None, "payout");
        }
        batch.debit(
            users[0],
            Decimal::from(500),
            TxnKind::Investment,
            None,
            "investment",
        );

        assert!(ledger.apply(batch).await.is_err());

        for user in &users[1..] {
            let wallet = ledger.wallet(*user).await.unwrap();
            assert_eq!(wallet.balance, Decimal::ZERO);
            assert!(ledger.wallet_transactions(*user).unwrap().is_empty());
        }

        ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_fanout_batch_credits_every_wallet() {
        let (ledger, _temp) = create_test_ledger().await;
        let users: Vec<UserId> = (0..5).map(|_| UserId::generate()).collect();

        let mut batch = OperationBatch::new();
        for (i, user) in users.iter().enumerate() {
            batch.credit(
                *user,
                Decimal::from((i as u64 + 1) * 10),
                TxnKind::Payout,
                None,
                "payout",
            );
        }
        let outcome = ledger.apply(batch).await.unwrap();
        assert_eq!(outcome.wallet_updates.len(), 5);

        for (i, user) in users.iter().enumerate() {
            let wallet = ledger.wallet(*user).await.unwrap();
            assert_eq!(wallet.balance, Decimal::from((i as u64 + 1) * 10));
            assert_eq!(wallet.total_earned, wallet.balance);
        }

        ledger.shutdown().await.unwrap();
    }
}
