//! Typed request and response structs for the platform operations
//!
//! Every operation the web layer exposes maps to one of these; payloads
//! are validated at the boundary before the core is reached, and nothing
//! internal (storage keys, error internals) leaks back out.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wallet_ledger::types::{
    CampaignId, Currency, FundingStatus, InvestorShare, UserId, Wallet, WalletTransaction,
};

/// Request to create a campaign
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignSpec {
    /// Owning artist
    pub artist_id: UserId,

    /// Display title
    pub title: String,

    /// Settlement currency
    pub currency: Currency,

    /// Fundraising target
    pub target_amount: Decimal,

    /// Price of one partition
    pub partition_price: Decimal,

    /// Percentage of revenue allocated to the investor pool (0-100)
    pub revenue_share_pct: Decimal,

    /// Minimum partitions per purchase
    pub min_partitions_per_user: u64,
}

/// Caller-facing wallet state, rounded to two decimal places
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletSnapshot {
    /// Wallet owner
    pub user_id: UserId,

    /// Spendable balance
    pub balance: Decimal,

    /// Lifetime deposits
    pub total_deposited: Decimal,

    /// Lifetime withdrawals
    pub total_withdrawn: Decimal,

    /// Lifetime amount moved into campaigns
    pub total_invested: Decimal,

    /// Lifetime revenue payouts received
    pub total_earned: Decimal,

    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

impl From<Wallet> for WalletSnapshot {
    fn from(wallet: Wallet) -> Self {
        Self {
            user_id: wallet.user_id,
            balance: wallet.balance.round_dp(2),
            total_deposited: wallet.total_deposited.round_dp(2),
            total_withdrawn: wallet.total_withdrawn.round_dp(2),
            total_invested: wallet.total_invested.round_dp(2),
            total_earned: wallet.total_earned.round_dp(2),
            updated_at: wallet.updated_at,
        }
    }
}

/// Result of a deposit or withdrawal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletReceipt {
    /// Post-operation wallet state
    pub wallet: WalletSnapshot,

    /// The transaction produced by the operation
    pub transaction: WalletTransaction,
}

/// Result of a direct partition purchase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    /// Legacy transaction recording the purchase
    pub transaction_id: Uuid,

    /// Partitions bought in this purchase
    pub partitions_bought: u64,

    /// Amount paid
    pub amount_paid: Decimal,

    /// Campaign funding status after the purchase
    pub campaign_status: FundingStatus,
}

/// Condensed holding state returned to investors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingSummary {
    /// Campaign
    pub campaign_id: CampaignId,

    /// Cumulative partitions owned
    pub partitions_owned: u64,

    /// Display ownership percentage, rounded to two places
    pub ownership_pct: Decimal,
}

/// Result of a wallet-funded investment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentReceipt {
    /// Post-operation wallet state
    pub wallet: WalletSnapshot,

    /// The investment debit transaction
    pub transaction: WalletTransaction,

    /// Updated holding
    pub holding: HoldingSummary,

    /// Partitions bought with the invested amount
    pub partitions_bought: u64,
}

/// Result of a distribution run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionReport {
    /// Distribution record ID
    pub distribution_id: Uuid,

    /// Sum of consumed revenue event amounts
    pub total_revenue: Decimal,

    /// Platform fee withheld
    pub platform_fee: Decimal,

    /// Platform fee as a percentage of revenue
    pub platform_fee_pct: Decimal,

    /// Residual credited to the artist
    pub artist_share: Decimal,

    /// Total allocated to the investor pool
    pub investor_pool: Decimal,

    /// Investor pool as a percentage of revenue
    pub investor_pool_pct: Decimal,

    /// Per-investor breakdown
    pub breakdown: Vec<InvestorShare>,
}

/// Public campaign statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignAnalytics {
    /// Campaign
    pub campaign_id: CampaignId,

    /// Display title
    pub title: String,

    /// Fundraising target
    pub target_amount: Decimal,

    /// Total money raised
    pub amount_raised: Decimal,

    /// Partitions sold across all holdings
    pub partitions_sold: u64,

    /// Canonical partition count
    pub total_partitions: u64,

    /// Number of distinct investors
    pub investor_count: usize,

    /// Funding progress percentage
    pub progress_pct: Decimal,

    /// Funding status
    pub funding_status: FundingStatus,
}

/// Payout earnings summary for an investor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarningsSummary {
    /// Completed payout total
    pub actual: Decimal,

    /// Pending payout total
    pub pending: Decimal,
}
