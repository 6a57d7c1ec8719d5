//! Core types for the wallet ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Memory safety (no unsafe code)
//! - Exact arithmetic (Decimal for money)

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// User identifier (investor or artist)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Create new user ID
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a fresh random user ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get underlying UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Raw bytes (storage key material)
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Campaign identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CampaignId(Uuid);

impl CampaignId {
    /// Create new campaign ID
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a fresh random campaign ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get underlying UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Raw bytes (storage key material)
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ISO 4217 currency code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Currency {
    /// Indian Rupee
    INR,
    /// US Dollar
    USD,
    /// Euro
    EUR,
    /// British Pound
    GBP,
}

impl Currency {
    /// ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::INR => "INR",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
        }
    }

    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INR" => Some(Currency::INR),
            "USD" => Some(Currency::USD),
            "EUR" => Some(Currency::EUR),
            "GBP" => Some(Currency::GBP),
            _ => None,
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::INR
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Per-user cash balance with lifetime totals
///
/// Invariant: `balance = total_deposited - total_withdrawn - total_invested
/// + total_earned`. Created lazily with zero balances on first financial
/// operation; one wallet per user (enforced by keying storage on `user_id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    /// Owning user
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

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Create an empty wallet
    pub fn new(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            balance: Decimal::ZERO,
            total_deposited: Decimal::ZERO,
            total_withdrawn: Decimal::ZERO,
            total_invested: Decimal::ZERO,
            total_earned: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a credit, bumping the lifetime total matching `kind`
    pub fn apply_credit(&mut self, amount: Decimal, kind: TxnKind) {
        self.balance += amount;
        match kind {
            TxnKind::Deposit => self.total_deposited += amount,
            TxnKind::Payout => self.total_earned += amount,
            // Withdrawal/investment reversals do not occur; a credit with
            // those kinds only restores balance.
            TxnKind::Withdrawal | TxnKind::Investment => {}
        }
        self.updated_at = Utc::now();
    }

    /// Apply a debit; fails without touching the wallet when the balance
    /// cannot cover `amount`
    pub fn apply_debit(&mut self, amount: Decimal, kind: TxnKind) -> crate::Result<()> {
        if amount > self.balance {
            return Err(crate::Error::InsufficientFunds {
                available: self.balance,
                requested: amount,
            });
        }
        self.balance -= amount;
        match kind {
            TxnKind::Withdrawal => self.total_withdrawn += amount,
            TxnKind::Investment => self.total_invested += amount,
            TxnKind::Deposit | TxnKind::Payout => {}
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Check the lifetime-totals invariant
    pub fn totals_consistent(&self) -> bool {
        self.balance
            == self.total_deposited - self.total_withdrawn - self.total_invested
                + self.total_earned
    }
}

/// Wallet transaction kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TxnKind {
    /// Money in from the payment gateway
    Deposit = 1,
    /// Money out to the user's bank
    Withdrawal = 2,
    /// Balance moved into a campaign
    Investment = 3,
    /// Revenue distribution payout
    Payout = 4,
}

impl TxnKind {
    /// Lowercase label used in references and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            TxnKind::Deposit => "deposit",
            TxnKind::Withdrawal => "withdrawal",
            TxnKind::Investment => "investment",
            TxnKind::Payout => "payout",
        }
    }
}

impl fmt::Display for TxnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Wallet transaction status
///
/// Only one-way transitions are allowed: Pending -> Completed and
/// Pending -> Failed. Completed and Failed are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TxnStatus {
    /// Recorded, awaiting gateway confirmation
    Pending = 1,
    /// Settled; balance snapshots are final
    Completed = 2,
    /// Gateway declined; balance untouched
    Failed = 3,
}

/// Append-only ledger entry capturing the balance around one mutation
///
/// This is the audit trail, not merely a log: `balance_before` and
/// `balance_after` are snapshotted at the moment the wallet mutates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletTransaction {
    /// Unique transaction ID (UUIDv7 for time-ordering)
    pub id: Uuid,

    /// Wallet owner
    pub user_id: UserId,

    /// Transaction kind
    pub kind: TxnKind,

    /// Amount moved
    pub amount: Decimal,

    /// Balance before the mutation
    pub balance_before: Decimal,

    /// Balance after the mutation
    pub balance_after: Decimal,

    /// Human-readable description
    pub description: String,

    /// External or cross-entity reference
    pub reference: Option<String>,

    /// Settlement status
    pub status: TxnStatus,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl WalletTransaction {
    /// Create a completed entry with final balance snapshots
    pub fn completed(
        user_id: UserId,
        kind: TxnKind,
        amount: Decimal,
        balance_before: Decimal,
        balance_after: Decimal,
        description: impl Into<String>,
        reference: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            kind,
            amount,
            balance_before,
            balance_after,
            description: description.into(),
            reference,
            status: TxnStatus::Completed,
            created_at: Utc::now(),
        }
    }

    /// Create a pending entry; balance snapshots are provisional until
    /// `complete` is called
    pub fn pending(
        user_id: UserId,
        kind: TxnKind,
        amount: Decimal,
        current_balance: Decimal,
        description: impl Into<String>,
        reference: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            kind,
            amount,
            balance_before: current_balance,
            balance_after: current_balance,
            description: description.into(),
            reference,
            status: TxnStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Settle a pending entry with final balance snapshots
    pub fn complete(&mut self, balance_before: Decimal, balance_after: Decimal) -> crate::Result<()> {
        if self.status != TxnStatus::Pending {
            return Err(crate::Error::Validation(format!(
                "transaction {} is not pending",
                self.id
            )));
        }
        self.balance_before = balance_before;
        self.balance_after = balance_after;
        self.status = TxnStatus::Completed;
        Ok(())
    }

    /// Mark a pending entry failed (balance untouched)
    pub fn fail(&mut self) -> crate::Result<()> {
        if self.status != TxnStatus::Pending {
            return Err(crate::Error::Validation(format!(
                "transaction {} is not pending",
                self.id
            )));
        }
        self.status = TxnStatus::Failed;
        Ok(())
    }

    /// Check if the entry has reached a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, TxnStatus::Completed | TxnStatus::Failed)
    }
}

/// Legacy transaction kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TransactionKind {
    /// Direct partition purchase
    Purchase = 1,
    /// Revenue distribution payout
    RevenueDistribution = 2,
}

impl TransactionKind {
    /// Lowercase label used in references and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Purchase => "purchase",
            TransactionKind::RevenueDistribution => "revenue_distribution",
        }
    }
}

/// Flat per-user audit record, kept for backward compatibility with
/// pre-wallet reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction ID
    pub id: Uuid,

    /// Acting user
    pub user_id: UserId,

    /// Transaction kind
    pub kind: TransactionKind,

    /// Amount moved
    pub amount: Decimal,

    /// Settlement status
    pub status: TxnStatus,

    /// Unique reference string
    pub reference: String,

    /// Human-readable description
    pub description: String,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a completed record
    pub fn completed(
        user_id: UserId,
        kind: TransactionKind,
        amount: Decimal,
        reference: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            kind,
            amount,
            status: TxnStatus::Completed,
            reference: reference.into(),
            description: description.into(),
            created_at: Utc::now(),
        }
    }
}

/// Campaign funding status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum FundingStatus {
    /// Created, not yet open for purchases
    Draft = 1,
    /// Open for purchases
    Live = 2,
    /// Target reached (terminal for fundraising; revenue phase begins)
    Funded = 3,
    /// Fundraising abandoned
    Failed = 4,
}

impl FundingStatus {
    /// Lowercase label for reports
    pub fn as_str(&self) -> &'static str {
        match self {
            FundingStatus::Draft => "draft",
            FundingStatus::Live => "live",
            FundingStatus::Funded => "funded",
            FundingStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for FundingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A fundraising campaign selling revenue partitions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    /// Unique campaign ID
    pub id: CampaignId,

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

    /// Canonical partition count, fixed at creation as
    /// target_amount / partition_price (truncated)
    pub total_partitions: u64,

    /// Minimum partitions per purchase
    pub min_partitions_per_user: u64,

    /// Total money raised so far (monotonic non-decreasing)
    pub amount_raised: Decimal,

    /// Funding lifecycle status
    pub funding_status: FundingStatus,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// Derive the canonical partition count from target and price.
    ///
    /// Purchases never grow this denominator; the raised-amount-derived
    /// ratio used for holding display percentages does.
    pub fn derive_total_partitions(target_amount: Decimal, partition_price: Decimal) -> Option<u64> {
        if partition_price <= Decimal::ZERO {
            return None;
        }
        (target_amount / partition_price).trunc().to_u64()
    }

    /// Open the campaign for purchases (Draft -> Live)
    pub fn publish(&mut self) -> crate::Result<()> {
        if self.funding_status != FundingStatus::Draft {
            return Err(crate::Error::Validation(format!(
                "campaign {} is {}, only draft campaigns can be published",
                self.id, self.funding_status
            )));
        }
        self.funding_status = FundingStatus::Live;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Account for a purchase: raise `amount_raised` and flip to Funded
    /// once the target is reached. The transition is one-way.
    pub fn apply_purchase(&mut self, amount_paid: Decimal) {
        self.amount_raised += amount_paid;
        if self.amount_raised >= self.target_amount
            && matches!(
                self.funding_status,
                FundingStatus::Draft | FundingStatus::Live
            )
        {
            self.funding_status = FundingStatus::Funded;
        }
        self.updated_at = Utc::now();
    }

    /// Partitions implied by money raised so far (display denominator)
    pub fn partitions_implied(&self) -> Decimal {
        if self.partition_price <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.amount_raised / self.partition_price
    }

    /// Check whether purchases are currently accepted
    pub fn is_open(&self) -> bool {
        self.funding_status == FundingStatus::Live
    }
}

/// Cumulative partition ownership of one investor in one campaign
///
/// Keyed by the (campaign, investor) pair; created on first purchase,
/// incremented on repeats, never deleted while the campaign is active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holding {
    /// Campaign
    pub campaign_id: CampaignId,

    /// Investor
    pub investor_id: UserId,

    /// Cumulative partitions owned (monotonic increase)
    pub partitions_owned: u64,

    /// Display ownership percentage, relative to partitions implied by
    /// money raised so far (not the fixed partition count)
    pub ownership_pct: Decimal,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

impl Holding {
    /// Create a holding for a first purchase
    pub fn new(campaign_id: CampaignId, investor_id: UserId, partitions: u64) -> Self {
        let now = Utc::now();
        Self {
            campaign_id,
            investor_id,
            partitions_owned: partitions,
            ownership_pct: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Reported income attributable to a campaign, pending distribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueEvent {
    /// Unique event ID
    pub id: Uuid,

    /// Campaign the income belongs to
    pub campaign_id: CampaignId,

    /// Income source (streaming platform, licensing, manual, ...)
    pub source: String,

    /// Reported amount
    pub amount: Decimal,

    /// Currency of the reported amount
    pub currency: Currency,

    /// Consumed by a distribution run; immutable once set
    pub processed: bool,

    /// When the event was consumed
    pub processed_at: Option<DateTime<Utc>>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl RevenueEvent {
    /// Record a new unprocessed event
    pub fn new(
        campaign_id: CampaignId,
        source: impl Into<String>,
        amount: Decimal,
        currency: Currency,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            campaign_id,
            source: source.into(),
            amount,
            currency,
            processed: false,
            processed_at: None,
            created_at: Utc::now(),
        }
    }

    /// Claim the event for a distribution run.
    ///
    /// Fails with a conflict when the event was already consumed, which is
    /// what stops two distribution runs from paying out the same revenue.
    pub fn mark_processed(&mut self) -> crate::Result<()> {
        if self.processed {
            return Err(crate::Error::Conflict(format!(
                "revenue event {} already processed",
                self.id
            )));
        }
        self.processed = true;
        self.processed_at = Some(Utc::now());
        Ok(())
    }
}

/// One investor's slice of a distribution run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestorShare {
    /// Investor receiving the payout
    pub investor_id: UserId,

    /// Partitions held at distribution time
    pub partitions_owned: u64,

    /// Amount credited
    pub amount: Decimal,
}

/// Immutable record of one settlement run
///
/// Links the full set of consumed revenue events and snapshots the
/// per-investor breakdown as computed at distribution time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Distribution {
    /// Unique distribution ID
    pub id: Uuid,

    /// Campaign distributed
    pub campaign_id: CampaignId,

    /// Revenue events consumed by this run
    pub revenue_event_ids: Vec<Uuid>,

    /// Sum of consumed event amounts
    pub total_revenue: Decimal,

    /// Platform fee withheld
    pub platform_fee: Decimal,

    /// Total allocated to the investor pool
    pub total_allocated_to_investors: Decimal,

    /// Residual credited to the artist
    pub artist_share: Decimal,

    /// Per-investor breakdown snapshot
    pub shares: Vec<InvestorShare>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}
