//! Main distribution engine
//!
//! Orchestrates campaign accounting, holding tracking, and revenue
//! distribution over the wallet ledger. Every operation here is the core
//! behind one externally exposed endpoint; the web layer is a thin caller.
//!
//! Distribution is the critical path: all wallet credits, legacy audit
//! records, the distribution snapshot, and the processed flags of the
//! consumed revenue events are staged into one operation batch and
//! committed atomically by the ledger. A failure anywhere leaves no
//! partial payout behind.

use crate::{
    campaign::build_campaign,
    config::Config,
    gateway::PaymentGateway,
    holdings::record_purchase,
    types::*,
    Error, Result,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;
use wallet_ledger::{
    types::{
        Campaign, CampaignId, Distribution, InvestorShare, RevenueEvent, Transaction,
        TransactionKind, TxnKind, TxnStatus, UserId, WalletTransaction,
    },
    OperationBatch, WalletLedger,
};

/// Distribution engine
pub struct Engine {
    /// Wallet ledger
    ledger: WalletLedger,

    /// Injected settlement provider
    gateway: Arc<dyn PaymentGateway>,

    /// Configuration
    config: Config,
}

impl Engine {
    /// Create a new engine over a freshly opened ledger.
    ///
    /// The gateway client is constructed by the caller and injected here,
    /// once, at process start.
    pub async fn new(config: Config, gateway: Arc<dyn PaymentGateway>) -> Result<Self> {
        config.validate()?;

        let ledger_config = wallet_ledger::Config {
            data_dir: config.ledger_data_dir.clone(),
            ..Default::default()
        };
        let ledger = WalletLedger::open(ledger_config).await?;

        Ok(Self {
            ledger,
            gateway,
            config,
        })
    }

    /// Direct access to the underlying ledger
    pub fn ledger(&self) -> &WalletLedger {
        &self.ledger
    }

    // Campaign lifecycle

    /// Create a campaign in draft state
    pub async fn create_campaign(&self, spec: CampaignSpec) -> Result<Campaign> {
        let campaign = build_campaign(spec, self.config.fees.platform_fee_pct)?;

        let mut batch = OperationBatch::new();
        batch.put_campaign(campaign.clone());
        self.ledger.apply(batch).await?;

        tracing::info!(
            campaign_id = %campaign.id,
            total_partitions = campaign.total_partitions,
            "Campaign created"
        );

        Ok(campaign)
    }

    /// Open a draft campaign for purchases (artist only)
    pub async fn publish_campaign(
        &self,
        artist_id: UserId,
        campaign_id: CampaignId,
    ) -> Result<Campaign> {
        let mut campaign = self.ledger.campaign(campaign_id)?;
        if campaign.artist_id != artist_id {
            return Err(Error::Unauthorized(
                "Only the campaign artist can publish".to_string(),
            ));
        }
        campaign.publish()?;

        let mut batch = OperationBatch::new();
        batch.put_campaign(campaign.clone());
        self.ledger.apply(batch).await?;

        tracing::info!(campaign_id = %campaign_id, "Campaign published");

        Ok(campaign)
    }

    // Purchases

    /// Buy partitions directly (externally settled payment)
    pub async fn buy_partitions(
        &self,
        investor_id: UserId,
        campaign_id: CampaignId,
        partitions_count: u64,
    ) -> Result<PurchaseReceipt> {
        let mut campaign = self.ledger.campaign(campaign_id)?;

        if !campaign.is_open() {
            return Err(Error::Validation("Campaign is not live".to_string()));
        }
        if partitions_count < campaign.min_partitions_per_user {
            return Err(Error::Validation(format!(
                "Minimum {} partitions required",
                campaign.min_partitions_per_user
            )));
        }

        let amount_paid = Decimal::from(partitions_count) * campaign.partition_price;

        campaign.apply_purchase(amount_paid);
        let holding = record_purchase(
            self.ledger.holding(campaign_id, investor_id)?,
            &campaign,
            investor_id,
            partitions_count,
        );

        let txn = Transaction::completed(
            investor_id,
            TransactionKind::Purchase,
            amount_paid,
            format!("TXN-{}", Uuid::new_v4()),
            format!(
                "Purchase {} partitions of {}",
                partitions_count, campaign.title
            ),
        );
        let transaction_id = txn.id;
        let campaign_status = campaign.funding_status;

        let mut batch = OperationBatch::new();
        batch
            .put_campaign(campaign)
            .put_holding(holding)
            .put_transaction(txn);
        self.ledger.apply(batch).await?;

        tracing::info!(
            campaign_id = %campaign_id,
            investor_id = %investor_id,
            partitions = partitions_count,
            %amount_paid,
            "Partitions purchased"
        );

        Ok(PurchaseReceipt {
            transaction_id,
            partitions_bought: partitions_count,
            amount_paid,
            campaign_status,
        })
    }

    /// Invest from wallet balance; partitions are sized by the campaign's
    /// partition price
    pub async fn invest_from_wallet(
        &self,
        user_id: UserId,
        campaign_id: CampaignId,
        amount: Decimal,
    ) -> Result<InvestmentReceipt> {
        if amount <= Decimal::ZERO {
            return Err(Error::Validation("Invalid investment amount".to_string()));
        }

        let mut campaign = self.ledger.campaign(campaign_id)?;

        let partitions = (amount / campaign.partition_price)
            .trunc()
            .to_u64()
            .unwrap_or(0);
        if partitions == 0 {
            return Err(Error::Validation(format!(
                "Amount is below the partition price of {}",
                campaign.partition_price
            )));
        }

        campaign.apply_purchase(amount);
        let holding = record_purchase(
            self.ledger.holding(campaign_id, user_id)?,
            &campaign,
            user_id,
            partitions,
        );
        let holding_summary = HoldingSummary {
            campaign_id,
            partitions_owned: holding.partitions_owned,
            ownership_pct: holding.ownership_pct.round_dp(2),
        };

        // Debit first: an uncovered balance aborts the batch before any
        // campaign or holding state is written
        let mut batch = OperationBatch::new();
        batch
            .debit(
                user_id,
                amount,
                TxnKind::Investment,
                Some(campaign_id.to_string()),
                format!("Investment in {}", campaign.title),
            )
            .put_campaign(campaign)
            .put_holding(holding);
        let mut outcome = self.ledger.apply(batch).await?;
        let (wallet, transaction) = outcome.wallet_updates.remove(0);

        tracing::info!(
            campaign_id = %campaign_id,
            user_id = %user_id,
            %amount,
            partitions,
            "Wallet investment recorded"
        );

        Ok(InvestmentReceipt {
            wallet: wallet.into(),
            transaction,
            holding: holding_summary,
            partitions_bought: partitions,
        })
    }

    // Wallet operations

    /// Wallet snapshot, creating the wallet lazily if absent
    pub async fn wallet_balance(&self, user_id: UserId) -> Result<WalletSnapshot> {
        Ok(self.ledger.wallet(user_id).await?.into())
    }

    /// Deposit via the payment gateway.
    ///
    /// A pending transaction is recorded before the gateway call; it is
    /// settled (wallet credited, same entry completed) on confirmation or
    /// marked failed on decline. The gateway call happens outside the
    /// ledger commit.
    pub async fn deposit(&self, user_id: UserId, amount: Decimal) -> Result<WalletReceipt> {
        if amount < self.config.deposits.min_amount {
            return Err(Error::Validation(format!(
                "Minimum deposit amount is {}",
                self.config.deposits.min_amount
            )));
        }
        if amount > self.config.deposits.max_amount {
            return Err(Error::Validation(format!(
                "Maximum deposit amount is {}",
                self.config.deposits.max_amount
            )));
        }

        let pending = self
            .ledger
            .begin_pending(
                user_id,
                TxnKind::Deposit,
                amount,
                None,
                format!("Wallet deposit of {}", amount),
            )
            .await?;

        let reference = pending.id.to_string();
        match self
            .gateway
            .collect(user_id, amount, Default::default(), &reference)
            .await
        {
            Ok(receipt) => {
                tracing::info!(
                    user_id = %user_id,
                    %amount,
                    external_reference = %receipt.external_reference,
                    "Deposit confirmed by gateway"
                );
                let (wallet, transaction) =
                    self.ledger.settle_pending(user_id, pending.id).await?;
                Ok(WalletReceipt {
                    wallet: wallet.into(),
                    transaction,
                })
            }
            Err(err) => {
                self.ledger.fail_pending(user_id, pending.id).await?;
                Err(err)
            }
        }
    }

    /// Withdraw from wallet balance; fails with the current balance in the
    /// message when the amount is not covered
    pub async fn withdraw(&self, user_id: UserId, amount: Decimal) -> Result<WalletReceipt> {
        let (wallet, transaction) = self
            .ledger
            .debit(
                user_id,
                amount,
                TxnKind::Withdrawal,
                None,
                format!("Withdrawal of {}", amount),
            )
            .await?;

        tracing::info!(user_id = %user_id, %amount, "Withdrawal completed");

        Ok(WalletReceipt {
            wallet: wallet.into(),
            transaction,
        })
    }

    /// Wallet transaction history
    pub fn wallet_transactions(&self, user_id: UserId) -> Result<Vec<WalletTransaction>> {
        Ok(self.ledger.wallet_transactions(user_id)?)
    }

    // Revenue

    /// Record reported revenue for a campaign (artist only)
    pub async fn upload_revenue(
        &self,
        artist_id: UserId,
        campaign_id: CampaignId,
        amount: Decimal,
        source: &str,
    ) -> Result<Uuid> {
        let campaign = self.ledger.campaign(campaign_id)?;
        if campaign.artist_id != artist_id {
            return Err(Error::Unauthorized(
                "Only the campaign artist can upload revenue".to_string(),
            ));
        }
        if amount <= Decimal::ZERO {
            return Err(Error::Validation("Valid amount is required".to_string()));
        }

        let event = RevenueEvent::new(campaign_id, source, amount, campaign.currency);
        let event_id = event.id;

        let mut batch = OperationBatch::new();
        batch.put_revenue_event(event);
        self.ledger.apply(batch).await?;

        tracing::info!(
            campaign_id = %campaign_id,
            event_id = %event_id,
            %amount,
            source,
            "Revenue recorded"
        );

        Ok(event_id)
    }

    /// Distribute all unprocessed revenue for a campaign (artist only).
    ///
    /// Splits the accumulated revenue into platform fee, investor pool,
    /// and artist residual, then credits every wallet, snapshots the
    /// breakdown, and marks the consumed events processed in one atomic
    /// ledger batch.
    pub async fn distribute_revenue(
        &self,
        artist_id: UserId,
        campaign_id: CampaignId,
    ) -> Result<DistributionReport> {
        let campaign = self.ledger.campaign(campaign_id)?;
        if campaign.artist_id != artist_id {
            return Err(Error::Unauthorized(
                "Only the campaign artist can distribute revenue".to_string(),
            ));
        }

        let unprocessed = self.ledger.unprocessed_revenue(campaign_id)?;
        if unprocessed.is_empty() {
            return Err(Error::NothingToDistribute);
        }

        let holdings = self.ledger.holdings_for_campaign(campaign_id)?;
        if holdings.is_empty() {
            return Err(Error::NoInvestors);
        }

        let total_revenue: Decimal = unprocessed.iter().map(|e| e.amount).sum();
        let platform_fee = total_revenue * self.config.fees.platform_fee_pct;
        let investor_pool = total_revenue * campaign.revenue_share_pct / Decimal::ONE_HUNDRED;
        let artist_share = total_revenue - investor_pool - platform_fee;

        // Campaign creation already rejects share+fee > 100%; this guards
        // campaigns created under an older fee schedule
        if artist_share < Decimal::ZERO {
            return Err(Error::Validation(format!(
                "Revenue split exceeds total revenue by {}",
                -artist_share
            )));
        }

        tracing::info!(
            campaign_id = %campaign_id,
            %total_revenue,
            %platform_fee,
            %investor_pool,
            %artist_share,
            events = unprocessed.len(),
            investors = holdings.len(),
            "Starting revenue distribution"
        );

        // Per-investor shares use the campaign's FIXED partition count,
        // not the raised-amount denominator holdings display with
        let total_partitions = Decimal::from(campaign.total_partitions);
        let shares: Vec<InvestorShare> = holdings
            .iter()
            .map(|h| InvestorShare {
                investor_id: h.investor_id,
                partitions_owned: h.partitions_owned,
                amount: Decimal::from(h.partitions_owned) / total_partitions * investor_pool,
            })
            .collect();

        let distribution = Distribution {
            id: Uuid::now_v7(),
            campaign_id,
            revenue_event_ids: unprocessed.iter().map(|e| e.id).collect(),
            total_revenue,
            platform_fee,
            total_allocated_to_investors: investor_pool,
            artist_share,
            shares: shares.clone(),
            created_at: chrono::Utc::now(),
        };
        let distribution_id = distribution.id;

        let mut batch = OperationBatch::new();
        for share in &shares {
            if share.amount <= Decimal::ZERO {
                continue;
            }
            let reference = format!("DIST-{}-{}", distribution_id, share.investor_id);
            batch.credit(
                share.investor_id,
                share.amount,
                TxnKind::Payout,
                Some(reference.clone()),
                format!("Revenue share from {}", campaign.title),
            );
            // Legacy record for backward compatibility
            batch.put_transaction(Transaction::completed(
                share.investor_id,
                TransactionKind::RevenueDistribution,
                share.amount,
                reference,
                format!("Revenue share from {}", campaign.title),
            ));
        }

        if artist_share > Decimal::ZERO {
            let reference = format!("DIST-{}-ARTIST", distribution_id);
            batch.credit(
                campaign.artist_id,
                artist_share,
                TxnKind::Payout,
                Some(reference.clone()),
                format!("Artist share from {}", campaign.title),
            );
            batch.put_transaction(Transaction::completed(
                campaign.artist_id,
                TransactionKind::RevenueDistribution,
                artist_share,
                reference,
                format!("Artist share from {}", campaign.title),
            ));
        }

        batch.put_distribution(distribution);
        for event in &unprocessed {
            batch.mark_revenue_processed(campaign_id, event.id);
        }

        self.ledger.apply(batch).await?;

        tracing::info!(
            campaign_id = %campaign_id,
            distribution_id = %distribution_id,
            "Revenue distribution complete"
        );

        Ok(DistributionReport {
            distribution_id,
            total_revenue,
            platform_fee,
            platform_fee_pct: self.config.fees.platform_fee_pct * Decimal::ONE_HUNDRED,
            artist_share,
            investor_pool,
            investor_pool_pct: campaign.revenue_share_pct,
            breakdown: shares,
        })
    }

    // Reporting

    /// Campaign by ID
    pub fn campaign(&self, campaign_id: CampaignId) -> Result<Campaign> {
        Ok(self.ledger.campaign(campaign_id)?)
    }

    /// Public campaign statistics
    pub fn campaign_analytics(&self, campaign_id: CampaignId) -> Result<CampaignAnalytics> {
        let campaign = self.ledger.campaign(campaign_id)?;
        let holdings = self.ledger.holdings_for_campaign(campaign_id)?;

        let partitions_sold = holdings.iter().map(|h| h.partitions_owned).sum();
        let progress_pct = if campaign.target_amount > Decimal::ZERO {
            (campaign.amount_raised / campaign.target_amount * Decimal::ONE_HUNDRED).round_dp(2)
        } else {
            Decimal::ZERO
        };

        Ok(CampaignAnalytics {
            campaign_id,
            title: campaign.title,
            target_amount: campaign.target_amount,
            amount_raised: campaign.amount_raised,
            partitions_sold,
            total_partitions: campaign.total_partitions,
            investor_count: holdings.len(),
            progress_pct,
            funding_status: campaign.funding_status,
        })
    }

    /// Total revenue already distributed for a campaign (artist only)
    pub fn processed_revenue(
        &self,
        artist_id: UserId,
        campaign_id: CampaignId,
    ) -> Result<Decimal> {
        let campaign = self.ledger.campaign(campaign_id)?;
        if campaign.artist_id != artist_id {
            return Err(Error::Unauthorized(
                "Only the campaign artist can view revenue".to_string(),
            ));
        }
        Ok(self
            .ledger
            .revenue_events(campaign_id)?
            .iter()
            .filter(|e| e.processed)
            .map(|e| e.amount)
            .sum())
    }

    /// Holdings owned by an investor
    pub fn holdings_for(&self, investor_id: UserId) -> Result<Vec<HoldingSummary>> {
        Ok(self
            .ledger
            .holdings_for_investor(investor_id)?
            .into_iter()
            .map(|h| HoldingSummary {
                campaign_id: h.campaign_id,
                partitions_owned: h.partitions_owned,
                ownership_pct: h.ownership_pct.round_dp(2),
            })
            .collect())
    }

    /// Completed and pending payout totals from the legacy records
    pub fn investor_earnings(&self, investor_id: UserId) -> Result<EarningsSummary> {
        let mut actual = Decimal::ZERO;
        let mut pending = Decimal::ZERO;
        for txn in self.ledger.transactions(investor_id)? {
            if txn.kind != TransactionKind::RevenueDistribution {
                continue;
            }
            match txn.status {
                TxnStatus::Completed => actual += txn.amount,
                TxnStatus::Pending => pending += txn.amount,
                TxnStatus::Failed => {}
            }
        }
        Ok(EarningsSummary { actual, pending })
    }

    /// Shutdown engine
    pub async fn shutdown(self) -> Result<()> {
        tracing::info!("Shutting down distribution engine");
        self.ledger.shutdown().await?;
        Ok(())
    }
}
