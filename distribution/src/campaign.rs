//! Campaign creation and partition accounting
//!
//! `total_partitions` is fixed here, at creation time, as
//! `target_amount / partition_price` truncated to an integer. Purchases
//! raise `amount_raised` but never grow that denominator; the
//! raised-amount-derived ratio used for holding display percentages does
//! grow. Both behaviors are deliberate (see holdings module).

use crate::{types::CampaignSpec, Error, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use wallet_ledger::types::{Campaign, CampaignId, FundingStatus};

/// Build a campaign from a validated spec.
///
/// Rejects configurations where `revenue_share_pct` plus the platform fee
/// exceeds 100%: those would drive the artist's residual share negative at
/// distribution time.
pub fn build_campaign(spec: CampaignSpec, platform_fee_pct: Decimal) -> Result<Campaign> {
    if spec.title.trim().is_empty() {
        return Err(Error::Validation("Campaign title is required".to_string()));
    }
    if spec.target_amount <= Decimal::ZERO {
        return Err(Error::Validation(
            "Target amount must be positive".to_string(),
        ));
    }
    if spec.partition_price <= Decimal::ZERO {
        return Err(Error::Validation(
            "Partition price must be positive".to_string(),
        ));
    }
    if spec.partition_price > spec.target_amount {
        return Err(Error::Validation(
            "Partition price cannot exceed the target amount".to_string(),
        ));
    }
    if spec.revenue_share_pct < Decimal::ZERO {
        return Err(Error::Validation(
            "Revenue share percentage cannot be negative".to_string(),
        ));
    }

    let fee_pct = platform_fee_pct * Decimal::ONE_HUNDRED;
    if spec.revenue_share_pct + fee_pct > Decimal::ONE_HUNDRED {
        return Err(Error::Validation(format!(
            "Revenue share {}% plus platform fee {}% exceeds 100%",
            spec.revenue_share_pct, fee_pct
        )));
    }

    if spec.min_partitions_per_user == 0 {
        return Err(Error::Validation(
            "Minimum partitions per user must be at least 1".to_string(),
        ));
    }

    let total_partitions =
        Campaign::derive_total_partitions(spec.target_amount, spec.partition_price)
            .filter(|&n| n > 0)
            .ok_or_else(|| {
                Error::Validation("Target amount must cover at least one partition".to_string())
            })?;

    let now = Utc::now();
    Ok(Campaign {
        id: CampaignId::generate(),
        artist_id: spec.artist_id,
        title: spec.title,
        currency: spec.currency,
        target_amount: spec.target_amount,
        partition_price: spec.partition_price,
        revenue_share_pct: spec.revenue_share_pct,
        total_partitions,
        min_partitions_per_user: spec.min_partitions_per_user,
        amount_raised: Decimal::ZERO,
        funding_status: FundingStatus::Draft,
        created_at: now,
        updated_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wallet_ledger::types::{Currency, UserId};

    fn test_spec() -> CampaignSpec {
        CampaignSpec {
            artist_id: UserId::generate(),
            title: "Debut Album".to_string(),
            currency: Currency::INR,
            target_amount: Decimal::from(10000),
            partition_price: Decimal::from(100),
            revenue_share_pct: Decimal::from(40),
            min_partitions_per_user: 1,
        }
    }

    fn fee() -> Decimal {
        Decimal::new(5, 2) // 5%
    }

    #[test]
    fn test_build_campaign_derives_partitions() {
        let campaign = build_campaign(test_spec(), fee()).unwrap();
        assert_eq!(campaign.total_partitions, 100);
        assert_eq!(campaign.funding_status, FundingStatus::Draft);
        assert_eq!(campaign.amount_raised, Decimal::ZERO);
    }

    #[test]
    fn test_purchases_never_grow_total_partitions() {
        let mut campaign = build_campaign(test_spec(), fee()).unwrap();
        campaign.funding_status = FundingStatus::Live;

        campaign.apply_purchase(Decimal::from(5000));
        assert_eq!(campaign.total_partitions, 100);
        // But the raised-amount-derived denominator does grow
        assert_eq!(campaign.partitions_implied(), Decimal::from(50));
    }

    #[test]
    fn test_share_plus_fee_over_100_rejected() {
        let mut spec = test_spec();
        spec.revenue_share_pct = Decimal::from(96);
        let result = build_campaign(spec, fee());
        assert!(matches!(result, Err(Error::Validation(_))));

        // Exactly 100 is allowed: artist share goes to zero, not negative
        let mut spec = test_spec();
        spec.revenue_share_pct = Decimal::from(95);
        assert!(build_campaign(spec, fee()).is_ok());
    }

    #[test]
    fn test_invalid_amounts_rejected() {
        let mut spec = test_spec();
        spec.target_amount = Decimal::ZERO;
        assert!(build_campaign(spec, fee()).is_err());

        let mut spec = test_spec();
        spec.partition_price = Decimal::ZERO;
        assert!(build_campaign(spec, fee()).is_err());

        let mut spec = test_spec();
        spec.partition_price = Decimal::from(20000);
        assert!(build_campaign(spec, fee()).is_err());

        let mut spec = test_spec();
        spec.title = "  ".to_string();
        assert!(build_campaign(spec, fee()).is_err());
    }
}
