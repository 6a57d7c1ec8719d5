//! Holding tracker
//!
//! Ownership display percentages are expressed relative to the partitions
//! implied by money raised so far, NOT the campaign's fixed partition
//! count. A holder's percentage therefore shrinks as later investors buy
//! in, unless they buy more themselves. Distribution math uses the fixed
//! denominator instead; the two must never be unified.

use chrono::Utc;
use rust_decimal::Decimal;
use wallet_ledger::types::{Campaign, Holding, UserId};

/// Record a purchase against the investor's holding.
///
/// Increments the existing holding for the `(campaign, investor)` pair or
/// creates one on first purchase, then recomputes the display ownership
/// percentage. Call AFTER the campaign's `amount_raised` has been advanced
/// for this purchase.
pub fn record_purchase(
    existing: Option<Holding>,
    campaign: &Campaign,
    investor_id: UserId,
    partitions: u64,
) -> Holding {
    let mut holding = match existing {
        Some(mut holding) => {
            holding.partitions_owned += partitions;
            holding.updated_at = Utc::now();
            holding
        }
        None => Holding::new(campaign.id, investor_id, partitions),
    };

    let implied = campaign.partitions_implied();
    holding.ownership_pct = if implied > Decimal::ZERO {
        Decimal::from(holding.partitions_owned) / implied * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };

    holding
}
