//! Payment gateway boundary
//!
//! The engine only ever consumes a confirmed-amount signal from the
//! gateway; signature verification and provider-specific settlement are
//! external concerns. The client is constructed once and injected at
//! engine start, never lazily initialized behind the scenes.

use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::time::Duration;
use uuid::Uuid;
use wallet_ledger::types::{Currency, UserId};

/// Confirmation returned by a gateway for a collected payment
#[derive(Debug, Clone)]
pub struct GatewayReceipt {
    /// Provider-side reference
    pub external_reference: String,

    /// Amount the provider confirmed
    pub confirmed_amount: Decimal,

    /// Completion timestamp
    pub completed_at: DateTime<Utc>,
}

/// External settlement provider used to collect money into wallets
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Collect `amount` from the user's external payment method.
    ///
    /// Returns a confirmation or a [`Error::Gateway`] decline; the caller
    /// decides what happens to the pending ledger entry either way.
    async fn collect(
        &self,
        user_id: UserId,
        amount: Decimal,
        currency: Currency,
        reference: &str,
    ) -> Result<GatewayReceipt>;
}

/// Mock settlement provider with configurable latency and failure rate
pub struct MockGateway {
    latency_ms: u64,
    success_rate: f64,
}

impl MockGateway {
    /// Create a mock gateway
    pub fn new(latency_ms: u64, success_rate: f64) -> Self {
        Self {
            latency_ms,
            success_rate,
        }
    }

    /// A gateway that always succeeds instantly (for tests)
    pub fn reliable() -> Self {
        Self::new(0, 1.0)
    }

    /// A gateway that always declines instantly (for tests)
    pub fn declining() -> Self {
        Self::new(0, 0.0)
    }

    fn should_succeed(&self) -> bool {
        use rand::Rng;
        rand::thread_rng().gen::<f64>() < self.success_rate
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn collect(
        &self,
        user_id: UserId,
        amount: Decimal,
        currency: Currency,
        reference: &str,
    ) -> Result<GatewayReceipt> {
        tracing::info!(
            user_id = %user_id,
            %amount,
            %currency,
            reference,
            "Mock gateway: collecting payment"
        );

        if self.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.latency_ms)).await;
        }

        if !self.should_succeed() {
            tracing::warn!(reference, "Mock gateway: payment declined");
            return Err(Error::Gateway("Payment declined by provider".to_string()));
        }

        Ok(GatewayReceipt {
            external_reference: format!("PAY-{}", Uuid::new_v4()),
            confirmed_amount: amount,
            completed_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_collect_success() {
        let gateway = MockGateway::reliable();
        let receipt = gateway
            .collect(
                UserId::generate(),
                Decimal::from(1000),
                Currency::INR,
                "TEST-REF",
            )
            .await
            .unwrap();

        assert_eq!(receipt.confirmed_amount, Decimal::from(1000));
        assert!(receipt.external_reference.starts_with("PAY-"));
    }

    #[tokio::test]
    async fn test_mock_collect_decline() {
        let gateway = MockGateway::declining();
        let result = gateway
            .collect(
                UserId::generate(),
                Decimal::from(1000),
                Currency::INR,
                "TEST-REF",
            )
            .await;

        assert!(matches!(result, Err(Error::Gateway(_))));
    }
}
