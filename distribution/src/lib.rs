//! Fanledger Distribution Engine
//!
//! Campaign accounting, holding tracking, and pro-rata revenue
//! distribution over the wallet ledger.
//!
//! # Architecture
//!
//! A distribution run proceeds in four steps:
//!
//! 1. **Collection**: Gather unprocessed revenue events for the campaign
//! 2. **Split**: Compute platform fee, investor pool, and artist residual
//! 3. **Allocation**: Size each investor's share by partitions held
//! 4. **Commit**: Credit every wallet, snapshot the breakdown, and mark
//!    the events processed in one atomic ledger batch
//!
//! # Example
//!
//! ```no_run
//! use distribution::{Config, Engine, MockGateway};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> distribution::Result<()> {
//!     let config = Config::default();
//!     let gateway = Arc::new(MockGateway::new(
//!         config.gateway.latency_ms,
//!         config.gateway.success_rate,
//!     ));
//!     let engine = Engine::new(config, gateway).await?;
//!
//!     // let report = engine.distribute_revenue(artist_id, campaign_id).await?;
//!
//!     engine.shutdown().await
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod campaign;
pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod holdings;
pub mod types;

// Re-exports
pub use config::Config;
pub use engine::Engine;
pub use error::{Error, Result};
pub use gateway::{GatewayReceipt, MockGateway, PaymentGateway};
pub use types::*;
