pub mod gamma_api;
pub mod types;

use anyhow::Result;
use async_trait::async_trait;
use types::MarketSnapshot;

/// Upstream market feed polled once per scan.
#[async_trait]
pub trait MarketSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<MarketSnapshot>>;
}
