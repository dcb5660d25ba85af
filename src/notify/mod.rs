pub mod console;
pub mod format;
pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;

/// Outbound channel for formatted alert and digest text.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
}
