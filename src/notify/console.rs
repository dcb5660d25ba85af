use anyhow::Result;
use async_trait::async_trait;
use crate::notify::Notifier;

/// Prints messages to stdout. Used when the messaging channel is disabled.
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        println!("🔔 (not pushed)\n{}\n", text);
        Ok(())
    }
}
