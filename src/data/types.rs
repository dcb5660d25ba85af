use serde::{Deserialize, Serialize};

/// Normalized view of one market for a single scan cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Market slug, used as the baseline key.
    pub id: String,
    pub title: String,
    pub category: Option<String>,
    pub volume: f64,
    /// One-period fractional price change, roughly in [-1, 1].
    pub price_change_ratio: f64,
    /// Current traded price in [0, 1].
    pub probability: f64,
}

impl MarketSnapshot {
    /// One-period price change in percentage points.
    pub fn delta(&self) -> f64 {
        self.price_change_ratio * 100.0
    }
}
