use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use tracing::{debug, warn};
use crate::data::types::MarketSnapshot;
use crate::data::MarketSource;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub struct GammaApiClient {
    client: Client,
    base_url: String,
}

/// Raw market record as served by the Gamma `/markets` endpoint.
///
/// Field names and numeric encodings drift between API versions, so every
/// numeric field is read leniently and every alternative name gets its own slot.
#[derive(Debug, Default, Deserialize)]
pub struct GammaMarket {
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default, deserialize_with = "de_lenient_f64")]
    volume: Option<f64>,
    #[serde(default, rename = "volumeNum", deserialize_with = "de_lenient_f64")]
    volume_num: Option<f64>,
    #[serde(default, rename = "oneDayPriceChange", deserialize_with = "de_lenient_f64")]
    one_day_price_change: Option<f64>,
    #[serde(default, rename = "one_day_price_change", deserialize_with = "de_lenient_f64")]
    one_day_price_change_snake: Option<f64>,
    #[serde(default, deserialize_with = "de_lenient_f64")]
    current_price: Option<f64>,
    #[serde(default, rename = "lastTradePrice", deserialize_with = "de_lenient_f64")]
    last_trade_price: Option<f64>,
}

impl GammaApiClient {
    pub fn new(base_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch all open markets from the Gamma API and normalize them.
    pub async fn fetch_markets(&self) -> Result<Vec<MarketSnapshot>> {
        let url = format!("{}/markets?closed=false&limit=500&active=true", self.base_url);

        let items: Vec<serde_json::Value> = self.client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch markets")?
            .error_for_status()
            .context("Gamma API returned an error status")?
            .json()
            .await
            .context("Failed to parse markets response as a JSON array")?;

        Ok(parse_markets(items))
    }
}

#[async_trait]
impl MarketSource for GammaApiClient {
    async fn fetch(&self) -> Result<Vec<MarketSnapshot>> {
        self.fetch_markets().await
    }
}

/// Parse each raw element independently; a malformed element is skipped.
pub fn parse_markets(items: Vec<serde_json::Value>) -> Vec<MarketSnapshot> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<GammaMarket>(item) {
            Ok(gm) => normalize(gm),
            Err(e) => {
                warn!("Skipping malformed market record: {}", e);
                None
            }
        })
        .collect()
}

/// Convert a Gamma record into a snapshot. Returns None when the record has no slug.
pub fn normalize(gm: GammaMarket) -> Option<MarketSnapshot> {
    let id = match gm.slug.map(|s| s.trim().to_string()) {
        Some(slug) if !slug.is_empty() => slug,
        _ => {
            debug!("Dropping market without slug: {:?}", gm.question);
            return None;
        }
    };

    let title = gm.question
        .filter(|q| !q.trim().is_empty())
        .or(gm.title)
        .unwrap_or_default();

    let volume = gm.volume.or(gm.volume_num).unwrap_or(0.0).max(0.0);

    let price_change_ratio = gm.one_day_price_change
        .or(gm.one_day_price_change_snake)
        .unwrap_or(0.0);

    let probability = gm.current_price
        .or(gm.last_trade_price)
        .unwrap_or(0.0);

    Some(MarketSnapshot {
        id,
        title,
        category: gm.category.filter(|c| !c.trim().is_empty()),
        volume,
        price_change_ratio,
        probability,
    })
}

/// Accept numbers, numeric strings, or anything else (which reads as None).
pub(crate) fn de_lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Value {
        Num(f64),
        Text(String),
        Other(IgnoredAny),
    }

    let parsed = match Value::deserialize(deserializer)? {
        Value::Num(n) => Some(n),
        Value::Text(s) => s.trim().parse::<f64>().ok(),
        Value::Other(_) => None,
    };

    Ok(parsed.filter(|n| n.is_finite()))
}
