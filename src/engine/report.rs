use chrono::{DateTime, Utc};
use crate::config::ReportConfig;
use crate::data::types::MarketSnapshot;
use crate::notify::format::{escape_html, format_short_volume, market_url};

const PLACEHOLDER: &str = "(no data)";

#[derive(Debug, Clone, PartialEq)]
pub struct DigestEntry {
    pub title: String,
    pub url: Option<String>,
    /// Probability in percent.
    pub probability_pct: f64,
    pub volume: f64,
}

/// Periodic summary: where the money is, and what is moving.
#[derive(Debug, Clone)]
pub struct Digest {
    pub generated_at: DateTime<Utc>,
    /// Top markets by volume.
    pub attention: Vec<DigestEntry>,
    /// Top markets by signed delta.
    pub momentum: Vec<DigestEntry>,
}

pub struct ReportBuilder {
    config: ReportConfig,
    market_url_base: String,
}

impl ReportBuilder {
    pub fn new(config: ReportConfig, market_url_base: String) -> Self {
        Self {
            config,
            market_url_base,
        }
    }

    /// Rank snapshots that already passed the compliance filter.
    /// Returns None when there is nothing to report.
    pub fn build(&self, snapshots: &[MarketSnapshot]) -> Option<Digest> {
        if snapshots.is_empty() {
            return None;
        }

        let mut by_volume: Vec<&MarketSnapshot> = snapshots.iter().collect();
        by_volume.sort_by(|a, b| b.volume.total_cmp(&a.volume));

        let mut by_delta: Vec<&MarketSnapshot> = snapshots.iter().collect();
        by_delta.sort_by(|a, b| b.delta().total_cmp(&a.delta()));

        Some(Digest {
            generated_at: Utc::now(),
            attention: by_volume
                .into_iter()
                .take(self.config.top_volume)
                .map(|s| self.entry(s))
                .collect(),
            momentum: by_delta
                .into_iter()
                .take(self.config.top_gainers)
                .map(|s| self.entry(s))
                .collect(),
        })
    }

    fn entry(&self, snapshot: &MarketSnapshot) -> DigestEntry {
        DigestEntry {
            title: snapshot.title.clone(),
            url: market_url(&self.market_url_base, &snapshot.id),
            probability_pct: snapshot.probability * 100.0,
            volume: snapshot.volume,
        }
    }
}

impl Digest {
    /// Render as Telegram HTML. Empty sections keep a placeholder line.
    pub fn render(&self) -> String {
        let mut lines = vec![
            "☀️ Daily digest: where is the money going?".to_string(),
            format!("🕐 Scan time: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")),
            String::new(),
            "🔥 Top Volume".to_string(),
        ];
        push_section(&mut lines, &self.attention);

        lines.push(String::new());
        lines.push("🚀 Top Gainers".to_string());
        push_section(&mut lines, &self.momentum);

        lines.join("\n")
    }
}

fn push_section(lines: &mut Vec<String>, entries: &[DigestEntry]) {
    if entries.is_empty() {
        lines.push(PLACEHOLDER.to_string());
        return;
    }
    lines.extend(entries.iter().map(render_entry));
}

fn render_entry(entry: &DigestEntry) -> String {
    let title = escape_html(&entry.title);
    let title = match &entry.url {
        Some(url) => format!("<a href=\"{}\">{}</a>", url, title),
        None => title,
    };

    format!(
        "• {} | Prob {:.1}% | Vol {}",
        title,
        entry.probability_pct,
        format_short_volume(entry.volume)
    )
}
