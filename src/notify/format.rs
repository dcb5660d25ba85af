//! Message formatting for alerts. Output targets Telegram's HTML parse mode.

use crate::data::types::MarketSnapshot;
use crate::engine::types::Decision;

/// Format an alert, or None when the decision is `NoAlert`.
pub fn format_alert(snapshot: &MarketSnapshot, decision: &Decision, url_base: &str) -> Option<String> {
    let delta_str = format!("{:+.1}%", snapshot.delta());

    let header = match decision {
        Decision::NoAlert => return None,
        Decision::NewHighVolume => "💰 [High-Volume New Market]".to_string(),
        Decision::NewVolatility(_) => "🆕 [New Market]".to_string(),
        Decision::IncrementalMove(change) => format!("⚡ [New Volatility] {:+.1}%", change),
    };

    let title = if snapshot.title.is_empty() { "N/A" } else { snapshot.title.as_str() };
    let category = snapshot.category.as_deref().unwrap_or("Uncategorized");
    let link = market_url(url_base, &snapshot.id).unwrap_or_default();

    Some(format!(
        "{}\n\
        \n\
        📂 Category: {}\n\
        📰 Title: {}\n\
        📈 Cumulative Δ: {}\n\
        💵 Volume: {}\n\
        🔗 Link: {}",
        header,
        escape_html(category),
        escape_html(title),
        delta_str,
        format_currency(snapshot.volume),
        link,
    ))
}

/// Canonical market page for a slug.
pub fn market_url(base: &str, slug: &str) -> Option<String> {
    if slug.is_empty() {
        return None;
    }
    Some(format!("{}/{}", base.trim_end_matches('/'), slug))
}

/// `1500000 -> "1.5M"`, `2500 -> "2.5K"`, `800 -> "800"`.
pub fn format_short_volume(volume: f64) -> String {
    if volume >= 1_000_000.0 {
        format!("{:.1}M", volume / 1_000_000.0)
    } else if volume >= 1_000.0 {
        format!("{:.1}K", volume / 1_000.0)
    } else {
        format!("{:.0}", volume)
    }
}

/// Dollar amount with thousands separators; cents only below $1,000.
pub fn format_currency(amount: f64) -> String {
    if amount < 1_000.0 {
        return format!("${:.2}", amount);
    }

    let whole = format!("{:.0}", amount);
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("${}", grouped)
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://polymarket.com/event";

    fn snapshot() -> MarketSnapshot {
        MarketSnapshot {
            id: "fed-cut-march".to_string(),
            title: "Fed cut in March?".to_string(),
            category: Some("Economics".to_string()),
            volume: 1_234_567.0,
            price_change_ratio: 0.052,
            probability: 0.4,
        }
    }

    #[test]
    fn test_short_volume() {
        assert_eq!(format_short_volume(1_500_000.0), "1.5M");
        assert_eq!(format_short_volume(2_500.0), "2.5K");
        assert_eq!(format_short_volume(800.0), "800");
        assert_eq!(format_short_volume(0.0), "0");
    }

    #[test]
    fn test_currency() {
        assert_eq!(format_currency(1_234_567.0), "$1,234,567");
        assert_eq!(format_currency(1_000.0), "$1,000");
        assert_eq!(format_currency(150_000.4), "$150,000");
        assert_eq!(format_currency(12.5), "$12.50");
        assert_eq!(format_currency(0.0), "$0.00");
    }

    #[test]
    fn test_market_url() {
        assert_eq!(
            market_url("https://polymarket.com/event/", "abc").as_deref(),
            Some("https://polymarket.com/event/abc")
        );
        assert_eq!(market_url(BASE, ""), None);
    }

    #[test]
    fn test_no_alert_formats_nothing() {
        assert!(format_alert(&snapshot(), &Decision::NoAlert, BASE).is_none());
    }

    #[test]
    fn test_high_volume_message() {
        let text = format_alert(&snapshot(), &Decision::NewHighVolume, BASE).unwrap();

        assert!(text.starts_with("💰 [High-Volume New Market]"));
        assert!(text.contains("📂 Category: Economics"));
        assert!(text.contains("📰 Title: Fed cut in March?"));
        assert!(text.contains("📈 Cumulative Δ: +5.2%"));
        assert!(text.contains("💵 Volume: $1,234,567"));
        assert!(text.contains("🔗 Link: https://polymarket.com/event/fed-cut-march"));
    }

    #[test]
    fn test_incremental_move_shows_both_deltas() {
        let text = format_alert(&snapshot(), &Decision::IncrementalMove(-2.4), BASE).unwrap();

        assert!(text.starts_with("⚡ [New Volatility] -2.4%"));
        assert!(text.contains("Cumulative Δ: +5.2%"));
    }

    #[test]
    fn test_missing_category_and_html_escaping() {
        let mut market = snapshot();
        market.category = None;
        market.title = "S&P <5000>?".to_string();

        let text = format_alert(&market, &Decision::NewVolatility(5.2), BASE).unwrap();

        assert!(text.starts_with("🆕 [New Market]"));
        assert!(text.contains("Category: Uncategorized"));
        assert!(text.contains("Title: S&amp;P &lt;5000&gt;?"));
    }
}
