use anyhow::{Context, Result};
use tracing::{error, info, warn};
use crate::data::types::MarketSnapshot;
use crate::data::MarketSource;
use crate::engine::report::ReportBuilder;
use crate::engine::rules::AlertRuleEngine;
use crate::engine::types::{Decision, ScanMode};
use crate::monitoring::logger::AlertJournal;
use crate::notify::console::ConsoleNotifier;
use crate::notify::format::format_alert;
use crate::notify::Notifier;
use crate::state::{Baseline, BaselineRecord, BaselineStore};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub markets: usize,
    pub alerts_sent: usize,
    pub alerts_failed: usize,
    pub baseline_size: usize,
    /// Alerts mode only: the baseline was empty and this scan only recorded.
    pub cold_start: bool,
    pub digest_sent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Nothing was fetched; the baseline was not touched.
    Skipped,
    Completed(ScanSummary),
}

/// One fetch -> evaluate -> notify -> persist cycle.
pub struct Scanner {
    source: Box<dyn MarketSource>,
    notifier: Box<dyn Notifier>,
    /// Receives a digest the primary channel failed to deliver.
    fallback: Box<dyn Notifier>,
    store: BaselineStore,
    rules: AlertRuleEngine,
    reports: ReportBuilder,
    mode: ScanMode,
    market_url_base: String,
    journal: Option<AlertJournal>,
}

impl Scanner {
    pub fn new(
        source: Box<dyn MarketSource>,
        notifier: Box<dyn Notifier>,
        store: BaselineStore,
        rules: AlertRuleEngine,
        reports: ReportBuilder,
        mode: ScanMode,
        market_url_base: String,
    ) -> Self {
        Self {
            source,
            notifier,
            fallback: Box::new(ConsoleNotifier),
            store,
            rules,
            reports,
            mode,
            market_url_base,
            journal: None,
        }
    }

    #[cfg(test)]
    pub fn with_fallback(mut self, fallback: Box<dyn Notifier>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_journal(mut self, journal: AlertJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Run a single scan to completion.
    ///
    /// A failed or empty fetch skips the scan without touching the baseline.
    /// A failed baseline write is returned as an error.
    pub async fn run_scan(&self) -> Result<ScanOutcome> {
        let snapshots = match self.source.fetch().await {
            Ok(snapshots) => snapshots,
            Err(e) => {
                error!("❌ Failed to fetch market data: {:#}", e);
                return Ok(ScanOutcome::Skipped);
            }
        };
        info!("Fetched {} markets", snapshots.len());

        if snapshots.is_empty() {
            warn!("No markets fetched, skipping this scan");
            return Ok(ScanOutcome::Skipped);
        }

        let baseline = self.store.load();
        let summary = match self.mode {
            ScanMode::Digest => self.digest_scan(&snapshots, baseline).await?,
            ScanMode::Alerts if baseline.is_empty() => self.cold_start_scan(&snapshots)?,
            ScanMode::Alerts => self.alert_scan(&snapshots, baseline).await?,
        };

        info!(
            "📊 Scan complete: markets={}, alerts_sent={}, alerts_failed={}, baseline={}, cold_start={}, digest_sent={}",
            summary.markets,
            summary.alerts_sent,
            summary.alerts_failed,
            summary.baseline_size,
            summary.cold_start,
            summary.digest_sent
        );

        Ok(ScanOutcome::Completed(summary))
    }

    /// First-ever scan: record everything, alert on nothing.
    fn cold_start_scan(&self, snapshots: &[MarketSnapshot]) -> Result<ScanSummary> {
        info!("🔵 Cold start: building baseline, no alerts will be sent");

        let next = record_all(Baseline::new(), snapshots);
        self.persist(&next)?;

        Ok(ScanSummary {
            markets: snapshots.len(),
            baseline_size: next.len(),
            cold_start: true,
            ..Default::default()
        })
    }

    async fn alert_scan(&self, snapshots: &[MarketSnapshot], baseline: Baseline) -> Result<ScanSummary> {
        let mut next = baseline.clone();
        let mut summary = ScanSummary {
            markets: snapshots.len(),
            ..Default::default()
        };

        for snapshot in snapshots {
            next.insert(snapshot.id.clone(), BaselineRecord::from_snapshot(snapshot));

            // Compare against the pre-scan baseline, never the one being built.
            let decision = self.rules.evaluate(snapshot, &baseline);
            if !decision.is_alert() {
                continue;
            }
            let Some(message) = format_alert(snapshot, &decision, &self.market_url_base) else {
                continue;
            };

            match self.notifier.send(&message).await {
                Ok(()) => {
                    summary.alerts_sent += 1;
                    info!("✅ Alert sent ({}): {}", decision.kind(), truncate(&snapshot.title, 50));
                    self.journal_alert(snapshot, &decision);
                }
                Err(e) => {
                    summary.alerts_failed += 1;
                    warn!("Failed to send alert for {}: {:#}", snapshot.id, e);
                }
            }
        }

        self.persist(&next)?;
        summary.baseline_size = next.len();
        Ok(summary)
    }

    async fn digest_scan(&self, snapshots: &[MarketSnapshot], baseline: Baseline) -> Result<ScanSummary> {
        let next = record_all(baseline, snapshots);
        self.persist(&next)?;

        let mut summary = ScanSummary {
            markets: snapshots.len(),
            baseline_size: next.len(),
            ..Default::default()
        };

        let eligible: Vec<MarketSnapshot> = snapshots
            .iter()
            .filter(|s| !self.rules.compliance().is_excluded(&s.title))
            .cloned()
            .collect();

        let Some(digest) = self.reports.build(&eligible) else {
            warn!("Digest has no data after filtering, nothing sent");
            return Ok(summary);
        };

        let text = digest.render();
        match self.notifier.send(&text).await {
            Ok(()) => {
                summary.digest_sent = true;
                info!("✅ Digest sent");
            }
            Err(e) => {
                warn!("Failed to send digest, falling back to console: {:#}", e);
                if let Err(e) = self.fallback.send(&text).await {
                    error!("Digest lost: {:#}", e);
                }
            }
        }

        Ok(summary)
    }

    fn persist(&self, baseline: &Baseline) -> Result<()> {
        self.store
            .save(baseline)
            .with_context(|| format!("Scan incomplete: could not save {}", self.store.path().display()))
    }

    fn journal_alert(&self, snapshot: &MarketSnapshot, decision: &Decision) {
        if let Some(journal) = &self.journal {
            if let Err(e) = journal.log_alert(snapshot, decision) {
                warn!("Failed to journal alert for {}: {}", snapshot.id, e);
            }
        }
    }
}

fn record_all(mut baseline: Baseline, snapshots: &[MarketSnapshot]) -> Baseline {
    for snapshot in snapshots {
        baseline.insert(snapshot.id.clone(), BaselineRecord::from_snapshot(snapshot));
    }
    baseline
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
