use crate::config::AlertConfig;
use crate::data::types::MarketSnapshot;
use crate::engine::compliance::ComplianceFilter;
use crate::engine::types::Decision;
use crate::state::Baseline;
use tracing::debug;

pub struct AlertRuleEngine {
    config: AlertConfig,
    compliance: ComplianceFilter,
}

impl AlertRuleEngine {
    pub fn new(config: AlertConfig) -> Self {
        let compliance = ComplianceFilter::new(&config.exclude_keywords);
        Self { config, compliance }
    }

    pub fn compliance(&self) -> &ComplianceFilter {
        &self.compliance
    }

    /// Decide whether a snapshot warrants an alert.
    ///
    /// `baseline` must be the state loaded at scan start. Rules are checked in
    /// priority order and the first match wins:
    /// 1. new market with volume >= high-volume threshold
    /// 2. new market with |delta| >= volatility threshold
    /// 3. known market with |delta - previous delta| >= increment threshold
    pub fn evaluate(&self, snapshot: &MarketSnapshot, baseline: &Baseline) -> Decision {
        if self.compliance.is_excluded(&snapshot.title) {
            debug!("Excluded by compliance filter: {}", snapshot.id);
            return Decision::NoAlert;
        }

        let current_delta = snapshot.delta();

        match baseline.get(&snapshot.id) {
            None => {
                if snapshot.volume >= self.config.high_volume_threshold {
                    return Decision::NewHighVolume;
                }
                if current_delta.abs() >= self.config.volatility_threshold {
                    return Decision::NewVolatility(current_delta);
                }
                Decision::NoAlert
            }
            Some(previous) => {
                let delta_change = current_delta - previous.delta;
                if delta_change.abs() >= self.config.increment_threshold {
                    debug!(
                        "{}: delta {:.2} -> {:.2} ({:+.2})",
                        snapshot.id, previous.delta, current_delta, delta_change
                    );
                    return Decision::IncrementalMove(delta_change);
                }
                Decision::NoAlert
            }
        }
    }
}
