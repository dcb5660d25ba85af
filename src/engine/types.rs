/// Outcome of evaluating one snapshot against the pre-scan baseline.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    NoAlert,
    /// Unknown market trading at or above the high-volume threshold.
    NewHighVolume,
    /// Unknown market whose delta (percentage points) crossed the volatility threshold.
    NewVolatility(f64),
    /// Known market whose delta moved by this many points since the last scan.
    IncrementalMove(f64),
}

impl Decision {
    pub fn is_alert(&self) -> bool {
        !matches!(self, Decision::NoAlert)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Decision::NoAlert => "no_alert",
            Decision::NewHighVolume => "new_high_volume",
            Decision::NewVolatility(_) => "new_volatility",
            Decision::IncrementalMove(_) => "incremental_move",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Per-market threshold alerts.
    Alerts,
    /// Ranked digest only; alert rules are skipped.
    Digest,
}
