use anyhow::Result;
use chrono::Utc;
use std::fs::OpenOptions;
use std::io::Write;
use crate::data::types::MarketSnapshot;
use crate::engine::types::Decision;

/// Append-only CSV journal of fired alerts.
pub struct AlertJournal {
    log_path: String,
}

impl AlertJournal {
    pub fn new(log_path: String) -> Result<Self> {
        // Create CSV file with headers if it doesn't exist
        if !std::path::Path::new(&log_path).exists() {
            let mut file = OpenOptions::new()
                .create(true)
                .write(true)
                .open(&log_path)?;

            writeln!(file, "timestamp,market_id,kind,delta,delta_change,volume,title")?;
        }

        Ok(Self { log_path })
    }

    pub fn log_alert(&self, snapshot: &MarketSnapshot, decision: &Decision) -> Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.log_path)?;

        let change_str = match decision {
            Decision::IncrementalMove(change) => format!("{:.2}", change),
            _ => String::new(),
        };

        writeln!(
            file,
            "{},{},{},{:.2},{},{:.2},{}",
            Utc::now().to_rfc3339(),
            csv_field(&snapshot.id),
            decision.kind(),
            snapshot.delta(),
            change_str,
            snapshot.volume,
            csv_field(&snapshot.title)
        )?;

        Ok(())
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
