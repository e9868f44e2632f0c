//! Export: campaign CSV and snapshot JSON.
//!
//! The CSV carries the filtered and sorted table (all pages) with the same
//! columns the table shows. Snapshot JSON is a debugging aid; snapshots are
//! never read back by the pipeline itself.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pulseboard_core::domain::{CampaignRow, Snapshot};

/// Default file name for the campaign export.
pub const EXPORT_FILE_NAME: &str = "campaign-data.csv";
pub const SNAPSHOT_FILE_NAME: &str = "snapshot.json";

pub const CSV_HEADER: [&str; 7] = [
    "Campaign",
    "Channel",
    "Revenue",
    "Conversions",
    "CTR",
    "Status",
    "Date",
];

// ─── CSV export ─────────────────────────────────────────────────────

/// Render rows as CSV: one header line, then one line per row.
///
/// Numbers print in shortest form (`1000`, `2.5`). Fields are quoted only
/// when they contain a delimiter, quote or newline, so row dates such as
/// `"Jan 01, 2024"` are always quoted. Every line ends in `\n`, the last
/// one included.
pub fn export_campaigns_csv(rows: &[CampaignRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(CSV_HEADER)?;

    for r in rows {
        let revenue = r.revenue.to_string();
        let conversions = r.conversions.to_string();
        let ctr = r.ctr.to_string();
        wtr.write_record([
            r.campaign.as_str(),
            r.channel.as_str(),
            revenue.as_str(),
            conversions.as_str(),
            ctr.as_str(),
            r.status.as_str(),
            r.date.as_str(),
        ])?;
    }

    let bytes = wtr.into_inner().context("failed to flush campaign CSV")?;
    String::from_utf8(bytes).context("campaign CSV is not UTF-8")
}

/// Write the campaign CSV into `dir` under [`EXPORT_FILE_NAME`].
pub fn save_campaigns_csv(rows: &[CampaignRow], dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create export dir {}", dir.display()))?;
    let path = dir.join(EXPORT_FILE_NAME);
    let csv = export_campaigns_csv(rows)?;
    std::fs::write(&path, csv).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_snapshot_json(snapshot: &Snapshot) -> Result<String> {
    serde_json::to_string_pretty(snapshot).context("failed to serialize snapshot to JSON")
}

pub fn import_snapshot_json(json: &str) -> Result<Snapshot> {
    serde_json::from_str(json).context("failed to deserialize snapshot from JSON")
}

/// Write the snapshot into `dir` under [`SNAPSHOT_FILE_NAME`].
pub fn save_snapshot_json(snapshot: &Snapshot, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create export dir {}", dir.display()))?;
    let path = dir.join(SNAPSHOT_FILE_NAME);
    let json = export_snapshot_json(snapshot)?;
    std::fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}
