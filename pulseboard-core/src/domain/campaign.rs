//! CampaignRow: one row of the campaign table.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Lifecycle status shown as a badge in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Active,
    Paused,
    Completed,
}

impl CampaignStatus {
    pub const ALL: [CampaignStatus; 3] = [
        CampaignStatus::Active,
        CampaignStatus::Paused,
        CampaignStatus::Completed,
    ];

    /// Live adapters derive status from the CTR sign: positive is active.
    pub fn from_ctr(ctr: f64) -> Self {
        if ctr > 0.0 {
            CampaignStatus::Active
        } else {
            CampaignStatus::Paused
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Active => "active",
            CampaignStatus::Paused => "paused",
            CampaignStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(CampaignStatus::Active),
            "paused" => Ok(CampaignStatus::Paused),
            "completed" => Ok(CampaignStatus::Completed),
            other => Err(format!("unknown campaign status '{other}'")),
        }
    }
}

/// One campaign row. `date` is a display string ("Jan 01, 2024").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignRow {
    pub id: String,
    pub campaign: String,
    pub channel: String,
    pub revenue: f64,
    pub conversions: f64,
    pub ctr: f64,
    pub status: CampaignStatus,
    pub date: String,
}

impl CampaignRow {
    /// Build a row, forcing revenue/conversions to finite non-negative values
    /// and CTR to a finite value.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        campaign: impl Into<String>,
        channel: impl Into<String>,
        revenue: f64,
        conversions: f64,
        ctr: f64,
        status: CampaignStatus,
        date: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            campaign: campaign.into(),
            channel: channel.into(),
            revenue: finite_non_negative(revenue),
            conversions: finite_non_negative(conversions),
            ctr: if ctr.is_finite() { ctr } else { 0.0 },
            status,
            date: date.into(),
        }
    }

    pub fn is_well_formed(&self) -> bool {
        !self.id.is_empty()
            && self.revenue.is_finite()
            && self.revenue >= 0.0
            && self.conversions.is_finite()
            && self.conversions >= 0.0
            && self.ctr.is_finite()
    }

    /// Calendar day behind the display date, if it parses.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_row_date(&self.date)
    }
}

/// Table date format, e.g. "Jan 01, 2024".
pub fn row_date_label(day: NaiveDate) -> String {
    day.format("%b %d, %Y").to_string()
}

pub fn parse_row_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%b %d, %Y").ok()
}

/// Whether every row id appears once.
pub fn has_unique_ids(rows: &[CampaignRow]) -> bool {
    let mut seen = HashSet::with_capacity(rows.len());
    rows.iter().all(|r| seen.insert(r.id.as_str()))
}

fn finite_non_negative(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}
