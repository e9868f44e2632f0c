//! MetricSnapshot: one headline card on the dashboard.

use serde::{Deserialize, Serialize};

use crate::format::round2;

/// Direction arrow shown next to a metric's change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
}

impl Trend {
    /// Down iff the change is negative. Exactly zero counts as up.
    pub fn from_change(change: f64) -> Self {
        if change < 0.0 {
            Trend::Down
        } else {
            Trend::Up
        }
    }
}

/// Closed set of card icons. The view maps each tag to a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricIcon {
    DollarSign,
    Users,
    Target,
    TrendingUp,
    Activity,
}

/// One headline card: title, pre-formatted value, and signed percent change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub title: String,
    pub value: String,
    pub change: f64,
    pub trend: Trend,
    pub icon: MetricIcon,
}

impl MetricSnapshot {
    /// Build a card with `trend` derived from `change`.
    ///
    /// Non-finite changes are recorded as 0.0; finite ones are rounded to two
    /// decimals before the trend is derived, so the two can never disagree.
    pub fn new(
        title: impl Into<String>,
        value: impl Into<String>,
        change: f64,
        icon: MetricIcon,
    ) -> Self {
        let change = if change.is_finite() { round2(change) } else { 0.0 };
        Self {
            title: title.into(),
            value: value.into(),
            change,
            trend: Trend::from_change(change),
            icon,
        }
    }

    /// Whether `trend` agrees with the sign of `change`.
    pub fn is_consistent(&self) -> bool {
        self.change.is_finite() && self.trend == Trend::from_change(self.change)
    }
}
