//! ChartPoint: one day on the revenue/engagement chart.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One calendar day of chart data.
///
/// `date` is a display label ("Jan 05"), never a timestamp; ordering uses `day`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub day: NaiveDate,
    pub date: String,
    pub revenue: f64,
    pub users: f64,
    pub conversions: f64,
    pub impressions: f64,
    pub clicks: f64,
}

impl ChartPoint {
    /// Build a point, clamping every measure to a finite non-negative value.
    pub fn new(
        day: NaiveDate,
        revenue: f64,
        users: f64,
        conversions: f64,
        impressions: f64,
        clicks: f64,
    ) -> Self {
        Self {
            day,
            date: day_label(day),
            revenue: non_negative(revenue),
            users: non_negative(users),
            conversions: non_negative(conversions),
            impressions: non_negative(impressions),
            clicks: non_negative(clicks),
        }
    }

    pub fn is_well_formed(&self) -> bool {
        [
            self.revenue,
            self.users,
            self.conversions,
            self.impressions,
            self.clicks,
        ]
        .iter()
        .all(|v| v.is_finite() && *v >= 0.0)
    }
}

/// Short day label used on the chart axis, e.g. "Mar 07".
pub fn day_label(day: NaiveDate) -> String {
    day.format("%b %d").to_string()
}

/// Sort points ascending by day and keep one point per day.
///
/// When a day appears more than once the later point in input order wins.
pub fn into_daily_series(mut points: Vec<ChartPoint>) -> Vec<ChartPoint> {
    // Stable sort keeps input order within a day, so the last of a run is the latest.
    points.sort_by_key(|p| p.day);
    let mut series: Vec<ChartPoint> = Vec::with_capacity(points.len());
    for point in points {
        match series.last_mut() {
            Some(last) if last.day == point.day => *last = point,
            _ => series.push(point),
        }
    }
    series
}

/// Whether a series is strictly ascending by day (implies one point per day).
pub fn is_daily_series(points: &[ChartPoint]) -> bool {
    points.windows(2).all(|w| w[0].day < w[1].day)
}

fn non_negative(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}
