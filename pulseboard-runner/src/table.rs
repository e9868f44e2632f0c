//! Campaign table query: search, status filter, sort, paginate.
//!
//! Pure functions over `CampaignRow` slices. The same filtered and sorted
//! list feeds both the visible page and the CSV export.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use pulseboard_core::domain::{CampaignRow, CampaignStatus};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Campaign,
    Channel,
    Revenue,
    Conversions,
    Ctr,
    Status,
    Date,
}

impl SortField {
    pub const ALL: [SortField; 7] = [
        SortField::Campaign,
        SortField::Channel,
        SortField::Revenue,
        SortField::Conversions,
        SortField::Ctr,
        SortField::Status,
        SortField::Date,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Campaign => "campaign",
            SortField::Channel => "channel",
            SortField::Revenue => "revenue",
            SortField::Conversions => "conversions",
            SortField::Ctr => "ctr",
            SortField::Status => "status",
            SortField::Date => "date",
        }
    }

    /// Ascending comparison of two rows on this column.
    fn compare(&self, a: &CampaignRow, b: &CampaignRow) -> Ordering {
        match self {
            SortField::Campaign => cmp_text(&a.campaign, &b.campaign),
            SortField::Channel => cmp_text(&a.channel, &b.channel),
            SortField::Revenue => a.revenue.total_cmp(&b.revenue),
            SortField::Conversions => a.conversions.total_cmp(&b.conversions),
            SortField::Ctr => a.ctr.total_cmp(&b.ctr),
            SortField::Status => a.status.as_str().cmp(b.status.as_str()),
            // Unparseable dates sort before every real date.
            SortField::Date => a.parsed_date().cmp(&b.parsed_date()),
        }
    }
}

fn cmp_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortField::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown sort column '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(CampaignStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: CampaignStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(s) => *s == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(StatusFilter::All)
        } else {
            s.parse().map(StatusFilter::Only)
        }
    }
}

/// Table controls. Pages are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    pub search: String,
    pub status: StatusFilter,
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
    pub page: usize,
    pub page_size: usize,
}

impl Default for TableQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: StatusFilter::All,
            sort_field: SortField::Date,
            sort_direction: SortDirection::Desc,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl TableQuery {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Header click: the same column flips direction, a new one starts descending.
    pub fn toggle_sort(&mut self, field: SortField) {
        if self.sort_field == field {
            self.sort_direction = self.sort_direction.flipped();
        } else {
            self.sort_field = field;
            self.sort_direction = SortDirection::Desc;
        }
    }

    pub fn matches(&self, row: &CampaignRow) -> bool {
        if !self.status.matches(row.status) {
            return false;
        }
        let needle = self.search.trim().to_lowercase();
        needle.is_empty()
            || row.campaign.to_lowercase().contains(&needle)
            || row.channel.to_lowercase().contains(&needle)
    }

    /// Every matching row in display order (all pages).
    pub fn apply(&self, rows: &[CampaignRow]) -> Vec<CampaignRow> {
        let mut out: Vec<CampaignRow> = rows.iter().filter(|r| self.matches(r)).cloned().collect();
        let field = self.sort_field;
        let direction = self.sort_direction;
        out.sort_by(|a, b| {
            let ord = field.compare(a, b);
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });
        out
    }

    /// The requested page, with the page number clamped into range.
    pub fn page(&self, rows: &[CampaignRow]) -> TablePage {
        let matching = self.apply(rows);
        let page_size = self.page_size.max(1);
        let total_rows = matching.len();
        let total_pages = total_rows.div_ceil(page_size);
        let page = self.page.clamp(1, total_pages.max(1));
        let start = (page - 1) * page_size;
        let end = (start + page_size).min(total_rows);
        TablePage {
            rows: matching[start..end].to_vec(),
            page,
            total_pages,
            total_rows,
            first: if total_rows == 0 { 0 } else { start + 1 },
            last: end,
        }
    }
}

/// One page of the table.
#[derive(Debug, Clone, PartialEq)]
pub struct TablePage {
    pub rows: Vec<CampaignRow>,
    pub page: usize,
    pub total_pages: usize,
    pub total_rows: usize,
    /// 1-based position of the first row shown; 0 when nothing matches.
    pub first: usize,
    pub last: usize,
}

impl TablePage {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn showing_label(&self) -> String {
        format!(
            "Showing {} to {} of {} results",
            self.first, self.last, self.total_rows
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, campaign: &str, channel: &str, revenue: f64, status: CampaignStatus, date: &str) -> CampaignRow {
        CampaignRow::new(id, campaign, channel, revenue, 10.0, 1.0, status, date)
    }

    fn rows() -> Vec<CampaignRow> {
        vec![
            row("c1", "Summer Sale", "Google Ads", 1_000.0, CampaignStatus::Active, "Jan 05, 2024"),
            row("c2", "black friday", "Facebook", 5_000.0, CampaignStatus::Paused, "Nov 24, 2023"),
            row("c3", "Brand Awareness", "Instagram", 2_500.0, CampaignStatus::Active, "Feb 01, 2024"),
        ]
    }

    fn ids(rows: &[CampaignRow]) -> Vec<&str> {
        rows.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn default_is_date_descending_by_calendar() {
        let out = TableQuery::default().apply(&rows());
        // "Nov 24, 2023" would sort after "Feb" as a string.
        assert_eq!(ids(&out), vec!["c3", "c1", "c2"]);
    }

    #[test]
    fn search_is_case_insensitive_over_campaign_and_channel() {
        let mut q = TableQuery::default();
        q.search = "BLACK".into();
        assert_eq!(ids(&q.apply(&rows())), vec!["c2"]);
        q.search = "insta".into();
        assert_eq!(ids(&q.apply(&rows())), vec!["c3"]);
    }

    #[test]
    fn status_filter() {
        let q = TableQuery {
            status: "paused".parse().unwrap(),
            ..TableQuery::default()
        };
        assert_eq!(ids(&q.apply(&rows())), vec!["c2"]);
        assert_eq!("All".parse::<StatusFilter>(), Ok(StatusFilter::All));
        assert!("archived".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn toggle_flips_same_field_and_resets_new_field() {
        let mut q = TableQuery::default();
        q.toggle_sort(SortField::Date);
        assert_eq!(q.sort_direction, SortDirection::Asc);
        q.toggle_sort(SortField::Revenue);
        assert_eq!(q.sort_field, SortField::Revenue);
        assert_eq!(q.sort_direction, SortDirection::Desc);
        assert_eq!(ids(&q.apply(&rows())), vec!["c2", "c3", "c1"]);
        q.toggle_sort(SortField::Revenue);
        assert_eq!(ids(&q.apply(&rows())), vec!["c1", "c3", "c2"]);
    }

    #[test]
    fn text_sort_ignores_case() {
        let q = TableQuery {
            sort_field: SortField::Campaign,
            sort_direction: SortDirection::Asc,
            ..TableQuery::default()
        };
        assert_eq!(ids(&q.apply(&rows())), vec!["c2", "c3", "c1"]);
    }

    #[test]
    fn empty_result_page() {
        let q = TableQuery {
            search: "nothing".into(),
            page: 3,
            ..TableQuery::default()
        };
        let page = q.page(&rows());
        assert!(page.rows.is_empty());
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.showing_label(), "Showing 0 to 0 of 0 results");
    }

    #[test]
    fn sort_field_parses() {
        assert_eq!("CTR".parse::<SortField>(), Ok(SortField::Ctr));
        assert!("id".parse::<SortField>().is_err());
    }
}
