//! Canonical dashboard records and the snapshot that bundles them.

pub mod campaign;
pub mod channel;
pub mod chart;
pub mod metric;
pub mod snapshot;

pub use campaign::{has_unique_ids, parse_row_date, row_date_label, CampaignRow, CampaignStatus};
pub use channel::{ChannelSlice, CHANNEL_PALETTE, MARKETING_CHANNELS};
pub use chart::{day_label, into_daily_series, is_daily_series, ChartPoint};
pub use metric::{MetricIcon, MetricSnapshot, Trend};
pub use snapshot::{RecordKind, SlotOrigin, SlotReport, Snapshot};
