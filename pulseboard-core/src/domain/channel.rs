//! ChannelSlice: one segment of the channel-distribution chart.

use serde::{Deserialize, Serialize};

/// Palette shared by every channel adapter, in slice order.
pub const CHANNEL_PALETTE: [&str; 5] = ["#3B82F6", "#10B981", "#F59E0B", "#8B5CF6", "#6B7280"];

/// Acquisition channels campaign rows are spread across.
pub const MARKETING_CHANNELS: [&str; 8] = [
    "Google Ads",
    "Facebook",
    "Instagram",
    "LinkedIn",
    "TikTok",
    "YouTube",
    "Email",
    "Organic",
];

/// One named slice. `value` may be a share or an absolute amount and is never
/// normalized, so slices of one snapshot need not sum to 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSlice {
    pub name: String,
    pub value: f64,
    pub color: String,
}

impl ChannelSlice {
    pub fn new(name: impl Into<String>, value: f64, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: if value.is_finite() { value } else { 0.0 },
            color: color.into(),
        }
    }

    /// Palette color for the slice at `index`, wrapping around.
    pub fn palette_color(index: usize) -> &'static str {
        CHANNEL_PALETTE[index % CHANNEL_PALETTE.len()]
    }

    pub fn has_hex_color(&self) -> bool {
        let hex = self.color.strip_prefix('#').unwrap_or("");
        hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit())
    }
}
