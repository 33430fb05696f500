use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Container and stream characteristics of one media file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MediaProfile {
    pub width: u32,
    pub height: u32,
    /// Seconds.
    pub duration: f64,
    pub video_codec: String,
    pub audio_codec: String,
    /// Frames per second with two decimals, or the raw probe value when it
    /// is not a usable fraction.
    pub frame_rate: String,
    pub bitrate: u64,
    pub video_bitrate: u64,
    pub audio_bitrate: u64,
    /// Bytes on disk.
    pub size: u64,
    pub pixel_format: String,
    pub color_space: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSummary {
    pub original: MediaProfile,
    pub compressed: MediaProfile,
    /// Size reduction in percent, two decimals.
    pub compression_ratio: String,
    /// Wall-clock processing time, e.g. `12.34s`.
    pub processing_time: String,
}
