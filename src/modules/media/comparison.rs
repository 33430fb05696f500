use super::model::{ComparisonSummary, MediaProfile};
use std::time::Duration;

/// Percentage of the original size saved by the compressed file.
///
/// An empty original yields `"0.00"` rather than dividing by zero. A larger
/// output yields a negative ratio.
pub fn compression_ratio(original_size: u64, compressed_size: u64) -> String {
    let ratio = if original_size > 0 {
        (original_size as f64 - compressed_size as f64) / original_size as f64 * 100.0
    } else {
        0.0
    };
    format!("{:.2}", ratio)
}

pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.2}s", elapsed.as_secs_f64())
}

pub fn compare(
    original: MediaProfile,
    compressed: MediaProfile,
    elapsed: Duration,
) -> ComparisonSummary {
    ComparisonSummary {
        compression_ratio: compression_ratio(original.size, compressed.size),
        processing_time: format_elapsed(elapsed),
        original,
        compressed,
    }
}
