//! Media inspection through an external `ffprobe` process.
//!
//! The probe is asked for JSON (`-print_format json -show_format -show_streams`)
//! and the output is folded into a [`MediaProfile`]. Only the first video and the
//! first audio stream contribute to the profile; container-level values that
//! cannot be parsed fall back to zero instead of failing the inspection.

use super::model::MediaProfile;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to get file info for {path}: {source}")]
    FileInfo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to execute ffprobe: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("ffprobe exited with code {code:?}: {stderr}")]
    Exit { code: Option<i32>, stderr: String },

    #[error("failed to parse ffprobe output: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Top-level ffprobe JSON document.
#[derive(Debug, Default, Deserialize)]
pub struct ProbeOutput {
    #[serde(default)]
    pub streams: Vec<ProbeStream>,
    #[serde(default)]
    pub format: ProbeFormat,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProbeFormat {
    pub duration: Option<String>,
    pub bit_rate: Option<String>,
    pub tags: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProbeStream {
    pub codec_type: Option<String>,
    pub codec_name: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub r_frame_rate: Option<String>,
    pub avg_frame_rate: Option<String>,
    pub bit_rate: Option<String>,
    pub pix_fmt: Option<String>,
    pub color_space: Option<String>,
}

impl ProbeStream {
    fn is(&self, kind: &str) -> bool {
        self.codec_type.as_deref() == Some(kind)
    }

    /// Average frame rate when the probe reports one, nominal rate otherwise.
    fn frame_rate(&self) -> String {
        [&self.avg_frame_rate, &self.r_frame_rate]
            .into_iter()
            .flatten()
            .find(|rate| !rate.is_empty())
            .map(|rate| parse_frame_rate(rate))
            .unwrap_or_default()
    }
}

impl ProbeOutput {
    pub fn into_profile(self, size: u64) -> MediaProfile {
        let mut profile = MediaProfile {
            size,
            duration: parse_duration(self.format.duration.as_deref()),
            bitrate: parse_bitrate(self.format.bit_rate.as_deref()),
            metadata: self.format.tags.unwrap_or_default(),
            ..MediaProfile::default()
        };

        if let Some(video) = self.streams.iter().find(|s| s.is("video")) {
            profile.width = video.width.unwrap_or_default();
            profile.height = video.height.unwrap_or_default();
            profile.video_codec = video.codec_name.clone().unwrap_or_default();
            profile.pixel_format = video.pix_fmt.clone().unwrap_or_default();
            profile.color_space = video.color_space.clone().unwrap_or_default();
            profile.frame_rate = video.frame_rate();
            profile.video_bitrate = parse_bitrate(video.bit_rate.as_deref());
        }

        if let Some(audio) = self.streams.iter().find(|s| s.is("audio")) {
            profile.audio_codec = audio.codec_name.clone().unwrap_or_default();
            profile.audio_bitrate = parse_bitrate(audio.bit_rate.as_deref());
        }

        profile
    }
}

/// Renders an ffprobe `num/den` rate as frames per second with two decimals.
///
/// Anything that is not a fraction of two numbers with a non-zero
/// denominator is returned unchanged.
pub fn parse_frame_rate(frame_rate: &str) -> String {
    let mut parts = frame_rate.split('/');
    if let (Some(num), Some(den), None) = (parts.next(), parts.next(), parts.next()) {
        if let (Ok(num), Ok(den)) = (num.parse::<f64>(), den.parse::<f64>()) {
            if den != 0.0 {
                return format!("{:.2}", num / den);
            }
        }
    }
    frame_rate.to_string()
}

fn parse_duration(value: Option<&str>) -> f64 {
    value
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or_default()
}

fn parse_bitrate(value: Option<&str>) -> u64 {
    value.and_then(|v| v.parse::<u64>().ok()).unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct MediaInspector {
    ffprobe_bin: PathBuf,
}

impl MediaInspector {
    pub fn new(ffprobe_bin: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe_bin: ffprobe_bin.into(),
        }
    }

    pub async fn inspect(&self, path: &Path) -> Result<MediaProfile, ProbeError> {
        let size = tokio::fs::metadata(path)
            .await
            .map_err(|source| ProbeError::FileInfo {
                path: path.to_path_buf(),
                source,
            })?
            .len();

        debug!(path = %path.display(), "Probing media file");

        let output = Command::new(&self.ffprobe_bin)
            .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(ProbeError::Spawn)?;

        if !output.status.success() {
            return Err(ProbeError::Exit {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let data: ProbeOutput = serde_json::from_slice(&output.stdout)?;
        Ok(data.into_profile(size))
    }
}
