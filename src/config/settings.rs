use crate::config::env::{self, EnvKey};
use std::path::PathBuf;
use std::time::Duration;

/// Hard ceiling on a single uploaded file.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 500 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_port: u16,
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
    pub ffmpeg_bin: PathBuf,
    pub ffprobe_bin: PathBuf,
    pub max_upload_bytes: u64,
    pub worker_count: usize,
    pub queue_capacity: usize,
    pub encode_timeout_secs: u64,
    pub pod_name: String,
}

impl AppConfig {
    pub fn new() -> Self {
        let pod_name = env::get(EnvKey::PodName)
            .or_else(|_| env::get(EnvKey::Hostname))
            .unwrap_or_default();

        Self {
            server_port: env::get_parsed(EnvKey::ServerPort, 8080),
            upload_dir: env::get_or(EnvKey::UploadDir, "./uploads").into(),
            output_dir: env::get_or(EnvKey::OutputDir, "./static").into(),
            ffmpeg_bin: env::get_or(EnvKey::FfmpegBin, "ffmpeg").into(),
            ffprobe_bin: env::get_or(EnvKey::FfprobeBin, "ffprobe").into(),
            max_upload_bytes: env::get_parsed(EnvKey::MaxUploadBytes, DEFAULT_MAX_UPLOAD_BYTES),
            worker_count: env::get_parsed(EnvKey::WorkerCount, 2usize).max(1),
            queue_capacity: env::get_parsed(EnvKey::QueueCapacity, 32usize),
            encode_timeout_secs: env::get_parsed(EnvKey::EncodeTimeoutSecs, 3600),
            pod_name,
        }
    }

    pub fn encode_timeout(&self) -> Duration {
        Duration::from_secs(self.encode_timeout_secs)
    }

    /// Ceiling rendered for client-facing messages, e.g. `500MB`.
    pub fn max_upload_label(&self) -> String {
        format!("{}MB", self.max_upload_bytes / (1024 * 1024))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_port: 8080,
            upload_dir: PathBuf::from("./uploads"),
            output_dir: PathBuf::from("./static"),
            ffmpeg_bin: PathBuf::from("ffmpeg"),
            ffprobe_bin: PathBuf::from("ffprobe"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            worker_count: 2,
            queue_capacity: 32,
            encode_timeout_secs: 3600,
            pod_name: String::new(),
        }
    }
}
