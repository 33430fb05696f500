use std::env;
use std::str::FromStr;

pub enum EnvKey {
    ServerPort,
    UploadDir,
    OutputDir,
    FfmpegBin,
    FfprobeBin,
    MaxUploadBytes,
    WorkerCount,
    QueueCapacity,
    EncodeTimeoutSecs,
    PodName,
    Hostname,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::UploadDir => "UPLOAD_DIR",
            EnvKey::OutputDir => "OUTPUT_DIR",
            EnvKey::FfmpegBin => "FFMPEG_BIN",
            EnvKey::FfprobeBin => "FFPROBE_BIN",
            EnvKey::MaxUploadBytes => "MAX_UPLOAD_BYTES",
            EnvKey::WorkerCount => "WORKER_COUNT",
            EnvKey::QueueCapacity => "QUEUE_CAPACITY",
            EnvKey::EncodeTimeoutSecs => "ENCODE_TIMEOUT_SECS",
            EnvKey::PodName => "POD_NAME",
            EnvKey::Hostname => "HOSTNAME",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    env::var(key.as_str()).unwrap_or_else(|_| default.to_string())
}

pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> T {
    match get(key) {
        Ok(val) => val.parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}
