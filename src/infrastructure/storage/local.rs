use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use crate::modules::job::model::output_file_name;

const DEFAULT_EXTENSION: &str = "mp4";

/// Job-namespaced locations for uploaded inputs and encoded outputs.
#[derive(Clone, Debug)]
pub struct StorageService {
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl StorageService {
    pub async fn new(upload_dir: &Path, output_dir: &Path) -> std::io::Result<Self> {
        for dir in [upload_dir, output_dir] {
            tokio::fs::create_dir_all(dir).await?;
        }

        info!(
            upload_dir = %upload_dir.display(),
            output_dir = %output_dir.display(),
            "Storage directories ready"
        );

        Ok(Self {
            upload_dir: upload_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
        })
    }

    pub fn input_path(&self, job_id: Uuid, original_filename: &str) -> PathBuf {
        self.upload_dir
            .join(format!("{}_input.{}", job_id, extension_of(original_filename)))
    }

    pub fn output_path(&self, job_id: Uuid) -> PathBuf {
        self.output_dir.join(output_file_name(job_id))
    }
}

/// Extension of the client-supplied filename, or `mp4` when it has none or
/// it contains anything but ASCII letters and digits.
pub fn extension_of(filename: &str) -> &str {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or(DEFAULT_EXTENSION)
}
