use axum::extract::multipart::Field;
use axum::http::StatusCode;
use bytes::Bytes;
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("File too large")]
    TooLarge { limit: u64 },

    #[error("Upload stream interrupted: {0}")]
    Stream(String),

    #[error("Failed to write upload: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes an upload to disk chunk by chunk, refusing to grow past `limit`.
pub struct DiskUploader {
    path: PathBuf,
    writer: BufWriter<File>,
    written: u64,
    limit: u64,
}

impl DiskUploader {
    pub async fn new(path: &Path, limit: u64) -> Result<Self, UploadError> {
        let file = File::create(path).await?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            written: 0,
            limit,
        })
    }

    pub async fn write_chunk(&mut self, chunk: Bytes) -> Result<(), UploadError> {
        let next = self.written + chunk.len() as u64;
        if next > self.limit {
            return Err(UploadError::TooLarge { limit: self.limit });
        }

        self.writer.write_all(&chunk).await?;
        self.written = next;
        Ok(())
    }

    /// Flushes to disk and returns the number of bytes stored.
    pub async fn finish(mut self) -> Result<u64, UploadError> {
        self.writer.flush().await?;
        self.writer.get_mut().sync_all().await?;
        Ok(self.written)
    }

    pub async fn abort(self) {
        let Self { path, writer, .. } = self;
        drop(writer);
        remove_partial(&path).await;
    }
}

/// Streams a multipart field into `path`. On any error the partial file is removed.
pub async fn stream_to_disk(
    mut field: Field<'_>,
    path: &Path,
    limit: u64,
) -> Result<u64, UploadError> {
    let mut uploader = DiskUploader::new(path, limit).await?;

    loop {
        let chunk = match field.next().await {
            Some(Ok(chunk)) => chunk,
            None => break,
            Some(Err(e)) => {
                error!("Stream error: {}", e);
                uploader.abort().await;
                // The request body limit surfaces here when the body has no Content-Length.
                if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    return Err(UploadError::TooLarge { limit });
                }
                return Err(UploadError::Stream(e.to_string()));
            }
        };

        if let Err(e) = uploader.write_chunk(chunk).await {
            uploader.abort().await;
            return Err(e);
        }
    }

    match uploader.finish().await {
        Ok(size) => Ok(size),
        Err(e) => {
            remove_partial(path).await;
            Err(e)
        }
    }
}

async fn remove_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!(path = %path.display(), "Failed to remove partial upload: {}", e);
    }
}
