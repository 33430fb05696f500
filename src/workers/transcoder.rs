use crate::infrastructure::queue::transcode::TranscodeTask;
use crate::modules::job::model::FailureReason;
use crate::modules::media::comparison::compare;
use crate::modules::media::model::ComparisonSummary;
use crate::modules::media::probe::ProbeError;
use crate::state::AppState;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

// Fixed encoder contract: NVENC H.264 at 2 Mbit/s, AAC at 128 kbit/s.
pub const VIDEO_CODEC: &str = "h264_nvenc";
pub const VIDEO_PRESET: &str = "fast";
pub const VIDEO_BITRATE: &str = "2M";
pub const AUDIO_CODEC: &str = "aac";
pub const AUDIO_BITRATE: &str = "128k";

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to spawn ffmpeg: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("failed waiting for ffmpeg: {0}")]
    Wait(#[source] std::io::Error),

    #[error("ffmpeg exited with code {code:?}")]
    Exit { code: Option<i32>, output: String },

    #[error("ffmpeg timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("failed to get original video metrics: {0}")]
    InputProbe(#[source] ProbeError),

    #[error("GPU compression failed: {0}")]
    Encode(#[source] EncodeError),

    #[error("failed to get compressed video metrics: {0}")]
    OutputProbe(#[source] ProbeError),
}

impl TranscodeError {
    pub fn reason(&self) -> FailureReason {
        match self {
            TranscodeError::InputProbe(_) => FailureReason::InputProbe,
            TranscodeError::Encode(EncodeError::Timeout(_)) => FailureReason::EncodeTimeout,
            TranscodeError::Encode(_) => FailureReason::Encode,
            TranscodeError::OutputProbe(_) => FailureReason::OutputProbe,
        }
    }
}

/// Spawns `config.worker_count` workers sharing the transcode queue.
///
/// Each worker runs one job at a time; workers exit once the queue is closed
/// and drained.
pub fn start_transcoder_workers(state: AppState) -> Vec<JoinHandle<()>> {
    let count = state.config.worker_count;
    info!(workers = count, "🎥 Starting transcoder workers...");

    (0..count)
        .map(|worker| tokio::spawn(run_worker(state.clone(), worker)))
        .collect()
}

/// Closes the queue and waits up to `grace` for the workers to finish the
/// backlog. Returns `false` when the grace period ran out first; the
/// remaining workers are then dropped with the runtime.
pub async fn drain_workers(
    state: &AppState,
    handles: Vec<JoinHandle<()>>,
    grace: Duration,
) -> bool {
    state.queue.close();
    info!(workers = handles.len(), "Draining transcoder workers");

    match tokio::time::timeout(grace, futures_util::future::join_all(handles)).await {
        Ok(results) => {
            for result in results {
                if let Err(e) = result {
                    error!("Transcoder worker panicked: {}", e);
                }
            }
            true
        }
        Err(_) => {
            warn!(?grace, "Transcoder workers still busy at shutdown");
            false
        }
    }
}

async fn run_worker(state: AppState, worker: usize) {
    let receiver = state.queue.receiver();
    info!(worker, "🎥 Transcoder worker listening");

    while let Ok(task) = receiver.recv().await {
        process_job(&state, &task).await;
        // Dropping the task releases its queue slot.
    }

    info!(worker, "Transcoder worker stopped");
}

/// Runs one job to a terminal state. Never returns an error: every failure
/// is recorded on the job itself.
pub async fn process_job(state: &AppState, task: &TranscodeTask) {
    let job_id = task.job_id;
    let started = Instant::now();
    info!(job_id = %job_id, "Starting GPU compression");

    match run_pipeline(state, task, started).await {
        Ok(summary) => {
            info!(
                job_id = %job_id,
                ratio = %summary.compression_ratio,
                elapsed = %summary.processing_time,
                "✅ GPU compression completed"
            );
            if let Err(e) = state
                .registry
                .complete(job_id, task.output_path.clone(), summary)
            {
                warn!(job_id = %job_id, "Could not record completion: {}", e);
            }
        }
        Err(e) => {
            match &e {
                TranscodeError::Encode(EncodeError::Exit { output, .. }) => {
                    error!(job_id = %job_id, ffmpeg_output = %output, "❌ {}", e)
                }
                _ => error!(job_id = %job_id, "❌ {}", e),
            }
            if let Err(e) = state.registry.fail(job_id, e.reason()) {
                warn!(job_id = %job_id, "Could not record failure: {}", e);
            }
        }
    }
}

async fn run_pipeline(
    state: &AppState,
    task: &TranscodeTask,
    started: Instant,
) -> Result<ComparisonSummary, TranscodeError> {
    let original = state
        .inspector
        .inspect(&task.input_path)
        .await
        .map_err(TranscodeError::InputProbe)?;

    encode(
        &state.config.ffmpeg_bin,
        &task.input_path,
        &task.output_path,
        state.config.encode_timeout(),
    )
    .await
    .map_err(TranscodeError::Encode)?;

    let compressed = state
        .inspector
        .inspect(&task.output_path)
        .await
        .map_err(TranscodeError::OutputProbe)?;

    Ok(compare(original, compressed, started.elapsed()))
}

/// Runs ffmpeg with the fixed encoder contract, killing it if it outlives `timeout`.
pub async fn encode(
    ffmpeg: &Path,
    input: &Path,
    output: &Path,
    timeout: Duration,
) -> Result<(), EncodeError> {
    let child = Command::new(ffmpeg)
        .arg("-y")
        .arg("-i")
        .arg(input)
        .args([
            "-c:v", VIDEO_CODEC,
            "-preset", VIDEO_PRESET,
            "-b:v", VIDEO_BITRATE,
            "-c:a", AUDIO_CODEC,
            "-b:a", AUDIO_BITRATE,
        ])
        .arg(output)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(EncodeError::Spawn)?;

    // On expiry the wait future is dropped along with the child, which kills it.
    let result = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(EncodeError::Wait)?,
        Err(_) => return Err(EncodeError::Timeout(timeout)),
    };

    if !result.status.success() {
        let mut combined = String::from_utf8_lossy(&result.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&result.stderr));
        return Err(EncodeError::Exit {
            code: result.status.code(),
            output: combined,
        });
    }

    Ok(())
}
