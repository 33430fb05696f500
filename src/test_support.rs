//! Fake `ffprobe`/`ffmpeg` executables for exercising the pipeline without a GPU.

use crate::config::settings::AppConfig;
use crate::infrastructure::queue::transcode::{TranscodeQueue, TranscodeTask};
use crate::infrastructure::storage::local::StorageService;
use crate::modules::job::model::{Job, JobStatus};
use crate::modules::job::registry::InMemoryJobRegistry;
use crate::state::AppState;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub const SAMPLE_PROBE_JSON: &str = r#"{
    "streams": [
        {
            "index": 0,
            "codec_type": "video",
            "codec_name": "h264",
            "width": 1920,
            "height": 1080,
            "pix_fmt": "yuv420p",
            "color_space": "bt709",
            "r_frame_rate": "30000/1001",
            "avg_frame_rate": "30000/1001",
            "bit_rate": "4000000"
        },
        {
            "index": 1,
            "codec_type": "audio",
            "codec_name": "aac",
            "bit_rate": "128000"
        },
        {
            "index": 2,
            "codec_type": "video",
            "codec_name": "mjpeg",
            "width": 320,
            "height": 240,
            "avg_frame_rate": "0/0",
            "r_frame_rate": "90000/1"
        },
        {
            "index": 3,
            "codec_type": "audio",
            "codec_name": "ac3",
            "bit_rate": "384000"
        }
    ],
    "format": {
        "format_name": "mov,mp4,m4a,3gp,3g2,mj2",
        "duration": "12.500000",
        "bit_rate": "4200000",
        "tags": {
            "encoder": "Lavf60.3.100",
            "major_brand": "isom"
        }
    }
}"#;

pub const FAKE_OUTPUT_BYTES: &[u8] = b"compressed";

pub enum FakeEncoder {
    /// Writes [`FAKE_OUTPUT_BYTES`] to the last argument and exits 0.
    Succeed,
    /// Prints a diagnostic and exits 1.
    Fail,
    /// Exits 0 without producing an output file.
    NoOutput,
    /// Never finishes on its own.
    Hang,
}

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

pub fn fake_ffprobe(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "fake-ffprobe",
        &format!("cat <<'EOF'\n{SAMPLE_PROBE_JSON}\nEOF"),
    )
}

pub fn fake_ffmpeg(dir: &Path, behaviour: FakeEncoder) -> PathBuf {
    let body = match behaviour {
        FakeEncoder::Succeed => format!(
            "for last; do :; done\nprintf '{}' > \"$last\"",
            String::from_utf8_lossy(FAKE_OUTPUT_BYTES)
        ),
        FakeEncoder::Fail => "echo 'No NVENC capable devices found' >&2\nexit 1".to_string(),
        FakeEncoder::NoOutput => "exit 0".to_string(),
        FakeEncoder::Hang => "exec sleep 30".to_string(),
    };
    write_script(dir, "fake-ffmpeg", &body)
}

pub async fn test_state(dir: &Path, ffprobe: PathBuf, ffmpeg: PathBuf) -> AppState {
    let config = AppConfig {
        upload_dir: dir.join("uploads"),
        output_dir: dir.join("static"),
        ffmpeg_bin: ffmpeg,
        ffprobe_bin: ffprobe,
        worker_count: 2,
        queue_capacity: 4,
        encode_timeout_secs: 30,
        pod_name: "test-pod".to_string(),
        ..AppConfig::default()
    };
    let storage = StorageService::new(&config.upload_dir, &config.output_dir)
        .await
        .unwrap();
    let queue = TranscodeQueue::new(config.worker_count, config.queue_capacity);

    AppState::new(config, Arc::new(InMemoryJobRegistry::new()), storage, queue)
}

/// Registers a job for `bytes` and pulls its task straight off the queue.
/// Only meaningful when no workers are consuming.
pub async fn enqueue_upload(state: &AppState, bytes: &[u8]) -> (Uuid, TranscodeTask) {
    let job_id = Uuid::new_v4();
    let input_path = state.storage.input_path(job_id, "clip.mp4");
    std::fs::write(&input_path, bytes).unwrap();

    state
        .registry
        .register(Job::new(job_id, "clip.mp4".into(), bytes.len() as u64, input_path.clone()))
        .unwrap();
    state
        .queue
        .reserve()
        .unwrap()
        .submit(job_id, input_path, state.storage.output_path(job_id))
        .unwrap();

    let task = state.queue.receiver().recv().await.unwrap();
    assert_eq!(task.job_id, job_id);
    (job_id, task)
}

pub async fn wait_for_terminal(state: &AppState, id: Uuid) -> JobStatus {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let status = state.registry.status(id).unwrap();
            if status.is_terminal() {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("Timed out waiting for job to finish")
}
