//! Concurrency-safe store of job lifecycle state.
//!
//! Every job enters as [`JobStatus::Processing`] and leaves it exactly once,
//! either through [`JobRegistry::complete`] (which publishes the comparison
//! summary in the same write) or through [`JobRegistry::fail`]. Terminal
//! records are never reopened.

use super::model::{FailureReason, Job, JobStatus};
use crate::modules::media::model::ComparisonSummary;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Job ID not found")]
    NotFound,

    #[error("Job {0} is already registered")]
    AlreadyRegistered(Uuid),

    #[error("Job {id} is already {current:?}")]
    InvalidTransition { id: Uuid, current: JobStatus },
}

pub trait JobRegistry: Send + Sync {
    /// Inserts a freshly created job in the `Processing` state.
    fn register(&self, job: Job) -> Result<(), RegistryError>;

    fn get(&self, id: Uuid) -> Option<Job>;

    fn status(&self, id: Uuid) -> Result<JobStatus, RegistryError>;

    fn summary(&self, id: Uuid) -> Option<ComparisonSummary>;

    /// `Processing -> Complete`, attaching the summary atomically.
    fn complete(
        &self,
        id: Uuid,
        output_path: PathBuf,
        summary: ComparisonSummary,
    ) -> Result<(), RegistryError>;

    /// `Processing -> Failed`.
    fn fail(&self, id: Uuid, reason: FailureReason) -> Result<(), RegistryError>;
}

#[derive(Debug, Default)]
pub struct InMemoryJobRegistry {
    jobs: RwLock<HashMap<Uuid, Job>>,
}

impl InMemoryJobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn transition<F>(&self, id: Uuid, apply: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&mut Job),
    {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        let job = jobs.get_mut(&id).ok_or(RegistryError::NotFound)?;

        if job.status.is_terminal() {
            return Err(RegistryError::InvalidTransition {
                id,
                current: job.status,
            });
        }

        apply(job);
        let finished_at = OffsetDateTime::now_utc();
        job.finished_at = Some(finished_at);

        debug!(
            job_id = %id,
            status = ?job.status,
            filename = %job.original_filename,
            input = %job.input_path.display(),
            size = job.size,
            lifetime = ?(finished_at - job.created_at),
            "Job reached terminal state"
        );
        Ok(())
    }
}

impl JobRegistry for InMemoryJobRegistry {
    fn register(&self, job: Job) -> Result<(), RegistryError> {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        if jobs.contains_key(&job.id) {
            return Err(RegistryError::AlreadyRegistered(job.id));
        }

        let job = Job {
            status: JobStatus::Processing,
            output_path: None,
            finished_at: None,
            failure: None,
            summary: None,
            ..job
        };
        jobs.insert(job.id, job);
        Ok(())
    }

    fn get(&self, id: Uuid) -> Option<Job> {
        let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
        jobs.get(&id).cloned()
    }

    fn status(&self, id: Uuid) -> Result<JobStatus, RegistryError> {
        let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
        jobs.get(&id).map(|job| job.status).ok_or(RegistryError::NotFound)
    }

    fn summary(&self, id: Uuid) -> Option<ComparisonSummary> {
        let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
        jobs.get(&id).and_then(|job| job.summary.clone())
    }

    fn complete(
        &self,
        id: Uuid,
        output_path: PathBuf,
        summary: ComparisonSummary,
    ) -> Result<(), RegistryError> {
        self.transition(id, |job| {
            job.status = JobStatus::Complete;
            job.output_path = Some(output_path);
            job.summary = Some(summary);
        })
    }

    fn fail(&self, id: Uuid, reason: FailureReason) -> Result<(), RegistryError> {
        self.transition(id, |job| {
            job.status = JobStatus::Failed;
            job.failure = Some(reason);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::media::comparison::compare;
    use crate::modules::media::model::MediaProfile;
    use std::sync::Arc;
    use std::time::Duration;

    fn new_job() -> Job {
        let id = Uuid::new_v4();
        Job::new(id, "clip.mov".into(), 10, PathBuf::from(format!("/tmp/{id}_input.mov")))
    }

    fn summary() -> ComparisonSummary {
        compare(
            MediaProfile { size: 100, ..Default::default() },
            MediaProfile { size: 40, ..Default::default() },
            Duration::from_secs(2),
        )
    }

    #[test]
    fn registered_job_is_processing() {
        let registry = InMemoryJobRegistry::new();
        let job = new_job();
        let id = job.id;

        registry.register(job).unwrap();

        assert_eq!(registry.status(id), Ok(JobStatus::Processing));
        assert!(registry.summary(id).is_none());
    }

    #[test]
    fn unknown_id_is_not_found() {
        let registry = InMemoryJobRegistry::new();
        registry.register(new_job()).unwrap();

        assert_eq!(registry.status(Uuid::new_v4()), Err(RegistryError::NotFound));
        assert!(registry.get(Uuid::new_v4()).is_none());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let registry = InMemoryJobRegistry::new();
        let job = new_job();
        let id = job.id;

        registry.register(job.clone()).unwrap();
        registry.fail(id, FailureReason::Encode).unwrap();

        assert_eq!(registry.register(job), Err(RegistryError::AlreadyRegistered(id)));
        assert_eq!(registry.status(id), Ok(JobStatus::Failed));
    }

    #[test]
    fn complete_publishes_summary_with_state() {
        let registry = InMemoryJobRegistry::new();
        let job = new_job();
        let id = job.id;
        registry.register(job).unwrap();

        registry
            .complete(id, PathBuf::from("/tmp/out.mp4"), summary())
            .unwrap();

        let job = registry.get(id).unwrap();
        assert_eq!(job.status, JobStatus::Complete);
        assert_eq!(job.summary, Some(summary()));
        assert_eq!(job.output_path, Some(PathBuf::from("/tmp/out.mp4")));
        assert!(job.finished_at.is_some());
        assert!(job.failure.is_none());
    }

    #[test]
    fn terminal_states_never_change() {
        let registry = InMemoryJobRegistry::new();
        let completed = new_job();
        let failed = new_job();
        let (completed_id, failed_id) = (completed.id, failed.id);
        registry.register(completed).unwrap();
        registry.register(failed).unwrap();

        registry.complete(completed_id, PathBuf::from("/tmp/a.mp4"), summary()).unwrap();
        registry.fail(failed_id, FailureReason::InputProbe).unwrap();

        assert_eq!(
            registry.fail(completed_id, FailureReason::Encode),
            Err(RegistryError::InvalidTransition { id: completed_id, current: JobStatus::Complete })
        );
        assert_eq!(
            registry.complete(failed_id, PathBuf::from("/tmp/b.mp4"), summary()),
            Err(RegistryError::InvalidTransition { id: failed_id, current: JobStatus::Failed })
        );

        assert_eq!(registry.status(completed_id), Ok(JobStatus::Complete));
        assert_eq!(registry.summary(completed_id), Some(summary()));
        assert_eq!(registry.status(failed_id), Ok(JobStatus::Failed));
        assert!(registry.summary(failed_id).is_none());
        assert_eq!(registry.get(failed_id).unwrap().failure, Some(FailureReason::InputProbe));
    }

    #[test]
    fn transition_of_unknown_job_is_not_found() {
        let registry = InMemoryJobRegistry::new();
        assert_eq!(
            registry.fail(Uuid::new_v4(), FailureReason::Encode),
            Err(RegistryError::NotFound)
        );
    }

    #[test]
    fn readers_of_different_jobs_do_not_wait_on_each_other() {
        let registry = Arc::new(InMemoryJobRegistry::new());
        let (first, second) = (new_job(), new_job());
        let (first_id, second_id) = (first.id, second.id);
        registry.register(first).unwrap();
        registry.register(second).unwrap();

        // A long-lived reader on the whole map must not stall other lookups.
        let held = registry.jobs.read().unwrap();
        assert_eq!(held.get(&first_id).map(|job| job.status), Some(JobStatus::Processing));

        let (tx, rx) = std::sync::mpsc::channel();
        let reader = registry.clone();
        std::thread::spawn(move || {
            tx.send((reader.status(first_id), reader.status(second_id))).unwrap();
        });

        let statuses = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(statuses, (Ok(JobStatus::Processing), Ok(JobStatus::Processing)));
        drop(held);
    }

    #[test]
    fn concurrent_writers_and_readers_stay_consistent() {
        let registry = Arc::new(InMemoryJobRegistry::new());
        let ids: Vec<Uuid> = (0..32)
            .map(|_| {
                let job = new_job();
                let id = job.id;
                registry.register(job).unwrap();
                id
            })
            .collect();

        let mut handles = Vec::new();
        for (i, id) in ids.iter().copied().enumerate() {
            let writer = registry.clone();
            handles.push(std::thread::spawn(move || {
                if i % 2 == 0 {
                    writer.complete(id, PathBuf::from("/tmp/x.mp4"), summary()).unwrap();
                } else {
                    writer.fail(id, FailureReason::Encode).unwrap();
                }
            }));
            let reader = registry.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    let job = reader.get(id).unwrap();
                    assert_eq!(job.status == JobStatus::Complete, job.summary.is_some());
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        for (i, id) in ids.into_iter().enumerate() {
            let expected = if i % 2 == 0 { JobStatus::Complete } else { JobStatus::Failed };
            assert_eq!(registry.status(id), Ok(expected));
        }
    }
}
