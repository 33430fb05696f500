//! Bounded hand-off between upload requests and the transcoder worker pool.
//!
//! Admission is decided before an upload touches the disk: a caller first
//! [`reserve`](TranscodeQueue::reserve)s a slot, which fails fast with
//! [`QueueError::Saturated`] once every worker is busy and the backlog is full.
//! The slot travels with the queued task and is released when the worker that
//! ran it drops the task.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("transcode queue is saturated")]
    Saturated,

    #[error("transcode queue is closed")]
    Closed,
}

#[derive(Debug)]
pub struct TranscodeTask {
    pub job_id: Uuid,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    _slot: OwnedSemaphorePermit,
}

/// A reserved place in the queue. Dropping it without submitting frees the slot.
#[derive(Debug)]
pub struct QueueSlot {
    sender: async_channel::Sender<TranscodeTask>,
    permit: OwnedSemaphorePermit,
}

impl QueueSlot {
    pub fn submit(
        self,
        job_id: Uuid,
        input_path: PathBuf,
        output_path: PathBuf,
    ) -> Result<(), QueueError> {
        let task = TranscodeTask {
            job_id,
            input_path,
            output_path,
            _slot: self.permit,
        };

        // Channel capacity equals the number of slots, so a held slot
        // guarantees room and only a closed channel can fail here.
        self.sender.try_send(task).map_err(|e| match e {
            async_channel::TrySendError::Full(_) => QueueError::Saturated,
            async_channel::TrySendError::Closed(_) => QueueError::Closed,
        })?;

        debug!(job_id = %job_id, "Transcode task queued");
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct TranscodeQueue {
    sender: async_channel::Sender<TranscodeTask>,
    receiver: async_channel::Receiver<TranscodeTask>,
    slots: Arc<Semaphore>,
}

impl TranscodeQueue {
    /// `workers` running tasks plus `backlog` waiting ones may be admitted at once.
    pub fn new(workers: usize, backlog: usize) -> Self {
        let capacity = (workers + backlog).max(1);
        let (sender, receiver) = async_channel::bounded(capacity);

        Self {
            sender,
            receiver,
            slots: Arc::new(Semaphore::new(capacity)),
        }
    }

    pub fn reserve(&self) -> Result<QueueSlot, QueueError> {
        if self.sender.is_closed() {
            return Err(QueueError::Closed);
        }

        let permit = self
            .slots
            .clone()
            .try_acquire_owned()
            .map_err(|_| QueueError::Saturated)?;

        Ok(QueueSlot {
            sender: self.sender.clone(),
            permit,
        })
    }

    pub fn receiver(&self) -> async_channel::Receiver<TranscodeTask> {
        self.receiver.clone()
    }

    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    /// Stops accepting tasks. Tasks already queued are still delivered, and
    /// receivers see the channel end once the backlog is empty.
    pub fn close(&self) {
        self.sender.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submit(queue: &TranscodeQueue) -> Result<Uuid, QueueError> {
        let id = Uuid::new_v4();
        queue
            .reserve()?
            .submit(id, PathBuf::from("in.mp4"), PathBuf::from("out.mp4"))?;
        Ok(id)
    }

    #[test]
    fn saturates_after_workers_plus_backlog() {
        let queue = TranscodeQueue::new(1, 2);

        for _ in 0..3 {
            submit(&queue).unwrap();
        }

        assert_eq!(queue.available_slots(), 0);
        assert_eq!(submit(&queue), Err(QueueError::Saturated));
    }

    #[tokio::test]
    async fn finishing_a_task_frees_its_slot() {
        let queue = TranscodeQueue::new(1, 0);
        let first = submit(&queue).unwrap();
        assert_eq!(submit(&queue), Err(QueueError::Saturated));

        let task = queue.receiver().recv().await.unwrap();
        assert_eq!(task.job_id, first);
        assert_eq!(queue.available_slots(), 0);

        drop(task);
        assert_eq!(queue.available_slots(), 1);
        submit(&queue).unwrap();
    }

    #[test]
    fn unused_slot_is_released() {
        let queue = TranscodeQueue::new(1, 0);
        let slot = queue.reserve().unwrap();
        assert_eq!(queue.available_slots(), 0);

        drop(slot);
        assert_eq!(queue.available_slots(), 1);
    }

    #[tokio::test]
    async fn closed_queue_still_delivers_backlog() {
        let queue = TranscodeQueue::new(1, 1);
        let first = submit(&queue).unwrap();
        let second = submit(&queue).unwrap();
        queue.close();

        let receiver = queue.receiver();
        assert_eq!(receiver.recv().await.unwrap().job_id, first);
        assert_eq!(receiver.recv().await.unwrap().job_id, second);
        assert!(receiver.recv().await.is_err());
    }

    #[test]
    fn closed_queue_rejects() {
        let queue = TranscodeQueue::new(2, 2);
        let slot = queue.reserve().unwrap();
        queue.close();

        assert_eq!(
            slot.submit(Uuid::new_v4(), PathBuf::new(), PathBuf::new()),
            Err(QueueError::Closed)
        );
        assert_eq!(queue.reserve().err(), Some(QueueError::Closed));
    }
}
