//! Waiting/active job queue and the admission gate.
//!
//! The queue itself does no locking; the pool serializes access to it.

use std::collections::VecDeque;
use std::sync::Arc;

use super::chunk::Chunk;
use super::error::QueueError;
use super::job::{Job, JobId, JobState};

/// FIFO waiting jobs plus a bounded active set.
#[derive(Debug)]
pub struct JobQueue<P = Vec<u8>> {
    max_jobs: usize,
    pub(crate) waiting_jobs: VecDeque<Arc<Job<P>>>,
    pub(crate) active_jobs: Vec<Arc<Job<P>>>,
    next_id: u64,
}

impl<P> JobQueue<P> {
    /// Queue admitting at most `max_jobs` active jobs. With `max_jobs == 0`
    /// nothing is ever activated.
    pub fn new(max_jobs: usize) -> Self {
        Self {
            max_jobs,
            waiting_jobs: VecDeque::new(),
            active_jobs: Vec::new(),
            next_id: 0,
        }
    }

    pub fn max_jobs(&self) -> usize {
        self.max_jobs
    }

    /// Wrap `chunk` in a waiting job at the tail. Returns the new waiting count.
    /// Submission is never refused for capacity; only activation is gated.
    pub fn add_job(&mut self, chunk: Chunk<P>) -> Result<usize, QueueError> {
        if !chunk.is_valid() {
            return Err(QueueError::InvalidChunk);
        }
        let id = JobId(self.next_id);
        self.next_id += 1;
        self.waiting_jobs.push_back(Arc::new(Job::new(id, chunk)));
        Ok(self.waiting_jobs.len())
    }

    /// Move the oldest waiting job into the active set.
    ///
    /// Capacity is the current length of the active set, not a counter, so an
    /// over-full active set (e.g. pre-populated) keeps refusing.
    pub fn activate_oldest_waiting_job(&mut self) -> Result<Arc<Job<P>>, QueueError> {
        if self.waiting_jobs.is_empty() {
            return Err(QueueError::NoWaitingJobs);
        }
        if self.active_jobs.len() >= self.max_jobs {
            return Err(QueueError::MaxActiveJobs);
        }
        let job = self
            .waiting_jobs
            .pop_front()
            .ok_or(QueueError::NoWaitingJobs)?;
        job.set_state(JobState::Active);
        self.active_jobs.push(Arc::clone(&job));
        Ok(job)
    }

    /// Remove a finished job from the active set, freeing its slot.
    pub fn finish_job(&mut self, id: JobId) -> Option<Arc<Job<P>>> {
        let pos = self.active_jobs.iter().position(|j| j.id() == id)?;
        Some(self.active_jobs.swap_remove(pos))
    }

    pub fn waiting_len(&self) -> usize {
        self.waiting_jobs.len()
    }

    pub fn active_len(&self) -> usize {
        self.active_jobs.len()
    }

    /// Nothing waiting and nothing in flight.
    pub fn is_idle(&self) -> bool {
        self.waiting_jobs.is_empty() && self.active_jobs.is_empty()
    }

    /// Chunk ids of waiting jobs, oldest first.
    pub fn waiting_chunk_ids(&self) -> Vec<&str> {
        self.waiting_jobs.iter().map(|j| j.chunk().id.as_str()).collect()
    }

    /// Chunk ids of active jobs (order not significant).
    pub fn active_chunk_ids(&self) -> Vec<&str> {
        self.active_jobs.iter().map(|j| j.chunk().id.as_str()).collect()
    }
}
