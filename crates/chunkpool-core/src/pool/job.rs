//! Per-chunk job record and its state machine.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use super::chunk::Chunk;

/// Job identifier, unique within one queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Lifecycle state of a job.
///
/// `Waiting → Active → InProgress → Completed | Failed`. The last two are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Waiting,
    Active,
    InProgress,
    Completed,
    Failed,
}

impl JobState {
    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Waiting => "waiting",
            JobState::Active => "active",
            JobState::InProgress => "in_progress",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    fn to_u8(self) -> u8 {
        match self {
            JobState::Waiting => 0,
            JobState::Active => 1,
            JobState::InProgress => 2,
            JobState::Completed => 3,
            JobState::Failed => 4,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => JobState::Waiting,
            1 => JobState::Active,
            2 => JobState::InProgress,
            3 => JobState::Completed,
            _ => JobState::Failed,
        }
    }
}

/// One chunk's lifecycle record. Shared as `Arc<Job<P>>` between the queue and
/// the upload task that owns it while active; the state cell is the only
/// mutable part.
#[derive(Debug)]
pub struct Job<P = Vec<u8>> {
    id: JobId,
    chunk: Chunk<P>,
    state: AtomicU8,
}

impl<P> Job<P> {
    pub(crate) fn new(id: JobId, chunk: Chunk<P>) -> Self {
        Self {
            id,
            chunk,
            state: AtomicU8::new(JobState::Waiting.to_u8()),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn chunk(&self) -> &Chunk<P> {
        &self.chunk
    }

    pub fn state(&self) -> JobState {
        JobState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: JobState) {
        self.state.store(state.to_u8(), Ordering::Release);
    }
}

/// Terminal outcome of one job, published by the pool after the job is reaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub job_id: JobId,
    pub chunk_id: String,
    pub state: JobState,
    /// Uploader error text when `state` is `Failed`.
    pub error: Option<String>,
}
