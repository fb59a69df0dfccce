//! Bounded-concurrency upload pool.
//!
//! Chunks are wrapped in jobs and queued FIFO; at most `max_jobs` are active
//! (uploading) at once. Each completion frees a slot and the oldest waiting
//! job takes it:
//!
//! `submit → JobQueue::add_job → cycle → upload task → completion → cycle → ...`

mod chunk;
mod config;
mod error;
mod job;
mod queue;
mod run;
mod stats;
mod uploader;

pub use chunk::Chunk;
pub use config::PoolConfig;
pub use error::{PoolError, QueueError, UploadError};
pub use job::{Job, JobId, JobReport, JobState};
pub use queue::JobQueue;
pub use run::Pool;
pub use stats::PoolStats;
pub use uploader::Uploader;
