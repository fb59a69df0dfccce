//! Uploader capability and the per-job drain step.

use std::panic::{self, AssertUnwindSafe};

use super::chunk::Chunk;
use super::error::UploadError;
use super::job::{Job, JobState};

/// Performs the actual transfer for one chunk. Called once per job from a
/// blocking worker thread; never under the queue lock.
pub trait Uploader<P>: Send + Sync + 'static {
    fn upload(&self, chunk: &Chunk<P>) -> Result<(), UploadError>;
}

impl<P, F> Uploader<P> for F
where
    F: Fn(&Chunk<P>) -> Result<(), UploadError> + Send + Sync + 'static,
{
    fn upload(&self, chunk: &Chunk<P>) -> Result<(), UploadError> {
        self(chunk)
    }
}

/// Run the upload for an active job and record its terminal state.
///
/// A panic inside the uploader is caught and turned into `UploadError::Panicked`
/// so the coordinator still hears about the job.
pub(crate) fn drain<P, U>(job: &Job<P>, uploader: &U) -> Result<(), UploadError>
where
    U: Uploader<P> + ?Sized,
{
    job.set_state(JobState::InProgress);
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| uploader.upload(job.chunk())))
        .unwrap_or_else(|payload| Err(UploadError::Panicked(panic_message(payload.as_ref()))));
    job.set_state(match outcome {
        Ok(()) => JobState::Completed,
        Err(_) => JobState::Failed,
    });
    outcome
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
