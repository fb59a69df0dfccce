//! Error kinds for admission, uploads, and pool construction.

use thiserror::Error;

/// Admission/scheduling errors returned by the job queue.
///
/// `NoWaitingJobs` and `MaxActiveJobs` are expected stop conditions for the
/// cycle loop; only `InvalidChunk` is meant to reach the submitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    /// Chunk was submitted without an identifier. The queue is unchanged.
    #[error("invalid chunk: missing id")]
    InvalidChunk,
    /// Activation requested with nothing waiting.
    #[error("no waiting jobs")]
    NoWaitingJobs,
    /// Activation requested while every slot is taken.
    #[error("max active jobs reached")]
    MaxActiveJobs,
}

/// Failure reported by an uploader for a single chunk. Terminal for that job.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    /// Destination or uploader refused the chunk (e.g. content mismatch).
    #[error("rejected: {0}")]
    Rejected(String),
    /// Uploader panicked; the job is failed so its slot can be reclaimed.
    #[error("uploader panicked: {0}")]
    Panicked(String),
}

impl UploadError {
    pub fn rejected(msg: impl Into<String>) -> Self {
        UploadError::Rejected(msg.into())
    }
}

/// Pool construction errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("max_jobs must be at least 1")]
    InvalidMaxJobs,
    #[error("upload pool needs a tokio runtime")]
    NoRuntime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_error_display() {
        assert_eq!(QueueError::InvalidChunk.to_string(), "invalid chunk: missing id");
        assert_eq!(QueueError::NoWaitingJobs.to_string(), "no waiting jobs");
        assert_eq!(QueueError::MaxActiveJobs.to_string(), "max active jobs reached");
    }

    #[test]
    fn upload_error_from_io() {
        let e: UploadError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(e, UploadError::Io(_)));
        assert_eq!(e.to_string(), "io: gone");
        assert_eq!(UploadError::rejected("bad hash").to_string(), "rejected: bad hash");
    }
}
