//! Pool: admission through the job queue, uploads on blocking workers, and a
//! coordinator that reaps completions and backfills freed slots.
//!
//! Queue state lives behind one async mutex. Upload tasks never touch it; they
//! send `(job_id, outcome)` over a channel that only the coordinator reads.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tokio::task::JoinHandle;

use super::chunk::Chunk;
use super::config::PoolConfig;
use super::error::{PoolError, QueueError, UploadError};
use super::job::{Job, JobId, JobReport, JobState};
use super::queue::JobQueue;
use super::stats::PoolStats;
use super::uploader::{drain, Uploader};

/// Reports buffered per subscriber before slow receivers start lagging.
const REPORT_CAPACITY: usize = 1024;

enum Event {
    Completed {
        job_id: JobId,
        outcome: Result<(), UploadError>,
    },
    Shutdown,
}

struct Inner<P> {
    queue: JobQueue<P>,
    completed: u64,
    failed: u64,
}

impl<P> Inner<P> {
    fn stats(&self) -> PoolStats {
        PoolStats {
            waiting: self.queue.waiting_len(),
            active: self.queue.active_len(),
            completed: self.completed,
            failed: self.failed,
        }
    }
}

struct Shared<P, U> {
    inner: Mutex<Inner<P>>,
    uploader: Arc<U>,
    max_jobs: usize,
    auto_cycle: bool,
    events: mpsc::UnboundedSender<Event>,
    stats: watch::Sender<PoolStats>,
    reports: broadcast::Sender<JobReport>,
}

impl<P, U> Shared<P, U>
where
    P: Send + Sync + 'static,
    U: Uploader<P>,
{
    /// Activate while slots and waiting jobs remain; start an upload for each.
    /// Caller holds the queue lock.
    fn cycle_locked(&self, inner: &mut Inner<P>) -> usize {
        let mut started = 0;
        loop {
            match inner.queue.activate_oldest_waiting_job() {
                Ok(job) => {
                    self.launch(job);
                    started += 1;
                }
                // NoWaitingJobs / MaxActiveJobs: nothing more to do until a slot frees.
                Err(_) => break,
            }
        }
        started
    }

    fn launch(&self, job: Arc<Job<P>>) {
        tracing::debug!(job = %job.id(), chunk = %job.chunk().id, "upload started");
        let uploader = Arc::clone(&self.uploader);
        let events = self.events.clone();
        tokio::task::spawn_blocking(move || {
            let outcome = drain(job.as_ref(), uploader.as_ref());
            let _ = events.send(Event::Completed {
                job_id: job.id(),
                outcome,
            });
        });
    }

    async fn complete(&self, job_id: JobId, outcome: Result<(), UploadError>) {
        let mut inner = self.inner.lock().await;
        let Some(job) = inner.queue.finish_job(job_id) else {
            tracing::warn!(job = %job_id, "completion for a job that is not active");
            return;
        };

        let state = match &outcome {
            Ok(()) => JobState::Completed,
            Err(_) => JobState::Failed,
        };
        job.set_state(state);
        let error = outcome.err().map(|e| e.to_string());
        match &error {
            None => {
                inner.completed += 1;
                tracing::debug!(job = %job_id, chunk = %job.chunk().id, "upload completed");
            }
            Some(e) => {
                inner.failed += 1;
                tracing::warn!(job = %job_id, chunk = %job.chunk().id, "upload failed: {}", e);
            }
        }

        if self.auto_cycle {
            self.cycle_locked(&mut inner);
        }
        self.publish(&inner);
        drop(inner);

        let _ = self.reports.send(JobReport {
            job_id,
            chunk_id: job.chunk().id.clone(),
            state,
            error,
        });
    }

    fn publish(&self, inner: &Inner<P>) {
        self.stats.send_replace(inner.stats());
    }
}

/// Bounded-concurrency upload pool.
///
/// At most `max_jobs` uploads run at once; waiting chunks are promoted in
/// submission order. Must be created inside a tokio runtime
/// (`PoolError::NoRuntime` otherwise).
pub struct Pool<P, U> {
    shared: Arc<Shared<P, U>>,
    coordinator: Option<JoinHandle<()>>,
}

impl<P, U> Pool<P, U>
where
    P: Send + Sync + 'static,
    U: Uploader<P>,
{
    /// Pool with automatic cycling and `max_jobs` slots.
    pub fn new(uploader: U, max_jobs: usize) -> Result<Self, PoolError> {
        Self::with_config(uploader, PoolConfig::new(max_jobs))
    }

    /// Pool from an explicit config. Rejects `max_jobs == 0` and construction
    /// outside a tokio runtime.
    pub fn with_config(uploader: U, config: PoolConfig) -> Result<Self, PoolError> {
        if config.max_jobs == 0 {
            return Err(PoolError::InvalidMaxJobs);
        }
        let runtime = Handle::try_current().map_err(|_| PoolError::NoRuntime)?;

        let (events, events_rx) = mpsc::unbounded_channel();
        let (stats, _) = watch::channel(PoolStats::default());
        let (reports, _) = broadcast::channel(REPORT_CAPACITY);
        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner {
                queue: JobQueue::new(config.max_jobs),
                completed: 0,
                failed: 0,
            }),
            uploader: Arc::new(uploader),
            max_jobs: config.max_jobs,
            auto_cycle: config.auto_cycle,
            events,
            stats,
            reports,
        });
        let coordinator = runtime.spawn(coordinate(Arc::clone(&shared), events_rx));

        tracing::debug!(
            max_jobs = config.max_jobs,
            auto_cycle = config.auto_cycle,
            "upload pool started"
        );
        Ok(Self {
            shared,
            coordinator: Some(coordinator),
        })
    }

    /// Queue a chunk and, with automatic cycling, start it if a slot is free.
    /// Returns the waiting count right after queueing.
    pub async fn submit(&self, chunk: Chunk<P>) -> Result<usize, QueueError> {
        let mut inner = self.shared.inner.lock().await;
        let waiting = inner.queue.add_job(chunk)?;
        if self.shared.auto_cycle {
            self.shared.cycle_locked(&mut inner);
        }
        self.shared.publish(&inner);
        Ok(waiting)
    }

    /// Fill free slots from the waiting queue. Returns the number of uploads started.
    pub async fn cycle(&self) -> usize {
        let mut inner = self.shared.inner.lock().await;
        let started = self.shared.cycle_locked(&mut inner);
        self.shared.publish(&inner);
        started
    }

    /// Promote exactly one waiting job and start its upload.
    pub async fn activate_oldest_waiting_job(&self) -> Result<JobId, QueueError> {
        let mut inner = self.shared.inner.lock().await;
        let job = inner.queue.activate_oldest_waiting_job()?;
        let id = job.id();
        self.shared.launch(job);
        self.shared.publish(&inner);
        Ok(id)
    }

    pub async fn stats(&self) -> PoolStats {
        self.shared.inner.lock().await.stats()
    }

    pub async fn waiting_chunk_ids(&self) -> Vec<String> {
        let inner = self.shared.inner.lock().await;
        inner
            .queue
            .waiting_chunk_ids()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub async fn active_chunk_ids(&self) -> Vec<String> {
        let inner = self.shared.inner.lock().await;
        inner
            .queue
            .active_chunk_ids()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn max_jobs(&self) -> usize {
        self.shared.max_jobs
    }

    /// Stats updates, published after every queue mutation.
    pub fn watch_stats(&self) -> watch::Receiver<PoolStats> {
        self.shared.stats.subscribe()
    }

    /// Terminal job reports from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<JobReport> {
        self.shared.reports.subscribe()
    }

    /// Wait until nothing is waiting or in flight. With automatic cycling off,
    /// waiting jobs must be activated by the caller or this never returns.
    pub async fn wait_idle(&self) -> PoolStats {
        let mut rx = self.watch_stats();
        let idle = rx.wait_for(PoolStats::is_idle).await.map(|stats| *stats);
        idle.unwrap_or_else(|_| *rx.borrow())
    }

    /// Let in-flight uploads finish, then stop the coordinator.
    pub async fn shutdown(mut self) -> PoolStats {
        let _ = self.shared.events.send(Event::Shutdown);
        if let Some(handle) = self.coordinator.take() {
            if let Err(e) = handle.await {
                tracing::warn!("pool coordinator join: {}", e);
            }
        }
        let stats = self.shared.inner.lock().await.stats();
        tracing::info!(
            completed = stats.completed,
            failed = stats.failed,
            "upload pool shut down"
        );
        stats
    }
}

impl<P, U> Drop for Pool<P, U> {
    fn drop(&mut self) {
        if self.coordinator.is_some() {
            let _ = self.shared.events.send(Event::Shutdown);
        }
    }
}

/// Consume completion events until shut down and no upload is in flight.
async fn coordinate<P, U>(shared: Arc<Shared<P, U>>, mut events: mpsc::UnboundedReceiver<Event>)
where
    P: Send + Sync + 'static,
    U: Uploader<P>,
{
    let mut closing = false;
    while let Some(event) = events.recv().await {
        match event {
            Event::Completed { job_id, outcome } => shared.complete(job_id, outcome).await,
            Event::Shutdown => closing = true,
        }
        if closing {
            let inner = shared.inner.lock().await;
            if inner.queue.active_len() == 0 {
                let abandoned = inner.queue.waiting_len();
                if abandoned > 0 {
                    tracing::warn!("pool stopped with {} job(s) never activated", abandoned);
                }
                break;
            }
        }
    }
    tracing::debug!("pool coordinator stopped");
}
