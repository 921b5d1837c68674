use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;

use microjournal_domain::push::{BulkOutcome, PushEndpoint, PushMessage};
use microjournal_domain::shared::{DispatchJobId, DomainError};

use super::NotificationDispatcher;
use crate::application::config::DispatchConfig;

/// One bulk send waiting for a worker.
#[derive(Debug, Clone)]
pub struct DispatchJob {
    pub id: DispatchJobId,
    pub endpoints: Vec<PushEndpoint>,
    pub message: PushMessage,
}

impl DispatchJob {
    pub fn new(endpoints: Vec<PushEndpoint>, message: PushMessage) -> Self {
        Self {
            id: DispatchJobId::new(),
            endpoints,
            message,
        }
    }
}

/// Completion handle for a submitted job. Dropping it does not cancel the job.
#[derive(Debug)]
pub struct DispatchTicket {
    job_id: DispatchJobId,
    receiver: oneshot::Receiver<Result<BulkOutcome, DomainError>>,
}

impl DispatchTicket {
    pub fn job_id(&self) -> &DispatchJobId {
        &self.job_id
    }

    pub async fn wait(self) -> Result<BulkOutcome, DomainError> {
        self.receiver.await.map_err(|_| {
            DomainError::Infrastructure(format!(
                "Dispatch job {} was dropped before completing",
                self.job_id
            ))
        })?
    }
}

struct QueuedJob {
    job: DispatchJob,
    reply: oneshot::Sender<Result<BulkOutcome, DomainError>>,
}

/// Bounded queue of notification jobs drained by a fixed worker pool.
pub struct DispatchQueue {
    sender: Mutex<Option<mpsc::Sender<QueuedJob>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl DispatchQueue {
    /// Spawns the workers; must be called inside a tokio runtime.
    pub fn start(dispatcher: Arc<NotificationDispatcher>, config: &DispatchConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..config.workers.max(1))
            .map(|worker| {
                let receiver = Arc::clone(&receiver);
                let dispatcher = Arc::clone(&dispatcher);
                tokio::spawn(async move { Self::run_worker(worker, receiver, dispatcher).await })
            })
            .collect();

        info!(
            "✅ Dispatch queue started ({} workers, capacity {})",
            config.workers.max(1),
            config.queue_capacity.max(1)
        );

        Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
        }
    }

    async fn run_worker(
        worker: usize,
        receiver: Arc<Mutex<mpsc::Receiver<QueuedJob>>>,
        dispatcher: Arc<NotificationDispatcher>,
    ) {
        loop {
            // Hold the lock only while waiting for the next job.
            let next = receiver.lock().await.recv().await;
            let Some(QueuedJob { job, reply }) = next else {
                debug!("Dispatch worker {worker} exiting");
                break;
            };

            let result = dispatcher.send_bulk(&job.endpoints, &job.message).await;
            if let Err(e) = &result {
                error!("Dispatch job {} failed: {}", job.id, e);
            }
            // The submitter may have dropped its ticket.
            let _ = reply.send(result);
        }
    }

    /// Queue a job without waiting for capacity; a full queue is an error.
    pub async fn submit(&self, job: DispatchJob) -> Result<DispatchTicket, DomainError> {
        let guard = self.sender.lock().await;
        let sender = guard.as_ref().ok_or_else(|| {
            DomainError::Infrastructure("Dispatch queue is shut down".to_string())
        })?;

        let job_id = job.id.clone();
        let (reply, receiver) = oneshot::channel();
        sender
            .try_send(QueuedJob { job, reply })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    DomainError::Infrastructure("Dispatch queue is full".to_string())
                }
                mpsc::error::TrySendError::Closed(_) => {
                    DomainError::Infrastructure("Dispatch queue is closed".to_string())
                }
            })?;

        debug!("Queued dispatch job {job_id}");
        Ok(DispatchTicket { job_id, receiver })
    }

    /// Stop accepting jobs, drain what is queued, then wait for the workers.
    pub async fn shutdown(&self) {
        self.sender.lock().await.take();

        let workers: Vec<JoinHandle<()>> = self.workers.lock().await.drain(..).collect();
        info!("🛑 Waiting for {} dispatch workers...", workers.len());
        for handle in workers {
            if let Err(e) = handle.await {
                warn!("Dispatch worker ended abnormally: {}", e);
            }
        }
        info!("✅ Dispatch queue stopped");
    }
}
