//! Background worker pool for audit events
//!
//! Events are sharded by entity so that all events for one entity are
//! handled by the same worker, in submission order. Different entities are
//! processed in parallel. Submitting never blocks: a full queue drops the
//! event with an error the listener logs.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use super::pipeline::{AuditEvent, AuditPipeline, EventSink};
use crate::config::Settings;
use crate::error::{AuditError, AuditResult};
use crate::models::EntityInfo;

pub struct AuditDispatcher {
    senders: Vec<mpsc::Sender<AuditEvent>>,
    workers: Vec<JoinHandle<()>>,
}

impl AuditDispatcher {
    /// Spawn `worker_count` workers on the current tokio runtime
    pub fn start(
        pipeline: Arc<AuditPipeline>,
        worker_count: usize,
        capacity: usize,
    ) -> AuditResult<Self> {
        let handle = Handle::try_current()
            .map_err(|e| AuditError::Dispatch(format!("No tokio runtime: {}", e)))?;
        if worker_count == 0 || capacity == 0 {
            return Err(AuditError::Validation(
                "worker count and queue capacity must be at least 1".into(),
            ));
        }

        let mut senders = Vec::with_capacity(worker_count);
        let mut workers = Vec::with_capacity(worker_count);
        for index in 0..worker_count {
            let (tx, rx) = mpsc::channel(capacity);
            senders.push(tx);
            workers.push(handle.spawn(run_worker(index, rx, Arc::clone(&pipeline))));
        }

        tracing::debug!(worker_count, capacity, "audit dispatcher started");
        Ok(Self { senders, workers })
    }

    pub fn from_settings(pipeline: Arc<AuditPipeline>, settings: &Settings) -> AuditResult<Self> {
        Self::start(pipeline, settings.worker_count, settings.queue_capacity)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stop accepting events and wait for queued ones to finish
    pub async fn shutdown(self) {
        drop(self.senders);
        for (index, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.await {
                tracing::error!(worker = index, error = %e, "audit worker ended abnormally");
            }
        }
        tracing::debug!("audit dispatcher stopped");
    }

    fn shard(&self, info: &EntityInfo) -> usize {
        let mut hasher = DefaultHasher::new();
        info.entity_kind.hash(&mut hasher);
        info.entity_id.hash(&mut hasher);
        (hasher.finish() % self.senders.len() as u64) as usize
    }
}

impl EventSink for AuditDispatcher {
    fn submit(&self, event: AuditEvent) -> AuditResult<()> {
        let shard = self.shard(&event.info);
        self.senders[shard].try_send(event).map_err(|e| match e {
            TrySendError::Full(event) => AuditError::Dispatch(format!(
                "queue {} full, dropped event for {}",
                shard,
                event.info.key()
            )),
            TrySendError::Closed(_) => AuditError::Dispatch(format!("queue {} closed", shard)),
        })
    }
}

async fn run_worker(index: usize, mut rx: mpsc::Receiver<AuditEvent>, pipeline: Arc<AuditPipeline>) {
    while let Some(event) = rx.recv().await {
        let pipeline = Arc::clone(&pipeline);
        // Diffing and file writes are synchronous
        match tokio::task::spawn_blocking(move || pipeline.handle(event)).await {
            Ok(outcome) => tracing::trace!(worker = index, ?outcome, "audit event handled"),
            Err(e) => tracing::error!(worker = index, error = %e, "audit task panicked"),
        }
    }
}
