//! Activity Log
//!
//! Access and audit entries are queued on a bounded channel and persisted
//! by one background worker, so request latency never includes a log write.
//!
//! ```text
//! handler / middleware → ActivityLog::record_* → mpsc → ActivityLogWorker → repository
//! ```
//!
//! A full queue drops the entry with a warning. The worker stops once every
//! [`ActivityLog`] handle is dropped and the queue is drained.

use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::domain::entity::{AccessLogEntry, AuditLogEntry};
use crate::domain::repository::ActivityLogRepository;

#[derive(Debug)]
pub enum ActivityEvent {
    Access(AccessLogEntry),
    Audit(AuditLogEntry),
}

/// Cheap-to-clone sending side
#[derive(Debug, Clone)]
pub struct ActivityLog {
    sender: mpsc::Sender<ActivityEvent>,
}

impl ActivityLog {
    /// Create the sink and the worker that drains it
    pub fn new<R>(repo: Arc<R>, capacity: usize) -> (Self, ActivityLogWorker<R>)
    where
        R: ActivityLogRepository + Send + Sync + 'static,
    {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, ActivityLogWorker { repo, receiver })
    }

    pub fn record_access(&self, entry: AccessLogEntry) {
        self.submit(ActivityEvent::Access(entry));
    }

    pub fn record_audit(&self, entry: AuditLogEntry) {
        self.submit(ActivityEvent::Audit(entry));
    }

    fn submit(&self, event: ActivityEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                tracing::warn!(event = ?event_kind(&event), "Activity log queue full, dropping entry");
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!("Activity log worker stopped, dropping entry");
            }
        }
    }
}

/// Receiving side; run it on its own task
pub struct ActivityLogWorker<R> {
    repo: Arc<R>,
    receiver: mpsc::Receiver<ActivityEvent>,
}

impl<R> ActivityLogWorker<R>
where
    R: ActivityLogRepository + Send + Sync + 'static,
{
    /// Persist entries until all senders are gone and the queue is empty
    pub async fn run(mut self) {
        tracing::info!("Activity log worker started");

        let mut written = 0u64;
        while let Some(event) = self.receiver.recv().await {
            self.persist(event).await;
            written += 1;
        }

        tracing::info!(entries = written, "Activity log worker drained and stopped");
    }

    async fn persist(&self, event: ActivityEvent) {
        match event {
            ActivityEvent::Access(entry) => {
                tracing::info!(
                    target: "access_log",
                    trace_id = %entry.trace_id,
                    user_id = ?entry.user_id.map(|id| id.to_string()),
                    method = %entry.method,
                    path = %entry.path,
                    status = entry.status,
                    latency_ms = entry.latency_ms,
                    "request"
                );
                if let Err(e) = self.repo.save_access_log(&entry).await {
                    tracing::warn!(error = %e, trace_id = %entry.trace_id, "Failed to persist access log");
                }
            }
            ActivityEvent::Audit(entry) => {
                tracing::info!(
                    target: "audit_log",
                    trace_id = %entry.trace_id,
                    domain = entry.domain,
                    action = entry.action,
                    success = entry.success,
                    identifier = %entry.identifier,
                    "audit"
                );
                if let Err(e) = self.repo.save_audit_log(&entry).await {
                    tracing::warn!(error = %e, trace_id = %entry.trace_id, "Failed to persist audit log");
                }
            }
        }
    }
}

fn event_kind(event: &ActivityEvent) -> &'static str {
    match event {
        ActivityEvent::Access(_) => "access",
        ActivityEvent::Audit(_) => "audit",
    }
}
