//! Durable processing queue with a lossy wake-up channel.
//!
//! The `processing_requests` table is the source of truth. The channel only
//! tells an idle processor that there may be work; a dropped signal delays
//! a request until the next wake-up or restart, it never loses it.

use std::path::Path;

use tokio::sync::mpsc;
use tracing::{debug, info};

use homevault_core::result::AppResult;
use homevault_core::types::NodeId;
use homevault_database::repositories::processing as processing_repo;
use homevault_database::{DatabasePool, SqliteConnection};
use homevault_entity::processing::{NewProcessingRequest, ProcessingRequest};

/// Message on the wake-up channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueSignal {
    /// New requests may be pending.
    Wake,
    /// Finish in-flight work and shut down.
    Stop,
}

/// Enqueues processing requests and wakes the processor.
#[derive(Debug, Clone)]
pub struct ProcessingQueue {
    db: DatabasePool,
    signals: mpsc::Sender<QueueSignal>,
}

impl ProcessingQueue {
    /// Create a queue and the receiver the processor listens on.
    pub fn new(db: DatabasePool, capacity: usize) -> (Self, mpsc::Receiver<QueueSignal>) {
        let (signals, receiver) = mpsc::channel(capacity.max(1));
        (Self { db, signals }, receiver)
    }

    /// Insert a request as part of the caller's transaction.
    ///
    /// Call [`notify`](Self::notify) after the transaction commits.
    pub async fn enqueue_in(
        &self,
        conn: &mut SqliteConnection,
        node_id: NodeId,
        source_path: &Path,
        delete_source: bool,
    ) -> AppResult<ProcessingRequest> {
        let request = processing_repo::insert(
            conn,
            &NewProcessingRequest {
                node_id,
                source_path: source_path.to_string_lossy().into_owned(),
                delete_source,
            },
        )
        .await?;
        debug!(request_id = %request.id, node_id = %node_id, "Enqueued processing request");
        Ok(request)
    }

    /// Insert a request in its own transaction and wake the processor.
    pub async fn enqueue(
        &self,
        node_id: NodeId,
        source_path: &Path,
        delete_source: bool,
    ) -> AppResult<ProcessingRequest> {
        let mut tx = self.db.begin_write().await?;
        let request = self
            .enqueue_in(&mut tx, node_id, source_path, delete_source)
            .await?;
        tx.commit().await?;
        self.notify();
        Ok(request)
    }

    /// Wake the processor. Never blocks; a full or closed channel drops the
    /// signal.
    pub fn notify(&self) {
        if let Err(e) = self.signals.try_send(QueueSignal::Wake) {
            debug!(reason = %e, "Dropped processing wake-up signal");
        }
    }

    /// Atomically remove and return the oldest pending request.
    pub async fn take(&self) -> AppResult<Option<ProcessingRequest>> {
        let mut tx = self.db.begin_write().await?;
        let request = processing_repo::take_oldest(&mut tx).await?;
        tx.commit().await?;
        Ok(request)
    }

    /// Number of pending requests.
    pub async fn pending_count(&self) -> AppResult<i64> {
        let mut conn = self.db.acquire().await?;
        processing_repo::count(&mut conn).await
    }

    /// Oldest pending requests, up to `limit`.
    pub async fn pending(&self, limit: i64) -> AppResult<Vec<ProcessingRequest>> {
        let mut conn = self.db.acquire().await?;
        processing_repo::pending(&mut conn, limit).await
    }

    /// Ask the processor to shut down once in-flight work finishes.
    ///
    /// Unlike wake-ups, the stop signal waits for channel capacity.
    pub async fn stop(&self) {
        if self.signals.send(QueueSignal::Stop).await.is_err() {
            debug!("Processor already gone");
        } else {
            info!("Processing stop requested");
        }
    }
}
