//! Bounded worker pool that drains the processing queue.
//!
//! Each wake-up signal lets one drainer task start once a concurrency slot
//! is free; a drainer claims requests one at a time until the queue is
//! empty. On start the processor drains whatever a previous run left
//! behind before it waits on signals.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, error, info, warn};

use homevault_core::error::ErrorKind;
use homevault_core::result::AppResult;
use homevault_core::traits::MediaToolkit;
use homevault_core::types::NodeId;
use homevault_core::types::media::{MediaClass, ThumbMethod};
use homevault_database::DatabasePool;
use homevault_database::repositories::node as node_repo;
use homevault_entity::node::Node;
use homevault_entity::processing::ProcessingRequest;
use homevault_service::{ProcessingQueue, QueueSignal};
use homevault_storage::{StorageLayout, local};

/// What processing one request changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessOutcome {
    /// The processed node, `None` when it no longer exists.
    pub node_id: Option<NodeId>,
    /// Probed duration in seconds.
    pub length: Option<f64>,
    /// Whether a thumbnail was written.
    pub thumbnail: bool,
    /// Whether the node row was updated.
    pub updated: bool,
    /// Whether the source file was removed afterwards.
    pub source_removed: bool,
}

/// Claims processing requests and derives duration and thumbnails.
#[derive(Debug, Clone)]
pub struct NodeProcessor {
    db: DatabasePool,
    queue: ProcessingQueue,
    layout: StorageLayout,
    toolkit: Arc<dyn MediaToolkit>,
    thumb_method: ThumbMethod,
    concurrency: usize,
}

impl NodeProcessor {
    /// Create a processor running at most `concurrency` drainers.
    pub fn new(
        db: DatabasePool,
        queue: ProcessingQueue,
        layout: StorageLayout,
        toolkit: Arc<dyn MediaToolkit>,
        thumb_method: ThumbMethod,
        concurrency: usize,
    ) -> Self {
        Self {
            db,
            queue,
            layout,
            toolkit,
            thumb_method,
            concurrency: concurrency.max(1),
        }
    }

    /// Run until a [`QueueSignal::Stop`] arrives or the channel closes,
    /// then wait for in-flight drainers to finish.
    pub async fn run(self, mut signals: mpsc::Receiver<QueueSignal>) {
        let slots = Arc::new(Semaphore::new(self.concurrency));
        info!(concurrency = self.concurrency, "Node processor started");

        // Leftovers from a previous run.
        self.start_drainer(&slots).await;

        while let Some(signal) = signals.recv().await {
            match signal {
                QueueSignal::Wake => self.start_drainer(&slots).await,
                QueueSignal::Stop => {
                    info!("Node processor stopping");
                    break;
                }
            }
        }

        // Every permit back means every drainer has finished.
        match slots.acquire_many(self.concurrency as u32).await {
            Ok(_all) => info!("Node processor stopped"),
            Err(e) => error!(error = %e, "Processor semaphore closed"),
        }
    }

    /// Wait for a free slot, then spawn a drainer holding it.
    async fn start_drainer(&self, slots: &Arc<Semaphore>) {
        let permit = match Arc::clone(slots).acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                error!(error = %e, "Processor semaphore closed");
                return;
            }
        };

        let processor = self.clone();
        tokio::spawn(async move {
            let _permit = permit;
            match processor.drain().await {
                Ok(0) => {}
                Ok(processed) => debug!(processed, "Drainer finished"),
                Err(e) => error!(error = %e, "Drainer failed to claim a request"),
            }
        });
    }

    /// Process requests until the queue is empty. Returns how many were
    /// claimed.
    pub async fn drain(&self) -> AppResult<usize> {
        let mut processed = 0;
        while self.process_next().await?.is_some() {
            processed += 1;
        }
        Ok(processed)
    }

    /// Claim and process the oldest request, if any.
    pub async fn process_next(&self) -> AppResult<Option<ProcessOutcome>> {
        match self.queue.take().await? {
            Some(request) => Ok(Some(self.process_request(&request).await)),
            None => Ok(None),
        }
    }

    /// Process one claimed request. Failures are logged and never retried.
    pub async fn process_request(&self, request: &ProcessingRequest) -> ProcessOutcome {
        let source = PathBuf::from(&request.source_path);
        let mut outcome = self.apply_media(request, &source).await;

        if request.delete_source {
            outcome.source_removed = local::remove_best_effort(&source, "processed upload").await;
        }
        outcome
    }

    async fn apply_media(&self, request: &ProcessingRequest, source: &Path) -> ProcessOutcome {
        let mut outcome = ProcessOutcome::default();

        let node = match self.load_node(request.node_id).await {
            Ok(Some(node)) => node,
            Ok(None) => {
                debug!(request_id = %request.id, node_id = %request.node_id, "Node gone, skipping");
                return outcome;
            }
            Err(e) => {
                error!(request_id = %request.id, node_id = %request.node_id, error = %e, "Failed to load node");
                return outcome;
            }
        };
        outcome.node_id = Some(node.id);

        let class = MediaClass::of(&node.mime_type);
        let mut length = node.length;
        let mut has_thumb = node.has_custom_thumb;

        if class.has_duration() {
            match self.toolkit.probe_duration(source).await {
                Ok(seconds) => {
                    length = Some(seconds);
                    outcome.length = Some(seconds);
                }
                Err(e) => warn!(node_id = %node.id, error = %e, "Duration probe failed"),
            }
        }

        if class.is_thumbnailable() {
            match self.write_thumbnail(node.id, source, &node.mime_type).await {
                Ok(()) => {
                    has_thumb = true;
                    outcome.thumbnail = true;
                }
                Err(e) => warn!(node_id = %node.id, error = %e, "Thumbnail generation failed"),
            }
        }

        if length != node.length || has_thumb != node.has_custom_thumb {
            match self.save_media(node.id, length, has_thumb).await {
                Ok(()) => outcome.updated = true,
                // Deleted while the tools ran.
                Err(e) if e.is(ErrorKind::NotFound) => {
                    debug!(node_id = %node.id, "Node deleted during processing")
                }
                Err(e) => error!(node_id = %node.id, error = %e, "Failed to save media fields"),
            }
        }

        info!(
            request_id = %request.id,
            node_id = %node.id,
            mime_type = %node.mime_type,
            length = ?outcome.length,
            thumbnail = outcome.thumbnail,
            "Processed node"
        );
        outcome
    }

    async fn load_node(&self, id: NodeId) -> AppResult<Option<Node>> {
        let mut conn = self.db.acquire().await?;
        node_repo::find_by_id(&mut conn, id).await
    }

    async fn write_thumbnail(&self, id: NodeId, source: &Path, mime: &str) -> AppResult<()> {
        local::ensure_dir(&self.layout.thumb_dir(id)).await?;
        self.toolkit
            .generate_thumbnail(source, &self.layout.thumb_path(id), mime, self.thumb_method)
            .await
    }

    async fn save_media(&self, id: NodeId, length: Option<f64>, has_thumb: bool) -> AppResult<()> {
        let mut tx = self.db.begin_write().await?;
        node_repo::update_media(&mut tx, id, length, has_thumb).await?;
        tx.commit().await
    }
}
