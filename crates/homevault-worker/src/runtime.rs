//! Wiring shared by the server and the CLI.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use homevault_core::config::AppConfig;
use homevault_core::result::AppResult;
use homevault_core::traits::{MediaToolkit, MimeDetector};
use homevault_database::DatabasePool;
use homevault_service::{MutationEngine, NodeService, ProcessingQueue, QueueSignal, UserService};
use homevault_storage::{ContentMimeDetector, ShellMediaToolkit, StorageLayout};

use crate::processor::NodeProcessor;
use crate::scan::{ScanLease, Scanner};

/// Every long-lived component of a HomeVault process.
#[derive(Debug, Clone)]
pub struct Runtime {
    pub config: AppConfig,
    pub db: DatabasePool,
    pub layout: StorageLayout,
    pub queue: ProcessingQueue,
    pub nodes: NodeService,
    pub users: UserService,
    pub scanner: Scanner,
    pub processor: NodeProcessor,
}

impl Runtime {
    /// Open and migrate the catalog, create the data directories, and wire
    /// the components with the shell media toolkit.
    ///
    /// The returned receiver belongs to [`NodeProcessor::run`].
    pub async fn connect(config: AppConfig) -> AppResult<(Self, mpsc::Receiver<QueueSignal>)> {
        let db = DatabasePool::connect(&config.database).await?;
        db.migrate().await?;

        let layout = StorageLayout::from_config(&config.storage);
        layout.ensure_roots().await?;

        let toolkit = Arc::new(ShellMediaToolkit::new(config.media.clone(), layout.clone()));
        Ok(Self::assemble(config, db, toolkit))
    }

    /// Wire components over an already migrated catalog.
    pub fn assemble(
        config: AppConfig,
        db: DatabasePool,
        toolkit: Arc<dyn MediaToolkit>,
    ) -> (Self, mpsc::Receiver<QueueSignal>) {
        let layout = StorageLayout::from_config(&config.storage);
        let (queue, signals) = ProcessingQueue::new(db.clone(), config.processing.signal_capacity);
        let engine = MutationEngine::new(layout.clone());
        let mime: Arc<dyn MimeDetector> = Arc::new(ContentMimeDetector::new());

        let nodes = NodeService::new(db.clone(), engine.clone(), queue.clone(), mime);
        let users = UserService::new(db.clone(), engine);
        let scanner = Scanner::new(
            db.clone(),
            nodes.clone(),
            users.clone(),
            ScanLease::new(),
            &config.scan,
        );
        let processor = NodeProcessor::new(
            db.clone(),
            queue.clone(),
            layout.clone(),
            toolkit,
            config.media.thumb_method,
            config.processing.concurrency,
        );

        info!(
            files_root = %layout.files_root().display(),
            thumbs_root = %layout.thumbs_root().display(),
            home_root = %layout.home_root().display(),
            "Runtime assembled"
        );

        (
            Self {
                config,
                db,
                layout,
                queue,
                nodes,
                users,
                scanner,
                processor,
            },
            signals,
        )
    }
}
