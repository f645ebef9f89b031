//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::mpsc;

use homevault_core::config::{AppConfig, DatabaseConfig, IngestMode, StorageConfig};
use homevault_core::error::AppError;
use homevault_core::result::AppResult;
use homevault_core::traits::MediaToolkit;
use homevault_core::types::media::ThumbMethod;
use homevault_database::DatabasePool;
use homevault_entity::node::Node;
use homevault_entity::user::User;
use homevault_service::{Actor, QueueSignal};
use homevault_worker::Runtime;

/// PNG signature followed by filler.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01";
/// An ISO base media header with an `mp42` brand.
pub const MP4_BYTES: &[u8] = b"\0\0\0\x18ftypmp42\0\0\0\0mp42isom\0\0\0\x08free";
/// An ID3v2 tag header.
pub const MP3_BYTES: &[u8] = b"ID3\x03\0\0\0\0\0\x0f\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0";

/// Media toolkit that writes a marker thumbnail instead of shelling out.
#[derive(Debug, Default)]
pub struct FakeMediaToolkit {
    pub duration: f64,
    pub fail_probe: AtomicBool,
    pub fail_thumbnails: AtomicBool,
    /// Milliseconds each thumbnail takes.
    pub thumbnail_delay_ms: AtomicU64,
    pub probes: AtomicUsize,
    pub thumbnails: AtomicUsize,
}

impl FakeMediaToolkit {
    pub fn new() -> Self {
        Self {
            duration: 42.5,
            ..Self::default()
        }
    }

    pub fn set_thumbnails_failing(&self, failing: bool) {
        self.fail_thumbnails.store(failing, Ordering::SeqCst);
    }

    pub fn set_thumbnail_delay(&self, delay: Duration) {
        self.thumbnail_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set_probe_failing(&self, failing: bool) {
        self.fail_probe.store(failing, Ordering::SeqCst);
    }

    pub fn probe_calls(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn thumbnail_calls(&self) -> usize {
        self.thumbnails.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaToolkit for FakeMediaToolkit {
    async fn probe_duration(&self, path: &Path) -> AppResult<f64> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if self.fail_probe.load(Ordering::SeqCst) {
            return Err(AppError::external(format!("probe failed for {}", path.display())));
        }
        Ok(self.duration)
    }

    async fn generate_thumbnail(
        &self,
        source: &Path,
        dest: &Path,
        mime: &str,
        _method: ThumbMethod,
    ) -> AppResult<()> {
        self.thumbnails.fetch_add(1, Ordering::SeqCst);
        let delay = self.thumbnail_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_thumbnails.load(Ordering::SeqCst) {
            return Err(AppError::external(format!("convert failed for {mime}")));
        }
        tokio::fs::metadata(source).await?;
        tokio::fs::write(dest, b"thumb").await?;
        Ok(())
    }
}

/// Test application context
pub struct TestApp {
    pub runtime: Runtime,
    pub toolkit: Arc<FakeMediaToolkit>,
    /// Receiver for [`run_processor`](Self::run_processor); taken once.
    pub signals: Option<mpsc::Receiver<QueueSignal>>,
    pub dir: TempDir,
}

impl TestApp {
    /// A fresh catalog and storage tree in a temporary directory.
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = AppConfig {
            database: DatabaseConfig {
                url: format!("sqlite://{}", dir.path().join("catalog.db").display()),
                ..DatabaseConfig::default()
            },
            storage: StorageConfig {
                data_root: dir.path().join("data").display().to_string(),
                ..StorageConfig::default()
            },
            ..AppConfig::default()
        };
        config.scan.concurrency = 4;
        config.processing.concurrency = 2;

        let db = DatabasePool::connect(&config.database)
            .await
            .expect("connect");
        db.migrate().await.expect("migrate");

        let toolkit = Arc::new(FakeMediaToolkit::new());
        let (runtime, signals) = Runtime::assemble(config, db, toolkit.clone());
        runtime.layout.ensure_roots().await.expect("roots");

        Self {
            runtime,
            toolkit,
            signals: Some(signals),
            dir,
        }
    }

    /// Create a user and return it with its root and an actor for it.
    pub async fn create_user(&self, name: &str, admin: bool) -> (User, Node, Actor) {
        let (user, root) = self
            .runtime
            .users
            .create(name, admin)
            .await
            .expect("create user");
        let actor = Actor::for_user(&user);
        (user, root, actor)
    }

    /// Write a file outside the storage roots to use as an upload.
    pub fn write_upload(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let uploads = self.dir.path().join("uploads");
        std::fs::create_dir_all(&uploads).expect("uploads dir");
        let path = uploads.join(name);
        std::fs::write(&path, bytes).expect("write upload");
        path
    }

    /// Write a file under a user's physical home directory.
    pub fn write_home(&self, user: &str, relative: &str, bytes: &[u8]) -> PathBuf {
        let path = self.runtime.layout.home_dir(user).join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("home dir");
        }
        std::fs::write(&path, bytes).expect("write home file");
        path
    }

    /// Create a file node from `bytes`, copying the content.
    pub async fn new_file(&self, actor: &Actor, parent: &Node, name: &str, bytes: &[u8]) -> Node {
        let source = self.write_upload(name, bytes);
        self.runtime
            .nodes
            .create_file(actor, parent.id, name, &source, IngestMode::Copy, false)
            .await
            .expect("create file")
    }

    pub async fn mkdir(&self, actor: &Actor, parent: &Node, name: &str) -> Node {
        self.runtime
            .nodes
            .make_dir(actor, parent.id, name)
            .await
            .expect("make dir")
    }

    /// Run the processor until everything signalled so far is processed.
    pub async fn run_processor(&mut self) {
        let signals = self.signals.take().expect("processor already ran");
        let handle = tokio::spawn(self.runtime.processor.clone().run(signals));
        self.runtime.queue.stop().await;
        handle.await.expect("processor task");
    }
}
