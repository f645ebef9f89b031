//! Reconciliation between the catalog and the physical filesystem.
//!
//! - scan-deleted prunes file nodes whose content is gone, then any
//!   directory left empty, never a root.
//! - scan-new walks every user's home directory and catalogs what is
//!   missing, directories first, files on a bounded pool. Ingested files
//!   are moved into the file store and emptied directories removed, so a
//!   home directory only ever holds what is not cataloged yet.

pub mod deleted;
pub mod lease;
pub mod new;

use serde::Serialize;

use homevault_core::config::ScanConfig;
use homevault_core::result::AppResult;
use homevault_core::types::NodeId;
use homevault_database::DatabasePool;
use homevault_service::{NodeService, UserService};

pub use lease::{ScanGuard, ScanLease};

/// Outcome of a scan-deleted sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanDeletedReport {
    /// File nodes whose content path was checked.
    pub files_checked: usize,
    /// File nodes removed because their content is missing.
    pub files_removed: Vec<NodeId>,
    /// Directories removed because they became empty.
    pub dirs_removed: Vec<NodeId>,
    /// Entries skipped after an error.
    pub errors: usize,
}

/// Outcome of a scan-new sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanNewReport {
    /// Users whose home directory was walked.
    pub users: usize,
    pub dirs_created: Vec<NodeId>,
    pub files_created: Vec<NodeId>,
    /// Entries already in the catalog.
    pub existing: usize,
    /// `user:/logical/path` of entries whose catalog type disagrees with
    /// the filesystem. Left for manual review.
    pub mismatches: Vec<String>,
    /// Entries skipped after an error.
    pub errors: usize,
}

impl ScanNewReport {
    /// Nodes created by the sweep.
    pub fn created(&self) -> usize {
        self.dirs_created.len() + self.files_created.len()
    }
}

/// Both sweeps run back to back under one lease.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub deleted: ScanDeletedReport,
    pub new: ScanNewReport,
}

/// Runs the reconciliation sweeps.
#[derive(Debug, Clone)]
pub struct Scanner {
    db: DatabasePool,
    nodes: NodeService,
    users: UserService,
    lease: ScanLease,
    concurrency: usize,
}

impl Scanner {
    /// Create a scanner. Scanners that must exclude each other share a
    /// lease.
    pub fn new(
        db: DatabasePool,
        nodes: NodeService,
        users: UserService,
        lease: ScanLease,
        config: &ScanConfig,
    ) -> Self {
        Self {
            db,
            nodes,
            users,
            lease,
            concurrency: config.concurrency.max(1),
        }
    }

    /// The lease this scanner takes.
    pub fn lease(&self) -> &ScanLease {
        &self.lease
    }

    /// Remove catalog entries whose physical content is gone.
    pub async fn scan_deleted(&self) -> AppResult<ScanDeletedReport> {
        let _guard = self.lease.try_acquire("scan-deleted")?;
        self.prune_missing().await
    }

    /// Catalog physical entries under the users' home directories.
    pub async fn scan_new(&self) -> AppResult<ScanNewReport> {
        let _guard = self.lease.try_acquire("scan-new")?;
        self.ingest_homes().await
    }

    /// scan-deleted followed by scan-new.
    pub async fn scan_all(&self) -> AppResult<ScanReport> {
        let _guard = self.lease.try_acquire("full scan")?;
        let deleted = self.prune_missing().await?;
        let new = self.ingest_homes().await?;
        Ok(ScanReport { deleted, new })
    }
}
