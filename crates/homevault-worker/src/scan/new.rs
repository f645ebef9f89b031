//! scan-new: catalog what the users' home directories contain.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use homevault_core::config::IngestMode;
use homevault_core::error::{AppError, ErrorKind};
use homevault_core::result::AppResult;
use homevault_core::types::NodeId;
use homevault_database::{SqliteConnection, WriteTransaction};
use homevault_entity::node::{Node, NodeType};
use homevault_entity::user::User;
use homevault_service::Actor;
use homevault_service::node::path;
use homevault_storage::local;

use super::{ScanNewReport, Scanner};

/// One entry found under a home directory.
#[derive(Debug, Clone)]
struct HomeEntry {
    /// `/`-rooted path relative to the home directory.
    logical: String,
    /// Parent's logical path.
    parent: String,
    name: String,
    absolute: PathBuf,
    kind: NodeType,
}

/// What happened to one entry.
#[derive(Debug)]
enum Ingested {
    Created(NodeId),
    Existing,
    Mismatch(NodeType),
}

impl Scanner {
    pub(super) async fn ingest_homes(&self) -> AppResult<ScanNewReport> {
        let mut report = ScanNewReport::default();

        for user in self.users.list().await? {
            if let Err(e) = self.ingest_home(&user, &mut report).await {
                warn!(user = %user.name, error = %e, "Failed to scan home directory");
                report.errors += 1;
            }
        }

        info!(
            users = report.users,
            dirs_created = report.dirs_created.len(),
            files_created = report.files_created.len(),
            existing = report.existing,
            mismatches = report.mismatches.len(),
            errors = report.errors,
            "scan-new finished"
        );
        Ok(report)
    }

    async fn ingest_home(&self, user: &User, report: &mut ScanNewReport) -> AppResult<()> {
        let (user, root) = self.users.ensure_root(user.id).await?;
        let home = self.nodes.layout().home_dir(&user.name);
        if !local::exists(&home).await? {
            debug!(user = %user.name, home = %home.display(), "No home directory");
            return Ok(());
        }
        report.users += 1;

        let walk_root = home.clone();
        let (entries, walk_errors) = tokio::task::spawn_blocking(move || walk_home(&walk_root))
            .await
            .map_err(|e| AppError::internal(format!("Home directory walk panicked: {e}")))?;
        report.errors += walk_errors;

        let actor = Actor::for_user(&user);
        let (dirs, files): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .partition(|entry| entry.kind == NodeType::Directory);

        // Pre-order walk: a parent directory always precedes its children.
        let mut cataloged_dirs = Vec::new();
        for entry in &dirs {
            let result = self.ingest_dir(&actor, &root, entry).await;
            if matches!(result, Ok(Ingested::Created(_) | Ingested::Existing)) {
                cataloged_dirs.push(entry.absolute.clone());
            }
            record(report, &user, entry, result);
        }

        let slots = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        for entry in files {
            let permit = Arc::clone(&slots)
                .acquire_owned()
                .await
                .map_err(|e| AppError::internal(format!("Scan semaphore closed: {e}")))?;
            let scanner = self.clone();
            let actor = actor.clone();
            let root = root.clone();
            tasks.spawn(async move {
                let _permit = permit;
                let result = scanner.ingest_file(&actor, &root, &entry).await;
                (entry, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((entry, result)) => record(report, &user, &entry, result),
                Err(e) => {
                    error!(user = %user.name, error = %e, "File ingest task failed");
                    report.errors += 1;
                }
            }
        }

        // Deepest first. Anything left behind keeps its directory.
        for dir in cataloged_dirs.iter().rev() {
            local::remove_empty_dir(dir).await;
        }
        Ok(())
    }

    async fn ingest_dir(&self, actor: &Actor, root: &Node, entry: &HomeEntry) -> AppResult<Ingested> {
        if let Some(found) = self.lookup(root, entry).await? {
            return Ok(found);
        }

        let mut tx = self.db.begin_write().await?;
        if let Some(existing) = path::resolve(&mut tx, root, &entry.logical).await? {
            return Ok(classify(&existing, entry));
        }
        let parent = resolve_parent(&mut tx, root, entry).await?;
        let dir = self
            .nodes
            .engine()
            .make_dir(&mut tx, actor, &parent, &entry.name)
            .await?;
        tx.commit().await?;
        Ok(Ingested::Created(dir.id))
    }

    async fn ingest_file(&self, actor: &Actor, root: &Node, entry: &HomeEntry) -> AppResult<Ingested> {
        if let Some(found) = self.lookup(root, entry).await? {
            return Ok(found);
        }

        let size = local::file_size(&entry.absolute).await?;
        let mime_type = self.nodes.mime_detector().detect(&entry.absolute).await?;

        let mut tx = self.db.begin_write().await?;
        if let Some(existing) = path::resolve(&mut tx, root, &entry.logical).await? {
            return Ok(classify(&existing, entry));
        }
        let parent = resolve_parent(&mut tx, root, entry).await?;
        let node = self
            .nodes
            .engine()
            .new_file(&mut tx, actor, &parent, &entry.name, &mime_type, size, None)
            .await?;

        self.nodes
            .place_content(&node, &entry.absolute, IngestMode::Move)
            .await?;
        let content = self.nodes.layout().content_path(node.id);
        if let Err(e) = self.commit_ingest(tx, node.id, &content).await {
            // The row is gone with the transaction; the file goes home.
            if let Err(undo) = local::place(&content, &entry.absolute, IngestMode::Move).await {
                error!(
                    path = %entry.absolute.display(),
                    content = %content.display(),
                    error = %undo,
                    "Failed to return file to home directory"
                );
            }
            return Err(e);
        }
        self.nodes.queue().notify();

        debug!(node_id = %node.id, path = %entry.logical, mime_type, size, "Ingested file");
        Ok(Ingested::Created(node.id))
    }

    async fn commit_ingest(
        &self,
        mut tx: WriteTransaction,
        node_id: NodeId,
        content: &Path,
    ) -> AppResult<()> {
        self.nodes
            .queue()
            .enqueue_in(&mut tx, node_id, content, false)
            .await?;
        tx.commit().await
    }

    /// Read-only check so entries already cataloged never take the write
    /// lease.
    async fn lookup(&self, root: &Node, entry: &HomeEntry) -> AppResult<Option<Ingested>> {
        let mut conn = self.db.acquire().await?;
        Ok(path::resolve(&mut conn, root, &entry.logical)
            .await?
            .map(|existing| classify(&existing, entry)))
    }
}

fn classify(existing: &Node, entry: &HomeEntry) -> Ingested {
    if existing.node_type == entry.kind {
        Ingested::Existing
    } else {
        Ingested::Mismatch(existing.node_type)
    }
}

async fn resolve_parent(conn: &mut SqliteConnection, root: &Node, entry: &HomeEntry) -> AppResult<Node> {
    path::resolve(conn, root, &entry.parent).await?.ok_or_else(|| {
        AppError::new(
            ErrorKind::NotFound,
            format!("Parent '{}' of '{}' is not cataloged", entry.parent, entry.logical),
        )
    })
}

fn record(report: &mut ScanNewReport, user: &User, entry: &HomeEntry, result: AppResult<Ingested>) {
    match result {
        Ok(Ingested::Created(id)) => match entry.kind {
            NodeType::Directory => report.dirs_created.push(id),
            NodeType::File => report.files_created.push(id),
        },
        Ok(Ingested::Existing) => report.existing += 1,
        Ok(Ingested::Mismatch(cataloged)) => {
            warn!(
                user = %user.name,
                path = %entry.logical,
                cataloged = ?cataloged,
                found = ?entry.kind,
                "Catalog type disagrees with filesystem, leaving as is"
            );
            report.mismatches.push(format!("{}:{}", user.name, entry.logical));
        }
        Err(e) => {
            warn!(user = %user.name, path = %entry.logical, error = %e, "Failed to ingest entry");
            report.errors += 1;
        }
    }
}

/// Walk `home` in pre-order. Returns the entries and how many were
/// unreadable.
fn walk_home(home: &Path) -> (Vec<HomeEntry>, usize) {
    let mut entries = Vec::new();
    let mut errors = 0;

    for item in WalkDir::new(home).min_depth(1).sort_by_file_name() {
        let item = match item {
            Ok(item) => item,
            Err(e) => {
                warn!(error = %e, "Unreadable home entry");
                errors += 1;
                continue;
            }
        };

        let Some(segments) = item
            .path()
            .strip_prefix(home)
            .ok()
            .and_then(|relative| {
                relative
                    .components()
                    .map(|c| c.as_os_str().to_str().map(str::to_string))
                    .collect::<Option<Vec<String>>>()
            })
        else {
            warn!(path = %item.path().display(), "Skipping entry with a non UTF-8 name");
            errors += 1;
            continue;
        };
        let Some((name, parents)) = segments.split_last() else {
            continue;
        };

        // Follows symlinks; a dangling link has no content to catalog.
        let kind = match std::fs::metadata(item.path()) {
            Ok(meta) if meta.is_dir() => NodeType::Directory,
            Ok(meta) if meta.is_file() => NodeType::File,
            Ok(_) => continue,
            Err(e) => {
                warn!(path = %item.path().display(), error = %e, "Skipping unreadable entry");
                errors += 1;
                continue;
            }
        };

        entries.push(HomeEntry {
            logical: format!("/{}", segments.join("/")),
            parent: format!("/{}", parents.join("/")),
            name: name.clone(),
            absolute: item.path().to_path_buf(),
            kind,
        });
    }

    (entries, errors)
}
