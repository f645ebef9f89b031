//! scan-deleted: drop file nodes whose content vanished.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use homevault_core::result::AppResult;
use homevault_core::types::NodeId;
use homevault_database::repositories::node as node_repo;
use homevault_entity::node::{Node, NodeType};
use homevault_service::Actor;
use homevault_storage::local;

use super::{ScanDeletedReport, Scanner};

impl Scanner {
    pub(super) async fn prune_missing(&self) -> AppResult<ScanDeletedReport> {
        let files = {
            let mut conn = self.db.acquire().await?;
            node_repo::all_of_type(&mut conn, NodeType::File).await?
        };

        let mut report = ScanDeletedReport {
            files_checked: files.len(),
            ..ScanDeletedReport::default()
        };
        let mut candidates = BTreeSet::new();

        for file in files {
            let content = self.nodes.layout().content_path(file.id);
            match local::exists(&content).await {
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => {
                    warn!(node_id = %file.id, error = %e, "Failed to check content");
                    report.errors += 1;
                    continue;
                }
            }

            match self.remove_missing_file(file.id).await {
                Ok(Some(removed)) => {
                    debug!(node_id = %removed.id, name = %removed.name, "Pruned file with missing content");
                    report.files_removed.push(removed.id);
                    if let Some(parent_id) = removed.parent_id {
                        candidates.insert(parent_id);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(node_id = %file.id, error = %e, "Failed to prune file");
                    report.errors += 1;
                }
            }
        }

        // Directories emptied by the pass, walking upward until a non-empty
        // directory or a root.
        while let Some(dir_id) = candidates.pop_first() {
            match self.remove_if_empty(dir_id).await {
                Ok(Some(removed)) => {
                    debug!(node_id = %removed.id, name = %removed.name, "Pruned empty directory");
                    report.dirs_removed.push(removed.id);
                    if let Some(parent_id) = removed.parent_id {
                        candidates.insert(parent_id);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(node_id = %dir_id, error = %e, "Failed to prune directory");
                    report.errors += 1;
                }
            }
        }

        info!(
            checked = report.files_checked,
            files_removed = report.files_removed.len(),
            dirs_removed = report.dirs_removed.len(),
            errors = report.errors,
            "scan-deleted finished"
        );
        Ok(report)
    }

    /// Delete a file node if it still exists and its content is still gone.
    async fn remove_missing_file(&self, id: NodeId) -> AppResult<Option<Node>> {
        let mut tx = self.db.begin_write().await?;
        let Some(node) = node_repo::find_by_id(&mut tx, id).await? else {
            return Ok(None);
        };
        if !node.is_file() || local::exists(&self.nodes.layout().content_path(id)).await? {
            return Ok(None);
        }

        self.nodes
            .engine()
            .delete(&mut tx, &Actor::system(), &node, false)
            .await?;
        tx.commit().await?;
        Ok(Some(node))
    }

    /// Delete a directory if it is empty and not a root.
    async fn remove_if_empty(&self, id: NodeId) -> AppResult<Option<Node>> {
        let mut tx = self.db.begin_write().await?;
        let Some(node) = node_repo::find_by_id(&mut tx, id).await? else {
            return Ok(None);
        };
        if node.is_root() || !node.is_dir() || node_repo::count_children(&mut tx, id).await? > 0 {
            return Ok(None);
        }

        self.nodes
            .engine()
            .delete(&mut tx, &Actor::system(), &node, false)
            .await?;
        tx.commit().await?;
        Ok(Some(node))
    }
}
