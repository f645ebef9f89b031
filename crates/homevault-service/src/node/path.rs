//! Logical path resolution.
//!
//! A logical path names a node by the sequence of names from its root, e.g.
//! `/photos/2024/beach.jpg`. The root itself is `/`. Physical locations are
//! handled by [`StorageLayout`](homevault_storage::StorageLayout) and never
//! depend on logical paths.

use homevault_core::error::AppError;
use homevault_core::result::AppResult;
use homevault_core::types::NodeId;
use homevault_database::SqliteConnection;
use homevault_database::repositories::node as node_repo;
use homevault_entity::node::Node;

/// Canonical form of a client-supplied path.
///
/// Empty and `.` segments are dropped; the result always starts with `/`
/// and never ends with one, except for the root itself.
pub fn normalize(path: &str) -> String {
    let segments = segments(path);
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Meaningful segments of a path.
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect()
}

/// Split a path into its normalized parent and final name. `None` for the
/// root.
pub fn split_parent(path: &str) -> Option<(String, &str)> {
    let mut segments = segments(path);
    let name = segments.pop()?;
    Some((format!("/{}", segments.join("/")), name))
}

/// Ancestors of `node` from its parent up to and including the root.
pub async fn ancestors(conn: &mut SqliteConnection, node: &Node) -> AppResult<Vec<Node>> {
    let mut chain = Vec::new();
    let mut next = node.parent_id;
    while let Some(id) = next {
        if chain.iter().any(|n: &Node| n.id == id) || id == node.id {
            return Err(AppError::internal(format!(
                "Parent chain of node {} contains a cycle at {id}",
                node.id
            )));
        }
        let parent = node_repo::get(&mut *conn, id).await?;
        next = parent.parent_id;
        chain.push(parent);
    }
    Ok(chain)
}

/// Logical path of `node`, walking parents up to its root.
pub async fn logical_path_of(conn: &mut SqliteConnection, node: &Node) -> AppResult<String> {
    if node.is_root() {
        return Ok("/".to_string());
    }

    let chain = ancestors(conn, node).await?;
    let mut names: Vec<&str> = chain
        .iter()
        .filter(|n| !n.is_root())
        .map(|n| n.name.as_str())
        .collect();
    names.reverse();
    names.push(&node.name);
    Ok(format!("/{}", names.join("/")))
}

/// Walk `path` down from `root`, one child lookup per segment.
///
/// Returns `None` as soon as a segment has no matching child.
pub async fn resolve(
    conn: &mut SqliteConnection,
    root: &Node,
    path: &str,
) -> AppResult<Option<Node>> {
    let mut current = root.clone();
    for segment in segments(path) {
        match node_repo::find_child(&mut *conn, current.id, segment).await? {
            Some(child) => current = child,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

/// Whether `node` is `ancestor_id` or lies beneath it.
pub async fn is_within(
    conn: &mut SqliteConnection,
    node: &Node,
    ancestor_id: NodeId,
) -> AppResult<bool> {
    if node.id == ancestor_id {
        return Ok(true);
    }
    Ok(ancestors(conn, node)
        .await?
        .iter()
        .any(|n| n.id == ancestor_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize("."), "/");
        assert_eq!(normalize("docs"), "/docs");
        assert_eq!(normalize("//docs///a.txt/"), "/docs/a.txt");
        assert_eq!(normalize("/./docs/./a.txt"), "/docs/a.txt");
    }

    #[test]
    fn test_split_parent() {
        assert_eq!(split_parent("/docs/a.txt"), Some(("/docs".to_string(), "a.txt")));
        assert_eq!(split_parent("docs"), Some(("/".to_string(), "docs")));
        assert_eq!(split_parent("/"), None);
    }

    #[test]
    fn test_segments() {
        assert_eq!(segments("/a//b/./c/"), vec!["a", "b", "c"]);
        assert!(segments("/").is_empty());
    }
}
