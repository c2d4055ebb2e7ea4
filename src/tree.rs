use indextree::{Arena, NodeId};
use log::trace;
use std::collections::HashMap;

use crate::error::TreeError;
use crate::paths;

/// A single file or directory as reported by the walker.
///
/// For directories `size` and `num_descendants` grow as descendants are
/// inserted into a [`FileTree`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileRecord {
    pub path: String,
    pub size: i64,
    pub is_dir: bool,
    pub num_descendants: usize,
}

impl FileRecord {
    pub fn new(path: impl Into<String>, size: i64, is_dir: bool) -> Self {
        Self {
            path: path.into(),
            size,
            is_dir,
            num_descendants: 0,
        }
    }

    pub fn file(path: impl Into<String>, size: i64) -> Self {
        Self::new(path, size, false)
    }

    pub fn dir(path: impl Into<String>) -> Self {
        Self::new(path, 0, true)
    }

    pub fn name(&self) -> &str {
        paths::name(&self.path)
    }

    pub fn parent_dir(&self) -> String {
        paths::dir(&self.path)
    }
}

/// Append-only file hierarchy, grown one record at a time.
///
/// Every insertion bubbles its size up through the ancestor chain, so the
/// aggregates are always current and never need a bottom-up pass.
pub struct FileTree {
    arena: Arena<FileRecord>,
    root: Option<NodeId>,
    path_to_node: HashMap<String, NodeId>,
}

impl FileTree {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
            path_to_node: HashMap::new(),
        }
    }

    /// Add a record to the hierarchy, update weights and relationships.
    ///
    /// The first record becomes the root. A record whose parent directory
    /// has not been inserted yet is indexed but stays detached.
    pub fn insert(&mut self, record: FileRecord) -> Result<NodeId, TreeError> {
        let clean = paths::clean(&record.path);
        if clean != record.path {
            return Err(TreeError::InvalidPath {
                path: record.path,
                clean,
            });
        }
        if self.path_to_node.contains_key(&record.path) {
            return Err(TreeError::DuplicatePath(record.path));
        }

        let path = record.path.clone();
        let size = record.size;
        let parent_path = record.parent_dir();
        let node_id = self.arena.new_node(record);
        self.path_to_node.insert(path.clone(), node_id);

        if self.root.is_none() {
            trace!("root {path}");
            self.root = Some(node_id);
            return Ok(node_id);
        }

        // `.` and `/` are their own parents
        let parent_id = match self.path_to_node.get(&parent_path) {
            Some(&id) if id != node_id => id,
            _ => {
                trace!("no parent {parent_path} for {path}, left detached");
                return Ok(node_id);
            }
        };
        parent_id.append(node_id, &mut self.arena);

        let mut ancestor = Some(parent_id);
        while let Some(id) = ancestor {
            if let Some(node) = self.arena.get_mut(id) {
                let data = node.get_mut();
                data.size += size;
                data.num_descendants += 1;
            }
            ancestor = self.arena.get(id).and_then(|node| node.parent());
        }

        trace!("inserted {path} ({size} bytes)");
        Ok(node_id)
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn find(&self, path: &str) -> Option<NodeId> {
        self.path_to_node.get(path).copied()
    }

    pub fn get(&self, id: NodeId) -> Option<&FileRecord> {
        self.arena.get(id).map(|node| node.get())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id).and_then(|node| node.parent())
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.children(&self.arena)
    }

    pub fn has_children(&self, id: NodeId) -> bool {
        self.arena
            .get(id)
            .map(|node| node.first_child().is_some())
            .unwrap_or(false)
    }

    /// Number of indexed records, attached or not.
    pub fn len(&self) -> usize {
        self.path_to_node.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path_to_node.is_empty()
    }

    /// Get total size of the tree
    pub fn total_size(&self) -> i64 {
        self.root
            .and_then(|id| self.get(id))
            .map(|record| record.size)
            .unwrap_or(0)
    }
}

impl Default for FileTree {
    fn default() -> Self {
        Self::new()
    }
}
