//! The live visual tree that reconciliation mutates.
//!
//! Rendering belongs to a host widget. The reconciler only needs a handful of primitives,
//! captured by [`ExternalTree`]. [`MemoryTree`] is an in-process implementation that behaves
//! like a mind-map widget (removing a node drops its subtree, the root cannot be removed)
//! and records every operation it accepts.

use crate::error::TreeError;
use crate::outline::MindTree;
use std::collections::HashMap;
use std::fmt;

/// Mutation primitives of a host tree widget.
pub trait ExternalTree {
    /// Whether a node with this id is present.
    fn exists(&self, id: &str) -> bool;

    /// Add a node as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// Fails if the parent is missing or the id is taken.
    fn add(&mut self, parent: &str, id: &str, label: &str) -> Result<(), TreeError>;

    /// Remove a node.
    ///
    /// # Errors
    ///
    /// Fails if the node is missing or cannot be removed.
    fn remove(&mut self, id: &str) -> Result<(), TreeError>;

    /// Replace a node's label.
    ///
    /// # Errors
    ///
    /// Fails if the node is missing.
    fn update(&mut self, id: &str, label: &str) -> Result<(), TreeError>;

    /// Select a node without moving the viewport.
    ///
    /// # Errors
    ///
    /// Fails if the node is missing.
    fn select(&mut self, id: &str) -> Result<(), TreeError>;

    /// Currently selected node.
    fn selected(&self) -> Option<String>;

    /// Move a node under a new parent, keeping its subtree.
    ///
    /// # Errors
    ///
    /// The default reports [`TreeError::Unsupported`] so callers fall back to remove+add.
    fn move_node(&mut self, _id: &str, _parent: &str) -> Result<(), TreeError> {
        Err(TreeError::Unsupported)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// An operation accepted by a [`MemoryTree`].
pub enum TreeOp {
    /// Node added under a parent.
    Add {
        /// Parent id.
        parent: String,
        /// New node id.
        id: String,
        /// Label.
        label: String,
    },
    /// Node (and its subtree) removed.
    Remove {
        /// Removed id.
        id: String,
    },
    /// Label replaced.
    Update {
        /// Node id.
        id: String,
        /// New label.
        label: String,
    },
    /// Node moved under another parent.
    Move {
        /// Node id.
        id: String,
        /// New parent id.
        parent: String,
    },
    /// Node selected.
    Select {
        /// Node id.
        id: String,
    },
}

impl fmt::Display for TreeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add { parent, id, label } => write!(f, "add {id} under {parent}: {label}"),
            Self::Remove { id } => write!(f, "remove {id}"),
            Self::Update { id, label } => write!(f, "update {id}: {label}"),
            Self::Move { id, parent } => write!(f, "move {id} under {parent}"),
            Self::Select { id } => write!(f, "select {id}"),
        }
    }
}

#[derive(Clone, Debug)]
struct MemoryNode {
    parent: Option<String>,
    label: String,
    children: Vec<String>,
}

#[derive(Clone, Debug)]
/// In-memory tree with an operation log.
pub struct MemoryTree {
    root: String,
    nodes: HashMap<String, MemoryNode>,
    selected: Option<String>,
    /// Whether [`ExternalTree::move_node`] is available.
    pub supports_move: bool,
    /// Operations accepted so far, in order.
    pub log: Vec<TreeOp>,
}

impl MemoryTree {
    #[must_use]
    /// A tree holding only its root.
    pub fn new(root: &str, label: &str) -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            root.to_string(),
            MemoryNode {
                parent: None,
                label: label.to_string(),
                children: Vec::new(),
            },
        );
        Self {
            root: root.to_string(),
            nodes,
            selected: None,
            supports_move: false,
            log: Vec::new(),
        }
    }

    #[must_use]
    /// Populate a tree from a built outline. The log starts empty.
    pub fn from_outline(outline: &MindTree) -> Self {
        let mut tree = Self::new(&outline.root_id, &outline.root_topic);
        outline.walk(|node, _| {
            if let Some(parent) = &node.parent {
                if let Err(e) = tree.add(parent, &node.id, &node.topic) {
                    tracing::warn!(id = %node.id, error = %e, "outline node not mirrored");
                }
            }
        });
        tree.log.clear();
        tree
    }

    #[must_use]
    /// Root id.
    pub fn root(&self) -> &str {
        &self.root
    }

    #[must_use]
    /// Parent of a node.
    pub fn parent(&self, id: &str) -> Option<&str> {
        self.nodes.get(id)?.parent.as_deref()
    }

    #[must_use]
    /// Label of a node.
    pub fn label(&self, id: &str) -> Option<&str> {
        self.nodes.get(id).map(|n| n.label.as_str())
    }

    #[must_use]
    /// Children of a node in insertion order.
    pub fn children(&self, id: &str) -> &[String] {
        self.nodes.get(id).map_or(&[], |n| n.children.as_slice())
    }

    #[must_use]
    /// Number of nodes including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    /// Whether only the root is present.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    fn detach(&mut self, id: &str) {
        let parent = self.nodes.get(id).and_then(|n| n.parent.clone());
        if let Some(p) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            p.children.retain(|c| c != id);
        }
    }

    fn drop_subtree(&mut self, id: &str) {
        if let Some(node) = self.nodes.remove(id) {
            if self.selected.as_deref() == Some(id) {
                self.selected = None;
            }
            for child in node.children {
                self.drop_subtree(&child);
            }
        }
    }

    fn is_descendant(&self, id: &str, ancestor: &str) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.parent(c);
        }
        false
    }
}

impl ExternalTree for MemoryTree {
    fn exists(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    fn add(&mut self, parent: &str, id: &str, label: &str) -> Result<(), TreeError> {
        if self.nodes.contains_key(id) {
            return Err(TreeError::Exists(id.to_string()));
        }
        let parent_node = self
            .nodes
            .get_mut(parent)
            .ok_or_else(|| TreeError::Missing(parent.to_string()))?;
        parent_node.children.push(id.to_string());
        self.nodes.insert(
            id.to_string(),
            MemoryNode {
                parent: Some(parent.to_string()),
                label: label.to_string(),
                children: Vec::new(),
            },
        );
        self.log.push(TreeOp::Add {
            parent: parent.to_string(),
            id: id.to_string(),
            label: label.to_string(),
        });
        Ok(())
    }

    fn remove(&mut self, id: &str) -> Result<(), TreeError> {
        if id == self.root {
            return Err(TreeError::Unsupported);
        }
        if !self.nodes.contains_key(id) {
            return Err(TreeError::Missing(id.to_string()));
        }
        self.detach(id);
        self.drop_subtree(id);
        self.log.push(TreeOp::Remove { id: id.to_string() });
        Ok(())
    }

    fn update(&mut self, id: &str, label: &str) -> Result<(), TreeError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| TreeError::Missing(id.to_string()))?;
        node.label = label.to_string();
        self.log.push(TreeOp::Update {
            id: id.to_string(),
            label: label.to_string(),
        });
        Ok(())
    }

    fn select(&mut self, id: &str) -> Result<(), TreeError> {
        if !self.nodes.contains_key(id) {
            return Err(TreeError::Missing(id.to_string()));
        }
        self.selected = Some(id.to_string());
        self.log.push(TreeOp::Select { id: id.to_string() });
        Ok(())
    }

    fn selected(&self) -> Option<String> {
        self.selected.clone()
    }

    fn move_node(&mut self, id: &str, parent: &str) -> Result<(), TreeError> {
        if !self.supports_move || id == self.root {
            return Err(TreeError::Unsupported);
        }
        if !self.nodes.contains_key(id) {
            return Err(TreeError::Missing(id.to_string()));
        }
        if !self.nodes.contains_key(parent) {
            return Err(TreeError::Missing(parent.to_string()));
        }
        if self.is_descendant(parent, id) {
            return Err(TreeError::Unsupported);
        }
        self.detach(id);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(id.to_string());
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = Some(parent.to_string());
        }
        self.log.push(TreeOp::Move {
            id: id.to_string(),
            parent: parent.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/tree.rs"]
mod tests;
