//! Outline construction from a flat heading list.
//!
//! The outline is the tree a mind-map host renders: a single root (the first level-1
//! heading, or a virtual root named after the document) with every other heading hung
//! under its outline parent.

use crate::heading::{HeadingNode, HeadingStyle};
use serde::Serialize;
use std::collections::HashMap;

#[must_use]
/// Id of the synthesized root for a document without a level-1 heading.
pub fn virtual_root_id(document_name: &str) -> String {
    format!("virtual_root_{document_name}")
}

#[must_use]
/// Root id for a parse: the first level-1 heading, else the virtual root.
pub fn resolve_root_id(headings: &[HeadingNode], document_name: &str) -> String {
    headings
        .iter()
        .find(|h| h.level == 1)
        .map_or_else(|| virtual_root_id(document_name), |h| h.id.clone())
}

fn strip_md_suffix(name: &str) -> &str {
    let len = name.len();
    if len >= 3 && name.is_char_boundary(len - 3) && name[len - 3..].eq_ignore_ascii_case(".md") {
        &name[..len - 3]
    } else {
        name
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// A node in the built outline.
pub struct OutlineNode {
    /// Heading id, or the virtual root id.
    pub id: String,
    /// Display label.
    pub topic: String,
    /// Parent in the outline; `None` only for the root.
    pub parent: Option<String>,
    /// Child ids in document order.
    pub children: Vec<String>,
}

#[derive(Clone, Debug)]
/// Outline with a single designated root.
pub struct MindTree {
    /// Name of the source document.
    pub document_name: String,
    /// Id of the root node.
    pub root_id: String,
    /// Label of the root node.
    pub root_topic: String,
    /// Whether the root was synthesized rather than taken from a heading.
    pub virtual_root: bool,
    nodes: HashMap<String, OutlineNode>,
}

#[derive(Serialize)]
struct NodeTreeData<'a> {
    id: &'a str,
    topic: &'a str,
    children: Vec<NodeTreeData<'a>>,
}

#[derive(Serialize)]
struct NodeTreeMeta<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct NodeTree<'a> {
    meta: NodeTreeMeta<'a>,
    format: &'static str,
    data: NodeTreeData<'a>,
}

impl MindTree {
    #[must_use]
    /// Look up a node by id.
    pub fn get(&self, id: &str) -> Option<&OutlineNode> {
        self.nodes.get(id)
    }

    #[must_use]
    /// The root node.
    pub fn root(&self) -> &OutlineNode {
        &self.nodes[&self.root_id]
    }

    #[must_use]
    /// Number of nodes including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    /// Whether the outline holds only its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Visit nodes depth-first from the root, yielding each with its depth.
    pub fn walk(&self, mut visit: impl FnMut(&OutlineNode, usize)) {
        let mut stack = vec![(self.root_id.as_str(), 0)];
        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            visit(node, depth);
            for child in node.children.iter().rev() {
                stack.push((child.as_str(), depth + 1));
            }
        }
    }

    fn data(&self, id: &str) -> Option<NodeTreeData<'_>> {
        let node = self.nodes.get(id)?;
        Some(NodeTreeData {
            id: &node.id,
            topic: &node.topic,
            children: node.children.iter().filter_map(|c| self.data(c)).collect(),
        })
    }

    /// Serialize in the `node_tree` interchange shape used by mind-map widgets.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn to_node_tree_json(&self) -> serde_json::Result<String> {
        let data = self.data(&self.root_id).unwrap_or(NodeTreeData {
            id: &self.root_id,
            topic: &self.root_topic,
            children: Vec::new(),
        });
        let tree = NodeTree {
            meta: NodeTreeMeta {
                name: &self.document_name,
            },
            format: "node_tree",
            data,
        };
        serde_json::to_string_pretty(&tree)
    }
}

#[must_use]
/// Build the outline tree for a document.
pub fn build_tree(headings: &[HeadingNode], document_name: &str) -> MindTree {
    let first_h1 = headings.iter().find(|h| h.level == 1);
    let (root_id, root_topic, virtual_root) = match first_h1 {
        Some(h) => {
            let topic = if h.title.is_empty() {
                document_name.to_string()
            } else {
                h.title.clone()
            };
            (h.id.clone(), topic, false)
        }
        None => (
            virtual_root_id(document_name),
            strip_md_suffix(document_name).to_string(),
            true,
        ),
    };

    let mut nodes: HashMap<String, OutlineNode> = HashMap::new();
    nodes.insert(
        root_id.clone(),
        OutlineNode {
            id: root_id.clone(),
            topic: root_topic.clone(),
            parent: None,
            children: Vec::new(),
        },
    );

    let others = || headings.iter().filter(|h| h.id != root_id);
    for h in others() {
        nodes.insert(
            h.id.clone(),
            OutlineNode {
                id: h.id.clone(),
                topic: h.title.clone(),
                parent: None,
                children: Vec::new(),
            },
        );
    }
    for h in others() {
        let wanted = h.parent_id.as_deref().unwrap_or(&root_id);
        let parent = if nodes.contains_key(wanted) {
            wanted.to_string()
        } else {
            root_id.clone()
        };
        if let Some(node) = nodes.get_mut(&h.id) {
            node.parent = Some(parent.clone());
        }
        if let Some(p) = nodes.get_mut(&parent) {
            p.children.push(h.id.clone());
        }
    }

    MindTree {
        document_name: document_name.to_string(),
        root_id,
        root_topic,
        virtual_root,
        nodes,
    }
}

#[must_use]
/// Depth of a heading along its `parent_id` chain (top-level headings are depth 0).
pub(crate) fn depth_of(heading: &HeadingNode, by_id: &HashMap<&str, &HeadingNode>) -> usize {
    let mut depth = 0;
    let mut current = heading;
    while let Some(parent) = current.parent_id.as_deref().and_then(|p| by_id.get(p)) {
        depth += 1;
        current = parent;
        if depth > by_id.len() {
            break;
        }
    }
    depth
}

/// Slice `text` by char offsets, clamping to its length.
pub(crate) fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let byte_at = |n: usize| text.char_indices().nth(n).map_or(text.len(), |(b, _)| b);
    let start_b = byte_at(start);
    let end_b = byte_at(end).max(start_b);
    &text[start_b..end_b]
}

#[must_use]
/// Text owned by a heading alone: after its own line, before its first child heading.
pub fn immediate_body<'a>(text: &'a str, heading: &HeadingNode, headings: &[HeadingNode]) -> &'a str {
    let mut body_start = heading.heading_text_end + 1;
    if heading.style == HeadingStyle::Setext {
        // Skip the underline line.
        let rest = char_slice(text, body_start, usize::MAX);
        body_start += rest.split('\n').next().map_or(0, |l| l.chars().count() + 1);
    }
    let body_end = heading
        .children
        .first()
        .and_then(|first| headings.iter().find(|h| &h.id == first))
        .map_or(heading.end, |child| child.start);
    char_slice(text, body_start, body_end).trim()
}

#[must_use]
/// Text preceding the first heading, trimmed; the whole text when there are no headings.
pub fn leading_text<'a>(text: &'a str, headings: &[HeadingNode]) -> &'a str {
    let end = headings.first().map_or(usize::MAX, |h| h.start);
    char_slice(text, 0, end).trim()
}

#[cfg(test)]
#[path = "tests/outline.rs"]
mod tests;
