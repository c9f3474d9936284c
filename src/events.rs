//! Events coming back from the host tree widget.
//!
//! Widgets report events in loosely shaped payloads: the event name may arrive as the type
//! argument or inside the payload, and the node may be a bare id, an object, or the first
//! element of a `data` array. [`RawTreeEvent`] accepts all of those shapes and
//! [`TreeEvent::from_raw`] resolves them once into a closed set of variants.

use crate::error::Error;
use crate::heading::{retitle_heading, HeadingNode};
use crate::state::CollapsedStore;
use serde::Deserialize;
use serde_json::Value;

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
/// A node reference as hosts send it.
pub enum RawNode {
    /// Bare node id.
    Id(String),
    /// Node object.
    Object {
        /// Node id.
        id: String,
        #[serde(default)]
        /// Node label, when the host includes it.
        topic: Option<String>,
    },
}

#[derive(Clone, Debug, Default, Deserialize)]
/// Host event payload before interpretation.
pub struct RawTreeEvent {
    #[serde(default)]
    /// Event name carried in the payload.
    pub evt: Option<String>,
    #[serde(default)]
    /// Node reference.
    pub node: Option<RawNode>,
    #[serde(default)]
    /// Positional arguments, `[id, topic, ...]`.
    pub data: Option<Vec<Value>>,
    #[serde(default)]
    /// Node id at the top level.
    pub id: Option<String>,
    #[serde(default)]
    /// Node label at the top level.
    pub topic: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Interpreted host event.
pub enum TreeEvent {
    /// A node was selected.
    Select {
        /// Node id.
        id: String,
    },
    /// Selection was cleared.
    ClearSelection,
    /// A node label was edited in the widget.
    Rename {
        /// Node id.
        id: String,
        /// New label.
        title: String,
    },
    /// A node was collapsed.
    Collapse {
        /// Node id.
        id: String,
    },
    /// A node was expanded.
    Expand {
        /// Node id.
        id: String,
    },
}

impl RawTreeEvent {
    /// Parse a JSON payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not a JSON object of the expected shape.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    fn node_id(&self) -> Option<String> {
        if let Some(RawNode::Id(id) | RawNode::Object { id, .. }) = &self.node {
            return Some(id.clone());
        }
        if let Some(Value::String(id)) = self.data.as_ref().and_then(|d| d.first()) {
            return Some(id.clone());
        }
        self.id.clone()
    }

    fn node_topic(&self) -> Option<String> {
        if let Some(topic) = &self.topic {
            return Some(topic.clone());
        }
        if let Some(RawNode::Object {
            topic: Some(topic), ..
        }) = &self.node
        {
            return Some(topic.clone());
        }
        match self.data.as_ref().and_then(|d| d.get(1)) {
            Some(Value::String(topic)) => Some(topic.clone()),
            _ => None,
        }
    }
}

impl TreeEvent {
    #[must_use]
    /// Interpret a host event. `event_type` is the name passed alongside the payload, if any.
    ///
    /// Returns `None` for events this crate does not act on or that lack a node id.
    pub fn from_raw(event_type: Option<&str>, raw: &RawTreeEvent) -> Option<Self> {
        let name = event_type.or(raw.evt.as_deref())?;
        if name == "select_clear" {
            return Some(Self::ClearSelection);
        }
        let id = raw.node_id().filter(|id| !id.is_empty())?;
        match name {
            "select_node" => Some(Self::Select { id }),
            "edit" | "update_node" | "nodechanged" | "topic_change" | "textedit" => {
                Some(Self::Rename {
                    id,
                    title: raw.node_topic().unwrap_or_default(),
                })
            }
            "collapse_node" | "collapse" => Some(Self::Collapse { id }),
            "expand_node" | "expand" => Some(Self::Expand { id }),
            _ => None,
        }
    }
}

impl TreeEvent {
    #[must_use]
    /// Write a rename back into the document text.
    ///
    /// Returns `None` for other events, for ids not in `headings`, and when the text would
    /// not change. A blank title is written as `placeholder`.
    pub fn apply_to_text(&self, text: &str, headings: &[HeadingNode], placeholder: &str) -> Option<String> {
        let Self::Rename { id, title } = self else {
            return None;
        };
        let heading = headings.iter().find(|h| &h.id == id)?;
        let updated = retitle_heading(text, heading, title, placeholder);
        (updated != text).then_some(updated)
    }
}

impl CollapsedStore {
    /// Record collapse and expand events for `document`; other events are ignored.
    ///
    /// Returns true if the store changed.
    pub fn apply_event(&mut self, document: &str, headings: &[HeadingNode], event: &TreeEvent) -> bool {
        match event {
            TreeEvent::Collapse { id } => self.set_collapsed(document, headings, id, true),
            TreeEvent::Expand { id } => self.set_collapsed(document, headings, id, false),
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "tests/events.rs"]
mod tests;
