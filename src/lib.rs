//! mdoutline: markdown outline extraction and incremental tree reconciliation.
//!
//! Text flows one way through the parser: raw markdown becomes a flat list of
//! [`HeadingNode`]s, the list becomes an outline with a single root, and each heading's
//! body can be mined for informal structure as [`ContentNode`]s. After an edit, the
//! [`Reconciler`] brings a live host tree from the old outline to the new one.
#![allow(clippy::multiple_crate_versions)]
// No public repository yet, so the metadata lint cannot be satisfied.
#![allow(clippy::cargo_common_metadata)]

pub mod cache;
pub mod config;
pub mod content;
pub mod error;
pub mod events;
pub mod heading;
pub mod logging;
pub mod outline;
pub mod reconcile;
pub mod stable_key;
pub mod state;
pub mod tree;

pub use cache::{ParseCache, Parser};
pub use content::{extract_content_tree, ContentNode, TaskMeta};
pub use error::{Error, ReconcileError, TreeError};
pub use events::{RawTreeEvent, TreeEvent};
pub use heading::{
    compute_heading_sections, delete_heading_section, insert_child_heading, retitle_heading,
    HeadingNode, HeadingStyle, IdStrategy,
};
pub use outline::{build_tree, MindTree};
pub use reconcile::{ReconcileReport, Reconciler};
pub use stable_key::{compute_stable_keys, StableKeyIndex};
pub use state::CollapsedStore;
pub use tree::{ExternalTree, MemoryTree, TreeOp};
