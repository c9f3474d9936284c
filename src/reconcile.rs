//! Incremental synchronization of a live tree with a new heading parse.
//!
//! Given the headings the tree currently shows and the headings parsed after an edit,
//! apply the smallest set of removals, additions, label updates and reparents to the tree.
//! Every external call is individually fault tolerant: failures are logged and the pass
//! carries on.
//!
//! Pass order:
//!
//! 1. remove vanished headings, deepest first
//! 2. add new headings, shallowest first, under their nearest ancestor already present
//! 3. update changed labels
//! 4. reparent headings whose resolved parent changed (move, or remove then add)
//! 5. restore surviving headings that dropped out with a removed subtree
//! 6. reselect the previously selected node

use crate::error::{ReconcileError, TreeError};
use crate::heading::HeadingNode;
use crate::outline::{depth_of, resolve_root_id, virtual_root_id};
use crate::tree::ExternalTree;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

const MAX_ANCESTOR_WALK: usize = 100;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Counts of the operations one pass applied.
pub struct ReconcileReport {
    /// Nodes removed because their heading vanished.
    pub removed: usize,
    /// Nodes added for new headings.
    pub added: usize,
    /// Labels replaced in place.
    pub updated: usize,
    /// Nodes moved or re-added under a new parent.
    pub reparented: usize,
    /// Surviving nodes re-added after their subtree was removed.
    pub restored: usize,
    /// External calls that failed and were skipped.
    pub failures: usize,
}

impl ReconcileReport {
    #[must_use]
    /// Whether the pass changed nothing structurally or textually.
    pub fn is_noop(&self) -> bool {
        self.removed + self.added + self.updated + self.reparented + self.restored == 0
    }
}

/// Serializes reconciliation passes against one tree.
pub struct Reconciler {
    document_name: String,
    placeholder: String,
    in_flight: AtomicBool,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn label_for<'a>(heading: &'a HeadingNode, placeholder: &'a str) -> &'a str {
    if heading.title.trim().is_empty() {
        placeholder
    } else {
        &heading.title
    }
}

#[must_use]
/// Whether the root changes between two parses, which reconciliation cannot express.
///
/// Hosts should rebuild the tree from scratch in that case.
pub fn needs_rebuild(prev: &[HeadingNode], next: &[HeadingNode], document_name: &str) -> bool {
    resolve_root_id(prev, document_name) != resolve_root_id(next, document_name)
}

struct Pass<'a, T: ExternalTree + ?Sized> {
    tree: &'a mut T,
    placeholder: &'a str,
    prev_by_id: HashMap<&'a str, &'a HeadingNode>,
    next_by_id: HashMap<&'a str, &'a HeadingNode>,
    root_id: String,
    desired_root: String,
    report: ReconcileReport,
}

impl<T: ExternalTree + ?Sized> Pass<'_, T> {
    fn attempt(&mut self, what: &str, id: &str, result: Result<(), TreeError>) -> bool {
        match result {
            Ok(()) => {
                tracing::trace!(op = what, id, "applied");
                true
            }
            Err(e) => {
                tracing::warn!(op = what, id, error = %e, "tree operation failed, continuing");
                self.report.failures += 1;
                false
            }
        }
    }

    /// Nearest ancestor of `heading` already in the tree, else the tree's root.
    fn existing_parent(&self, heading: &HeadingNode) -> String {
        let mut ancestor = heading.parent_id.as_deref();
        let mut steps = 0;
        while let Some(id) = ancestor {
            if steps >= MAX_ANCESTOR_WALK {
                tracing::warn!(id = %heading.id, "ancestor chain too long, using root");
                break;
            }
            steps += 1;
            if self.tree.exists(id) {
                return id.to_string();
            }
            let Some(h) = self.next_by_id.get(id) else {
                break;
            };
            ancestor = h.parent_id.as_deref();
        }
        self.root_id.clone()
    }

    fn add(&mut self, parent: &str, heading: &HeadingNode) -> bool {
        let label = label_for(heading, self.placeholder).to_string();
        let result = self.tree.add(parent, &heading.id, &label);
        self.attempt("add", &heading.id, result)
    }

    fn remove(&mut self, id: &str) -> bool {
        let result = self.tree.remove(id);
        self.attempt("remove", id, result)
    }

    fn remove_vanished(&mut self, prev: &[HeadingNode]) {
        let mut to_remove: Vec<&HeadingNode> = prev
            .iter()
            .filter(|h| !self.next_by_id.contains_key(h.id.as_str()))
            .collect();
        to_remove.sort_by_key(|h| std::cmp::Reverse(depth_of(h, &self.prev_by_id)));
        for h in to_remove {
            if self.tree.exists(&h.id) && self.remove(&h.id) {
                self.report.removed += 1;
            }
        }
    }

    fn add_new(&mut self, next: &[HeadingNode]) {
        let mut to_add: Vec<&HeadingNode> = next
            .iter()
            .filter(|h| !self.prev_by_id.contains_key(h.id.as_str()))
            .collect();
        to_add.sort_by_key(|h| depth_of(h, &self.next_by_id));
        for h in to_add {
            let parent = self.existing_parent(h);
            if self.add(&parent, h) {
                self.report.added += 1;
            }
        }
    }

    fn update_label(&mut self, heading: &HeadingNode) {
        let label = label_for(heading, self.placeholder).to_string();
        let result = self.tree.update(&heading.id, &label);
        if self.attempt("update", &heading.id, result) {
            self.report.updated += 1;
        }
    }

    fn reparent(&mut self, heading: &HeadingNode) {
        let parent = self.existing_parent(heading);
        if parent == heading.id {
            return;
        }
        match self.tree.move_node(&heading.id, &parent) {
            Ok(()) => {
                self.report.reparented += 1;
                return;
            }
            Err(TreeError::Unsupported) => {}
            Err(e) => {
                tracing::debug!(id = %heading.id, error = %e, "move failed, falling back to remove+add");
            }
        }
        if self.tree.exists(&heading.id) {
            self.remove(&heading.id);
        }
        if self.add(&parent, heading) {
            self.report.reparented += 1;
        }
    }

    fn sync_survivors(&mut self, next: &[HeadingNode]) {
        for h in next {
            let Some(old) = self.prev_by_id.get(h.id.as_str()).copied() else {
                continue;
            };
            if old.title != h.title {
                self.update_label(h);
            }
            let old_parent = old.parent_id.as_deref().unwrap_or(&self.root_id);
            let new_parent = h.parent_id.as_deref().unwrap_or(&self.desired_root);
            if old_parent != new_parent {
                self.reparent(h);
            }
        }
    }

    // Removing a node drops its subtree; bring back anything that should still be shown.
    fn restore_missing(&mut self, next: &[HeadingNode]) {
        let mut missing: Vec<&HeadingNode> = next
            .iter()
            .filter(|h| h.id != self.root_id && !self.tree.exists(&h.id))
            .collect();
        missing.sort_by_key(|h| depth_of(h, &self.next_by_id));
        for h in missing {
            let parent = self.existing_parent(h);
            if self.add(&parent, h) {
                self.report.restored += 1;
            }
        }
    }

    fn reselect(&mut self, selected: Option<String>) {
        let Some(id) = selected.filter(|id| self.next_by_id.contains_key(id.as_str())) else {
            return;
        };
        if self.tree.exists(&id) {
            let result = self.tree.select(&id);
            self.attempt("select", &id, result);
        }
    }
}

impl Reconciler {
    #[must_use]
    /// Reconciler for one document; `placeholder` labels headings with blank titles.
    pub fn new(document_name: &str, placeholder: &str) -> Self {
        Self {
            document_name: document_name.to_string(),
            placeholder: placeholder.to_string(),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Bring `tree` from showing `prev` to showing `next`.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Busy`] if another pass is running on this reconciler.
    /// Failures of individual tree operations are counted in the report, never returned.
    pub fn reconcile<T: ExternalTree + ?Sized>(
        &self,
        prev: &[HeadingNode],
        next: &[HeadingNode],
        tree: &mut T,
    ) -> Result<ReconcileReport, ReconcileError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(ReconcileError::Busy);
        }
        let _guard = InFlight(&self.in_flight);
        let report = reconcile_with(prev, next, tree, &self.document_name, &self.placeholder);
        tracing::debug!(?report, document = %self.document_name, "reconciled");
        Ok(report)
    }
}

/// One reconciliation pass without the in-flight guard.
///
/// Callers must not run two passes against the same tree concurrently.
pub fn reconcile_with<T: ExternalTree + ?Sized>(
    prev: &[HeadingNode],
    next: &[HeadingNode],
    tree: &mut T,
    document_name: &str,
    placeholder: &str,
) -> ReconcileReport {
    let virtual_root = virtual_root_id(document_name);
    let prev_h1 = prev.iter().find(|h| h.level == 1).map(|h| h.id.as_str());
    let next_h1 = next.iter().find(|h| h.level == 1).map(|h| h.id.as_str());
    // The tree keeps the root it was built with; new parents fall back to it.
    let root_id = prev_h1.unwrap_or(&virtual_root).to_string();
    let desired_root = next_h1.unwrap_or(&root_id).to_string();

    let selected = tree.selected();
    let mut pass = Pass {
        tree,
        placeholder,
        prev_by_id: prev.iter().map(|h| (h.id.as_str(), h)).collect(),
        next_by_id: next.iter().map(|h| (h.id.as_str(), h)).collect(),
        root_id,
        desired_root,
        report: ReconcileReport::default(),
    };

    pass.remove_vanished(prev);
    pass.add_new(next);
    pass.sync_survivors(next);
    pass.restore_missing(next);
    pass.reselect(selected);
    pass.report
}

#[cfg(test)]
#[path = "tests/reconcile.rs"]
mod tests;
