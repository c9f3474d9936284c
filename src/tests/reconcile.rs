use super::{needs_rebuild, ReconcileReport, Reconciler};
use crate::error::{ReconcileError, TreeError};
use crate::heading::{compute_heading_sections, compute_heading_sections_with, HeadingNode, IdStrategy};
use crate::outline::build_tree;
use crate::tree::{ExternalTree, MemoryTree, TreeOp};
use pretty_assertions::assert_eq;

const DOC: &str = "doc.md";

fn tree_for(prev: &[HeadingNode]) -> MemoryTree {
    MemoryTree::from_outline(&build_tree(prev, DOC))
}

fn run(prev: &str, next: &str, tree: &mut MemoryTree) -> ReconcileReport {
    let prev = compute_heading_sections(prev);
    let next = compute_heading_sections(next);
    Reconciler::new(DOC, "New heading")
        .reconcile(&prev, &next, tree)
        .unwrap()
}

fn setup(prev: &str) -> MemoryTree {
    tree_for(&compute_heading_sections(prev))
}

fn add(parent: &str, id: &str, label: &str) -> TreeOp {
    TreeOp::Add {
        parent: parent.into(),
        id: id.into(),
        label: label.into(),
    }
}

fn remove(id: &str) -> TreeOp {
    TreeOp::Remove { id: id.into() }
}

#[test]
fn test_sibling_swap_is_a_noop() {
    let prev = "# A\n## B\n## C";
    let mut tree = setup(prev);
    let report = run(prev, "# A\n## C\n## B", &mut tree);
    assert!(report.is_noop());
    assert!(tree.log.is_empty());
}

#[test]
fn test_identical_parse_is_a_noop() {
    let text = "# A\n## B\n### C\ntext\n## D";
    let mut tree = setup(text);
    assert_eq!(run(text, text, &mut tree), ReconcileReport::default());
    assert!(tree.log.is_empty());
}

#[test]
fn test_promotion_is_remove_then_add() {
    let prev = "# A\n## B\n### C";
    let mut tree = setup(prev);
    let report = run(prev, "# A\n## B\n## C", &mut tree);

    assert_eq!(tree.log, vec![remove("h_c"), add("h_a", "h_c", "C")]);
    assert_eq!(report.reparented, 1);
    assert_eq!(report.updated, 0);
    assert_eq!(tree.parent("h_c"), Some("h_a"));
}

#[test]
fn test_promotion_uses_move_when_available() {
    let prev = "# A\n## B\n### C\n#### D";
    let mut tree = setup(prev);
    tree.supports_move = true;
    let report = run(prev, "# A\n## B\n## C\n#### D", &mut tree);

    assert_eq!(
        tree.log,
        vec![TreeOp::Move {
            id: "h_c".into(),
            parent: "h_a".into()
        }]
    );
    assert_eq!(report.reparented, 1);
    assert_eq!(tree.parent("h_d"), Some("h_c"));
}

#[test]
fn test_removals_run_deepest_first() {
    let prev = "# A\n## B\n### C\n## D";
    let mut tree = setup(prev);
    let report = run(prev, "# A\n## D", &mut tree);

    assert_eq!(tree.log, vec![remove("h_c"), remove("h_b")]);
    assert_eq!(report.removed, 2);
    assert_eq!(tree.children("h_a"), ["h_d".to_string()]);
}

#[test]
fn test_additions_run_shallowest_first() {
    let prev = "# A";
    let mut tree = setup(prev);
    let report = run(prev, "# A\n### C\n## B\n### B1", &mut tree);

    // C has no level-2 ancestor and hangs off A directly.
    assert_eq!(
        tree.log,
        vec![
            add("h_a", "h_c", "C"),
            add("h_a", "h_b", "B"),
            add("h_b", "h_b1", "B1"),
        ]
    );
    assert_eq!(report.added, 3);
}

#[test]
fn test_blank_titles_get_the_placeholder() {
    let prev = "# A";
    let mut tree = setup(prev);
    run(prev, "# A\n## ", &mut tree);
    assert_eq!(tree.label("h_untitled"), Some("New heading"));
}

#[test]
fn test_slug_retitle_replaces_the_node() {
    let prev = "# A\n## Old";
    let mut tree = setup(prev);
    run(prev, "# A\n## New", &mut tree);
    assert_eq!(tree.log, vec![remove("h_old"), add("h_a", "h_new", "New")]);
}

#[test]
fn test_positional_retitle_updates_in_place() {
    let prev = compute_heading_sections_with("# A\n## Old", IdStrategy::Positional);
    let next = compute_heading_sections_with("# A\n## New", IdStrategy::Positional);
    let mut tree = tree_for(&prev);

    let report = Reconciler::new(DOC, "New heading")
        .reconcile(&prev, &next, &mut tree)
        .unwrap();

    assert_eq!(
        tree.log,
        vec![TreeOp::Update {
            id: "h_1_4".into(),
            label: "New".into()
        }]
    );
    assert_eq!(report.updated, 1);
}

#[test]
fn test_survivors_of_a_removed_subtree_are_restored() {
    let prev = "# A\n## B\n### C\n#### D";
    let mut tree = setup(prev);
    let report = run(prev, "# A\n### C\n#### D", &mut tree);

    assert_eq!(
        tree.log,
        vec![remove("h_b"), add("h_a", "h_c", "C"), add("h_c", "h_d", "D")]
    );
    assert_eq!(report.removed, 1);
    assert_eq!(report.reparented, 1);
    assert_eq!(report.restored, 1);
}

#[test]
fn test_selection_is_restored() {
    let prev = "# A\n## B\n### C";
    let mut tree = setup(prev);
    tree.select("h_c").unwrap();
    tree.log.clear();

    run(prev, "# A\n## B\n## C", &mut tree);
    assert_eq!(tree.selected().as_deref(), Some("h_c"));
    assert_eq!(tree.log.last(), Some(&TreeOp::Select { id: "h_c".into() }));
}

#[test]
fn test_selection_of_a_removed_node_is_dropped() {
    let prev = "# A\n## B";
    let mut tree = setup(prev);
    tree.select("h_b").unwrap();
    run(prev, "# A", &mut tree);
    assert_eq!(tree.selected(), None);
}

#[test]
fn test_virtual_root_receives_top_level_additions() {
    let prev = "## A";
    let mut tree = setup(prev);
    run(prev, "## A\n## B", &mut tree);
    assert_eq!(tree.parent("h_b"), Some("virtual_root_doc.md"));
}

struct FlakyTree {
    inner: MemoryTree,
    refuse: &'static str,
}

impl ExternalTree for FlakyTree {
    fn exists(&self, id: &str) -> bool {
        self.inner.exists(id)
    }

    fn add(&mut self, parent: &str, id: &str, label: &str) -> Result<(), TreeError> {
        if id == self.refuse {
            return Err(TreeError::Missing(parent.to_string()));
        }
        self.inner.add(parent, id, label)
    }

    fn remove(&mut self, id: &str) -> Result<(), TreeError> {
        self.inner.remove(id)
    }

    fn update(&mut self, id: &str, label: &str) -> Result<(), TreeError> {
        self.inner.update(id, label)
    }

    fn select(&mut self, id: &str) -> Result<(), TreeError> {
        self.inner.select(id)
    }

    fn selected(&self) -> Option<String> {
        self.inner.selected()
    }
}

#[test]
fn test_failed_operations_do_not_abort_the_pass() {
    let prev = compute_heading_sections("# A");
    let next = compute_heading_sections("# A\n## B\n## C");
    let mut tree = FlakyTree {
        inner: tree_for(&prev),
        refuse: "h_b",
    };

    let report = Reconciler::new(DOC, "New heading")
        .reconcile(&prev, &next, &mut tree)
        .unwrap();

    assert!(tree.inner.exists("h_c"));
    assert!(!tree.inner.exists("h_b"));
    assert_eq!(report.added, 1);
    // Once in the add pass and once more when restoring.
    assert_eq!(report.failures, 2);
}

struct ReentrantTree<'a> {
    inner: MemoryTree,
    reconciler: &'a Reconciler,
    nested: Option<Result<ReconcileReport, ReconcileError>>,
}

impl ExternalTree for ReentrantTree<'_> {
    fn exists(&self, id: &str) -> bool {
        self.inner.exists(id)
    }

    fn add(&mut self, parent: &str, id: &str, label: &str) -> Result<(), TreeError> {
        if self.nested.is_none() {
            let mut scratch = MemoryTree::new("x", "x");
            self.nested = Some(self.reconciler.reconcile(&[], &[], &mut scratch));
        }
        self.inner.add(parent, id, label)
    }

    fn remove(&mut self, id: &str) -> Result<(), TreeError> {
        self.inner.remove(id)
    }

    fn update(&mut self, id: &str, label: &str) -> Result<(), TreeError> {
        self.inner.update(id, label)
    }

    fn select(&mut self, id: &str) -> Result<(), TreeError> {
        self.inner.select(id)
    }

    fn selected(&self) -> Option<String> {
        self.inner.selected()
    }
}

#[test]
fn test_overlapping_pass_is_refused() {
    let reconciler = Reconciler::new(DOC, "New heading");
    let prev = compute_heading_sections("# A");
    let next = compute_heading_sections("# A\n## B");
    let mut tree = ReentrantTree {
        inner: tree_for(&prev),
        reconciler: &reconciler,
        nested: None,
    };

    let report = reconciler.reconcile(&prev, &next, &mut tree).unwrap();
    assert_eq!(report.added, 1);
    assert_eq!(tree.nested, Some(Err(ReconcileError::Busy)));

    // The guard is released once the outer pass returns.
    let mut scratch = MemoryTree::new("x", "x");
    assert!(reconciler.reconcile(&[], &[], &mut scratch).is_ok());
}

#[test]
fn test_root_change_needs_rebuild() {
    let a = compute_heading_sections("# A\n## x");
    let b = compute_heading_sections("# B\n## x");
    assert!(needs_rebuild(&a, &b, DOC));
    assert!(!needs_rebuild(&a, &compute_heading_sections("# A"), DOC));
    assert!(!needs_rebuild(
        &compute_heading_sections("## x"),
        &compute_heading_sections("## y"),
        DOC
    ));
}

#[test]
fn test_cyclic_parents_fall_back_to_root() {
    let prev = compute_heading_sections("# R");
    let mut next = compute_heading_sections("# R\n## A\n## B");
    next[1].parent_id = Some("h_b".into());
    next[2].parent_id = Some("h_a".into());
    let mut tree = tree_for(&prev);

    let report = Reconciler::new(DOC, "New heading")
        .reconcile(&prev, &next, &mut tree)
        .unwrap();

    // Neither ancestor exists when A is added, so the walk gives up at the root.
    assert_eq!(tree.parent("h_a"), Some("h_r"));
    assert_eq!(tree.parent("h_b"), Some("h_a"));
    assert_eq!(report.added, 2);
    assert_eq!(report.failures, 0);
}
