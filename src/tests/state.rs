use super::CollapsedStore;
use crate::error::Error;
use crate::heading::{compute_heading_sections, retitle_heading};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

const DOC: &str = "notes/plan.md";

#[test]
fn test_missing_file_loads_empty_store() {
    let dir = TempDir::new().unwrap();
    let store = CollapsedStore::load(&dir.path().join("state.json")).unwrap();
    assert_eq!(store, CollapsedStore::default());
}

#[test]
fn test_save_then_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("state.json");
    let headings = compute_heading_sections("# A\n## B\n## C");

    let mut store = CollapsedStore::default();
    assert!(store.set_collapsed(DOC, &headings, "h_c", true));
    store.save(&path).unwrap();

    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.contains("collapsedByFile"));
    assert!(raw.contains("\"0.1\""));

    let loaded = CollapsedStore::load(&path).unwrap();
    assert_eq!(loaded, store);
    assert_eq!(loaded.collapsed_ids(DOC, &headings), vec!["h_c".to_string()]);
}

#[test]
fn test_invalid_json_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json");
    fs::write(&path, "{not json").unwrap();
    assert!(matches!(
        CollapsedStore::load(&path),
        Err(Error::StateParse { .. })
    ));
}

#[test]
fn test_unknown_fields_default() {
    let store: CollapsedStore = serde_json::from_str("{}").unwrap();
    assert!(store.collapsed_by_file.is_empty());
}

#[test]
fn test_collapse_survives_retitle() {
    let text = "# A\n## B\n### B1";
    let headings = compute_heading_sections(text);
    let mut store = CollapsedStore::default();
    store.set_collapsed(DOC, &headings, "h_b", true);

    let b = &headings[1];
    let edited = compute_heading_sections(&retitle_heading(text, b, "Beta", "New heading"));
    assert_eq!(store.collapsed_ids(DOC, &edited), vec!["h_beta".to_string()]);
}

#[test]
fn test_expand_removes_key_and_empty_entry() {
    let headings = compute_heading_sections("# A\n## B");
    let mut store = CollapsedStore::default();
    store.set_collapsed(DOC, &headings, "h_b", true);
    assert!(store.set_collapsed(DOC, &headings, "h_b", false));
    assert!(store.collapsed_ids(DOC, &headings).is_empty());
    assert!(!store.collapsed_by_file.contains_key(DOC));
}

#[test]
fn test_unknown_heading_is_ignored() {
    let headings = compute_heading_sections("# A");
    let mut store = CollapsedStore::default();
    assert!(!store.set_collapsed(DOC, &headings, "h_nope", true));
    assert!(store.collapsed_by_file.is_empty());
}

#[test]
fn test_documents_are_independent() {
    let headings = compute_heading_sections("# A\n## B");
    let mut store = CollapsedStore::default();
    store.set_collapsed("one.md", &headings, "h_b", true);
    assert!(store.collapsed_ids("two.md", &headings).is_empty());
}

#[test]
fn test_rename_and_forget() {
    let headings = compute_heading_sections("# A\n## B");
    let mut store = CollapsedStore::default();
    store.set_collapsed("old.md", &headings, "h_b", true);

    store.rename("old.md", "new.md");
    assert!(store.collapsed_ids("old.md", &headings).is_empty());
    assert_eq!(store.collapsed_ids("new.md", &headings), vec!["h_b".to_string()]);

    store.forget("new.md");
    assert!(store.collapsed_by_file.is_empty());
}
