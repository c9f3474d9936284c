use super::{compute_stable_keys, invert_stable_keys, StableKeyIndex};
use crate::heading::{compute_heading_sections, retitle_heading};
use pretty_assertions::assert_eq;

#[test]
fn test_single_heading_key() {
    let keys = compute_stable_keys(&compute_heading_sections("# Only"));
    assert_eq!(keys.get("h_only").map(String::as_str), Some("0"));
}

#[test]
fn test_keys_follow_sibling_paths() {
    let text = "# A\n## B\n### B1\n### B2\n## C\n# D";
    let index = StableKeyIndex::new(&compute_heading_sections(text));
    assert_eq!(index.key("h_a"), Some("0"));
    assert_eq!(index.key("h_b"), Some("0.0"));
    assert_eq!(index.key("h_b1"), Some("0.0.0"));
    assert_eq!(index.key("h_b2"), Some("0.0.1"));
    assert_eq!(index.key("h_c"), Some("0.1"));
    assert_eq!(index.key("h_d"), Some("1"));
}

#[test]
fn test_key_survives_title_change() {
    let before_text = "# A\n# B\n# C";
    let before = compute_heading_sections(before_text);
    let b = before.iter().find(|h| h.id == "h_b").expect("B parsed");
    let after = compute_heading_sections(&retitle_heading(before_text, b, "Renamed", "New heading"));

    let before_keys = StableKeyIndex::new(&before);
    let after_keys = StableKeyIndex::new(&after);
    assert_eq!(before_keys.key("h_b"), Some("1"));
    assert_eq!(after_keys.key("h_renamed"), Some("1"));
    assert_eq!(after_keys.id("1"), Some("h_renamed"));
}

#[test]
fn test_key_survives_nested_title_change() {
    let text = "# Root\n## First\n## Second\n### Leaf";
    let before = compute_heading_sections(text);
    let second = before.iter().find(|h| h.id == "h_second").expect("parsed");
    let after = compute_heading_sections(&retitle_heading(text, second, "Zweite", "New heading"));

    assert_eq!(StableKeyIndex::new(&before).key("h_second"), Some("0.1"));
    let after_keys = StableKeyIndex::new(&after);
    assert_eq!(after_keys.key("h_zweite"), Some("0.1"));
    assert_eq!(after_keys.key("h_leaf"), Some("0.1.0"));
}

#[test]
fn test_inserting_a_sibling_above_shifts_keys() {
    let before = StableKeyIndex::new(&compute_heading_sections("# A\n## B"));
    let after = StableKeyIndex::new(&compute_heading_sections("# A\n## New\n## B"));
    assert_eq!(before.key("h_b"), Some("0.0"));
    assert_eq!(after.key("h_b"), Some("0.1"));
}

#[test]
fn test_orphans_are_keyed_as_top_level_siblings() {
    let index = StableKeyIndex::new(&compute_heading_sections("## Pre\n# Main\n## Sub"));
    assert_eq!(index.key("h_pre"), Some("0"));
    assert_eq!(index.key("h_main"), Some("1"));
    assert_eq!(index.key("h_sub"), Some("1.0"));
}

#[test]
fn test_invert_round_trips_ids() {
    let keys = compute_stable_keys(&compute_heading_sections("# A\n## B\n## C"));
    let inverse = invert_stable_keys(&keys);
    assert_eq!(inverse.len(), keys.len());
    for (id, key) in &keys {
        assert_eq!(inverse.get(key), Some(id));
    }
}

#[test]
fn test_empty_outline_has_no_keys() {
    let index = StableKeyIndex::new(&[]);
    assert!(index.by_id.is_empty());
    assert_eq!(index.id("0"), None);
}

#[test]
fn test_cyclic_parents_terminate() {
    let mut headings = compute_heading_sections("# R\n## A\n## B");
    headings[1].parent_id = Some("h_b".into());
    headings[2].parent_id = Some("h_a".into());

    let keys = compute_stable_keys(&headings);
    assert_eq!(keys.get("h_r").map(String::as_str), Some("0"));
    // Each sits alone under the other, and the walk stops at the repeat.
    assert_eq!(keys.get("h_a").map(String::as_str), Some("0.0"));
    assert_eq!(keys.get("h_b").map(String::as_str), Some("0.0"));
}
