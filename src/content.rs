//! Informal structure beneath a heading.
//!
//! Body text rarely uses sub-headings for everything. People write bold lead-ins, numbered
//! steps, task lists and "Title:" lines followed by bullets. This module recovers a nested
//! outline from those conventions so they can hang under their heading in the mind map.
//!
//! Line classification is an ordered cascade of [`Rule`]s; the first rule that matches
//! a line decides its kind and label. Nesting is then derived from a structural base depth
//! (raised by lead-in lines) and from list indentation.

use crate::heading::{is_heading_line, strip_cr};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

const BULLETS: &str = "-*+–—•";

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($re).expect("valid pattern"));
    };
}

pattern!(NUMBERED_BOLD, r"^(\s*)(\d+)\.\s*\*\*(.+?)\*\*[：:]?.*$");
pattern!(BOLD_LEAD, r"^(\s*)\*\*(.+?)\*\*[：:]?.*$");
pattern!(TASK_ITEM, r"^(\s*)[-*+–—•]\s+\[([ xX])\]\s*(.*)$");
pattern!(ORDERED_ITEM, r"^(\s*)(\d+)[.)．、]\s+(.+)$");
pattern!(UNORDERED_ITEM, r"^(\s*)[-*+–—•]\s+(.+)$");
pattern!(LEADING_BOLD, r"^\*\*(.+?)\*\*");
pattern!(TITLE_COLON_TAIL, r"[：:]\s*(?:[(（][^)）]*[)）])?\s*$");
pattern!(STANDALONE_EMPHASIS, r"^\s*(?:__(.+?)__|\*([^*].*?)\*|_([^_].*?)_)\s*$");
pattern!(FENCE, r"^\s*```");

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
/// Checkbox state of a task item.
pub struct TaskMeta {
    /// Always true for task items.
    pub task: bool,
    /// Whether the box is checked.
    pub done: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
/// A non-heading structural node.
pub struct ContentNode {
    /// Text with list, task and emphasis markup removed.
    pub label: String,
    /// Nested nodes in document order.
    pub children: Vec<ContentNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Present only for checkbox items.
    pub meta: Option<TaskMeta>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// What a classified line contributes to the structure.
pub enum LineKind {
    /// `1. **Step**` numbered item with a bold lead.
    NumberedBold,
    /// Line opening with a bold span.
    BoldLead,
    /// `- [ ]` / `- [x]` checkbox item.
    Task,
    /// Short line ending in a colon that introduces a list.
    TitleColon,
    /// Ordered or unordered list item.
    ListItem,
    /// Standalone italic or underscore-bold line.
    Emphasis,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Outcome of classifying one line.
pub struct Classified {
    /// Structural role of the line.
    pub kind: LineKind,
    /// Leading indentation in columns (tabs count as four).
    pub indent: usize,
    /// Label before the trailing-colon cleanup.
    pub label: String,
    /// Task metadata for checkbox items.
    pub meta: Option<TaskMeta>,
}

/// A line together with the lookahead some rules need.
pub struct LineContext<'a> {
    /// The line being classified, without its line ending.
    pub line: &'a str,
    /// The next non-blank line inside the scanned range, if any.
    pub next_non_blank: Option<&'a str>,
}

/// One step of the classification cascade.
pub struct Rule {
    /// Short name used in logs and tests.
    pub name: &'static str,
    /// Returns a classification when the rule applies.
    pub classify: fn(&LineContext<'_>) -> Option<Classified>,
}

/// Classification rules in priority order.
pub const RULES: &[Rule] = &[
    Rule {
        name: "numbered-bold",
        classify: numbered_bold,
    },
    Rule {
        name: "bold-lead",
        classify: bold_lead,
    },
    Rule {
        name: "task",
        classify: task_item,
    },
    Rule {
        name: "title-colon",
        classify: title_colon,
    },
    Rule {
        name: "list-item",
        classify: list_item,
    },
    Rule {
        name: "emphasis",
        classify: standalone_emphasis,
    },
];

fn indent_width(ws: &str) -> usize {
    ws.chars().map(|c| if c == '\t' { 4 } else { 1 }).sum()
}

fn bold_or_text(text: &str) -> String {
    let text = text.trim();
    LEADING_BOLD
        .captures(text)
        .map_or_else(|| text.to_string(), |c| c[1].trim().to_string())
}

fn is_list_or_task(line: &str) -> bool {
    TASK_ITEM.is_match(line) || ORDERED_ITEM.is_match(line) || UNORDERED_ITEM.is_match(line)
}

fn numbered_bold(ctx: &LineContext<'_>) -> Option<Classified> {
    let c = NUMBERED_BOLD.captures(ctx.line)?;
    Some(Classified {
        kind: LineKind::NumberedBold,
        indent: indent_width(&c[1]),
        label: format!("{}. {}", &c[2], c[3].trim()),
        meta: None,
    })
}

fn bold_lead(ctx: &LineContext<'_>) -> Option<Classified> {
    let c = BOLD_LEAD.captures(ctx.line)?;
    Some(Classified {
        kind: LineKind::BoldLead,
        indent: indent_width(&c[1]),
        label: c[2].trim().to_string(),
        meta: None,
    })
}

fn task_item(ctx: &LineContext<'_>) -> Option<Classified> {
    let c = TASK_ITEM.captures(ctx.line)?;
    Some(Classified {
        kind: LineKind::Task,
        indent: indent_width(&c[1]),
        label: bold_or_text(&c[3]),
        meta: Some(TaskMeta {
            task: true,
            done: !c[2].trim().is_empty(),
        }),
    })
}

fn title_colon(ctx: &LineContext<'_>) -> Option<Classified> {
    let trimmed = ctx.line.trim();
    let len = trimmed.chars().count();
    if !(1..=80).contains(&len) {
        return None;
    }
    let first = trimmed.chars().next()?;
    if BULLETS.contains(first) || first == '#' || ORDERED_ITEM.is_match(trimmed) {
        return None;
    }
    if !TITLE_COLON_TAIL.is_match(trimmed) {
        return None;
    }
    // Prose ending in a colon only becomes structure when a list follows.
    if !ctx.next_non_blank.is_some_and(is_list_or_task) {
        return None;
    }
    Some(Classified {
        kind: LineKind::TitleColon,
        indent: indent_width(&ctx.line[..ctx.line.len() - ctx.line.trim_start().len()]),
        label: trimmed.to_string(),
        meta: None,
    })
}

fn list_item(ctx: &LineContext<'_>) -> Option<Classified> {
    if let Some(c) = ORDERED_ITEM.captures(ctx.line) {
        return Some(Classified {
            kind: LineKind::ListItem,
            indent: indent_width(&c[1]),
            label: format!("{}. {}", &c[2], bold_or_text(&c[3])),
            meta: None,
        });
    }
    let c = UNORDERED_ITEM.captures(ctx.line)?;
    Some(Classified {
        kind: LineKind::ListItem,
        indent: indent_width(&c[1]),
        label: bold_or_text(&c[2]),
        meta: None,
    })
}

fn standalone_emphasis(ctx: &LineContext<'_>) -> Option<Classified> {
    let c = STANDALONE_EMPHASIS.captures(ctx.line)?;
    let inner = c.get(1).or_else(|| c.get(2)).or_else(|| c.get(3))?;
    Some(Classified {
        kind: LineKind::Emphasis,
        indent: 0,
        label: inner.as_str().trim().to_string(),
        meta: None,
    })
}

#[must_use]
/// Run the cascade on one line, returning the first match and the rule that produced it.
pub fn classify_line(ctx: &LineContext<'_>) -> Option<(&'static str, Classified)> {
    RULES
        .iter()
        .find_map(|rule| (rule.classify)(ctx).map(|c| (rule.name, c)))
}

#[must_use]
/// Remove a trailing colon (and a parenthetical after it) from a label.
pub fn clean_label(label: &str) -> String {
    let stripped = TITLE_COLON_TAIL.replace(label.trim(), "");
    let stripped = stripped.trim();
    if stripped.is_empty() {
        label.trim().to_string()
    } else {
        stripped.to_string()
    }
}

struct Slot {
    node: ContentNode,
    children: Vec<usize>,
}

/// Arena used while nesting, so frames can refer to nodes by index.
#[derive(Default)]
struct Forest {
    slots: Vec<Slot>,
    roots: Vec<usize>,
    stack: Vec<(usize, usize)>,
}

impl Forest {
    fn place(&mut self, depth: usize, node: ContentNode) {
        while self.stack.last().is_some_and(|&(d, _)| d >= depth) {
            self.stack.pop();
        }
        let idx = self.slots.len();
        self.slots.push(Slot {
            node,
            children: Vec::new(),
        });
        match self.stack.last() {
            Some(&(_, parent)) => self.slots[parent].children.push(idx),
            None => self.roots.push(idx),
        }
        self.stack.push((depth, idx));
    }

    fn assemble(&self, idx: usize) -> ContentNode {
        let slot = &self.slots[idx];
        let mut node = slot.node.clone();
        node.children = slot.children.iter().map(|&c| self.assemble(c)).collect();
        node
    }

    fn finish(self) -> Vec<ContentNode> {
        self.roots.iter().map(|&r| self.assemble(r)).collect()
    }
}

/// Index of the line containing char offset `offset`.
fn line_of(line_starts: &[usize], offset: usize) -> usize {
    line_starts
        .partition_point(|&s| s <= offset)
        .saturating_sub(1)
}

#[must_use]
/// Extract the content forest for the char range `[start_offset, end_offset]`.
///
/// Extraction stops before the first heading line inside the range, and fenced code
/// blocks are skipped entirely.
pub fn extract_content_tree(text: &str, start_offset: usize, end_offset: usize) -> Vec<ContentNode> {
    let lines: Vec<&str> = text.split('\n').map(strip_cr).collect();
    let text_len = text.chars().count();
    if start_offset > end_offset || start_offset > text_len {
        return Vec::new();
    }

    let mut line_starts = Vec::with_capacity(lines.len());
    let mut offset = 0;
    for raw in text.split('\n') {
        line_starts.push(offset);
        offset += raw.chars().count() + 1;
    }

    let first = line_of(&line_starts, start_offset);
    let mut last = line_of(&line_starts, end_offset.min(text_len));
    if let Some(boundary) = (first..=last).find(|&i| is_heading_line(&lines, i)) {
        if boundary == first {
            return Vec::new();
        }
        last = boundary - 1;
    }

    let mut forest = Forest::default();
    let mut structural_base = 0;
    let mut base_floor_after_bold = 0;
    let mut in_code = false;

    for i in first..=last {
        let line = lines[i];
        if FENCE.is_match(line) {
            in_code = !in_code;
            continue;
        }
        if in_code {
            continue;
        }
        if line.trim().is_empty() {
            structural_base = base_floor_after_bold;
            continue;
        }

        let next_non_blank = lines[i + 1..=last]
            .iter()
            .copied()
            .find(|l| !l.trim().is_empty());
        let ctx = LineContext {
            line,
            next_non_blank,
        };
        let Some((rule, classified)) = classify_line(&ctx) else {
            continue;
        };
        tracing::trace!(line = i, rule, "classified content line");

        let depth = match classified.kind {
            LineKind::BoldLead => 0,
            LineKind::Emphasis => base_floor_after_bold,
            LineKind::TitleColon => structural_base,
            LineKind::Task | LineKind::ListItem | LineKind::NumberedBold => {
                (classified.indent / 2).max(structural_base)
            }
        };
        match classified.kind {
            LineKind::BoldLead => {
                structural_base = 1;
                base_floor_after_bold = 1;
            }
            LineKind::Emphasis | LineKind::TitleColon => structural_base = depth + 1,
            _ => {}
        }

        forest.place(
            depth,
            ContentNode {
                label: clean_label(&classified.label),
                children: Vec::new(),
                meta: classified.meta,
            },
        );
    }

    forest.finish()
}

#[cfg(test)]
#[path = "tests/content.rs"]
mod tests;
