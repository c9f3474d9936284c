//! Heading extraction for markdown documents.
//!
//! A heading represents a hierarchical division of a document. Headings track their
//! position in the outline through parent/child relationships and carry the character
//! offsets needed to slice out their section body from the source text.
//!
//! Recognition is line-based and deliberately lenient: heading-like lines inside fenced
//! code blocks still count as headings here. Fence awareness belongs to the content
//! extractor only.

use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::LazyLock;

static ATX_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.*)$").expect("valid ATX pattern"));
static ATX_LINE_PARTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(#{1,6})([ \t]+)(.*?)([ \t#]*)$").expect("valid ATX parts pattern")
});
static SETEXT_H1_UNDERLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^=+\s*$").expect("valid setext pattern"));
// Exactly three dashes is a thematic break or frontmatter fence, never an underline.
static SETEXT_H2_UNDERLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-{4,}\s*$").expect("valid setext pattern"));

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
/// Markup used to write a heading.
pub enum HeadingStyle {
    /// Leading `#` characters.
    Atx,
    /// Title line followed by a `=` or `----` underline.
    Setext,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// How heading ids are derived.
pub enum IdStrategy {
    /// `h_` + slug of the title, deduplicated with `_2`, `_3`, ...
    #[default]
    Slug,
    /// `h_{line}_{offset}`: survives title edits but not insertions above the heading.
    Positional,
}

impl IdStrategy {
    #[must_use]
    /// Parse the config spelling of a strategy, defaulting to slugs.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "positional" | "position" => Self::Positional,
            _ => Self::Slug,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
/// One markdown heading with its section coordinates.
pub struct HeadingNode {
    /// Identifier unique within one parse.
    pub id: String,
    /// Outline depth, 1 to 6.
    pub level: usize,
    /// Heading text without markup, trimmed.
    pub title: String,
    /// Char offset where the heading line begins.
    pub start: usize,
    /// Char offset where the section body ends (inclusive).
    pub end: usize,
    /// Zero-based line of the heading's first line.
    pub line_start: usize,
    /// Char offset at the end of the heading's own text line.
    pub heading_text_end: usize,
    /// Nearest preceding heading with a strictly lower level.
    pub parent_id: Option<String>,
    /// Ids of direct children in document order.
    pub children: Vec<String>,
    /// Markup used for this heading.
    pub style: HeadingStyle,
}

struct RawHeading {
    level: usize,
    title: String,
    start: usize,
    line_start: usize,
    line_len: usize,
    style: HeadingStyle,
}

/// Strip the carriage return left behind by CRLF line endings.
pub(crate) fn strip_cr(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

/// Match an ATX heading line, returning its level and trimmed title.
pub(crate) fn match_atx(line: &str) -> Option<(usize, String)> {
    let caps = ATX_HEADING.captures(strip_cr(line))?;
    Some((caps[1].len(), caps[2].trim().to_string()))
}

/// Match a setext heading from a title line and the line after it.
pub(crate) fn match_setext(line: &str, next: &str) -> Option<usize> {
    let line = strip_cr(line);
    if line.trim().is_empty() || ATX_HEADING.is_match(line) {
        return None;
    }
    let next = strip_cr(next);
    if SETEXT_H1_UNDERLINE.is_match(next) {
        Some(1)
    } else if SETEXT_H2_UNDERLINE.is_match(next) {
        Some(2)
    } else {
        None
    }
}

/// Whether `lines[i]` opens a heading of either style.
pub(crate) fn is_heading_line(lines: &[&str], i: usize) -> bool {
    match_atx(lines[i]).is_some()
        || lines
            .get(i + 1)
            .is_some_and(|next| match_setext(lines[i], next).is_some())
}

#[must_use]
/// Reduce a title to a lowercase, hyphenated identifier fragment.
///
/// Keeps ASCII alphanumerics, hyphens and CJK ideographs. Empty results become `untitled`.
pub fn slugify(title: &str) -> String {
    let lowered = title.trim().to_lowercase();
    let hyphenated = lowered.split_whitespace().collect::<Vec<_>>().join("-");
    let kept: String = hyphenated
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || is_cjk(*c))
        .collect();
    let trimmed = kept.trim_matches('-');
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

fn is_cjk(c: char) -> bool {
    matches!(c, '\u{3400}'..='\u{4DBF}' | '\u{4E00}'..='\u{9FFF}' | '\u{F900}'..='\u{FAFF}')
}

fn scan(text: &str) -> Vec<RawHeading> {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut raw = Vec::new();
    let mut offset = 0;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let line_len = line.chars().count();

        if let Some((level, title)) = match_atx(line) {
            raw.push(RawHeading {
                level,
                title,
                start: offset,
                line_start: i,
                line_len,
                style: HeadingStyle::Atx,
            });
        } else if let Some(level) = lines.get(i + 1).and_then(|next| match_setext(line, next)) {
            raw.push(RawHeading {
                level,
                title: strip_cr(line).trim().to_string(),
                start: offset,
                line_start: i,
                line_len,
                style: HeadingStyle::Setext,
            });
            // The underline is consumed with its title.
            offset += line_len + 1;
            i += 1;
            offset += lines[i].chars().count() + 1;
            i += 1;
            continue;
        }

        offset += line_len + 1;
        i += 1;
    }

    raw
}

fn assign_ids(raw: &[RawHeading], strategy: IdStrategy) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    raw.iter()
        .map(|h| match strategy {
            IdStrategy::Positional => format!("h_{}_{}", h.line_start, h.start),
            IdStrategy::Slug => {
                let base = format!("h_{}", slugify(&h.title));
                let count = seen.entry(base.clone()).or_insert(0);
                *count += 1;
                if *count == 1 {
                    base
                } else {
                    format!("{base}_{count}")
                }
            }
        })
        .collect()
}

#[must_use]
/// Parse headings with slug-derived ids.
pub fn compute_heading_sections(text: &str) -> Vec<HeadingNode> {
    compute_heading_sections_with(text, IdStrategy::Slug)
}

#[must_use]
/// Parse headings, assigning section ranges and outline parents.
///
/// Each heading's section runs to one char before the next heading of equal or higher
/// rank, or to the end of the text. Parents come from a level-ordered stack.
pub fn compute_heading_sections_with(text: &str, strategy: IdStrategy) -> Vec<HeadingNode> {
    let raw = scan(text);
    let ids = assign_ids(&raw, strategy);
    let text_len = text.chars().count();

    let mut headings: Vec<HeadingNode> = raw
        .iter()
        .zip(ids)
        .map(|(h, id)| HeadingNode {
            id,
            level: h.level,
            title: h.title.clone(),
            start: h.start,
            end: text_len,
            line_start: h.line_start,
            heading_text_end: h.start + h.line_len,
            parent_id: None,
            children: Vec::new(),
            style: h.style,
        })
        .collect();

    for i in 0..headings.len() {
        if let Some(next) = headings[i + 1..]
            .iter()
            .find(|h| h.level <= headings[i].level)
        {
            headings[i].end = next.start - 1;
        }
    }

    let mut stack: Vec<usize> = Vec::new();
    for i in 0..headings.len() {
        while stack
            .last()
            .is_some_and(|&top| headings[top].level >= headings[i].level)
        {
            stack.pop();
        }
        if let Some(&parent) = stack.last() {
            let child_id = headings[i].id.clone();
            headings[i].parent_id = Some(headings[parent].id.clone());
            headings[parent].children.push(child_id);
        }
        stack.push(i);
    }

    tracing::debug!(count = headings.len(), "parsed headings");
    headings
}

/// Byte index of char offset `n`, clamped to the end of `text`.
fn byte_at(text: &str, n: usize) -> usize {
    text.char_indices().nth(n).map_or(text.len(), |(b, _)| b)
}

#[must_use]
/// Rewrite a heading's title line in `text`, keeping its markup and everything else.
///
/// ATX lines keep their hashes, the whitespace after them and any closing `#` run. A blank
/// `new_title` writes `placeholder` instead.
pub fn retitle_heading(text: &str, heading: &HeadingNode, new_title: &str, placeholder: &str) -> String {
    let start = byte_at(text, heading.start);
    let end = byte_at(text, heading.heading_text_end);
    let old_line = &text[start..end];
    let cr = if old_line.ends_with('\r') { "\r" } else { "" };
    let title = match new_title.trim() {
        "" => placeholder.trim(),
        t => t,
    };
    let new_line = match heading.style {
        HeadingStyle::Atx => match ATX_LINE_PARTS.captures(strip_cr(old_line)) {
            Some(c) => format!("{}{}{title}{}", &c[1], &c[2], &c[4]),
            None => format!("{} {title}", "#".repeat(heading.level.clamp(1, 6))),
        },
        HeadingStyle::Setext => title.to_string(),
    };
    let mut out = String::with_capacity(text.len() + new_line.len());
    out.push_str(&text[..start]);
    out.push_str(&new_line);
    out.push_str(cr);
    out.push_str(&text[end..]);
    out
}

#[must_use]
/// Insert a placeholder heading at the end of `parent`'s section, one level deeper.
///
/// Without a parent the new heading is a level-1 heading at the end of the document.
pub fn insert_child_heading(text: &str, parent: Option<&HeadingNode>, placeholder: &str) -> String {
    let text_len = text.chars().count();
    let (level, at) = parent.map_or((1, text_len), |p| {
        ((p.level + 1).min(6), (p.end + 1).min(text_len))
    });
    let at_byte = byte_at(text, at);
    let needs_newline = at > 0 && !text[..at_byte].ends_with('\n');
    let mut out = String::with_capacity(text.len() + placeholder.len() + level + 3);
    out.push_str(&text[..at_byte]);
    if needs_newline {
        out.push('\n');
    }
    out.push_str(&"#".repeat(level));
    out.push(' ');
    out.push_str(placeholder);
    out.push('\n');
    out.push_str(&text[at_byte..]);
    out
}

#[must_use]
/// Remove a heading together with its whole section, nested headings included.
pub fn delete_heading_section(text: &str, heading: &HeadingNode) -> String {
    let text_len = text.chars().count();
    let start = byte_at(text, heading.start.min(text_len));
    let end = byte_at(text, (heading.end + 1).min(text_len)).max(start);
    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..start]);
    out.push_str(&text[end..]);
    out
}

#[cfg(test)]
#[path = "tests/heading.rs"]
mod tests;
