//! Short-lived memoization of heading parses.
//!
//! Editors tend to ask for the outline several times per keystroke. The cache returns the
//! previous parse when the text length is unchanged and the previous parse is younger than
//! the configured window. It is a shortcut only: any caller that needs exact results should
//! use a disabled cache or the free parsing functions.

use crate::heading::{compute_heading_sections_with, HeadingNode, IdStrategy};
use std::time::{Duration, Instant};

struct CachedParse {
    text_len: usize,
    parsed_at: Instant,
    headings: Vec<HeadingNode>,
}

/// Length- and time-bounded memo of the last heading parse.
pub struct ParseCache {
    window: Option<Duration>,
    last: Option<CachedParse>,
}

impl ParseCache {
    #[must_use]
    /// Cache that reuses a parse for `window` after it was produced.
    pub fn new(window: Duration) -> Self {
        Self {
            window: Some(window),
            last: None,
        }
    }

    #[must_use]
    /// Cache that never hits.
    pub fn disabled() -> Self {
        Self {
            window: None,
            last: None,
        }
    }

    fn lookup(&self, text_len: usize, now: Instant) -> Option<&[HeadingNode]> {
        let window = self.window?;
        let last = self.last.as_ref()?;
        let fresh = now.saturating_duration_since(last.parsed_at) <= window;
        (last.text_len == text_len && fresh).then_some(last.headings.as_slice())
    }

    fn store(&mut self, text_len: usize, now: Instant, headings: &[HeadingNode]) {
        if self.window.is_some() {
            self.last = Some(CachedParse {
                text_len,
                parsed_at: now,
                headings: headings.to_vec(),
            });
        }
    }

    /// Drop any remembered parse.
    pub fn invalidate(&mut self) {
        self.last = None;
    }
}

impl Default for ParseCache {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Heading parser with an id strategy and an injectable cache.
#[derive(Default)]
pub struct Parser {
    /// How heading ids are derived.
    pub strategy: IdStrategy,
    cache: ParseCache,
}

impl Parser {
    #[must_use]
    /// Build a parser with the given id strategy and cache.
    pub fn new(strategy: IdStrategy, cache: ParseCache) -> Self {
        Self { strategy, cache }
    }

    /// Parse `text`, possibly returning the previous result when the cache hits.
    pub fn parse(&mut self, text: &str) -> Vec<HeadingNode> {
        self.parse_at(text, Instant::now())
    }

    pub(crate) fn parse_at(&mut self, text: &str, now: Instant) -> Vec<HeadingNode> {
        let text_len = text.len();
        if let Some(hit) = self.cache.lookup(text_len, now) {
            tracing::trace!(text_len, "heading cache hit");
            return hit.to_vec();
        }
        let headings = compute_heading_sections_with(text, self.strategy);
        self.cache.store(text_len, now, &headings);
        headings
    }

    /// Forget the cached parse, e.g. after a length-changing edit was applied elsewhere.
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }
}

#[cfg(test)]
#[path = "tests/cache.rs"]
mod tests;
