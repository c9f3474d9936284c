//! Configuration to acknowledge developer preferences as well as set defaults.
//!
//! We look for an `mdoutline.toml` in the working directory, and if present we load settings
//! from there. Command line flags override anything set in the file.

use crate::cache::{ParseCache, Parser};
use crate::error::Error;
use crate::heading::IdStrategy;
use facet::Facet;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "mdoutline.toml";

#[derive(Facet, Clone, Debug)]
/// User preferences loaded from `mdoutline.toml` or falling back to defaults.
pub struct Config {
    #[facet(default = "New heading".to_string())]
    /// Label shown for headings with a blank title.
    pub placeholder_label: String,
    #[facet(default = 50)]
    /// How long a parse may be reused for text of unchanged length; 0 disables the cache.
    pub cache_window_ms: u64,
    #[facet(default = "slug".to_string())]
    /// Heading id scheme: `slug` or `positional`.
    pub id_strategy: String,
    #[facet(default = vec!["md".to_string()])]
    /// File suffixes treated as markdown documents.
    pub file_extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            placeholder_label: "New heading".to_string(),
            cache_window_ms: 50,
            id_strategy: "slug".to_string(),
            file_extensions: vec!["md".to_string()],
        }
    }
}

impl Config {
    #[must_use]
    /// Load configuration from `mdoutline.toml` if present, else defaults.
    ///
    /// An unreadable or invalid file is reported as a warning and ignored.
    pub fn load() -> Self {
        match Self::load_from_path(Path::new(CONFIG_FILE)) {
            Ok(Some(config)) => config,
            Ok(None) => Self::default(),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring config file");
                Self::default()
            }
        }
    }

    /// Load configuration from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from_path(path: &Path) -> Result<Option<Self>, Error> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
            .map(Some)
            .map_err(|message| Error::ConfigParse {
                path: path.to_path_buf(),
                message,
            })
    }

    /// Parse configuration from TOML text; missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns the parser message if the text is not valid for this config.
    pub fn from_toml(contents: &str) -> Result<Self, String> {
        facet_toml::from_str::<Self>(contents).map_err(|e| e.to_string())
    }

    #[must_use]
    /// Parsed id strategy.
    pub fn id_strategy(&self) -> IdStrategy {
        IdStrategy::from_name(&self.id_strategy)
    }

    #[must_use]
    /// Heading parser configured with this config's id strategy and cache window.
    pub fn parser(&self) -> Parser {
        let cache = if self.cache_window_ms == 0 {
            ParseCache::disabled()
        } else {
            ParseCache::new(Duration::from_millis(self.cache_window_ms))
        };
        Parser::new(self.id_strategy(), cache)
    }

    /// Read a document, warning when its extension is not a configured markdown one.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read_document(&self, path: &Path) -> Result<String, Error> {
        if !self.is_document(path) {
            tracing::warn!(
                path = %path.display(),
                extensions = ?self.file_extensions,
                "not a markdown file extension, reading anyway"
            );
        }
        fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    #[must_use]
    /// Whether a path has one of the configured markdown extensions.
    pub fn is_document(&self, path: &Path) -> bool {
        path.extension()
            .and_then(std::ffi::OsStr::to_str)
            .is_some_and(|ext| self.file_extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}

#[cfg(test)]
#[path = "tests/config.rs"]
mod tests;
