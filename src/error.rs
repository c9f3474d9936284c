//! Error types shared by the library and the binary.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
/// Failures at the crate's I/O edges. Parsing itself never fails.
pub enum Error {
    #[error("Failed to read {path}: {source}")]
    /// A document or state file could not be read.
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    /// A state file could not be written.
    Write {
        /// File that was being written.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {message}")]
    /// The config file exists but is not valid TOML for [`crate::config::Config`].
    ConfigParse {
        /// Config file path.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    #[error("Invalid collapsed-state file at {path}: {source}")]
    /// The collapsed-state file is not valid JSON.
    StateParse {
        /// State file path.
        path: PathBuf,
        /// JSON error.
        source: serde_json::Error,
    },

    #[error("Failed to serialize: {0}")]
    /// Output could not be serialized.
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    /// Reconciliation was refused.
    Reconcile(#[from] ReconcileError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Failures reported by an external tree for a single operation.
pub enum TreeError {
    #[error("node {0} does not exist")]
    /// The node to change is absent.
    Missing(String),
    #[error("node {0} already exists")]
    /// The node to add is already present.
    Exists(String),
    #[error("operation not supported by this tree")]
    /// The tree has no such primitive.
    Unsupported,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Reasons a reconciliation pass did not run.
pub enum ReconcileError {
    #[error("a reconciliation pass is already running for this tree")]
    /// Another pass holds the in-flight guard.
    Busy,
}
