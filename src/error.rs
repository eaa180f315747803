//! Error types for the command-line front end and configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the CLI and the config layer.
///
/// DOM work never fails: heuristics that do not match are silent no-ops.
#[derive(Debug, Error)]
pub enum FlagFixError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize document: {0}")]
    Serialize(#[source] std::io::Error),

    #[error("No config directory available on this platform")]
    NoConfigDir,
}
