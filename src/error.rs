use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Rejected insertion into the file hierarchy.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("path {path:?} has shorter clean equivalent {clean:?}")]
    InvalidPath { path: String, clean: String },

    #[error("path {0:?} was already inserted")]
    DuplicatePath(String),
}

#[derive(Debug, Error)]
pub enum TreemapError {
    #[error("no such node: {0}")]
    NodeNotFound(String),
}

/// Failures reported by the directory walker. None of these stop a scan.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error(transparent)]
    Traverse(#[from] jwalk::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Any non-fatal error surfaced to the renderer alongside a state update.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Treemap(#[from] TreemapError),

    #[error(transparent)]
    Walk(#[from] WalkError),
}
