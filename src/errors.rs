//! Submodule defining the errors used across the crate.

use std::io;
use std::path::PathBuf;

/// Errors that can occur while splitting SQL text into named statements.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// A marker declared a name outside of `[A-Za-z0-9_]+` (the empty name included).
    #[error("invalid query name {0:?}")]
    InvalidStatementName(String),

    /// The same name was declared twice while strict mode was enabled.
    #[error("duplicate query name {0:?}")]
    DuplicateStatementName(String),

    /// The configured marker token cannot be used to delimit statements.
    #[error("invalid query marker: {0}")]
    InvalidMarker(String),
}

/// Errors that can occur while copying statements into a [`QueryTarget`](crate::QueryTarget).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    /// A tagged field requested a statement that was never declared.
    #[error("could not find query {0}")]
    QueryNotFound(String),

    /// A tagged field cannot receive SQL text.
    #[error("field {0} cannot be changed or is not a string")]
    FieldNotAssignable(&'static str),
}

/// Errors raised by the file-system layer of the [`loader`](crate::loader).
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A source could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// The source being read.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// The directory walk failed.
    #[error("cannot walk {}: {source}", path.display())]
    Walk {
        /// The entry being visited when the walk failed.
        path: PathBuf,
        /// The underlying walk error.
        source: walkdir::Error,
    },

    /// A single source contained malformed statements.
    #[error("{}: {source}", path.display())]
    Parse {
        /// The offending source.
        path: PathBuf,
        /// The segmentation error.
        source: ParseError,
    },
}

/// Errors that can occur when loading queries end to end.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Segmentation failed.
    #[error("cannot load queries: {0}")]
    Parse(#[from] ParseError),

    /// Binding failed.
    #[error("cannot load queries: {0}")]
    Bind(#[from] BindError),

    /// Reading or walking the sources failed.
    #[error("cannot load queries: {0}")]
    Load(#[from] LoadError),
}
