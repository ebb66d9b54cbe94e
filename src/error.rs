//! Crate error type.
//!
//! Detection, resolution and substitution never fail: a rule that does not
//! match simply contributes nothing, and an unbound placeholder stays in the
//! text. Only the edges that touch bytes (loading a document, reading a data
//! source, saving output) can fail, and those failures are propagated as-is.

use std::path::PathBuf;

/// Errors produced while loading or saving documents, data sources and
/// dictionaries, or while addressing blocks by path.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input bytes are not a document this crate understands.
    #[error("malformed document: {0}")]
    MalformedDocument(#[source] serde_json::Error),

    /// Reading or writing `path` failed.
    #[error("i/o error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serializing a value for output failed.
    #[error("failed to encode {what}: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A CSV data source could not be read.
    #[error("malformed data source: {0}")]
    MalformedCsv(#[from] csv::Error),

    /// A JSON data source is not an array of flat objects.
    #[error("malformed data source: {0}")]
    MalformedRows(String),

    /// A block path string could not be parsed.
    #[error("invalid block path '{0}'")]
    InvalidBlockPath(String),

    /// A well-formed block path does not point at a paragraph in the document.
    #[error("no paragraph at block path '{0}'")]
    NoSuchBlock(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
