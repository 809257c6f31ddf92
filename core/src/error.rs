use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
    /// A document (or a commit file) could not be written. For a single document
    /// this is recoverable: batch callers skip it and move on.
    #[error("index write failed for {name}: {reason}")]
    IndexWrite { name: String, reason: String },

    #[error("failed to open index at {}: {source}", path.display())]
    IndexOpen {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("failed to read index file {}: {source}", path.display())]
    IndexRead {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("could not parse query {query:?}: {reason}")]
    QueryParse { query: String, reason: String },

    #[error("term {term:?} of document {doc_id} is missing from the vocabulary")]
    Vectorization { doc_id: u32, term: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    pub(crate) fn open(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        Error::IndexOpen { path: path.into(), source: source.into() }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        Error::IndexRead { path: path.into(), source: source.into() }
    }

    pub(crate) fn write(name: &str, reason: impl ToString) -> Self {
        Error::IndexWrite { name: name.to_string(), reason: reason.to_string() }
    }
}
