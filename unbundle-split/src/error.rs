use thiserror::Error;

use crate::formatter::FormatError;

/// Result type for splitting operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A declaration does not have the shape the classifier relies on.
    #[error("{file}:{line}: bad receiver on method {method}: {reason}")]
    MalformedReceiver {
        file: String,
        line: usize,
        method: String,
        reason: String,
    },

    #[error("error formatting {file_name} (bucket {bucket:?})")]
    Formatting {
        bucket: String,
        file_name: String,
        #[source]
        source: FormatError,
    },
}
