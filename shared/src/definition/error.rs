use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors raised while reading or writing persisted sector definitions
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// The definition file could not be opened, read or written
    #[error("I/O error on definition file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file was readable but does not hold a valid definition
    #[error("Malformed definition file {path:?}: {reason}")]
    Malformed { path: PathBuf, reason: String },
}
