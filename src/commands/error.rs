//! Errors raised while locating or reading a definitions file.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandsError {
    /// No `*<suffix>` file exists in the searched directory.
    #[error("No *{suffix} file found in {}", dir.display())]
    DefinitionsFileNotFound { dir: PathBuf, suffix: String },

    /// The definitions file exists but could not be read.
    #[error("Failed to read definitions file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The directory could not be listed.
    #[error("Failed to list directory '{}': {source}", dir.display())]
    ListDir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type CommandsResult<T> = Result<T, CommandsError>;
