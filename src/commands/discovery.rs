//! Locating the definitions file.

use super::error::{CommandsError, CommandsResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name suffix of definitions files (`*_commands.h`).
pub const DEFAULT_SUFFIX: &str = "_commands.h";

/// First regular, non-hidden file in `dir` whose name ends with `suffix`.
///
/// Entries are visited in directory-listing order, which is whatever the
/// platform returns; with several candidates the first one listed wins.
pub fn find_definitions_file(dir: impl AsRef<Path>, suffix: &str) -> CommandsResult<PathBuf> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir).map_err(|source| CommandsError::ListDir {
        dir: dir.to_path_buf(),
        source,
    })?;

    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.starts_with('.') || !name.ends_with(suffix) {
            continue;
        }
        if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            let path = entry.path();
            debug!(path = %path.display(), "found definitions file");
            return Ok(path);
        }
    }

    Err(CommandsError::DefinitionsFileNotFound {
        dir: dir.to_path_buf(),
        suffix: suffix.to_string(),
    })
}

/// Resolve `target` to a definitions file: a file is used as is, a directory
/// is searched with [`find_definitions_file`].
pub fn resolve_definitions(target: impl AsRef<Path>, suffix: &str) -> CommandsResult<PathBuf> {
    let target = target.as_ref();
    if target.is_file() {
        Ok(target.to_path_buf())
    } else {
        find_definitions_file(target, suffix)
    }
}
