//! Command table: locating, parsing and querying `*_commands.h` files.

mod discovery;
mod error;
mod parser;
mod table;

pub use discovery::{find_definitions_file, resolve_definitions, DEFAULT_SUFFIX};
pub use error::{CommandsError, CommandsResult};
pub use parser::{group_name, parse_file, parse_str, TableBuilder};
pub use table::{CommandDef, CommandGroup, CommandTable, Lookup, Section};

use std::path::{Path, PathBuf};

/// Locate the definitions file under `target` and parse it.
///
/// Returns the file actually used alongside its table.
pub fn load(target: impl AsRef<Path>, suffix: &str) -> CommandsResult<(PathBuf, CommandTable)> {
    let path = resolve_definitions(target, suffix)?;
    let table = parse_file(&path)?;
    Ok((path, table))
}
