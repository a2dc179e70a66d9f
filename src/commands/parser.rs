//! Line-oriented parser for `*_commands.h` definitions files.
//!
//! The format is a loose C-header convention:
//!
//! ```text
//! // Mixer commands
//! #define MIXER_START 0x01
//! // Mixer ack commands
//! #define MIXER_STARTED 0x81
//!
//!
//! // Display commands
//! #define DISPLAY_INIT 0x10
//! ```
//!
//! A `//` comment mentioning "command" opens a group (its name derived by
//! [`group_name`]) and selects the commands or acks list. A comment mentioning
//! only "ack" selects the acks list of an already known group with the same
//! derived name. A "command" header whose derived name is empty closes the
//! active group. `#define NAME 0xHH` lines are appended to the active list.
//! Two or more consecutive blank lines close the active group.

use super::error::{CommandsError, CommandsResult};
use super::table::{CommandDef, CommandTable, Section};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::{debug, warn};

static COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^//\s*(.+)").expect("comment pattern is valid"));

static DEFINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#define\s+(\w+)\s+0[xX]([0-9A-Fa-f]+)").expect("define pattern is valid")
});

/// Blank lines in a row that end the active group.
const GROUP_BREAK_BLANK_LINES: usize = 2;

/// Derive a group name from a header comment.
///
/// Lowercases the text, removes every "ack", then "commands", then "command",
/// trims, and title-cases the rest: `"Mixer ack commands"` becomes `"Mixer"`.
/// Removal is plain substring removal, so words that merely contain "ack"
/// are affected too (`"Feedback commands"` becomes `"Feedb"`).
pub fn group_name(comment: &str) -> String {
    let stripped = comment
        .to_lowercase()
        .replace("ack", "")
        .replace("commands", "")
        .replace("command", "");
    title_case(stripped.trim())
}

/// Uppercase the first letter of every run of letters and lowercase the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Incremental table builder; feed it lines in file order.
#[derive(Debug, Default)]
pub struct TableBuilder {
    table: CommandTable,
    current_group: Option<String>,
    current_section: Option<Section>,
    blank_lines: usize,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one line (without its line terminator).
    pub fn feed_line(&mut self, line: &str) {
        if line.trim().is_empty() {
            self.blank_lines += 1;
            return;
        }
        if self.blank_lines >= GROUP_BREAK_BLANK_LINES {
            self.current_group = None;
            self.current_section = None;
        }
        self.blank_lines = 0;

        if let Some(caps) = COMMENT_RE.captures(line) {
            self.on_comment(caps[1].trim());
        } else if let Some(caps) = DEFINE_RE.captures(line) {
            self.on_define(&caps[1], &caps[2]);
        }
    }

    fn on_comment(&mut self, text: &str) {
        let lower = text.to_lowercase();
        let name = group_name(text);
        if lower.contains("command") && name.is_empty() {
            // "// Commands" names no group; its defines belong nowhere.
            debug!(header = text, "command header without a group name");
            self.current_group = None;
            self.current_section = None;
            return;
        }
        if lower.contains("command") {
            self.table.group_entry(&name);
        } else if !(lower.contains("ack") && self.table.group(&name).is_some()) {
            // Only "command" headers may create groups; a bare "ack" header
            // can only reopen one that already exists.
            return;
        }
        self.current_group = Some(name);
        self.current_section = Some(if lower.contains("ack") {
            Section::Acks
        } else {
            Section::Commands
        });
    }

    fn on_define(&mut self, name: &str, hex: &str) {
        let (Some(group), Some(section)) = (&self.current_group, self.current_section) else {
            debug!(constant = name, "ignoring #define outside any command group");
            return;
        };
        let value = match u32::from_str_radix(hex, 16) {
            Ok(value) => value,
            Err(e) => {
                warn!(constant = name, hex, error = %e, "skipping #define with out-of-range value");
                return;
            }
        };
        self.table
            .group_entry(group)
            .section_mut(section)
            .push(CommandDef::new(name, value));
    }

    pub fn finish(self) -> CommandTable {
        self.table
    }
}

/// Parse definitions from text.
pub fn parse_str(text: &str) -> CommandTable {
    let mut builder = TableBuilder::new();
    for line in text.lines() {
        builder.feed_line(line);
    }
    builder.finish()
}

/// Read and parse a definitions file.
pub fn parse_file(path: impl AsRef<Path>) -> CommandsResult<CommandTable> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| CommandsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let table = parse_str(&String::from_utf8_lossy(&bytes));
    debug!(
        path = %path.display(),
        groups = table.len(),
        constants = table.constant_count(),
        "parsed definitions file"
    );
    Ok(table)
}
