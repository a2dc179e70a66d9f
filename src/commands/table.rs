//! The parsed command table.

use serde::Serialize;
use std::fmt;

/// Which list of a group a constant belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Commands,
    Acks,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Commands => "command",
            Self::Acks => "ack",
        })
    }
}

/// One `#define NAME 0xHH` constant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandDef {
    pub name: String,
    /// The declared value, as written. Only the low byte goes on the wire.
    pub value: u32,
}

impl CommandDef {
    pub fn new(name: impl Into<String>, value: u32) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// The byte actually transmitted for this constant.
    pub fn byte(&self) -> u8 {
        (self.value & 0xFF) as u8
    }
}

impl fmt::Display for CommandDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.name, self.value)
    }
}

/// Commands and acknowledgments sharing one derived group name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandGroup {
    pub name: String,
    pub commands: Vec<CommandDef>,
    pub acks: Vec<CommandDef>,
}

impl CommandGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
            acks: Vec::new(),
        }
    }

    pub fn section(&self, section: Section) -> &[CommandDef] {
        match section {
            Section::Commands => &self.commands,
            Section::Acks => &self.acks,
        }
    }

    pub fn section_mut(&mut self, section: Section) -> &mut Vec<CommandDef> {
        match section {
            Section::Commands => &mut self.commands,
            Section::Acks => &mut self.acks,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.acks.is_empty()
    }
}

/// Result of a [`CommandTable::find`] lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup<'a> {
    pub group: &'a CommandGroup,
    pub section: Section,
    pub def: &'a CommandDef,
}

/// Groups keyed by unique name, in the order they were first seen.
///
/// Built once by the parser and never mutated afterwards; filtered views are
/// separate tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CommandTable {
    groups: Vec<CommandGroup>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn groups(&self) -> &[CommandGroup] {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&CommandGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of constants across all groups and sections.
    pub fn constant_count(&self) -> usize {
        self.groups
            .iter()
            .map(|g| g.commands.len() + g.acks.len())
            .sum()
    }

    /// The group called `name`, created empty at the end if it does not exist yet.
    pub(crate) fn group_entry(&mut self, name: &str) -> &mut CommandGroup {
        let index = match self.groups.iter().position(|g| g.name == name) {
            Some(index) => index,
            None => {
                self.groups.push(CommandGroup::new(name));
                self.groups.len() - 1
            }
        };
        &mut self.groups[index]
    }

    /// A copy holding only constants whose name contains `query`
    /// (case-insensitive). Groups left with nothing are dropped; an empty
    /// query returns a full copy.
    pub fn filter(&self, query: &str) -> CommandTable {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.clone();
        }
        let matches = |defs: &[CommandDef]| -> Vec<CommandDef> {
            defs.iter()
                .filter(|d| d.name.to_lowercase().contains(&query))
                .cloned()
                .collect()
        };

        let groups = self
            .groups
            .iter()
            .map(|g| CommandGroup {
                name: g.name.clone(),
                commands: matches(&g.commands[..]),
                acks: matches(&g.acks[..]),
            })
            .filter(|g| !g.is_empty())
            .collect();
        CommandTable { groups }
    }

    /// Find a constant by name. An exact match wins over a case-insensitive one.
    pub fn find(&self, name: &str) -> Option<Lookup<'_>> {
        self.find_by(|d| d.name == name)
            .or_else(|| self.find_by(|d| d.name.eq_ignore_ascii_case(name)))
    }

    fn find_by(&self, pred: impl Fn(&CommandDef) -> bool) -> Option<Lookup<'_>> {
        self.groups.iter().find_map(|group| {
            [Section::Commands, Section::Acks]
                .into_iter()
                .find_map(|section| {
                    group
                        .section(section)
                        .iter()
                        .find(|d| pred(*d))
                        .map(|def| Lookup {
                            group,
                            section,
                            def,
                        })
                })
        })
    }
}

impl<'a> IntoIterator for &'a CommandTable {
    type Item = &'a CommandGroup;
    type IntoIter = std::slice::Iter<'a, CommandGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> CommandTable {
        let mut table = CommandTable::new();
        let mixer = table.group_entry("Mixer");
        mixer.commands.push(CommandDef::new("MIXER_START", 0x01));
        mixer.commands.push(CommandDef::new("MIXER_STOP", 0x02));
        mixer.acks.push(CommandDef::new("MIXER_STARTED", 0x81));
        let display = table.group_entry("Display");
        display.commands.push(CommandDef::new("DISPLAY_INIT", 0x10));
        table
    }

    #[test]
    fn test_group_entry_reuses_existing() {
        let mut table = sample();
        table
            .group_entry("Mixer")
            .acks
            .push(CommandDef::new("MIXER_STOPPED", 0x82));

        assert_eq!(table.len(), 2);
        assert_eq!(table.groups()[0].acks.len(), 2);
        assert_eq!(table.constant_count(), 5);
    }

    #[test]
    fn test_filter_is_case_insensitive_and_drops_empty_groups() {
        let table = sample();
        let filtered = table.filter("start");

        assert_eq!(filtered.len(), 1);
        let mixer = &filtered.groups()[0];
        assert_eq!(mixer.commands, vec![CommandDef::new("MIXER_START", 0x01)]);
        assert_eq!(mixer.acks, vec![CommandDef::new("MIXER_STARTED", 0x81)]);
        // The source table is untouched.
        assert_eq!(table.constant_count(), 4);
    }

    #[test]
    fn test_empty_filter_is_full_copy() {
        let table = sample();
        assert_eq!(table.filter("  "), table);
        assert!(table.filter("nothing-matches").is_empty());
    }

    #[test]
    fn test_find() {
        let table = sample();
        let hit = table.find("MIXER_STARTED").unwrap();
        assert_eq!(hit.group.name, "Mixer");
        assert_eq!(hit.section, Section::Acks);
        assert_eq!(hit.def.byte(), 0x81);

        assert_eq!(table.find("display_init").unwrap().def.value, 0x10);
        assert!(table.find("MISSING").is_none());
    }

    #[test]
    fn test_display_and_low_byte() {
        let def = CommandDef::new("WIDE", 0x1234);
        assert_eq!(def.to_string(), "WIDE (0x1234)");
        assert_eq!(def.byte(), 0x34);
        assert_eq!(CommandDef::new("X", 0x5).to_string(), "X (0x05)");
    }
}
