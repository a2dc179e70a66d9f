//! Definitions file parsing through the public API.

mod common;

use common::{fixtures_dir, DEMO_DEFINITIONS};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serial_cmd_sender::commands::{self, parse_str, CommandDef, Section};

fn names(defs: &[CommandDef]) -> Vec<&str> {
    defs.iter().map(|d| d.name.as_str()).collect()
}

#[test]
fn test_demo_file_groups() {
    let table = parse_str(DEMO_DEFINITIONS);

    let group_names: Vec<&str> = table.groups().iter().map(|g| g.name.as_str()).collect();
    assert_eq!(group_names, vec!["Mixer", "Display"]);

    let mixer = table.group("Mixer").unwrap();
    assert_eq!(names(&mixer.commands), vec!["MIXER_START", "MIXER_STOP"]);
    assert_eq!(names(&mixer.acks), vec!["MIXER_STARTED", "MIXER_STOPPED"]);

    let display = table.group("Display").unwrap();
    assert_eq!(names(&display.commands), vec!["DISPLAY_INIT", "DISPLAY_CLEAR"]);
    assert_eq!(names(&display.acks), vec!["DISPLAY_READY", "DISPLAY_DONE"]);
    assert_eq!(display.acks[0].value, 0x90);

    // The include guard has no hex value and is not a constant.
    assert!(table.find("MY_DEVICE_COMMANDS_H_").is_none());
    assert_eq!(table.constant_count(), 8);
}

#[test]
fn test_find_reports_section() {
    let table = parse_str(DEMO_DEFINITIONS);
    let found = table.find("display_done").unwrap();
    assert_eq!(found.group.name, "Display");
    assert_eq!(found.section, Section::Acks);
    assert_eq!(found.def.byte(), 0x91);
}

#[test]
fn test_filter_keeps_matching_constants_only() {
    let table = parse_str(DEMO_DEFINITIONS);
    let view = table.filter("STOP");

    assert_eq!(view.len(), 1);
    let mixer = view.group("Mixer").unwrap();
    assert_eq!(names(&mixer.commands), vec!["MIXER_STOP"]);
    assert_eq!(names(&mixer.acks), vec!["MIXER_STOPPED"]);

    assert_eq!(table.filter(""), table);
    assert!(table.filter("nothing").is_empty());
}

#[test]
fn test_load_from_directory() {
    let (path, table) = commands::load(fixtures_dir(), commands::DEFAULT_SUFFIX).unwrap();
    assert_eq!(path.file_name().unwrap(), "my_device_commands.h");
    assert_eq!(table, parse_str(DEMO_DEFINITIONS));
}

#[test]
fn test_load_without_definitions_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = commands::load(dir.path(), commands::DEFAULT_SUFFIX).unwrap_err();
    assert!(matches!(
        err,
        commands::CommandsError::DefinitionsFileNotFound { .. }
    ));
}

#[test]
fn test_table_serializes_as_group_list() {
    let table = parse_str("// Pump commands\n#define PUMP_ON 0x01\n");
    let json = serde_json::to_value(&table).unwrap();
    assert_eq!(
        json,
        serde_json::json!([
            { "name": "Pump", "commands": [{ "name": "PUMP_ON", "value": 1 }], "acks": [] }
        ])
    );
}

fn definitions_line() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[A-Za-z ]{1,12}".prop_map(|t| format!("// {t} commands")),
        "[A-Za-z ]{1,12}".prop_map(|t| format!("// {t} ack commands")),
        "[A-Za-z ]{1,12}".prop_map(|t| format!("// {t}")),
        ("[A-Z_]{1,10}", any::<u8>()).prop_map(|(n, v)| format!("#define {n} 0x{v:02X}")),
        "[ -~]{0,20}",
    ]
}

proptest! {
    #[test]
    fn parsing_is_deterministic(lines in proptest::collection::vec(definitions_line(), 0..40)) {
        let text = lines.join("\n");
        prop_assert_eq!(parse_str(&text), parse_str(&text));
    }

    #[test]
    fn group_names_are_unique(lines in proptest::collection::vec(definitions_line(), 0..40)) {
        let table = parse_str(&lines.join("\n"));
        let mut seen = std::collections::HashSet::new();
        for group in table.groups() {
            prop_assert!(seen.insert(group.name.clone()));
        }
    }
}
