//! Session behaviour against a mock port: connect, send, receive, disconnect.

mod common;

use common::{MockRig, DEMO_DEFINITIONS, WAIT};
use serial_cmd_sender::commands::parse_str;
use serial_cmd_sender::{ConnectionState, DisplayFormat, EndChar, SendError};
use std::time::{Duration, Instant};

#[test]
fn test_send_requires_connection() {
    let mut rig = MockRig::new();
    assert_eq!(rig.session.state(), ConnectionState::Disconnected);

    let err = rig.session.send(0x01, EndChar::Cr.bytes()).unwrap_err();
    assert!(matches!(err, SendError::NotConnected));
    assert_eq!(err.to_string(), "Serial port not open.");
    assert!(rig.port().get_write_log().is_empty());
}

#[test]
fn test_every_terminator_is_written_after_the_command_byte() {
    let table = parse_str(DEMO_DEFINITIONS);
    let start = table.find("MIXER_START").unwrap().def.byte();

    let mut rig = MockRig::new();
    rig.session.connect("COM3", 9600).unwrap();
    for end in EndChar::ALL {
        rig.session.send(start, end.bytes()).unwrap();
    }
    rig.session.disconnect();

    assert_eq!(
        rig.port().get_write_log(),
        vec![
            vec![0x01],
            vec![0x01, 0x0D],
            vec![0x01, 0x0A],
            vec![0x01, 0x0D, 0x0A],
            vec![0x01, 0x0A, 0x0D],
            vec![0x01, 0x00],
        ]
    );
}

#[test]
fn test_request_response_round_trip() {
    let mut rig = MockRig::new();
    rig.session.set_display_format(DisplayFormat::Hex);
    rig.session.connect("COM3", 115200).unwrap();

    rig.session.send(0x10, EndChar::CrLf.bytes()).unwrap();
    rig.port().enqueue_read(&[0x90, b'\r', b'\n']);

    assert!(rig.sink.wait_for("Received: 90 0D 0A", WAIT));
    rig.session.disconnect();

    assert_eq!(
        rig.sink.lines(),
        vec![
            "Connected to COM3 at 115200 baud.",
            "Sent: 10 0D 0A",
            "Received: 90 0D 0A",
            "Disconnected.",
        ]
    );
}

#[test]
fn test_partial_line_is_flushed_on_timeout() {
    let mut rig = MockRig::new();
    rig.session.set_display_format(DisplayFormat::Ascii);
    rig.session.connect("COM3", 9600).unwrap();

    rig.port().enqueue_read(b"PROMPT>");
    assert!(rig.sink.wait_for("Received: PROMPT>", WAIT));
    rig.session.disconnect();
}

#[test]
fn test_several_lines_in_one_read() {
    let mut rig = MockRig::new();
    rig.session.set_display_format(DisplayFormat::Dec);
    rig.session.connect("COM3", 9600).unwrap();

    rig.port().enqueue_read(b"A\nB\n");
    assert!(rig.sink.wait_for("Received: 66 10", WAIT));
    rig.session.disconnect();

    let received: Vec<String> = rig
        .sink
        .lines()
        .into_iter()
        .filter(|l| l.starts_with("Received"))
        .collect();
    assert_eq!(received, vec!["Received: 65 10", "Received: 66 10"]);
}

#[test]
fn test_disconnect_is_prompt_while_reader_blocks() {
    let mut rig = MockRig::new();
    rig.session.connect("COM3", 9600).unwrap();

    let started = Instant::now();
    assert!(rig.session.disconnect());
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(!rig.session.disconnect());
}

#[test]
fn test_lost_device_ends_connection() {
    let mut rig = MockRig::new();
    rig.session.connect("COM3", 9600).unwrap();

    rig.port().close();
    assert!(rig.sink.wait_for("Connection lost.", WAIT));

    let deadline = Instant::now() + WAIT;
    while rig.session.is_connected() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(rig.session.state(), ConnectionState::Disconnected);
    assert!(rig.session.connection_info().is_none());

    // A fresh connect reopens the port.
    rig.session.connect("COM3", 9600).unwrap();
    assert!(rig.session.is_connected());
    assert!(!rig.port().is_closed());
    rig.session.disconnect();
}
