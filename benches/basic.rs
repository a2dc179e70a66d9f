use criterion::{criterion_group, criterion_main, Criterion};
use serial_cmd_sender::commands::parse_str;
use serial_cmd_sender::{format_bytes, DisplayFormat};
use std::fmt::Write;
use std::hint::black_box;
use std::time::Duration;

/// A definitions file with `groups` groups of 16 commands and 16 acks each.
fn synthetic_definitions(groups: usize) -> String {
    let mut text = String::new();
    for g in 0..groups {
        let _ = writeln!(text, "// Unit{g} commands");
        for c in 0..16 {
            let _ = writeln!(text, "#define UNIT{g}_CMD{c} 0x{c:02X}");
        }
        let _ = writeln!(text, "// Unit{g} ack commands");
        for c in 0..16 {
            let _ = writeln!(text, "#define UNIT{g}_ACK{c} 0x{:02X}", 0x80 + c);
        }
        text.push_str("\n\n");
    }
    text
}

pub fn bench_parse_definitions(c: &mut Criterion) {
    let sample = synthetic_definitions(32);
    c.bench_function("parse_definitions_32_groups", |b| {
        b.iter(|| black_box(parse_str(black_box(&sample))))
    });
}

pub fn bench_format_bytes(c: &mut Criterion) {
    let line: Vec<u8> = b"STATUS 0042 OK temperature=21.5C\r\n".to_vec();
    for mode in DisplayFormat::ALL {
        c.bench_function(&format!("format_bytes_{}", mode.label()), |b| {
            b.iter(|| black_box(format_bytes(black_box(&line), mode)))
        });
    }
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .warm_up_time(Duration::from_millis(300))
        .measurement_time(Duration::from_secs(2));
    targets = bench_parse_definitions, bench_format_bytes
}
criterion_main!(benches);
