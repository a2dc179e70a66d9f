//! Rendering of raw bytes for the operator log.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// How sent and received bytes are shown in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayFormat {
    /// Lossy UTF-8 text.
    Ascii,
    /// `0D 0A`
    Hex,
    /// `0D 0A  (\r\n)`
    #[default]
    HexAscii,
    /// `13 10`
    Dec,
}

impl DisplayFormat {
    pub const ALL: [DisplayFormat; 4] = [Self::Ascii, Self::Hex, Self::HexAscii, Self::Dec];

    pub fn label(self) -> &'static str {
        match self {
            Self::Ascii => "ASCII",
            Self::Hex => "HEX",
            Self::HexAscii => "HEX + ASCII",
            Self::Dec => "DEC",
        }
    }
}

impl fmt::Display for DisplayFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DisplayFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "ascii" => Ok(Self::Ascii),
            "hex" => Ok(Self::Hex),
            "hex+ascii" | "hex-ascii" | "hexascii" | "hex_ascii" => Ok(Self::HexAscii),
            "dec" | "decimal" => Ok(Self::Dec),
            _ => Err(format!(
                "unknown display format '{s}' (expected ascii, hex, hex+ascii or dec)"
            )),
        }
    }
}

impl<'de> Deserialize<'de> for DisplayFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Format `bytes` for display. Never fails; empty input is allowed.
pub fn format_bytes(bytes: &[u8], mode: DisplayFormat) -> String {
    match mode {
        DisplayFormat::Ascii => String::from_utf8_lossy(bytes).into_owned(),
        DisplayFormat::Hex => hex(bytes),
        DisplayFormat::Dec => bytes
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(" "),
        DisplayFormat::HexAscii => {
            let text = String::from_utf8_lossy(bytes)
                .replace('\r', "\\r")
                .replace('\n', "\\n");
            format!("{}  ({})", hex(bytes), text)
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const CRLF: [u8; 2] = [0x0D, 0x0A];

    #[test]
    fn test_hex() {
        assert_eq!(format_bytes(&CRLF, DisplayFormat::Hex), "0D 0A");
        assert_eq!(format_bytes(&[0xAB, 0x01], DisplayFormat::Hex), "AB 01");
    }

    #[test]
    fn test_dec() {
        assert_eq!(format_bytes(&CRLF, DisplayFormat::Dec), "13 10");
    }

    #[test]
    fn test_hex_ascii_escapes_line_endings() {
        assert_eq!(format_bytes(&CRLF, DisplayFormat::HexAscii), "0D 0A  (\\r\\n)");
        assert_eq!(
            format_bytes(b"OK\r\n", DisplayFormat::HexAscii),
            "4F 4B 0D 0A  (OK\\r\\n)"
        );
    }

    #[test]
    fn test_ascii_replaces_invalid_bytes() {
        assert_eq!(format_bytes(b"OK\r\n", DisplayFormat::Ascii), "OK\r\n");
        assert_eq!(format_bytes(&[b'A', 0xFF, b'B'], DisplayFormat::Ascii), "A\u{FFFD}B");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(format_bytes(&[], DisplayFormat::Ascii), "");
        assert_eq!(format_bytes(&[], DisplayFormat::Hex), "");
        assert_eq!(format_bytes(&[], DisplayFormat::Dec), "");
        assert_eq!(format_bytes(&[], DisplayFormat::HexAscii), "  ()");
    }

    #[test]
    fn test_parse_labels_and_short_forms() {
        for format in DisplayFormat::ALL {
            assert_eq!(format.label().parse::<DisplayFormat>(), Ok(format));
        }
        assert_eq!("hex-ascii".parse::<DisplayFormat>(), Ok(DisplayFormat::HexAscii));
        assert_eq!("Decimal".parse::<DisplayFormat>(), Ok(DisplayFormat::Dec));
        assert!("binary".parse::<DisplayFormat>().is_err());
    }

    #[test]
    fn test_default_is_hex_ascii() {
        assert_eq!(DisplayFormat::default(), DisplayFormat::HexAscii);
    }

    proptest! {
        #[test]
        fn hex_has_three_chars_per_byte(bytes in proptest::collection::vec(any::<u8>(), 1..64)) {
            let out = format_bytes(&bytes, DisplayFormat::Hex);
            prop_assert_eq!(out.len(), bytes.len() * 3 - 1);
        }

        #[test]
        fn dec_round_trips(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
            let out = format_bytes(&bytes, DisplayFormat::Dec);
            let parsed: Vec<u8> = out.split_whitespace().map(|t| t.parse().unwrap()).collect();
            prop_assert_eq!(parsed, bytes);
        }
    }
}
