//! Line terminators appended after every sent command byte.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// The terminator choice. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EndChar {
    None,
    #[default]
    Cr,
    Lf,
    CrLf,
    LfCr,
    Null,
}

impl EndChar {
    pub const ALL: [EndChar; 6] = [
        Self::None,
        Self::Cr,
        Self::Lf,
        Self::CrLf,
        Self::LfCr,
        Self::Null,
    ];

    /// The bytes written after the command byte.
    pub fn bytes(self) -> &'static [u8] {
        match self {
            Self::None => &[],
            Self::Cr => &[0x0D],
            Self::Lf => &[0x0A],
            Self::CrLf => &[0x0D, 0x0A],
            Self::LfCr => &[0x0A, 0x0D],
            Self::Null => &[0x00],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Cr => "CR (Carriage Return)",
            Self::Lf => "LF (Line Feed)",
            Self::CrLf => "CR + LF",
            Self::LfCr => "LF + CR",
            Self::Null => "NULL",
        }
    }

    /// `0x0D0A` style summary, or `None` for an empty terminator.
    pub fn hex_label(self) -> String {
        let bytes = self.bytes();
        if bytes.is_empty() {
            return "None".to_string();
        }
        let digits: String = bytes.iter().map(|b| format!("{b:02X}")).collect();
        format!("0x{digits}")
    }
}

impl fmt::Display for EndChar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EndChar {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        if let Some(found) = Self::ALL
            .iter()
            .find(|e| e.label().eq_ignore_ascii_case(label))
        {
            return Ok(*found);
        }
        let key: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "none" | "" => Ok(Self::None),
            "cr" | "\\r" => Ok(Self::Cr),
            "lf" | "\\n" => Ok(Self::Lf),
            "crlf" | "cr+lf" | "cr-lf" | "\\r\\n" => Ok(Self::CrLf),
            "lfcr" | "lf+cr" | "lf-cr" | "\\n\\r" => Ok(Self::LfCr),
            "null" | "nul" | "\\0" => Ok(Self::Null),
            _ => Err(format!(
                "unknown end character '{s}' (expected none, cr, lf, cr+lf, lf+cr or null)"
            )),
        }
    }
}

// Config files accept the same spellings as the command line.
impl<'de> Deserialize<'de> for EndChar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
