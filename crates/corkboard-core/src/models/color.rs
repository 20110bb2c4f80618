//! Sticky note colors and their hex encoding

use serde::{Deserialize, Serialize};
use std::fmt;

/// An sRGB color with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl Color {
    pub const YELLOW: Self = Self::rgb(0xFF, 0xFF, 0x00);
    pub const BLACK: Self = Self::rgb(0x00, 0x00, 0x00);

    #[must_use]
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: 0xFF,
        }
    }

    /// Parse `#RGB`, `#RRGGBB` or `#AARRGGBB`.
    ///
    /// Non-hex characters are stripped first; any other length yields opaque
    /// black, matching what stored records have always decoded to.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_hex(raw: &str) -> Self {
        let digits: String = raw.chars().filter(char::is_ascii_alphanumeric).collect();
        let Ok(value) = u64::from_str_radix(&digits, 16) else {
            return Self::BLACK;
        };
        let byte = |shift: u32| ((value >> shift) & 0xFF) as u8;
        let nibble = |shift: u32| ((value >> shift) & 0xF) as u8 * 17;

        match digits.len() {
            3 => Self::rgb(nibble(8), nibble(4), nibble(0)),
            6 => Self::rgb(byte(16), byte(8), byte(0)),
            8 => Self {
                alpha: byte(24),
                red: byte(16),
                green: byte(8),
                blue: byte(0),
            },
            _ => Self::BLACK,
        }
    }

    /// `#RRGGBB`, uppercase. Alpha is not persisted.
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::YELLOW
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
