//! UTF-16 code units for direct code-point injection.
//!
//! `KEYEVENTF_UNICODE` events carry one 16-bit unit each, so a character
//! above U+FFFF has to be sent as a high/low surrogate pair:
//!
//! ```text
//! v    = code - 0x10000
//! high = 0xD800 + (v >> 10)
//! low  = 0xDC00 + (v & 0x3FF)
//! ```

/// The one or two UTF-16 units of a single character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Utf16Units {
    Single(u16),
    Pair { high: u16, low: u16 },
}

impl Utf16Units {
    /// Encodes `ch` into its UTF-16 units.
    pub fn encode(ch: char) -> Self {
        let code = ch as u32;
        if code > 0xFFFF {
            let v = code - 0x1_0000;
            Utf16Units::Pair {
                high: 0xD800 + (v >> 10) as u16,
                low: 0xDC00 + (v & 0x3FF) as u16,
            }
        } else {
            Utf16Units::Single(code as u16)
        }
    }

    /// Number of units (1 or 2).
    pub fn len(self) -> usize {
        match self {
            Utf16Units::Single(_) => 1,
            Utf16Units::Pair { .. } => 2,
        }
    }

    pub fn is_pair(self) -> bool {
        matches!(self, Utf16Units::Pair { .. })
    }

    /// Iterates over the units in emission order (high surrogate first).
    pub fn iter(self) -> impl Iterator<Item = u16> {
        let (first, second) = match self {
            Utf16Units::Single(u) => (u, None),
            Utf16Units::Pair { high, low } => (high, Some(low)),
        };
        std::iter::once(first).chain(second)
    }
}
