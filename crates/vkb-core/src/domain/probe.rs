//! The fixed, ordered set of characters probed during calibration.
//!
//! Order matters: results of two runs are only comparable when the probes are
//! tried in the same sequence, so the set is built by concatenating fixed
//! groups and dropping repeats while keeping first-seen order.

/// Lower- and upper-case ASCII letters.
const LETTERS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";
const WHITESPACE: &str = " ";
const BRACKETS: &str = "{}[]()<>";
const SYMBOLS: &str = "@#$%^&*~|\\/?!";
const PUNCTUATION: &str = "+-=_:;,.'\"`";
const ACCENTED: &str = "áéíóúÁÉÍÓÚñÑüÜ¿¡";
/// Symbols and emoji, several outside the BMP (need surrogate pairs).
///
/// Taken code point by code point, so variation selectors such as U+FE0F are
/// probed on their own.
const SUPPLEMENTARY: &str = "⌨️📋🚀📖🔧🧪🛠✨⚠️⏹▶️✅⏳✍️📄";

const GROUPS: [&str; 8] = [
    LETTERS,
    DIGITS,
    WHITESPACE,
    BRACKETS,
    SYMBOLS,
    PUNCTUATION,
    ACCENTED,
    SUPPLEMENTARY,
];

/// The ordered, deduplicated list of calibration probes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSet {
    probes: Vec<char>,
}

impl ProbeSet {
    /// Builds the standard probe set.
    pub fn standard() -> Self {
        Self::from_chars(GROUPS.iter().flat_map(|group| group.chars()))
    }

    /// Builds a probe set from arbitrary characters, dropping repeats.
    pub fn from_chars<I: IntoIterator<Item = char>>(chars: I) -> Self {
        let mut probes: Vec<char> = Vec::new();
        for ch in chars {
            if !probes.contains(&ch) {
                probes.push(ch);
            }
        }
        Self { probes }
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.probes.iter().copied()
    }

    pub fn contains(&self, ch: char) -> bool {
        self.probes.contains(&ch)
    }

    pub fn as_slice(&self) -> &[char] {
        &self.probes
    }
}

impl Default for ProbeSet {
    fn default() -> Self {
        Self::standard()
    }
}

/// Renders a probe for status lines: `'a'  U+0061`, with space shown as `(space)`.
pub fn describe_probe(ch: char) -> String {
    let shown = match ch {
        ' ' => "(space)".to_string(),
        '\t' => "(tab)".to_string(),
        other => other.to_string(),
    };
    format!("'{shown}'  U+{:04X}", ch as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_set_has_no_duplicates() {
        let set = ProbeSet::standard();
        let mut seen = std::collections::HashSet::new();
        for ch in set.iter() {
            assert!(seen.insert(ch), "duplicate probe {ch:?}");
        }
    }

    #[test]
    fn test_standard_set_starts_with_lowercase_letters_in_order() {
        let set = ProbeSet::standard();
        let head: String = set.iter().take(3).collect();
        assert_eq!(head, "abc");
    }

    #[test]
    fn test_standard_set_covers_every_group() {
        let set = ProbeSet::standard();
        for ch in ['a', 'Z', '5', ' ', '{', '\\', '"', 'á', '¿', '🚀', '✅'] {
            assert!(set.contains(ch), "missing {ch:?}");
        }
    }

    #[test]
    fn test_variation_selector_probed_once() {
        let set = ProbeSet::standard();
        let count = set.iter().filter(|&c| c == '\u{FE0F}').count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_standard_set_contains_supplementary_plane_chars() {
        let set = ProbeSet::standard();
        assert!(set.iter().any(|c| (c as u32) > 0xFFFF));
    }

    #[test]
    fn test_standard_set_size_is_stable() {
        // 52 letters + 10 digits + space + 8 brackets + 13 symbols + 11 punct
        // + 16 accented + 16 distinct code points from the emoji group.
        assert_eq!(ProbeSet::standard().len(), 127);
    }

    #[test]
    fn test_from_chars_keeps_first_seen_order() {
        let set = ProbeSet::from_chars("abcab".chars());
        assert_eq!(set.as_slice(), &['a', 'b', 'c']);
    }

    #[test]
    fn test_describe_probe_formats_space_and_code_point() {
        assert_eq!(describe_probe(' '), "'(space)'  U+0020");
        assert_eq!(describe_probe('🚀'), "'🚀'  U+1F680");
    }
}
