//! WinAnsi (Windows-1252) encoding for simple PDF fonts.
//!
//! Both the width tables and the text written into content streams are keyed
//! by WinAnsi byte, so measuring and drawing agree on every character.
//! Characters without a WinAnsi code are replaced by `?` on both sides.

/// Byte used in place of characters that have no WinAnsi code.
pub const REPLACEMENT: u8 = b'?';

/// Maps a WinAnsi byte back to its Unicode character.
/// Bytes 0x80-0x9F are remapped; all others map directly to their codepoint.
pub fn decode_byte(byte: u8) -> char {
    match byte {
        0x80 => '\u{20AC}',
        0x82 => '\u{201A}',
        0x83 => '\u{0192}',
        0x84 => '\u{201E}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02C6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8E => '\u{017D}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02DC}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203A}',
        0x9C => '\u{0153}',
        0x9E => '\u{017E}',
        0x9F => '\u{0178}',
        _ => byte as char,
    }
}

/// Returns the WinAnsi byte for a character, or `None` if it has no code.
pub fn encode_char(c: char) -> Option<u8> {
    match c as u32 {
        0x0000..=0x007E => Some(c as u8),
        0x00A0..=0x00FF => Some(c as u8),
        0x20AC => Some(0x80),
        0x201A => Some(0x82),
        0x0192 => Some(0x83),
        0x201E => Some(0x84),
        0x2026 => Some(0x85),
        0x2020 => Some(0x86),
        0x2021 => Some(0x87),
        0x02C6 => Some(0x88),
        0x2030 => Some(0x89),
        0x0160 => Some(0x8A),
        0x2039 => Some(0x8B),
        0x0152 => Some(0x8C),
        0x017D => Some(0x8E),
        0x2018 => Some(0x91),
        0x2019 => Some(0x92),
        0x201C => Some(0x93),
        0x201D => Some(0x94),
        0x2022 => Some(0x95),
        0x2013 => Some(0x96),
        0x2014 => Some(0x97),
        0x02DC => Some(0x98),
        0x2122 => Some(0x99),
        0x0161 => Some(0x9A),
        0x203A => Some(0x9B),
        0x0153 => Some(0x9C),
        0x017E => Some(0x9E),
        0x0178 => Some(0x9F),
        _ => None,
    }
}

/// Encodes text for a PDF string operand. Control characters and characters
/// outside WinAnsi become `?`.
pub fn encode(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match encode_char(c) {
            Some(byte) if byte >= 0x20 => byte,
            _ => REPLACEMENT,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passes_through() {
        assert_eq!(encode("Dear Hiring Manager,"), b"Dear Hiring Manager,".to_vec());
    }

    #[test]
    fn test_typographic_quotes_and_dashes_map_to_cp1252() {
        assert_eq!(encode("\u{201C}hi\u{201D}"), vec![0x93, b'h', b'i', 0x94]);
        assert_eq!(encode("\u{2013}\u{2014}"), vec![0x96, 0x97]);
    }

    #[test]
    fn test_latin1_maps_directly() {
        assert_eq!(encode("café"), vec![b'c', b'a', b'f', 0xE9]);
    }

    #[test]
    fn test_unmappable_becomes_replacement() {
        assert_eq!(encode("日本"), vec![REPLACEMENT, REPLACEMENT]);
        assert_eq!(encode("a\tb"), vec![b'a', REPLACEMENT, b'b']);
        assert_eq!(encode("a\u{7f}"), vec![b'a', REPLACEMENT]);
    }

    #[test]
    fn test_decode_inverts_encode_for_remapped_range() {
        for byte in 0x80u8..=0x9F {
            let c = decode_byte(byte);
            if let Some(back) = encode_char(c) {
                assert_eq!(back, byte, "byte {byte:#x} did not survive decode/encode");
            }
        }
    }
}
