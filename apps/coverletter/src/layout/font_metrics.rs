//! Character-width tables for measuring text before it is drawn.
//!
//! Widths are stored in 1/1000 em, the unit PDF font dictionaries use, so the
//! same numbers drive line wrapping and the `/Widths` array written for the
//! font. Tables are indexed by WinAnsi code over 32..=255 (224 slots).
//!
//! The three PDF standard families ship static tables taken from their AFM
//! files; any other family is measured from its TrueType/OpenType file by
//! `layout::fonts`.

use crate::layout::winansi;

/// First WinAnsi code covered by a width table.
pub const FIRST_CHAR: u8 = 32;
/// Last WinAnsi code covered by a width table.
pub const LAST_CHAR: u8 = 255;
const TABLE_LEN: usize = (LAST_CHAR - FIRST_CHAR) as usize + 1;

// ────────────────────────────────────────────────────────────────────────────
// Standard font families
// ────────────────────────────────────────────────────────────────────────────

/// PDF base-14 families that every viewer renders without an embedded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFont {
    Helvetica,
    TimesRoman,
    Courier,
}

impl StandardFont {
    /// Matches a user-facing family name against the standard families.
    pub fn from_family(family: &str) -> Option<Self> {
        match family.trim().to_ascii_lowercase().as_str() {
            "helvetica" => Some(Self::Helvetica),
            "times" | "times-roman" | "times roman" => Some(Self::TimesRoman),
            "courier" => Some(Self::Courier),
            _ => None,
        }
    }

    /// The `/BaseFont` name written into the PDF.
    pub fn base_font(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::TimesRoman => "Times-Roman",
            Self::Courier => "Courier",
        }
    }

    fn ascii_widths(&self) -> &'static [u16; 95] {
        match self {
            Self::Helvetica => &HELVETICA_ASCII,
            Self::TimesRoman => &TIMES_ROMAN_ASCII,
            Self::Courier => &COURIER_ASCII,
        }
    }

    fn high_widths(&self) -> &'static [u16; 128] {
        match self {
            Self::Helvetica => &HELVETICA_HIGH,
            Self::TimesRoman => &TIMES_ROMAN_HIGH,
            Self::Courier => &COURIER_HIGH,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Metric table
// ────────────────────────────────────────────────────────────────────────────

/// Advance widths for one font, in 1/1000 em, indexed by WinAnsi code - 32.
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    widths: Vec<f32>,
}

impl FontMetrics {
    /// Builds the table for a standard family from its static AFM widths.
    pub fn standard(font: StandardFont) -> Self {
        let ascii = font.ascii_widths();
        let high = font.high_widths();
        let widths = (FIRST_CHAR..=LAST_CHAR)
            .map(|byte| match byte {
                0x20..=0x7E => f32::from(ascii[(byte - FIRST_CHAR) as usize]),
                // DEL is never drawn.
                0x7F => f32::from(ascii[0]),
                _ => f32::from(high[(byte - 0x80) as usize]),
            })
            .collect();
        Self { widths }
    }

    /// Wraps a table measured from a font file. Returns `None` unless the
    /// table has exactly one entry per code in 32..=255.
    pub fn from_widths(widths: Vec<f32>) -> Option<Self> {
        (widths.len() == TABLE_LEN).then_some(Self { widths })
    }

    /// The raw table, in the order the PDF `/Widths` array expects.
    pub fn widths(&self) -> &[f32] {
        &self.widths
    }

    /// Width of one character in 1/1000 em. Characters that will be drawn
    /// as `?` are measured as `?`.
    pub fn char_width(&self, c: char) -> f32 {
        let byte = match winansi::encode_char(c) {
            Some(byte) if byte >= FIRST_CHAR => byte,
            _ => winansi::REPLACEMENT,
        };
        self.widths[(byte - FIRST_CHAR) as usize]
    }

    /// Sum of character widths in 1/1000 em.
    pub fn measure_str(&self, s: &str) -> f32 {
        s.chars().map(|c| self.char_width(c)).sum()
    }

    /// Rendered width of `s` in points at `font_size`.
    pub fn string_width(&self, s: &str, font_size: f32) -> f32 {
        self.measure_str(s) * font_size / 1000.0
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Static AFM tables (ASCII 0x20..=0x7E)
// ────────────────────────────────────────────────────────────────────────────

#[rustfmt::skip]
static HELVETICA_ASCII: [u16; 95] = [
    // sp   !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0    1    2    3    4    5    6    7    8    9
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    // :    ;    <    =    >    ?    @
    278, 278, 584, 584, 584, 556, 1015,
    // A    B    C    D    E    F    G    H    I    J    K    L    M
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    // N    O    P    Q    R    S    T    U    V    W    X    Y    Z
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    // [    \    ]    ^    _    `
    278, 278, 278, 469, 556, 333,
    // a    b    c    d    e    f    g    h    i    j    k    l    m
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    // n    o    p    q    r    s    t    u    v    w    x    y    z
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    // {    |    }    ~
    334, 260, 334, 584,
];

#[rustfmt::skip]
static TIMES_ROMAN_ASCII: [u16; 95] = [
    // sp   !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    // 0    1    2    3    4    5    6    7    8    9
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    // :    ;    <    =    >    ?    @
    278, 278, 564, 564, 564, 444, 921,
    // A    B    C    D    E    F    G    H    I    J    K    L    M
    722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889,
    // N    O    P    Q    R    S    T    U    V    W    X    Y    Z
    722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611,
    // [    \    ]    ^    _    `
    333, 278, 333, 469, 500, 333,
    // a    b    c    d    e    f    g    h    i    j    k    l    m
    444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778,
    // n    o    p    q    r    s    t    u    v    w    x    y    z
    500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444,
    // {    |    }    ~
    480, 200, 480, 541,
];

static COURIER_ASCII: [u16; 95] = [600; 95];

// ────────────────────────────────────────────────────────────────────────────
// Static AFM tables (WinAnsi 0x80..=0xFF)
// ────────────────────────────────────────────────────────────────────────────
//
// Codes WinAnsi leaves unassigned (0x81, 0x8D, 0x8F, 0x90, 0x9D) carry the
// space width. `winansi::encode_char` never produces them.

#[rustfmt::skip]
static HELVETICA_HIGH: [u16; 128] = [
    // €    -    ‚    ƒ    „    …    †    ‡    ˆ    ‰    Š    ‹    Œ    -    Ž    -
    556, 278, 222, 556, 333, 1000, 556, 556, 333, 1000, 667, 333, 1000, 278, 611, 278,
    // -    ‘    ’    “    ”    •    –    —    ˜    ™    š    ›    œ    -    ž    Ÿ
    278, 222, 222, 333, 333, 350, 556, 1000, 333, 1000, 500, 333, 944, 278, 500, 667,
    // nbsp ¡    ¢    £    ¤    ¥    ¦    §    ¨    ©    ª    «    ¬    shy  ®    ¯
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    // °    ±    ²    ³    ´    µ    ¶    ·    ¸    ¹    º    »    ¼    ½    ¾    ¿
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    // À    Á    Â    Ã    Ä    Å    Æ    Ç    È    É    Ê    Ë    Ì    Í    Î    Ï
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    // Ð    Ñ    Ò    Ó    Ô    Õ    Ö    ×    Ø    Ù    Ú    Û    Ü    Ý    Þ    ß
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    // à    á    â    ã    ä    å    æ    ç    è    é    ê    ë    ì    í    î    ï
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278,
    // ð    ñ    ò    ó    ô    õ    ö    ÷    ø    ù    ú    û    ü    ý    þ    ÿ
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500,
];

#[rustfmt::skip]
static TIMES_ROMAN_HIGH: [u16; 128] = [
    // €    -    ‚    ƒ    „    …    †    ‡    ˆ    ‰    Š    ‹    Œ    -    Ž    -
    500, 250, 333, 500, 444, 1000, 500, 500, 333, 1000, 556, 333, 889, 250, 611, 250,
    // -    ‘    ’    “    ”    •    –    —    ˜    ™    š    ›    œ    -    ž    Ÿ
    250, 333, 333, 444, 444, 350, 500, 1000, 333, 980, 389, 333, 722, 250, 444, 722,
    // nbsp ¡    ¢    £    ¤    ¥    ¦    §    ¨    ©    ª    «    ¬    shy  ®    ¯
    250, 333, 500, 500, 500, 500, 200, 500, 333, 760, 276, 500, 564, 333, 760, 333,
    // °    ±    ²    ³    ´    µ    ¶    ·    ¸    ¹    º    »    ¼    ½    ¾    ¿
    400, 564, 300, 300, 333, 500, 453, 250, 333, 300, 310, 500, 750, 750, 750, 444,
    // À    Á    Â    Ã    Ä    Å    Æ    Ç    È    É    Ê    Ë    Ì    Í    Î    Ï
    722, 722, 722, 722, 722, 722, 889, 667, 611, 611, 611, 611, 333, 333, 333, 333,
    // Ð    Ñ    Ò    Ó    Ô    Õ    Ö    ×    Ø    Ù    Ú    Û    Ü    Ý    Þ    ß
    722, 722, 722, 722, 722, 722, 722, 564, 722, 722, 722, 722, 722, 722, 556, 500,
    // à    á    â    ã    ä    å    æ    ç    è    é    ê    ë    ì    í    î    ï
    444, 444, 444, 444, 444, 444, 667, 444, 444, 444, 444, 444, 278, 278, 278, 278,
    // ð    ñ    ò    ó    ô    õ    ö    ÷    ø    ù    ú    û    ü    ý    þ    ÿ
    500, 500, 500, 500, 500, 500, 500, 564, 500, 500, 500, 500, 500, 500, 500, 500,
];

static COURIER_HIGH: [u16; 128] = [600; 128];

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
