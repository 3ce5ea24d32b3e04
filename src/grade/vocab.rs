#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Authoring vocabularies.
//!
//! Question designers write enum parameters either with the OOXML value
//! (`center`) or with the label shown in the authoring tool (`居中对齐`).
//! A [`Vocab`] groups every spelling of one meaning under a canonical key so
//! both the expected parameter and the extracted value can be reduced to the
//! same key before comparison.

/// Canonical key followed by every accepted spelling (matched
/// case-insensitively after trimming).
pub type Vocab = &'static [(&'static str, &'static [&'static str])];

/// Canonical key for `value`, or `None` when no group lists it.
pub fn canonical(vocab: Vocab, value: &str) -> Option<&'static str> {
    let needle = value.trim().to_lowercase();
    vocab
        .iter()
        .find(|(key, spellings)| {
            key.to_lowercase() == needle || spellings.iter().any(|s| s.to_lowercase() == needle)
        })
        .map(|(key, _)| *key)
}

/// Whether two spellings mean the same thing under `vocab`. Values unknown
/// to the vocabulary fall back to trimmed case-insensitive equality.
pub fn same(vocab: Vocab, a: &str, b: &str) -> bool {
    match (canonical(vocab, a), canonical(vocab, b)) {
        (Some(x), Some(y)) => x == y,
        _ => a.trim().eq_ignore_ascii_case(b.trim()),
    }
}

/// Paragraph and header/footer alignment (`w:jc`).
pub const WORD_ALIGNMENT: Vocab = &[
    ("left", &["start", "左对齐", "左侧对齐", "靠左"]),
    ("center", &["centre", "居中", "居中对齐"]),
    ("right", &["end", "右对齐", "右侧对齐", "靠右"]),
    ("both", &["justify", "justified", "两端对齐"]),
    ("distribute", &["distributed", "分散对齐"]),
];

/// Vertical alignment of table cells (`w:vAlign`).
pub const WORD_VERTICAL_ALIGNMENT: Vocab = &[
    ("top", &["顶端对齐", "顶端", "靠上"]),
    ("center", &["居中对齐", "居中", "垂直居中"]),
    ("bottom", &["底端对齐", "底端", "靠下"]),
];

/// Paragraph and page border line styles (`w:val` on border elements).
pub const WORD_BORDER_STYLE: Vocab = &[
    ("none", &["nil", "无", "无边框"]),
    ("single", &["单实线", "细线", "solid"]),
    ("thick", &["粗线"]),
    ("double", &["双线"]),
    ("dotted", &["点线"]),
    ("dashed", &["dashSmallGap", "虚线"]),
    ("wave", &["doubleWave", "波浪线"]),
    ("dotDash", &["点划线"]),
];

/// Cell border line styles (`style` on spreadsheet border edges).
pub const EXCEL_BORDER_STYLE: Vocab = &[
    ("none", &["无边框", "无"]),
    ("solid", &["thin", "medium", "thick", "单实线", "实线", "粗线", "single"]),
    ("double", &["双线"]),
    ("dotted", &["hair", "点线"]),
    ("dashed", &["mediumDashed", "短划线", "长划线", "虚线"]),
    ("dashDot", &["mediumDashDot", "slantDashDot", "划线+点"]),
    ("dashDotDot", &["mediumDashDotDot", "划线+两个点"]),
];

/// Page orientation.
pub const ORIENTATION: Vocab = &[
    ("portrait", &["纵向", "竖向"]),
    ("landscape", &["横向"]),
];

/// Named colours and the concrete RGB values each one is satisfied by.
pub const COLORS: &[(&str, &[&str], &[&str])] = &[
    ("black", &["黑色"], &["000000"]),
    ("white", &["白色"], &["FFFFFF"]),
    ("red", &["红色"], &["FF0000", "C00000"]),
    ("green", &["绿色"], &["00FF00", "00B050", "008000"]),
    ("blue", &["蓝色"], &["0000FF", "0070C0", "002060"]),
    ("yellow", &["黄色"], &["FFFF00"]),
    ("purple", &["紫色"], &["7030A0", "800080"]),
    ("orange", &["橙色"], &["FFC000", "FFA500", "ED7D31"]),
    ("gray", &["灰色", "grey"], &["808080", "7F7F7F", "A6A6A6", "BFBFBF"]),
    ("lightGray", &["浅灰色", "lightgrey"], &["D9D9D9", "D3D3D3", "C0C0C0", "F2F2F2"]),
    ("darkGray", &["深灰色", "darkgrey"], &["404040", "595959", "A9A9A9"]),
];

/// Candidate RGB values for a colour spelling: a hex literal normalises to
/// itself, a name expands to its known shades, `auto` stays symbolic.
pub fn color_candidates(value: &str) -> Vec<String> {
    let v = value.trim();
    let lower = v.to_lowercase();
    if lower == "auto" || v == "自动" {
        return vec!["AUTO".to_string()];
    }
    if let Some(hex) = normalize_hex(v) {
        return vec![hex];
    }
    COLORS
        .iter()
        .find(|(name, aliases, _)| {
            name.to_lowercase() == lower || aliases.iter().any(|a| a.to_lowercase() == lower)
        })
        .map(|(_, _, rgbs)| rgbs.iter().map(|s| s.to_string()).collect())
        .unwrap_or_default()
}

/// Normalises `#RGB`, `RRGGBB`, `#RRGGBB` and `AARRGGBB` to upper-case
/// `RRGGBB`.
pub fn normalize_hex(value: &str) -> Option<String> {
    let v = value.trim();
    let v = v.strip_prefix('#').unwrap_or(v);
    let v = v
        .strip_prefix("0x")
        .or_else(|| v.strip_prefix("0X"))
        .unwrap_or(v);
    if !v.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match v.len() {
        6 => Some(v.to_ascii_uppercase()),
        8 => Some(v[2..].to_ascii_uppercase()),
        3 => Some(v.chars().flat_map(|c| [c, c]).collect::<String>().to_ascii_uppercase()),
        _ => None,
    }
}

/// Bold/italic/underline/strike flags parsed from a style description.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FontFlags {
    /// bold
    pub bold:      bool,
    /// italic
    pub italic:    bool,
    /// any underline
    pub underline: bool,
    /// single or double strike-through
    pub strike:    bool,
}

impl FontFlags {
    /// Parses descriptions such as `加粗+斜体`, `粗斜体`, `Bold Italic`,
    /// `常规`. Unknown tokens make the whole description unparseable.
    pub fn parse(value: &str) -> Option<Self> {
        let v = value.trim().to_lowercase();
        let mut flags = FontFlags::default();
        match v.as_str() {
            "常规" | "regular" | "normal" | "无" => return Some(flags),
            "粗斜体" | "加粗倾斜" | "bolditalic" | "bold italic" | "bold+italic" => {
                flags.bold = true;
                flags.italic = true;
                return Some(flags);
            }
            _ => {}
        }
        for token in v.split(['+', ',', '，', '、', ' ']).filter(|t| !t.is_empty()) {
            match token {
                "加粗" | "粗体" | "bold" => flags.bold = true,
                "斜体" | "倾斜" | "italic" => flags.italic = true,
                "下划线" | "underline" => flags.underline = true,
                "删除线" | "strike" | "strikethrough" => flags.strike = true,
                _ => return None,
            }
        }
        Some(flags)
    }
}

impl FontFlags {
    /// Whether `self` (observed) satisfies `expected`: a regular expectation
    /// wants no flags at all, anything else wants at least its flags.
    pub fn satisfies(&self, expected: &FontFlags) -> bool {
        if *expected == FontFlags::default() {
            return *self == FontFlags::default();
        }
        (!expected.bold || self.bold)
            && (!expected.italic || self.italic)
            && (!expected.underline || self.underline)
            && (!expected.strike || self.strike)
    }
}

/// Chinese font size names in points.
pub const NAMED_FONT_SIZES: &[(&str, f64)] = &[
    ("初号", 42.0),
    ("小初", 36.0),
    ("一号", 26.0),
    ("小一", 24.0),
    ("二号", 22.0),
    ("小二", 18.0),
    ("三号", 16.0),
    ("小三", 15.0),
    ("四号", 14.0),
    ("小四", 12.0),
    ("五号", 10.5),
    ("小五", 9.0),
    ("六号", 7.5),
    ("小六", 6.5),
    ("七号", 5.5),
    ("八号", 5.0),
];

/// Reads a font size in points from `12`, `12磅`, `12pt` or a named size
/// such as `小四`.
pub fn parse_font_size(value: &str) -> Option<f64> {
    let v = value.trim();
    NAMED_FONT_SIZES
        .iter()
        .find(|(name, _)| *name == v)
        .map(|(_, pt)| *pt)
        .or_else(|| super::params::parse_number(v))
}

impl std::fmt::Display for FontFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<&str> = [
            (self.bold, "bold"),
            (self.italic, "italic"),
            (self.underline, "underline"),
            (self.strike, "strike"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect();
        if parts.is_empty() {
            write!(f, "regular")
        } else {
            write!(f, "{}", parts.join("+"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chinese_and_ooxml_spellings_meet() {
        assert!(same(WORD_ALIGNMENT, "居中对齐", "center"));
        assert!(same(WORD_ALIGNMENT, "both", "两端对齐"));
        assert!(!same(WORD_ALIGNMENT, "left", "right"));
        assert!(same(EXCEL_BORDER_STYLE, "thin", "单实线"));
    }

    #[test]
    fn font_flags_parse() {
        let f = FontFlags::parse("加粗+斜体").expect("flags");
        assert!(f.bold && f.italic && !f.underline);
        assert_eq!(FontFlags::parse("粗斜体"), Some(f));
        assert_eq!(FontFlags::parse("常规"), Some(FontFlags::default()));
        assert_eq!(FontFlags::parse("sparkly"), None);
        assert_eq!(f.to_string(), "bold+italic");
        let bold = FontFlags::parse("加粗").expect("bold");
        assert!(f.satisfies(&bold));
        assert!(!FontFlags::default().satisfies(&bold));
        assert!(!f.satisfies(&FontFlags::default()));
    }

    #[test]
    fn named_font_sizes() {
        assert_eq!(parse_font_size("小四"), Some(12.0));
        assert_eq!(parse_font_size("五号"), Some(10.5));
        assert_eq!(parse_font_size("14磅"), Some(14.0));
    }

    #[test]
    fn colours_expand() {
        assert_eq!(normalize_hex("#f00"), Some("FF0000".into()));
        assert_eq!(normalize_hex("FF00B050"), Some("00B050".into()));
        assert!(color_candidates("红色").contains(&"FF0000".to_string()));
    }
}
