use super::parser::{is_index_line, normalize_source};

/// Trailing punctuation removed by [`clean_line`].
const TRAILING_PUNCTUATION: &[char] = &['，', '。', '､', '｡', ',', '.'];

/// Which rewrites [`normalize_line`] applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NormalizeOptions {
    /// Space out CJK / Latin boundaries.
    pub spacing: bool,
    /// Drop leading `N.` markers and trailing commas/periods.
    pub cleaning: bool,
}

impl NormalizeOptions {
    pub const SPACING: Self = Self {
        spacing: true,
        cleaning: false,
    };

    pub const CLEANING: Self = Self {
        spacing: false,
        cleaning: true,
    };
}

/// Han ideographs plus Japanese kana.
fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{309F}'   // hiragana
        | '\u{30A0}'..='\u{30FF}' // katakana
        | '\u{3400}'..='\u{4DBF}' // extension A
        | '\u{4E00}'..='\u{9FFF}' // unified ideographs
        | '\u{F900}'..='\u{FAFF}' // compatibility ideographs
    )
}

fn is_latin(c: char) -> bool {
    c.is_ascii_alphanumeric()
}

/// Insert one space wherever a CJK character meets an ASCII letter or digit.
pub fn add_cjk_spacing(line: &str) -> String {
    let mut out = String::with_capacity(line.len() + 8);
    let mut prev: Option<char> = None;

    for c in line.chars() {
        if let Some(p) = prev {
            if (is_cjk(p) && is_latin(c)) || (is_latin(p) && is_cjk(c)) {
                out.push(' ');
            }
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

/// Drop a leading `12.` list marker and the whitespace after it.
pub fn strip_list_marker(line: &str) -> &str {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 && line[digits..].starts_with('.') {
        line[digits + 1..].trim_start()
    } else {
        line
    }
}

/// Remove a leading list marker and any run of trailing commas or periods.
pub fn clean_line(line: &str) -> String {
    strip_list_marker(line)
        .trim_end_matches(TRAILING_PUNCTUATION)
        .to_string()
}

pub fn normalize_line(line: &str, options: NormalizeOptions) -> String {
    let mut out = line.to_string();
    if options.cleaning {
        out = clean_line(&out);
    }
    if options.spacing {
        out = add_cjk_spacing(&out);
    }
    out
}

/// Index, timing and blank lines pass through untouched.
fn is_text_line(line: &str) -> bool {
    !(line.trim().is_empty() || is_index_line(line) || line.contains("-->"))
}

/// Apply [`normalize_line`] to every text line of a file. A line the rewrite
/// would empty (a lone `...` or `。`) is kept as it was.
pub fn normalize_text(raw: &str, options: NormalizeOptions) -> String {
    let source = normalize_source(raw);
    let mut out = String::with_capacity(source.len());

    for line in source.lines() {
        if is_text_line(line) {
            let source_line = line.trim_end();
            let rewritten = normalize_line(source_line, options);
            // A blank text line would end the block early.
            if rewritten.trim().is_empty() {
                out.push_str(source_line);
            } else {
                out.push_str(&rewritten);
            }
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}
