use thiserror::Error;

use super::timestamp::Timing;
use super::{SubtitleBlock, SubtitleDocument};

/// Why a candidate block could not be read as a cue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("starts a block with too few lines (needs at least 3)")]
    TooFewLines,

    #[error("should be a numeric index, found '{found}'")]
    InvalidIndex { found: String },

    #[error("index {found} is out of range (expected 1 to {max})", max = u32::MAX)]
    IndexOutOfRange { found: String },

    #[error(
        "has an invalid timestamp format (expected 'HH:MM:SS,mmm --> HH:MM:SS,mmm'), got '{found}'"
    )]
    InvalidTiming { found: String },

    #[error("starts a block with no subtitle text")]
    MissingText,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Block {block}: line {line} {kind}")]
pub struct ParseError {
    /// 1-based ordinal of the block in the file.
    pub block: usize,
    /// 1-based source line.
    pub line: usize,
    pub kind: ParseErrorKind,
}

/// A run of non-blank lines, as found between blank lines in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock {
    /// 1-based source line of `lines[0]`.
    pub first_line: usize,
    pub lines: Vec<String>,
}

impl RawBlock {
    /// Source line number of `lines[offset]`.
    pub fn line_number(&self, offset: usize) -> usize {
        self.first_line + offset
    }

    pub(crate) fn error(&self, block: usize, offset: usize, kind: ParseErrorKind) -> ParseError {
        ParseError {
            block,
            line: self.line_number(offset),
            kind,
        }
    }

    pub(crate) fn check_len(&self, block: usize) -> Result<(), ParseError> {
        if self.lines.len() < 3 {
            return Err(self.error(block, 0, ParseErrorKind::TooFewLines));
        }
        Ok(())
    }

    pub(crate) fn parse_index(&self, block: usize) -> Result<u32, ParseError> {
        let found = self.lines[0].trim();
        if !is_index_line(found) {
            let kind = ParseErrorKind::InvalidIndex { found: found.to_string() };
            return Err(self.error(block, 0, kind));
        }
        parse_index(found).ok_or_else(|| {
            let kind = ParseErrorKind::IndexOutOfRange { found: found.to_string() };
            self.error(block, 0, kind)
        })
    }

    pub(crate) fn parse_timing(&self, block: usize) -> Result<Timing, ParseError> {
        Timing::parse_line(&self.lines[1]).ok_or_else(|| {
            let kind = ParseErrorKind::InvalidTiming { found: self.lines[1].trim().to_string() };
            self.error(block, 1, kind)
        })
    }

    pub(crate) fn check_text(&self, block: usize) -> Result<(), ParseError> {
        if self.lines[2..].iter().all(|l| l.trim().is_empty()) {
            return Err(self.error(block, 2, ParseErrorKind::MissingText));
        }
        Ok(())
    }

    /// Read this block as a cue. `block` is its 1-based ordinal, used in errors.
    pub fn parse(&self, block: usize) -> Result<SubtitleBlock, ParseError> {
        self.check_len(block)?;
        let index = self.parse_index(block)?;
        let timing = self.parse_timing(block)?;
        self.check_text(block)?;

        Ok(SubtitleBlock {
            index,
            start: timing.start,
            end: timing.end,
            text: self.lines[2..].to_vec(),
            source_line: Some(self.first_line),
        })
    }
}

/// Strip a UTF-8 BOM and turn CRLF / lone CR into LF.
pub fn normalize_source(raw: &str) -> String {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    raw.replace("\r\n", "\n").replace('\r', "\n")
}

/// True for a line made only of ASCII digits (surrounding whitespace ignored).
pub fn is_index_line(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && line.bytes().all(|b| b.is_ascii_digit())
}

/// Parse an index line as a positive `u32`.
pub fn parse_index(line: &str) -> Option<u32> {
    if !is_index_line(line) {
        return None;
    }
    line.trim().parse().ok().filter(|&n| n > 0)
}

/// Split source text into runs of non-blank lines, keeping line numbers.
pub fn split_blocks(raw: &str) -> Vec<RawBlock> {
    let source = normalize_source(raw);
    let mut blocks = Vec::new();
    let mut current: Option<RawBlock> = None;

    for (i, line) in source.lines().enumerate() {
        if line.trim().is_empty() {
            if let Some(block) = current.take() {
                blocks.push(block);
            }
            continue;
        }
        current
            .get_or_insert_with(|| RawBlock {
                first_line: i + 1,
                lines: Vec::new(),
            })
            .lines
            .push(line.to_string());
    }
    if let Some(block) = current {
        blocks.push(block);
    }

    blocks
}

/// Parse a whole file. Stops at the first malformed block.
pub fn parse(raw: &str) -> Result<SubtitleDocument, ParseError> {
    let blocks = split_blocks(raw)
        .iter()
        .enumerate()
        .map(|(i, raw_block)| raw_block.parse(i + 1))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SubtitleDocument::new(blocks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subtitle::Timestamp;

    const CANONICAL: &str = "1\n00:00:01,000 --> 00:00:02,000\nこんにちは\n\n\
                             2\n00:00:02,500 --> 00:00:04,000\nfirst line\nsecond line\n";

    #[test]
    fn test_parse_basic() {
        let doc = parse(CANONICAL).unwrap();
        assert_eq!(doc.len(), 2);

        let second = &doc.blocks[1];
        assert_eq!(second.index, 2);
        assert_eq!(second.start, Timestamp::from_millis(2_500));
        assert_eq!(second.end, Timestamp::from_millis(4_000));
        assert_eq!(second.text, vec!["first line", "second line"]);
        assert_eq!(second.source_line, Some(5));
    }

    #[test]
    fn test_round_trip_is_byte_identical() {
        assert_eq!(parse(CANONICAL).unwrap().to_srt(), CANONICAL);
    }

    #[test]
    fn test_bom_and_crlf_are_tolerated() {
        let raw = format!("\u{feff}{}", CANONICAL.replace('\n', "\r\n"));
        assert_eq!(parse(&raw).unwrap().to_srt(), CANONICAL);
    }

    #[test]
    fn test_extra_blank_lines_between_blocks() {
        let raw = "\n\n1\n00:00:01,000 --> 00:00:02,000\na\n\n \n\n\
                   2\n00:00:03,000 --> 00:00:04,000\nb\n\n\n";
        let doc = parse(raw).unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.blocks[0].source_line, Some(3));
        assert_eq!(doc.blocks[1].source_line, Some(9));
    }

    #[test]
    fn test_empty_input_is_empty_document() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("\u{feff}\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_non_numeric_index() {
        let raw = "1\n00:00:01,000 --> 00:00:02,000\na\n\nX\n00:00:03,000 --> 00:00:04,000\nb\n";
        let err = parse(raw).unwrap_err();
        assert_eq!(err.block, 2);
        assert_eq!(err.line, 5);
        assert_eq!(err.kind, ParseErrorKind::InvalidIndex { found: "X".into() });
        assert_eq!(err.to_string(), "Block 2: line 5 should be a numeric index, found 'X'");
    }

    #[test]
    fn test_bad_timing_line() {
        let err = parse("1\n00:00:01.000 --> 00:00:02,000\na\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(matches!(err.kind, ParseErrorKind::InvalidTiming { .. }));
    }

    #[test]
    fn test_too_few_lines() {
        let err = parse("1\n00:00:01,000 --> 00:00:02,000\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::TooFewLines);
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_split_blocks_keeps_line_numbers() {
        let blocks = split_blocks("a\nb\n\n\nc\n");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].first_line, 1);
        assert_eq!(blocks[1].first_line, 5);
        assert_eq!(blocks[1].line_number(0), 5);
    }

    #[test]
    fn test_index_line_detection() {
        assert!(is_index_line("42"));
        assert!(is_index_line(" 7 "));
        assert!(!is_index_line("4 2"));
        assert!(!is_index_line("1."));
        assert!(!is_index_line(""));
        assert_eq!(parse_index("12"), Some(12));
        assert_eq!(parse_index("0"), None);
        assert_eq!(parse_index("99999999999"), None);
    }

    #[test]
    fn test_index_out_of_range() {
        let err = parse("99999999999\n00:00:01,000 --> 00:00:02,000\na\n").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::IndexOutOfRange { found: "99999999999".into() }
        );
        assert_eq!(
            err.to_string(),
            "Block 1: line 1 index 99999999999 is out of range (expected 1 to 4294967295)"
        );

        let err = parse("0\n00:00:01,000 --> 00:00:02,000\na\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::IndexOutOfRange { found: "0".into() });
    }
}
