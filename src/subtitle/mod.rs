// SRT document model
//
// - timestamp: millisecond timestamps and timing lines
// - parser: raw text to blocks, with line-numbered errors
// - validate: structural and temporal checks, fail-fast or collect-all
// - transform: reindex, overlap fixing, shifting
// - text: line-level spacing and cleanup rewrites

pub mod parser;
pub mod text;
pub mod timestamp;
pub mod transform;
pub mod validate;

use std::fmt;

pub use parser::{ParseError, ParseErrorKind, RawBlock, parse, split_blocks};
pub use text::{
    NormalizeOptions, add_cjk_spacing, clean_line, normalize_line, normalize_text,
    strip_list_marker,
};
pub use timestamp::{Timestamp, Timing};
pub use transform::{OverlapFix, fix_overlaps, reindex, reindex_source, shift_from};
pub use validate::{
    SrtIssue, ValidationError, ValidationErrorKind, validate, validate_all, validate_source,
    validate_source_all,
};

/// One cue: display index, time range and text lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleBlock {
    pub index: u32,
    pub start: Timestamp,
    pub end: Timestamp,
    pub text: Vec<String>,
    /// 1-based line of the index line in the file this block came from.
    pub source_line: Option<usize>,
}

impl SubtitleBlock {
    pub fn new<I, S>(index: u32, start: Timestamp, end: Timestamp, text: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            index,
            start,
            end,
            text: text.into_iter().map(Into::into).collect(),
            source_line: None,
        }
    }

    pub fn timing(&self) -> Timing {
        Timing::new(self.start, self.end)
    }

    pub fn has_text(&self) -> bool {
        self.text.iter().any(|line| !line.trim().is_empty())
    }

    /// Number of lines this block occupies in canonical output, separator excluded.
    fn canonical_len(&self) -> usize {
        2 + self.text.len()
    }
}

impl fmt::Display for SubtitleBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        write!(f, "{}", self.timing())?;
        for line in &self.text {
            write!(f, "\n{}", line)?;
        }
        Ok(())
    }
}

/// Ordered cues; position is playback order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtitleDocument {
    pub blocks: Vec<SubtitleBlock>,
}

impl SubtitleDocument {
    pub fn new(blocks: Vec<SubtitleBlock>) -> Self {
        Self { blocks }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SubtitleBlock> {
        self.blocks.iter()
    }

    /// Line of the index line of the block at `position`: the source line when
    /// known, otherwise where canonical output would put it.
    pub fn index_line(&self, position: usize) -> usize {
        if let Some(line) = self.blocks[position].source_line {
            return line;
        }
        1 + self.blocks[..position]
            .iter()
            .map(|b| b.canonical_len() + 1)
            .sum::<usize>()
    }

    /// Canonical SRT: LF endings, one blank line between blocks, trailing newline.
    pub fn to_srt(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SubtitleDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            writeln!(f, "{}", block)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a SubtitleDocument {
    type Item = &'a SubtitleBlock;
    type IntoIter = std::slice::Iter<'a, SubtitleBlock>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(ms: u64) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    #[test]
    fn test_serialize_canonical() {
        let doc = SubtitleDocument::new(vec![
            SubtitleBlock::new(1, ts(0), ts(1_000), ["Hello"]),
            SubtitleBlock::new(2, ts(1_500), ts(3_000), ["two", "lines"]),
        ]);

        assert_eq!(
            doc.to_srt(),
            "1\n00:00:00,000 --> 00:00:01,000\nHello\n\n\
             2\n00:00:01,500 --> 00:00:03,000\ntwo\nlines\n"
        );
    }

    #[test]
    fn test_serialize_empty_document() {
        assert_eq!(SubtitleDocument::default().to_srt(), "");
    }

    #[test]
    fn test_index_line_falls_back_to_canonical_layout() {
        let doc = SubtitleDocument::new(vec![
            SubtitleBlock::new(1, ts(0), ts(1_000), ["a", "b"]),
            SubtitleBlock::new(2, ts(1_000), ts(2_000), ["c"]),
            SubtitleBlock::new(3, ts(2_000), ts(3_000), ["d"]),
        ]);

        assert_eq!(doc.index_line(0), 1);
        assert_eq!(doc.index_line(1), 6);
        assert_eq!(doc.index_line(2), 10);
    }

    #[test]
    fn test_has_text() {
        assert!(SubtitleBlock::new(1, ts(0), ts(1), ["x"]).has_text());
        assert!(!SubtitleBlock::new(1, ts(0), ts(1), ["  "]).has_text());
        assert!(!SubtitleBlock::new(1, ts(0), ts(1), Vec::<String>::new()).has_text());
    }
}
