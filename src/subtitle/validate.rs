use thiserror::Error;

use super::parser::{ParseError, RawBlock, split_blocks};
use super::timestamp::{Timestamp, Timing};
use super::SubtitleDocument;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    #[error(
        "index mismatch (expected {expected}, got {found}){}",
        mismatch_hint(.expected, .found)
    )]
    IndexMismatch { expected: u32, found: u32 },

    #[error("end time is earlier than or equal to start time")]
    EndNotAfterStart,

    #[error(
        "start time overlaps with previous block {previous_block} \
         (previous end at line {previous_line})"
    )]
    Overlap {
        previous_block: usize,
        previous_line: usize,
    },

    #[error("has no subtitle text")]
    EmptyText,

    /// Only reachable for documents built or shifted in memory.
    #[error("timestamp {found} is past the largest SRT time {max}", max = Timestamp::MAX)]
    TimestampTooLarge { found: Timestamp },
}

fn mismatch_hint(expected: &u32, found: &u32) -> String {
    if found > expected {
        format!(" (possibly missing block {})", expected)
    } else {
        " (duplicate or misplaced index)".to_string()
    }
}

/// A well-formed file that breaks an ordering or content rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Block {block}: line {line} {kind}")]
pub struct ValidationError {
    pub block: usize,
    pub line: usize,
    pub kind: ValidationErrorKind,
}

/// Anything the validator can report about a file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SrtIssue {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

impl SrtIssue {
    pub fn block(&self) -> usize {
        match self {
            Self::Parse(e) => e.block,
            Self::Invalid(e) => e.block,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            Self::Parse(e) => e.line,
            Self::Invalid(e) => e.line,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Previous {
    block: usize,
    end: Timestamp,
    timing_line: usize,
}

/// Running state across blocks: the index we expect next and the last good timing.
#[derive(Debug)]
struct Checker {
    expected: u32,
    previous: Option<Previous>,
}

impl Default for Checker {
    fn default() -> Self {
        Self {
            expected: 1,
            previous: None,
        }
    }
}

impl Checker {
    fn check_index(&mut self, block: usize, line: usize, found: u32) -> Option<ValidationError> {
        let expected = self.expected;
        // Resync on the found index so one bad number yields one report.
        self.expected = found.saturating_add(1);
        (found != expected).then_some(ValidationError {
            block,
            line,
            kind: ValidationErrorKind::IndexMismatch { expected, found },
        })
    }

    fn skip_index(&mut self) {
        self.expected = self.expected.saturating_add(1);
    }

    fn check_timing(&mut self, block: usize, line: usize, timing: Timing) -> Vec<ValidationError> {
        let mut found = Vec::new();

        if timing.end <= timing.start {
            found.push(ValidationError {
                block,
                line,
                kind: ValidationErrorKind::EndNotAfterStart,
            });
        }

        if let Some(prev) = self.previous {
            if timing.start < prev.end {
                found.push(ValidationError {
                    block,
                    line,
                    kind: ValidationErrorKind::Overlap {
                        previous_block: prev.block,
                        previous_line: prev.timing_line,
                    },
                });
            }
        }

        self.previous = Some(Previous {
            block,
            end: timing.end,
            timing_line: line,
        });
        found
    }

    fn check_raw(&mut self, raw: &RawBlock, block: usize, issues: &mut Vec<SrtIssue>) {
        if let Err(e) = raw.check_len(block) {
            issues.push(e.into());
            self.skip_index();
            return;
        }

        match raw.parse_index(block) {
            Ok(index) => issues.extend(
                self.check_index(block, raw.line_number(0), index)
                    .map(SrtIssue::from),
            ),
            Err(e) => {
                issues.push(e.into());
                self.skip_index();
            }
        }

        match raw.parse_timing(block) {
            Ok(timing) => issues.extend(
                self.check_timing(block, raw.line_number(1), timing)
                    .into_iter()
                    .map(SrtIssue::from),
            ),
            Err(e) => issues.push(e.into()),
        }

        if let Err(e) = raw.check_text(block) {
            issues.push(e.into());
        }
    }

    fn check_block(
        &mut self,
        doc: &SubtitleDocument,
        position: usize,
        issues: &mut Vec<ValidationError>,
    ) {
        let block = &doc.blocks[position];
        let ordinal = position + 1;
        let line = doc.index_line(position);

        issues.extend(self.check_index(ordinal, line, block.index));
        if let Some(found) = [block.start, block.end].into_iter().find(|t| *t > Timestamp::MAX) {
            issues.push(ValidationError {
                block: ordinal,
                line: line + 1,
                kind: ValidationErrorKind::TimestampTooLarge { found },
            });
        }
        issues.extend(self.check_timing(ordinal, line + 1, block.timing()));
        if !block.has_text() {
            issues.push(ValidationError {
                block: ordinal,
                line: line + 2,
                kind: ValidationErrorKind::EmptyText,
            });
        }
    }
}

fn run_document(doc: &SubtitleDocument, fail_fast: bool) -> Vec<ValidationError> {
    let mut checker = Checker::default();
    let mut issues = Vec::new();

    for position in 0..doc.len() {
        checker.check_block(doc, position, &mut issues);
        if fail_fast && !issues.is_empty() {
            issues.truncate(1);
            break;
        }
    }
    issues
}

fn run_source(raw: &str, fail_fast: bool) -> Vec<SrtIssue> {
    let mut checker = Checker::default();
    let mut issues = Vec::new();

    for (i, raw_block) in split_blocks(raw).iter().enumerate() {
        checker.check_raw(raw_block, i + 1, &mut issues);
        if fail_fast && !issues.is_empty() {
            issues.truncate(1);
            break;
        }
    }
    issues
}

/// Check an in-memory document, stopping at the first problem.
pub fn validate(doc: &SubtitleDocument) -> Result<(), ValidationError> {
    match run_document(doc, true).into_iter().next() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Every problem in an in-memory document, in block order.
pub fn validate_all(doc: &SubtitleDocument) -> Vec<ValidationError> {
    run_document(doc, false)
}

/// Check file contents, stopping at the first problem.
pub fn validate_source(raw: &str) -> Result<(), SrtIssue> {
    match run_source(raw, true).into_iter().next() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Every problem in file contents, in block order.
pub fn validate_source_all(raw: &str) -> Vec<SrtIssue> {
    run_source(raw, false)
}
