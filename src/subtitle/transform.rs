use std::fmt;

use super::parser::{is_index_line, split_blocks};
use super::timestamp::Timing;
use super::SubtitleDocument;

/// Number blocks 1..N in document order. Timing and text are left alone.
pub fn reindex(mut doc: SubtitleDocument) -> SubtitleDocument {
    for (i, block) in doc.blocks.iter_mut().enumerate() {
        block.index = u32::try_from(i + 1).unwrap_or(u32::MAX);
    }
    doc
}

/// Renumber raw file contents without requiring them to parse.
///
/// A first line made of digits is replaced by the new number, any other first
/// line gets a number line inserted above it. Returns the new text and the
/// number of blocks written.
pub fn reindex_source(raw: &str) -> (String, usize) {
    let blocks: Vec<String> = split_blocks(raw)
        .into_iter()
        .enumerate()
        .map(|(i, block)| {
            let number = (i + 1).to_string();
            let mut lines = block.lines;
            if is_index_line(&lines[0]) {
                lines[0] = number;
            } else {
                lines.insert(0, number);
            }
            lines.join("\n")
        })
        .collect();

    if blocks.is_empty() {
        return (String::new(), 0);
    }
    let count = blocks.len();
    (blocks.join("\n\n") + "\n", count)
}

/// One start time moved forward by the overlap fixer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapFix {
    pub index: u32,
    pub before: Timing,
    pub after: Timing,
}

impl fmt::Display for OverlapFix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}: {} => {}", self.index, self.before, self.after)
    }
}

/// Push each block's start to 1ms after the previous end whenever it does not
/// start strictly later. Ends are never touched, so a pushed block can end up
/// inverted; re-validate afterwards.
pub fn fix_overlaps(mut doc: SubtitleDocument) -> (SubtitleDocument, Vec<OverlapFix>) {
    let mut fixes = Vec::new();

    for i in 1..doc.blocks.len() {
        let prev_end = doc.blocks[i - 1].end;
        let block = &mut doc.blocks[i];
        if block.start > prev_end {
            continue;
        }

        let before = block.timing();
        block.start = prev_end.offset(1);
        fixes.push(OverlapFix {
            index: block.index,
            before,
            after: block.timing(),
        });
    }

    (doc, fixes)
}

/// Move every block whose index is `>= start_index` by `delta_ms`, clamping at zero.
pub fn shift_from(mut doc: SubtitleDocument, start_index: u32, delta_ms: i64) -> SubtitleDocument {
    for block in doc.blocks.iter_mut().filter(|b| b.index >= start_index) {
        block.start = block.start.offset(delta_ms);
        block.end = block.end.offset(delta_ms);
    }
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subtitle::{SubtitleBlock, Timestamp, parse, validate};

    fn ts(ms: u64) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    fn doc(spans: &[(u32, u64, u64)]) -> SubtitleDocument {
        SubtitleDocument::new(
            spans
                .iter()
                .map(|&(index, start, end)| {
                    SubtitleBlock::new(index, ts(start), ts(end), [format!("line {index}")])
                })
                .collect(),
        )
    }

    #[test]
    fn test_reindex_renumbers_in_order() {
        let out = reindex(doc(&[(7, 0, 1), (3, 1, 2), (3, 2, 3)]));
        let indices: Vec<u32> = out.iter().map(|b| b.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(out.blocks[1].text, vec!["line 3"]);
        assert_eq!(out.blocks[1].start, ts(1));
    }

    #[test]
    fn test_reindex_is_idempotent() {
        let once = reindex(doc(&[(5, 0, 1), (9, 1, 2)]));
        assert_eq!(reindex(once.clone()), once);
    }

    #[test]
    fn test_reindex_source_inserts_missing_numbers() {
        let raw = "\u{feff}5\n00:00:00,000 --> 00:00:01,000\na\n\n\
                   \n00:00:01,000 --> 00:00:02,000\nb\n\n  \n\
                   9\n00:00:02,000 --> 00:00:03,000\nc";
        let (out, count) = reindex_source(raw);

        assert_eq!(count, 3);
        assert_eq!(
            out,
            "1\n00:00:00,000 --> 00:00:01,000\na\n\n\
             2\n00:00:01,000 --> 00:00:02,000\nb\n\n\
             3\n00:00:02,000 --> 00:00:03,000\nc\n"
        );
        assert_eq!(reindex_source(&out), (out.clone(), 3));
    }

    #[test]
    fn test_reindex_source_empty() {
        assert_eq!(reindex_source(" \n\n"), (String::new(), 0));
    }

    #[test]
    fn test_fix_overlaps_pushes_start_forward() {
        let spans = [(1, 0, 2_000), (2, 1_500, 3_000), (3, 3_000, 4_000), (4, 4_500, 5_000)];
        let (fixed, fixes) = fix_overlaps(doc(&spans));

        assert_eq!(fixes.len(), 2);
        assert_eq!(fixes[0].index, 2);
        assert_eq!(fixes[0].before, Timing::new(ts(1_500), ts(3_000)));
        assert_eq!(fixes[0].after, Timing::new(ts(2_001), ts(3_000)));
        assert_eq!(fixes[1].index, 3);
        assert_eq!(fixes[1].after.start, ts(3_001));
        assert_eq!(
            fixes[0].to_string(),
            "#2: 00:00:01,500 --> 00:00:03,000 => 00:00:02,001 --> 00:00:03,000"
        );

        assert_eq!(fixed.blocks[3].start, ts(4_500));
        assert_eq!(validate(&fixed), Ok(()));
    }

    #[test]
    fn test_fix_overlaps_can_leave_inverted_blocks() {
        let (fixed, fixes) = fix_overlaps(doc(&[(1, 0, 5_000), (2, 1_000, 2_000)]));

        assert_eq!(fixes.len(), 1);
        assert_eq!(fixed.blocks[1].start, ts(5_001));
        assert_eq!(fixed.blocks[1].end, ts(2_000));
        for pair in fixed.blocks.windows(2) {
            assert!(pair[1].start >= pair[0].end);
        }
        assert!(validate(&fixed).is_err());
    }

    #[test]
    fn test_fix_overlaps_cascades() {
        let (fixed, fixes) = fix_overlaps(doc(&[(1, 0, 1_000), (2, 500, 1_000), (3, 500, 1_000)]));
        assert_eq!(fixes.len(), 2);
        assert_eq!(fixed.blocks[1].start, ts(1_001));
        assert_eq!(fixed.blocks[2].start, ts(1_001));
    }

    #[test]
    fn test_shift_from_only_touches_later_blocks() {
        let spans: Vec<(u32, u64, u64)> = (1..=60)
            .map(|i| (i, u64::from(i) * 1_000, u64::from(i) * 1_000 + 500))
            .collect();
        let original = doc(&spans);
        let shifted = shift_from(original.clone(), 50, -1_200);

        assert_eq!(shifted.blocks[..49], original.blocks[..49]);
        assert_eq!(shifted.blocks[49].start, ts(50_000 - 1_200));
        assert_eq!(shifted.blocks[59].end, ts(60_500 - 1_200));
    }

    #[test]
    fn test_shift_clamps_at_zero() {
        let shifted = shift_from(doc(&[(1, 500, 1_000), (2, 1_000, 2_000)]), 1, -1_200);
        assert_eq!(shifted.blocks[0].timing(), Timing::new(Timestamp::ZERO, Timestamp::ZERO));
        assert_eq!(shifted.blocks[1].timing(), Timing::new(Timestamp::ZERO, ts(800)));
        assert_eq!(shifted.to_srt().lines().nth(1), Some("00:00:00,000 --> 00:00:00,000"));
    }

    #[test]
    fn test_shift_round_trip() {
        let original = doc(&[(1, 1_000, 2_000), (2, 3_000, 4_000)]);
        let back = shift_from(shift_from(original.clone(), 1, 750), 1, -750);
        assert_eq!(back, original);
    }

    #[test]
    fn test_shift_round_trip_breaks_after_clamping() {
        let original = doc(&[(1, 300, 2_000)]);
        let back = shift_from(shift_from(original.clone(), 1, -500), 1, 500);

        assert_eq!(back.blocks[0].start, ts(500));
        assert_eq!(back.blocks[0].end, ts(2_000));
        assert_ne!(back, original);
    }

    #[test]
    fn test_transforms_survive_serialization() {
        let raw = "1\n00:00:01,000 --> 00:00:03,000\nA\n\n2\n00:00:02,000 --> 00:00:04,000\nB\n";
        let (fixed, _) = fix_overlaps(parse(raw).unwrap());
        assert_eq!(
            fixed.to_srt(),
            "1\n00:00:01,000 --> 00:00:03,000\nA\n\n2\n00:00:03,001 --> 00:00:04,000\nB\n"
        );
    }
}
