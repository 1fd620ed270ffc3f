use indicatif::ProgressBar;
use tracing::{debug, info, warn};

use crate::subtitle::parser::is_index_line;
use crate::subtitle::{SubtitleBlock, SubtitleDocument, strip_list_marker};
use super::ChatBackend;

/// Japanese conference talk to Traditional Chinese.
pub const DEFAULT_PROMPT: &str = "\
你是一個專業的日中字幕翻譯者。

以下是一段日本 iOS 開發研討會的逐字稿字幕，每行一句台詞，並以「編號. 」開頭。
請將每一行的日文台詞翻譯成自然、流暢的繁體中文。

【重要規則】
- 每一行輸入對應一行輸出，保留行首編號，行數必須與輸入完全相同。
- 不要新增、合併或刪除任何行。
- 不要加入任何說明、括號、標註或空行。
- 技術用語（例如 Swift, UIKit, API, UIView, Xcode, Apple）請保留原文。
- 若有日語語助詞或語氣詞（例如「ですね」「かな」「っていう」），請自然轉化為中文語氣。
- 請確保中文句子自然且口語化，但不失專業感。
- 僅輸出翻譯結果，不要多餘文字。

範例：
輸入：
1. カスタムUIを作るのは大変です。

輸出：
1. 製作自訂UI是件很不容易的事。

以下是要翻譯的內容：";

/// A batch the backend could not translate; its cues keep their source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    /// 1-based position of the first cue in the batch.
    pub first: usize,
    /// 1-based position of the last cue in the batch.
    pub last: usize,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationSummary {
    pub batches: usize,
    pub skipped: usize,
    pub translated_cues: usize,
    pub failures: Vec<BatchFailure>,
}

impl TranslationSummary {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Sends cues to a [`ChatBackend`] in fixed-size batches and writes the
/// replies back by position.
pub struct BatchTranslator<B: ChatBackend> {
    backend: B,
    batch_size: usize,
    prompt: String,
    progress: ProgressBar,
}

impl<B: ChatBackend> BatchTranslator<B> {
    pub fn new(backend: B, batch_size: usize, prompt: Option<String>) -> Self {
        Self {
            backend,
            batch_size: batch_size.max(1),
            prompt: prompt.unwrap_or_else(|| DEFAULT_PROMPT.to_string()),
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Translate every cue in place. A failed batch is logged and left as is.
    pub async fn translate_document(&self, doc: &mut SubtitleDocument) -> TranslationSummary {
        let total = doc.len();
        let mut summary = TranslationSummary::default();
        self.progress.set_length(total as u64);

        for (n, batch) in doc.blocks.chunks_mut(self.batch_size).enumerate() {
            let first = n * self.batch_size + 1;
            let last = first + batch.len() - 1;
            summary.batches += 1;
            info!("Translating cues {}-{} of {}", first, last, total);
            self.progress.set_message(format!("cues {}-{}", first, last));

            let lines: Vec<String> = batch.iter().map(cue_text).collect();
            if lines.iter().all(|line| line.is_empty()) {
                debug!("Batch {}-{} has no text, skipping", first, last);
                summary.skipped += 1;
                self.progress.inc(batch.len() as u64);
                continue;
            }

            let prompt = self.build_prompt(&lines);
            match self.backend.complete(&prompt).await {
                Ok(reply) => {
                    let translated = parse_reply(&reply);
                    if translated.len() != batch.len() {
                        warn!(
                            "Cues {}-{}: expected {} translated lines, got {}",
                            first,
                            last,
                            batch.len(),
                            translated.len()
                        );
                    }
                    for (block, line) in batch.iter_mut().zip(translated) {
                        if line.is_empty() {
                            continue;
                        }
                        block.text = vec![line];
                        summary.translated_cues += 1;
                    }
                }
                Err(e) => {
                    warn!("Translation failed for cues {}-{}: {}", first, last, e);
                    summary.failures.push(BatchFailure {
                        first,
                        last,
                        error: e.to_string(),
                    });
                }
            }
            self.progress.inc(batch.len() as u64);
        }

        self.progress.finish_and_clear();
        summary
    }

    /// Instruction followed by `N. text` lines, numbered from 1 per batch.
    pub fn build_prompt(&self, lines: &[String]) -> String {
        let body = lines
            .iter()
            .enumerate()
            .map(|(i, line)| format!("{}. {}", i + 1, line))
            .collect::<Vec<_>>()
            .join("\n");
        format!("{}\n\n{}", self.prompt, body)
    }
}

/// A cue's text on one line.
fn cue_text(block: &SubtitleBlock) -> String {
    block
        .text
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reply lines with list markers removed, one per cue.
///
/// Blank lines and echoed timing lines are dropped, and so is a digit-only
/// line directly above a timing line (an echoed index). Any other digit-only
/// line is a translation. A bare `N.` marker yields an empty entry so the
/// following lines stay aligned with their cues.
pub fn parse_reply(reply: &str) -> Vec<String> {
    let lines: Vec<&str> = reply
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    lines
        .iter()
        .enumerate()
        .filter(|&(i, line)| {
            let echoed_index =
                is_index_line(line) && lines.get(i + 1).is_some_and(|next| next.contains("-->"));
            !echoed_index && !line.contains("-->")
        })
        .map(|(_, line)| strip_list_marker(line).to_string())
        .collect()
}
