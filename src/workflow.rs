use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::{Config, Environment};
use crate::download::{DownloadSummary, Downloader, YtDlpFetcher, parse_manifest};
use crate::error::{Result, SrtkitError};
use crate::files::{find_srt_files, is_srt, read_text, write_atomic};
use crate::subtitle::timestamp::seconds_to_millis;
use crate::subtitle::{
    NormalizeOptions, OverlapFix, SubtitleDocument, ValidationErrorKind, fix_overlaps,
    normalize_text, parse, reindex_source, shift_from, validate_all, validate_source,
    validate_source_all,
};
use crate::translate::{BatchTranslator, OpenAiClient, TranslationSummary};

/// Outcome of checking one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCheck {
    pub path: PathBuf,
    pub problems: Vec<String>,
}

impl FileCheck {
    pub fn passed(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Results of a validation batch.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub files: Vec<FileCheck>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.files.iter().all(FileCheck::passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileCheck> {
        self.files.iter().filter(|f| !f.passed())
    }

    /// Markdown body for CI comments.
    pub fn render(&self) -> String {
        let mut out = String::from("❌ **SRT Format Validation Failed**\n\n");
        for file in self.failures() {
            for problem in &file.problems {
                out.push_str(&format!("- `{}`: {}\n", file.path.display(), problem));
            }
        }
        out.push_str("\nPlease fix the issues above and push again to re-run the check.\n");
        out.push_str(&format!(
            "\n_Generated {}_\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        out
    }
}

/// What a `validate` run ended with.
#[derive(Debug, Clone)]
pub enum ValidationOutcome {
    /// Nothing to check; not a failure.
    NoTargets,
    Passed { files: usize },
    Failed {
        report: ValidationReport,
        report_path: PathBuf,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReindexSummary {
    /// Files rewritten and the number of blocks in each.
    pub files: Vec<(PathBuf, usize)>,
    /// Files with no blocks, left untouched.
    pub empty: Vec<PathBuf>,
}

pub struct Workflow {
    config: Config,
    env: Environment,
}

impl Workflow {
    pub fn new(config: Config, env: Environment) -> Self {
        Self { config, env }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Rewrite the text lines of a file in place.
    pub fn normalize_file(&self, path: &Path, options: NormalizeOptions) -> Result<()> {
        info!("Normalizing {} ({:?})", path.display(), options);
        let source = read_text(path)?;
        write_atomic(path, &normalize_text(&source, options))?;
        Ok(())
    }

    /// Fix overlapping starts in place and return what changed.
    ///
    /// With `strict`, a result that still fails validation is not written.
    pub fn fix_overlaps_file(&self, path: &Path, strict: bool) -> Result<Vec<OverlapFix>> {
        info!("Fixing overlaps in {}", path.display());
        let doc = parse(&read_text(path)?)?;
        let (doc, fixes) = fix_overlaps(doc);

        write_checked(path, &doc, strict)?;
        Ok(fixes)
    }

    /// Reindex one `.srt` file, or every `.srt` file below a directory.
    pub fn reindex_path(&self, path: &Path) -> Result<ReindexSummary> {
        let mut summary = ReindexSummary::default();

        let targets = if path.is_file() {
            if !is_srt(path) {
                return Err(SrtkitError::Config(format!(
                    "{} is not an .srt file",
                    path.display()
                )));
            }
            vec![path.to_path_buf()]
        } else if path.is_dir() {
            find_srt_files(path)
        } else {
            return Err(SrtkitError::FileNotFound(path.display().to_string()));
        };
        info!("Reindexing {} file(s) under {}", targets.len(), path.display());

        for target in targets {
            match reindex_file(&target) {
                Ok(0) => {
                    warn!("Empty file: {}", target.display());
                    summary.empty.push(target);
                }
                Ok(count) => summary.files.push((target, count)),
                Err(e) if path.is_dir() => warn!("Skipping {}: {}", target.display(), e),
                Err(e) => return Err(e),
            }
        }

        Ok(summary)
    }

    /// Shift every block numbered `start_index` or later; returns how many moved.
    ///
    /// A shift past `99:59:59,999` is always refused. With `strict`, any
    /// other remaining problem also stops the write.
    pub fn shift_file(
        &self,
        path: &Path,
        start_index: u32,
        delta_seconds: f64,
        strict: bool,
    ) -> Result<usize> {
        let delta_ms = seconds_to_millis(delta_seconds).ok_or_else(|| {
            SrtkitError::Config(format!("Invalid shift amount: {}", delta_seconds))
        })?;
        info!(
            "Shifting {} by {}ms from block {}",
            path.display(),
            delta_ms,
            start_index
        );

        let doc = parse(&read_text(path)?)?;
        let moved = doc.iter().filter(|b| b.index >= start_index).count();
        let doc = shift_from(doc, start_index, delta_ms);

        write_checked(path, &doc, strict)?;
        Ok(moved)
    }

    /// Paths to validate: explicit ones, else the change list, else a scan of `scan_root`.
    pub fn validation_targets(&self, explicit: &[PathBuf], scan_root: &Path) -> Vec<PathBuf> {
        let candidates = if !explicit.is_empty() {
            explicit.to_vec()
        } else if !self.env.changed_files.is_empty() {
            debug!(
                "Using {} path(s) from the change list",
                self.env.changed_files.len()
            );
            self.env.changed_files.clone()
        } else {
            println!(
                "⚠️  No {} detected, scanning all .srt files under {}",
                self.config.validate.changed_files_env,
                scan_root.display()
            );
            find_srt_files(scan_root)
        };

        candidates.into_iter().filter(|p| is_srt(p)).collect()
    }

    /// Check each file, printing one line per file. Missing paths are skipped.
    pub fn validate_files(&self, targets: &[PathBuf], all_errors: bool) -> ValidationReport {
        let mut report = ValidationReport::default();

        for path in targets {
            if !path.exists() {
                debug!("Skipping missing path {}", path.display());
                continue;
            }

            let problems = check_file(path, all_errors);
            if problems.is_empty() {
                println!("✅ {}", path.display());
            } else {
                for problem in &problems {
                    println!("❌ {}: {}", path.display(), problem);
                }
            }
            report.files.push(FileCheck {
                path: path.clone(),
                problems,
            });
        }

        report
    }

    /// Pick targets, check them, and write the report when anything failed.
    pub fn run_validation(
        &self,
        explicit: &[PathBuf],
        all_errors: bool,
        scan_root: &Path,
    ) -> Result<ValidationOutcome> {
        let targets = self.validation_targets(explicit, scan_root);
        if targets.is_empty() {
            return Ok(ValidationOutcome::NoTargets);
        }

        let report = self.validate_files(&targets, all_errors);
        if report.passed() {
            return Ok(ValidationOutcome::Passed {
                files: report.files.len(),
            });
        }
        let report_path = self.write_report(&report)?;
        Ok(ValidationOutcome::Failed {
            report,
            report_path,
        })
    }

    /// Write the failure report where the config says.
    pub fn write_report(&self, report: &ValidationReport) -> Result<PathBuf> {
        let path = self.config.validate.report_path.clone();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, report.render())?;
        info!("Validation report written to {}", path.display());
        Ok(path)
    }

    /// Default output: `talk.srt` becomes `talk.<suffix>.srt`.
    pub fn translation_output(&self, input: &Path) -> PathBuf {
        input.with_extension(format!("{}.srt", self.config.translate.output_suffix))
    }

    /// Translate a file with the configured chat API.
    pub async fn translate_file(
        &self,
        input: &Path,
        output: Option<&Path>,
    ) -> Result<(PathBuf, TranslationSummary)> {
        let api_key = self.env.require_api_key(&self.config.translate.api_key_env)?;
        let client = OpenAiClient::new(&self.config.translate, api_key)?;
        let translator = BatchTranslator::new(
            client,
            self.config.translate.batch_size,
            self.config.translate.prompt.clone(),
        );
        self.translate_with(translator, input, output).await
    }

    /// Translate a file with any translator; used by [`Self::translate_file`].
    pub async fn translate_with<B: crate::translate::ChatBackend>(
        &self,
        translator: BatchTranslator<B>,
        input: &Path,
        output: Option<&Path>,
    ) -> Result<(PathBuf, TranslationSummary)> {
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.translation_output(input));
        info!("Translating {} -> {}", input.display(), output.display());

        let mut doc = parse(&read_text(input)?)?;
        let translator = translator.with_progress(progress_bar(doc.len() as u64));
        let summary = translator.translate_document(&mut doc).await;

        write_atomic(&output, &doc.to_srt())?;
        Ok((output, summary))
    }

    /// Download every manifest entry into folders beside the manifest.
    pub async fn download_sessions(&self, manifest: Option<&Path>) -> Result<DownloadSummary> {
        let manifest = manifest
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.download.manifest.clone());
        if !manifest.is_file() {
            return Err(SrtkitError::FileNotFound(manifest.display().to_string()));
        }
        let root = match manifest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let downloader = Downloader::new(
            YtDlpFetcher::new(self.config.download.clone()),
            self.config.download.merge_format.clone(),
        );
        let version = downloader.check_availability().await?;
        info!("Using {} {}", self.config.download.binary_path, version);

        let entries = parse_manifest(&read_text(&manifest)?);
        info!("Manifest {} lists {} entries", manifest.display(), entries.len());
        downloader.run(&entries, &root).await
    }
}

/// Reindex one file in place; returns the block count, 0 when the file is empty.
pub fn reindex_file(path: &Path) -> Result<usize> {
    let (content, count) = reindex_source(&read_text(path)?);
    if count > 0 {
        write_atomic(path, &content)?;
    }
    Ok(count)
}

/// Problems found in one file, rendered for people.
fn check_file(path: &Path, all_errors: bool) -> Vec<String> {
    let source = match read_text(path) {
        Ok(source) => source,
        Err(e) => return vec![format!("Cannot read file: {}", e)],
    };
    if source.trim_start_matches('\u{feff}').trim().is_empty() {
        return vec!["File is empty".to_string()];
    }

    if all_errors {
        validate_source_all(&source).iter().map(ToString::to_string).collect()
    } else {
        validate_source(&source).err().map(|e| e.to_string()).into_iter().collect()
    }
}

/// Re-validate a transformed document, then write it.
///
/// Times that cannot be written as `HH:MM:SS,mmm` always fail. Other issues
/// fail under `strict` and are logged as warnings otherwise.
fn write_checked(path: &Path, doc: &SubtitleDocument, strict: bool) -> Result<()> {
    let issues = validate_all(doc);

    let unwritable = issues
        .iter()
        .find(|issue| matches!(issue.kind, ValidationErrorKind::TimestampTooLarge { .. }));
    if let Some(issue) = unwritable {
        return Err(issue.clone().into());
    }
    if strict {
        if let Some(issue) = issues.into_iter().next() {
            return Err(issue.into());
        }
    } else {
        for issue in &issues {
            warn!("{}: {}", path.display(), issue);
        }
    }

    write_atomic(path, &doc.to_srt())
}

fn progress_bar(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} {msg}") {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}
