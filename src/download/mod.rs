// Session video downloads
//
// - commands: external command builder for yt-dlp
// - this module: manifest parsing and the per-entry folder handling

pub mod commands;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub use commands::{ToolCommand, YtDlpCommandBuilder};

use crate::config::DownloadConfig;
use crate::error::{Result, SrtkitError};

/// Characters that cannot appear in a file name on common filesystems.
const UNSAFE_FILENAME_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

const INSTALL_HINT: &str = "Install it with `brew install yt-dlp` or `pip install yt-dlp`";

/// One manifest pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestEntry {
    Download { folder: String, url: String },
    /// The line after the folder name is missing or not an http(s) URL.
    Skip { folder: String },
}

/// Read alternating folder-name / URL lines. Blank lines are ignored.
pub fn parse_manifest(content: &str) -> Vec<ManifestEntry> {
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    lines
        .chunks(2)
        .map(|pair| {
            let folder = pair[0].to_string();
            match pair.get(1) {
                Some(url) if url.starts_with("http") => ManifestEntry::Download {
                    folder,
                    url: url.to_string(),
                },
                _ => ManifestEntry::Skip { folder },
            }
        })
        .collect()
}

/// Folder name with path separators and other reserved characters removed.
pub fn safe_file_name(name: &str) -> String {
    name.chars()
        .filter(|c| !UNSAFE_FILENAME_CHARS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Something that can fetch a video URL to an output template.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoFetcher: Send + Sync {
    /// Fail fast when the tool is not installed.
    async fn check_availability(&self) -> Result<String>;

    /// `output_template` ends in `.%(ext)s`; the fetcher picks the extension.
    async fn fetch(&self, url: &str, output_template: &Path) -> Result<()>;
}

/// [`VideoFetcher`] backed by the yt-dlp binary.
pub struct YtDlpFetcher {
    config: DownloadConfig,
    command_builder: YtDlpCommandBuilder,
}

impl YtDlpFetcher {
    pub fn new(config: DownloadConfig) -> Self {
        let command_builder = YtDlpCommandBuilder::new(&config.binary_path);
        Self {
            config,
            command_builder,
        }
    }
}

#[async_trait]
impl VideoFetcher for YtDlpFetcher {
    async fn check_availability(&self) -> Result<String> {
        self.command_builder
            .version_check()
            .capture()
            .await
            .map_err(|e| {
                SrtkitError::ExternalTool(format!(
                    "{} is not available ({}). {}",
                    self.config.binary_path, e, INSTALL_HINT
                ))
            })
    }

    async fn fetch(&self, url: &str, output_template: &Path) -> Result<()> {
        self.command_builder
            .fetch(
                url,
                output_template,
                &self.config.format,
                &self.config.merge_format,
                &self.config.extra_args,
            )
            .execute()
            .await
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub downloaded: Vec<PathBuf>,
    pub skipped: Vec<String>,
    pub failed: Vec<(String, String)>,
}

/// Runs a manifest: one folder per entry next to the manifest, one video per folder.
pub struct Downloader<F: VideoFetcher> {
    fetcher: F,
    container: String,
}

impl<F: VideoFetcher> Downloader<F> {
    pub fn new(fetcher: F, container: impl Into<String>) -> Self {
        Self {
            fetcher,
            container: container.into(),
        }
    }

    pub async fn check_availability(&self) -> Result<String> {
        self.fetcher.check_availability().await
    }

    /// Download every valid entry under `root`. Failures are recorded, not fatal.
    pub async fn run(&self, entries: &[ManifestEntry], root: &Path) -> Result<DownloadSummary> {
        let mut summary = DownloadSummary::default();

        for entry in entries {
            let (folder, url) = match entry {
                ManifestEntry::Download { folder, url } => (folder, url),
                ManifestEntry::Skip { folder } => {
                    warn!("Skipping {}: missing or invalid URL", folder);
                    println!("⚠️  Skipped: {} (invalid URL)", folder);
                    summary.skipped.push(folder.clone());
                    continue;
                }
            };

            match self.download_one(folder, url, root).await {
                Ok(path) => summary.downloaded.push(path),
                Err(e) => {
                    warn!("Download failed for {}: {}", folder, e);
                    println!("❌ {}: {}", folder, e);
                    summary.failed.push((folder.clone(), e.to_string()));
                }
            }
        }

        Ok(summary)
    }

    async fn download_one(&self, folder: &str, url: &str, root: &Path) -> Result<PathBuf> {
        let folder_path = root.join(folder);
        if !folder_path.is_dir() {
            info!("Creating folder: {}", folder_path.display());
            tokio::fs::create_dir_all(&folder_path).await?;
        }

        let name = safe_file_name(folder);
        if name.is_empty() {
            return Err(SrtkitError::Config(format!("No usable file name in '{}'", folder)));
        }
        let output = folder_path.join(format!("{}.{}", name, self.container));
        if output.exists() {
            info!("Removing previous download: {}", output.display());
            tokio::fs::remove_file(&output).await?;
        }

        println!("🎬 Downloading: {}", folder);
        let template = folder_path.join(format!("{}.%(ext)s", name));
        self.fetcher.fetch(url, &template).await?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::{always, eq};

    #[test]
    fn test_parse_manifest_pairs() {
        let manifest = "Talk A\nhttps://example.com/a\n\nTalk B\nnot-a-url\nTalk C\n";
        assert_eq!(
            parse_manifest(manifest),
            vec![
                ManifestEntry::Download {
                    folder: "Talk A".to_string(),
                    url: "https://example.com/a".to_string()
                },
                ManifestEntry::Skip {
                    folder: "Talk B".to_string()
                },
                ManifestEntry::Skip {
                    folder: "Talk C".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_safe_file_name() {
        assert_eq!(safe_file_name(" A/B: \"C\"? "), "AB C");
        let title = "「iPhoneのマイナンバーカード」のすべて";
        assert_eq!(safe_file_name(title), title);
    }

    #[tokio::test]
    async fn test_run_creates_folders_and_replaces_old_video() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("Talk A")).unwrap();
        let stale = root.path().join("Talk A").join("Talk A.mp4");
        std::fs::write(&stale, "old").unwrap();

        let mut fetcher = MockVideoFetcher::new();
        let expected_template = root.path().join("Talk A").join("Talk A.%(ext)s");
        fetcher
            .expect_fetch()
            .with(eq("https://example.com/a"), eq(expected_template))
            .times(1)
            .returning(|_, _| Ok(()));
        fetcher
            .expect_fetch()
            .with(eq("https://example.com/b"), always())
            .times(1)
            .returning(|_, _| Err(SrtkitError::ExternalTool("exit status: 1".to_string())));

        let entries = parse_manifest(
            "Talk A\nhttps://example.com/a\nTalk B\nhttps://example.com/b\nTalk C\nftp://x\n",
        );
        let summary = Downloader::new(fetcher, "mp4").run(&entries, root.path()).await.unwrap();

        assert!(!stale.exists());
        assert!(root.path().join("Talk B").is_dir());
        assert!(!root.path().join("Talk C").exists());
        assert_eq!(summary.downloaded, vec![stale]);
        assert_eq!(summary.skipped, vec!["Talk C".to_string()]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, "Talk B");
    }
}
