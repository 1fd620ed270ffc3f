use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, SrtkitError};

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "srtkit.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub translate: TranslateConfig,
    pub validate: ValidateConfig,
    pub download: DownloadConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    /// Base URL of an OpenAI-compatible API
    pub endpoint: String,
    /// Chat model used for translation
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Cues sent per request
    pub batch_size: usize,
    /// Suffix inserted before `.srt` in the default output name
    pub output_suffix: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Instruction prepended to every batch; the built-in Japanese to
    /// Traditional Chinese prompt is used when unset
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidateConfig {
    /// Environment variable with newline-separated changed paths
    pub changed_files_env: String,
    /// Where the failure report is written
    pub report_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Path to the yt-dlp binary
    pub binary_path: String,
    /// Manifest of alternating folder-name / URL lines
    pub manifest: PathBuf,
    /// yt-dlp format selector
    pub format: String,
    /// Container the streams are merged into
    pub merge_format: String,
    /// Extra arguments appended before the URL
    pub extra_args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for the rolling log file
    pub dir: PathBuf,
    /// Disable to log to the console only
    pub file: bool,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-5".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            batch_size: 100,
            output_suffix: "zh".to_string(),
            timeout_secs: 300,
            prompt: None,
        }
    }
}

impl Default for ValidateConfig {
    fn default() -> Self {
        Self {
            changed_files_env: "CHANGED_FILES".to_string(),
            report_path: PathBuf::from("srt_report.txt"),
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            binary_path: "yt-dlp".to_string(),
            manifest: PathBuf::from("../session.txt"),
            format: "bestvideo+bestaudio/best".to_string(),
            merge_format: "mp4".to_string(),
            extra_args: vec![
                "--no-continue".to_string(),
                "--no-part".to_string(),
                "--no-warnings".to_string(),
            ],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".srtkit/log"),
            file: true,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SrtkitError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| SrtkitError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SrtkitError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SrtkitError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Explicit path, else `srtkit.toml` in the working directory, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }
}

/// Snapshot of the process-wide inputs the tools depend on.
///
/// Taken once at startup so the workflow never reads the environment itself.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub api_key: Option<String>,
    pub changed_files: Vec<PathBuf>,
}

impl Environment {
    /// Read the variables named in `config`, after loading `.env` if present.
    pub fn capture(config: &Config) -> Self {
        // A missing .env is the normal case.
        let _ = dotenvy::dotenv();

        let api_key = std::env::var(&config.translate.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        let changed_files = std::env::var(&config.validate.changed_files_env)
            .map(|list| parse_change_list(&list))
            .unwrap_or_default();

        Self {
            api_key,
            changed_files,
        }
    }

    pub fn require_api_key(&self, var_name: &str) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            SrtkitError::Config(format!(
                "{} is not set; add it to .env or export it",
                var_name
            ))
        })
    }
}

/// One path per line; blank lines ignored.
pub fn parse_change_list(list: &str) -> Vec<PathBuf> {
    list.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [translate]
            model = "gpt-4o-mini"
            batch_size = 20

            [validate]
            report_path = "out/report.md"
            "#,
        )
        .unwrap();

        assert_eq!(config.translate.model, "gpt-4o-mini");
        assert_eq!(config.translate.batch_size, 20);
        assert_eq!(config.translate.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.validate.report_path, PathBuf::from("out/report.md"));
        assert_eq!(config.download.binary_path, "yt-dlp");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("srtkit.toml");

        let mut config = Config::default();
        config.download.extra_args.push("--quiet".to_string());
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.download.extra_args, config.download.extra_args);
        assert_eq!(loaded.translate.prompt, None);
    }

    #[test]
    fn test_bad_config_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "translate = 3").unwrap();

        assert!(matches!(Config::from_file(&path), Err(SrtkitError::Config(_))));
    }

    #[test]
    fn test_parse_change_list() {
        let files = parse_change_list("a.srt\n\n  sub/b.srt \nREADME.md\n");
        assert_eq!(
            files,
            vec![
                PathBuf::from("a.srt"),
                PathBuf::from("sub/b.srt"),
                PathBuf::from("README.md")
            ]
        );
    }

    #[test]
    fn test_require_api_key() {
        let env = Environment::default();
        assert!(env.require_api_key("OPENAI_API_KEY").is_err());

        let env = Environment {
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        assert_eq!(env.require_api_key("OPENAI_API_KEY").unwrap(), "sk-test");
    }
}
