use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, SrtkitError};

/// An external program invocation.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl ToolCommand {
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// `-o <template>`
    pub fn output_template<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-o").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// `-f <selector>`
    pub fn format<S: Into<String>>(self, selector: S) -> Self {
        self.arg("-f").arg(selector)
    }

    /// `--merge-output-format <container>`
    pub fn merge_output_format<S: Into<String>>(self, container: S) -> Self {
        self.arg("--merge-output-format").arg(container)
    }

    /// Run with the terminal attached so the tool's own progress shows.
    pub async fn execute(&self) -> Result<()> {
        debug!("Executing: {} {:?}", self.binary_path, self.args);

        let status = Command::new(&self.binary_path)
            .args(&self.args)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| self.start_error(e))?;

        if !status.success() {
            return Err(SrtkitError::ExternalTool(format!(
                "{} failed with {}",
                self.description, status
            )));
        }
        Ok(())
    }

    /// Run quietly and return stdout.
    pub async fn capture(&self) -> Result<String> {
        debug!("Executing: {} {:?}", self.binary_path, self.args);

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.start_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SrtkitError::ExternalTool(format!(
                "{} failed: {}",
                self.description,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn start_error(&self, e: std::io::Error) -> SrtkitError {
        SrtkitError::ExternalTool(format!("Failed to start {}: {}", self.binary_path, e))
    }
}

/// Builds yt-dlp invocations.
pub struct YtDlpCommandBuilder {
    binary_path: String,
}

impl YtDlpCommandBuilder {
    pub fn new<S: Into<String>>(binary_path: S) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    pub fn fetch<P: AsRef<Path>>(
        &self,
        url: &str,
        output_template: P,
        format: &str,
        merge_format: &str,
        additional_options: &[String],
    ) -> ToolCommand {
        ToolCommand::new(&self.binary_path, format!("Download of {}", url))
            .format(format)
            .merge_output_format(merge_format)
            .output_template(output_template)
            .args(additional_options.iter().cloned())
            .arg(url)
    }

    pub fn version_check(&self) -> ToolCommand {
        ToolCommand::new(&self.binary_path, "Version check").arg("--version")
    }
}
