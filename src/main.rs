//! srtkit - SRT subtitle toolkit
//!
//! Entry point: parses the command line, loads configuration and the
//! environment snapshot, then hands off to the workflow.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing::{Level, info};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use srtkit::cli::{Args, Commands};
use srtkit::config::{Config, Environment, LoggingConfig};
use srtkit::error::SrtkitError;
use srtkit::files::display_relative;
use srtkit::subtitle::NormalizeOptions;
use srtkit::workflow::{ValidationOutcome, Workflow};

const LOG_FILE: &str = "srtkit.log";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(args.config.as_deref())?;
    setup_logging(args.verbose, &config.logging)?;

    let env = Environment::capture(&config);
    let workflow = Workflow::new(config, env);

    match args.command {
        Commands::Space { file } => {
            workflow.normalize_file(&file, NormalizeOptions::SPACING)?;
            println!("✅ Added CJK/Latin spacing: {}", file.display());
        }
        Commands::Clean { file } => {
            workflow.normalize_file(&file, NormalizeOptions::CLEANING)?;
            println!("✅ Cleaned text lines: {}", file.display());
        }
        Commands::Validate { paths, all_errors } => {
            match workflow.run_validation(&paths, all_errors, Path::new("."))? {
                ValidationOutcome::NoTargets => println!("No .srt files found."),
                ValidationOutcome::Passed { files } => {
                    println!("\n🎉 All {} file(s) passed", files);
                }
                ValidationOutcome::Failed { report_path, .. } => {
                    println!("\nReport written to {}", report_path.display());
                    std::process::exit(1);
                }
            }
        }
        Commands::FixOverlap { file, strict } => {
            let fixes = workflow.fix_overlaps_file(&file, strict)?;
            if fixes.is_empty() {
                println!("✅ No overlaps found in {}", file.display());
            } else {
                println!("🔧 Fixed {} overlap(s):", fixes.len());
                for fix in &fixes {
                    println!("  {}", fix);
                }
                println!("✅ Written: {}", file.display());
            }
        }
        Commands::Reindex { path } => {
            let summary = workflow.reindex_path(&path)?;
            for (file, count) in &summary.files {
                let shown = if path.is_dir() {
                    display_relative(file, &path)
                } else {
                    file.display().to_string()
                };
                println!("✅ Reindexed {} ({} blocks)", shown, count);
            }
            for file in &summary.empty {
                println!("⚠️  Empty file: {}", file.display());
            }
            println!("\nReindexed {} file(s)", summary.files.len());
        }
        Commands::Shift {
            file,
            start_index,
            delta_seconds,
            strict,
        } => {
            let moved = workflow.shift_file(&file, start_index, delta_seconds, strict)?;
            println!(
                "✅ Shifted {} block(s) from #{} by {:+.3}s: {}",
                moved,
                start_index,
                delta_seconds,
                file.display()
            );
        }
        Commands::Download { manifest } => {
            let summary = workflow.download_sessions(manifest.as_deref()).await?;
            println!(
                "\nDownloaded {}, skipped {}, failed {}",
                summary.downloaded.len(),
                summary.skipped.len(),
                summary.failed.len()
            );
            if !summary.failed.is_empty() {
                return Err(SrtkitError::ExternalTool(format!(
                    "{} download(s) failed",
                    summary.failed.len()
                ))
                .into());
            }
        }
        Commands::Translate { input, output } => {
            let (written, summary) = workflow.translate_file(&input, output.as_deref()).await?;
            for failure in &summary.failures {
                println!(
                    "⚠️  Cues {}-{} left untranslated: {}",
                    failure.first, failure.last, failure.error
                );
            }
            println!(
                "✅ Translated {} cue(s) in {} batch(es): {}",
                summary.translated_cues,
                summary.batches,
                written.display()
            );
        }
        Commands::InitConfig { output, force } => {
            if output.exists() && !force {
                return Err(SrtkitError::Config(format!(
                    "{} already exists (use --force to overwrite)",
                    output.display()
                ))
                .into());
            }
            workflow.config().save_to_file(&output)?;
            println!("✅ Configuration written to {}", output.display());
        }
    }

    Ok(())
}

/// Console logging on stderr, plus a daily-rolling file when enabled.
fn setup_logging(verbose: bool, logging: &LoggingConfig) -> Result<()> {
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(verbose)
        .with_line_number(verbose);

    let file_layer = if logging.file {
        std::fs::create_dir_all(&logging.dir)?;
        let file_appender = rolling::daily(&logging.dir, LOG_FILE);
        let (non_blocking_file, guard) = non_blocking(file_appender);
        // Keep the guard alive for the duration of the program
        std::mem::forget(guard);

        Some(
            fmt::layer()
                .with_writer(non_blocking_file)
                .with_target(false)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - level: {}, file: {}",
        log_level,
        if logging.file {
            logging.dir.join(LOG_FILE).display().to_string()
        } else {
            "disabled".to_string()
        }
    );

    Ok(())
}
