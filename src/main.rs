//! redub - subtitle translation and dubbing pipeline
//!
//! Downloads a video with yt-dlp, translates its subtitles sentence by
//! sentence, synthesizes a dubbed track and muxes it with ffmpeg.

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use redub::cli::{Args, Commands};
use redub::config::{Config, TranslationMode, TranslationProvider};
use redub::error::RedubError;
use redub::translate::ollama::OllamaTranslator;
use redub::workflow::{ProcessOptions, Workflow};

const DEFAULT_CONFIG_FILE: &str = "redub.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    let mut config = load_config(args.config.as_deref())?;

    match args.command {
        Commands::Process { url, burn, provider, translation_mode } => {
            apply_translation_overrides(&mut config, provider.as_deref(), translation_mode.as_deref())?;
            let workflow = Workflow::new(config);
            let summary = workflow.process(&ProcessOptions { url, burn }).await?;

            println!("\nDubbed video:   {}", summary.dubbed_video.display());
            println!("Subtitles:      {}", summary.translated_subtitles.display());
            if let Some(subtitled) = &summary.subtitled_video {
                println!("Subtitled:      {}", subtitled.display());
            }
            println!(
                "Translated {} cues, {} sentences failed; {} clips dubbed, {} dropped",
                summary.translation.translated_cues,
                summary.translation.failed_groups.len(),
                summary.dub.track.segment_count,
                summary.dub.dropped.len()
            );
        }
        Commands::Translate { input, output, provider, translation_mode } => {
            info!("Translating subtitles: {}", input.display());
            apply_translation_overrides(&mut config, provider.as_deref(), translation_mode.as_deref())?;

            let report = Workflow::new(config).translate_subtitles(&input, &output).await?;
            println!(
                "Translated {} cues in {} requests ({} failed) -> {}",
                report.translated_cues,
                report.groups,
                report.failed_groups.len(),
                output.display()
            );
        }
        Commands::Dub { input, output, voice } => {
            info!("Dubbing subtitles: {}", input.display());
            if let Some(voice) = voice {
                config.synth.voice = voice;
            }

            let summary = Workflow::new(config).dub(&input, &output).await?;
            println!(
                "Mixed {} clips into {} ({:.1}s)",
                summary.track.segment_count,
                summary.track.path.display(),
                summary.track.duration_ms as f64 / 1000.0
            );
            if !summary.dropped.is_empty() {
                let numbers: Vec<usize> = summary.dropped.iter().map(|position| position + 1).collect();
                println!("Cues without dub (counting from 1): {:?}", numbers);
            }
        }
        Commands::Mux { video, audio, output } => {
            info!("Muxing dubbed audio into: {}", video.display());
            Workflow::new(config).mux(&video, &audio, &output).await?;
        }
        Commands::Burn { video, subtitles, output } => {
            let output = output.unwrap_or_else(|| default_burn_output(&video));
            info!("Burning subtitles into: {}", video.display());
            Workflow::new(config).burn(&video, &subtitles, &output).await?;
            println!("Subtitled video: {}", output.display());
        }
        Commands::Groups { input } => {
            let groups = Workflow::new(config).groups(&input).await?;
            for group in &groups {
                println!("[{}-{}] {}", group.start_idx + 1, group.end_idx + 1, group.text);
            }
            println!("\n{} sentences", groups.len());
        }
        Commands::Config { output, force } => {
            if output.exists() && !force {
                return Err(RedubError::Config(format!(
                    "{} already exists, pass --force to overwrite",
                    output.display()
                ))
                .into());
            }
            Config::default().save_to_file(&output)?;
            println!("Wrote default configuration to {}", output.display());
        }
        Commands::Check => {
            let workflow = Workflow::new(config.clone());
            let version = workflow.check_dependencies().await?;
            println!("ffmpeg: {}", version);

            if config.translate.provider == TranslationProvider::Ollama {
                OllamaTranslator::new(config.translate.clone())?.check_availability().await?;
                println!("ollama: model {} available", config.translate.model);
            }
        }
    }

    info!("redub completed successfully");
    Ok(())
}

/// `--config`, then `./redub.toml`, then built-in defaults
fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new(DEFAULT_CONFIG_FILE).exists() {
                info!("Found {} in current directory, loading...", DEFAULT_CONFIG_FILE);
                Config::from_file(DEFAULT_CONFIG_FILE)?
            } else {
                Config::default()
            }
        }
    };
    Ok(config)
}

fn apply_translation_overrides(config: &mut Config, provider: Option<&str>, mode: Option<&str>) -> Result<()> {
    if let Some(provider) = provider {
        config.translate.provider = parse_translation_provider(provider)?;
    }
    if let Some(mode) = mode {
        config.translate.mode = parse_translation_mode(mode)?;
    }
    if config.translate.provider == TranslationProvider::Ollama && config.translate.model.starts_with("gpt-") {
        warn!("Model {} looks like an OpenAI model; set translate.model for Ollama", config.translate.model);
    }
    Ok(())
}

fn default_burn_output(video: &Path) -> PathBuf {
    let stem = video.file_stem().unwrap_or_default().to_string_lossy();
    video.with_file_name(format!("{}_subtitled.mp4", stem))
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".redub").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "redub.log");
    let (non_blocking_file, _guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(_guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(verbose)
        .with_line_number(verbose);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("redub.log").display());

    Ok(())
}

/// Parse translation provider from string
fn parse_translation_provider(provider: &str) -> Result<TranslationProvider> {
    match provider.to_lowercase().as_str() {
        "google" => Ok(TranslationProvider::Google),
        "deepl" => Ok(TranslationProvider::Deepl),
        "openai" => Ok(TranslationProvider::Openai),
        "ollama" => Ok(TranslationProvider::Ollama),
        _ => Err(RedubError::Config(format!(
            "Invalid translation provider '{}'. Valid providers: google, deepl, openai, ollama",
            provider
        ))
        .into()),
    }
}

/// Parse translation mode from string
fn parse_translation_mode(mode: &str) -> Result<TranslationMode> {
    match mode.to_lowercase().as_str() {
        "sentence" => Ok(TranslationMode::Sentence),
        "simple" => Ok(TranslationMode::Simple),
        _ => Err(RedubError::Config(format!(
            "Invalid translation mode '{}'. Valid modes: sentence, simple",
            mode
        ))
        .into()),
    }
}
