use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::MediaConfig;
use crate::error::{RedubError, Result};
use super::{MediaProcessorTrait, MediaCommandBuilder};

/// Concrete implementation of media processor (FFmpeg-based)
pub struct MediaProcessorImpl {
    command_builder: MediaCommandBuilder,
}

impl MediaProcessorImpl {
    /// Create a new media processor implementation
    pub fn new(config: MediaConfig) -> Self {
        Self {
            command_builder: MediaCommandBuilder::new(config),
        }
    }
}

#[async_trait]
impl MediaProcessorTrait for MediaProcessorImpl {
    async fn mux_dub(&self, video_path: &Path, audio_path: &Path, output_path: &Path) -> Result<()> {
        info!("Muxing {} with dubbed audio {} -> {}",
              video_path.display(), audio_path.display(), output_path.display());

        self.command_builder
            .mux_dub(video_path, audio_path, output_path)
            .execute()
            .await?;

        info!("Muxing completed successfully");
        Ok(())
    }

    async fn burn_subtitles(&self, video_path: &Path, subtitle_path: &Path, output_path: &Path) -> Result<()> {
        info!("Burning subtitles from {} into {} -> {}",
              subtitle_path.display(), video_path.display(), output_path.display());

        self.command_builder
            .burn_subtitles(video_path, subtitle_path, output_path)
            .execute()
            .await?;

        info!("Subtitle burning completed successfully");
        Ok(())
    }

    async fn mix_with_script(
        &self,
        inputs: &[PathBuf],
        script_path: &Path,
        output_label: &str,
        audio_codec: &str,
        output_path: &Path,
    ) -> Result<()> {
        info!("Mixing {} audio inputs -> {}", inputs.len(), output_path.display());

        self.command_builder
            .mix_with_script(inputs, script_path, output_label, audio_codec, output_path)
            .execute()
            .await
    }

    async fn probe_duration_ms(&self, path: &Path) -> Result<u64> {
        let stdout = self.command_builder.probe_duration(path).execute_capture().await?;
        let duration_ms = parse_probe_duration(&stdout)?;
        debug!("{} lasts {} ms", path.display(), duration_ms);
        Ok(duration_ms)
    }

    async fn check_availability(&self) -> Result<()> {
        self.command_builder
            .version_check()
            .execute()
            .await
            .map_err(|e| RedubError::Media(format!("Media processor not found: {}", e)))?;

        info!("Media processor is available");
        Ok(())
    }

    async fn get_version_info(&self) -> Result<String> {
        debug!("Getting media processor version information");

        let stdout = self.command_builder.version_check().execute_capture().await?;
        Ok(version_line(&stdout))
    }
}

/// First non-empty line of `ffmpeg -version`, e.g. `ffmpeg version 6.1.1 Copyright ...`
fn version_line(stdout: &str) -> String {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("Unknown version")
        .to_string()
}

/// ffprobe prints the duration in seconds, e.g. `12.345000`
fn parse_probe_duration(stdout: &str) -> Result<u64> {
    let value = stdout.trim();
    let seconds: f64 = value
        .parse()
        .map_err(|_| RedubError::Media(format!("Unexpected duration from probe: '{}'", value)))?;

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(RedubError::Media(format!("Invalid duration from probe: {}", seconds)));
    }
    Ok((seconds * 1000.0).round() as u64)
}
