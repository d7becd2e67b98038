use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::config::MediaConfig;
use crate::error::{RedubError, Result};

/// External command invocation (ffmpeg, ffprobe, yt-dlp, ...)
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Set video codec
    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:v").arg(codec)
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    /// Copy audio stream
    pub fn copy_audio(self) -> Self {
        self.audio_codec("copy")
    }

    /// Select an output stream
    pub fn map<S: Into<String>>(self, stream: S) -> Self {
        self.arg("-map").arg(stream)
    }

    /// Add video filter
    pub fn video_filter<S: Into<String>>(self, filter: S) -> Self {
        self.arg("-vf").arg(filter)
    }

    /// Run the command and return its stdout
    pub async fn execute_capture(&self) -> Result<String> {
        debug!("Executing media processing command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| RedubError::Media(format!("Failed to execute {}: {}", self.binary_path, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RedubError::Media(format!(
                "{} failed: {}",
                self.description,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Execute the command
    pub async fn execute(&self) -> Result<()> {
        self.execute_capture().await.map(|_| ())
    }
}

/// Builder for the ffmpeg/ffprobe invocations used by the pipeline
pub struct MediaCommandBuilder {
    config: MediaConfig,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    /// Replace the video's audio with the dubbed track
    pub fn mux_dub<P: AsRef<Path>>(&self, video_path: P, audio_path: P, output_path: P) -> MediaCommand {
        MediaCommand::new(&self.config.binary_path, "Dub muxing")
            .overwrite()
            .input(video_path)
            .input(audio_path)
            .map("0:v")
            .map("1:a")
            .video_codec(&self.config.video_codec)
            .arg("-preset").arg(&self.config.preset)
            .arg("-crf").arg(self.config.crf.to_string())
            .audio_codec(&self.config.audio_codec)
            .arg("-b:a").arg(&self.config.audio_bitrate)
            .args(self.config.extra_options.iter().cloned())
            .output(output_path)
    }

    /// Burn subtitles into the picture
    pub fn burn_subtitles<P: AsRef<Path>>(&self, video_path: P, subtitle_path: P, output_path: P) -> MediaCommand {
        let filter = format!(
            "subtitles='{}':force_style='{}'",
            escape_filter_path(subtitle_path.as_ref()),
            self.subtitle_style()
        );

        MediaCommand::new(&self.config.binary_path, "Subtitle burning")
            .overwrite()
            .input(video_path)
            .video_filter(filter)
            .video_codec(&self.config.video_codec)
            .arg("-preset").arg(&self.config.preset)
            .arg("-crf").arg(self.config.crf.to_string())
            .copy_audio()
            .args(self.config.extra_options.iter().cloned())
            .output(output_path)
    }

    /// Run a filter graph stored in a script file over several audio inputs
    pub fn mix_with_script<P: AsRef<Path>>(
        &self,
        inputs: &[P],
        script_path: &Path,
        output_label: &str,
        audio_codec: &str,
        output_path: &Path,
    ) -> MediaCommand {
        let mut cmd = MediaCommand::new(&self.config.binary_path, "Audio mixing").overwrite();
        for input in inputs {
            cmd = cmd.input(input);
        }

        cmd.arg("-filter_complex_script")
            .arg(script_path.to_string_lossy().to_string())
            .map(format!("[{}]", output_label))
            .audio_codec(audio_codec)
            .output(output_path)
    }

    /// Print the container duration in seconds
    pub fn probe_duration<P: AsRef<Path>>(&self, path: P) -> MediaCommand {
        MediaCommand::new(&self.config.probe_path, "Duration probe")
            .arg("-v").arg("error")
            .arg("-show_entries").arg("format=duration")
            .arg("-of").arg("default=noprint_wrappers=1:nokey=1")
            .output(path)
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.config.binary_path, "Version check")
            .arg("-version")
    }

    fn subtitle_style(&self) -> String {
        let mut style = vec![
            format!("FontSize={}", self.config.font_size),
            "PrimaryColour=&H00FFFFFF".to_string(),
            "OutlineColour=&H00000000".to_string(),
            "BorderStyle=1".to_string(),
            format!("Outline={}", self.config.outline),
        ];
        if let Some(font) = &self.config.font_name {
            style.insert(0, format!("FontName={}", font));
        }
        style.join(",")
    }
}

/// Escape a path for use inside a quoted filter argument
pub fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace(':', "\\:")
        .replace('\'', "'\\''")
}
