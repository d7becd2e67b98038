use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{RedubError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub workspace: WorkspaceConfig,
    pub fetch: FetchConfig,
    pub segment: SegmentConfig,
    pub translate: TranslateConfig,
    pub synth: SynthConfig,
    pub mix: MixConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Directory receiving downloaded videos and intermediate subtitles/audio
    pub download_dir: PathBuf,
    /// Directory receiving final videos and the translated subtitle copy
    pub output_dir: PathBuf,
    /// Suffix appended to translated artifacts (e.g. `talk_zh.srt`)
    pub target_suffix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Path to the downloader binary
    pub binary_path: String,
    /// Browser to borrow cookies from; empty disables `--cookies-from-browser`
    pub browser: String,
    /// yt-dlp format selector
    pub format: String,
    /// Subtitle languages to request
    pub sub_langs: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Characters that end a sentence when they are the last visible character of a cue
    pub terminal_punctuation: String,
    /// Characters after which a translated sentence may be split
    pub boundary_punctuation: String,
    /// How far (in characters) to look around the proportional split offset
    pub search_window: usize,
    /// Text assigned to a cue whose share of the translation came out empty
    pub placeholder: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    /// Public Google Translate endpoint, no key required
    Google,
    /// DeepL REST API (`DEEPL_API_KEY`)
    Deepl,
    /// OpenAI chat completions (`OPENAI_API_KEY`)
    Openai,
    /// Local Ollama server
    Ollama,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TranslationMode {
    /// Merge cues into sentences, translate each sentence, split it back onto the cues
    Sentence,
    /// Translate each cue on its own, in batches
    Simple,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    pub provider: TranslationProvider,
    pub mode: TranslationMode,
    pub source_language: String,
    pub target_language: String,
    /// Provider endpoint; empty selects the provider's public default
    pub endpoint: String,
    /// Model name for LLM-backed providers
    pub model: String,
    /// Number of cues per request in simple mode
    pub batch_size: usize,
    /// Pause between consecutive requests
    pub request_interval_ms: u64,
    /// HTTP timeout for one request
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SynthProvider {
    /// OpenAI speech endpoint (`OPENAI_API_KEY`)
    Openai,
    /// Any command line synthesizer, e.g. edge-tts
    Command,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    pub provider: SynthProvider,
    pub voice: String,
    /// Model name for the OpenAI provider
    pub model: String,
    /// Endpoint for the OpenAI provider; empty selects the public API
    pub endpoint: String,
    /// Program run by the command provider
    pub command: String,
    /// Arguments for the command provider; `{text}`, `{voice}` and `{output}` are substituted
    pub args: Vec<String>,
    /// Maximum number of clips synthesized at once
    pub concurrency: usize,
    /// A clip taking longer than this is dropped
    pub segment_timeout_secs: u64,
    /// File extension of synthesized clips
    pub clip_extension: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MixBackend {
    /// ffmpeg `adelay` + `amix` filter graph; accepts any clip format
    Ffmpeg,
    /// In-process PCM summation; clips must be WAV with a shared format
    Wav,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MixConfig {
    pub backend: MixBackend,
    /// Output codec for the ffmpeg backend
    pub audio_codec: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Path to ffprobe binary
    pub probe_path: String,
    pub video_codec: String,
    /// Encoding speed (ultrafast, fast, medium, slow, veryslow)
    pub preset: String,
    /// Quality (0-51, lower = better quality)
    pub crf: u32,
    pub audio_codec: String,
    pub audio_bitrate: String,
    /// Burned-in subtitle style
    pub font_size: u32,
    pub outline: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,
    /// Additional options appended before the output path
    pub extra_options: Vec<String>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("downloads"),
            output_dir: PathBuf::from("output"),
            target_suffix: "zh".to_string(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            binary_path: "yt-dlp".to_string(),
            browser: "chrome".to_string(),
            format: "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best".to_string(),
            sub_langs: "en,en-US,en-GB".to_string(),
        }
    }
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            terminal_punctuation: ".?!。？！".to_string(),
            boundary_punctuation: "，。！？、；：".to_string(),
            search_window: 15,
            placeholder: "...".to_string(),
        }
    }
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::Google,
            mode: TranslationMode::Sentence,
            source_language: "en".to_string(),
            target_language: "zh-CN".to_string(),
            endpoint: String::new(),
            model: "gpt-4o-mini".to_string(),
            batch_size: 30,
            request_interval_ms: 300,
            timeout_secs: 60,
        }
    }
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            provider: SynthProvider::Command,
            voice: "zh-CN-YunxiNeural".to_string(),
            model: "tts-1".to_string(),
            endpoint: String::new(),
            command: "edge-tts".to_string(),
            args: vec![
                "--voice".to_string(), "{voice}".to_string(),
                "--text".to_string(), "{text}".to_string(),
                "--write-media".to_string(), "{output}".to_string(),
            ],
            concurrency: 5,
            segment_timeout_secs: 20,
            clip_extension: "mp3".to_string(),
        }
    }
}

impl Default for MixConfig {
    fn default() -> Self {
        Self {
            backend: MixBackend::Ffmpeg,
            audio_codec: "mp3".to_string(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            binary_path: "ffmpeg".to_string(),
            probe_path: "ffprobe".to_string(),
            video_codec: "libx264".to_string(),
            preset: "fast".to_string(),
            crf: 23,
            audio_codec: "aac".to_string(),
            audio_bitrate: "192k".to_string(),
            font_size: 48,
            outline: 2,
            font_name: None,
            extra_options: Vec::new(),
        }
    }
}

impl MixConfig {
    /// File extension of the mixed track
    pub fn output_extension(&self) -> &'static str {
        match self.backend {
            MixBackend::Wav => "wav",
            MixBackend::Ffmpeg => match self.audio_codec.as_str() {
                "mp3" | "libmp3lame" => "mp3",
                "aac" => "m4a",
                "flac" => "flac",
                "opus" | "libopus" => "opus",
                "pcm_s16le" => "wav",
                _ => "mka",
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RedubError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| RedubError::Config(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| RedubError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| RedubError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Reject values that would make a pipeline stage meaningless
    pub fn validate(&self) -> Result<()> {
        if self.segment.terminal_punctuation.is_empty() {
            return Err(RedubError::Config("segment.terminal_punctuation must not be empty".to_string()));
        }
        if self.translate.batch_size == 0 {
            return Err(RedubError::Config("translate.batch_size must be at least 1".to_string()));
        }
        if self.synth.concurrency == 0 {
            return Err(RedubError::Config("synth.concurrency must be at least 1".to_string()));
        }
        if self.synth.segment_timeout_secs == 0 {
            return Err(RedubError::Config("synth.segment_timeout_secs must be at least 1".to_string()));
        }
        if self.mix.backend == MixBackend::Wav && !self.synth.clip_extension.eq_ignore_ascii_case("wav") {
            return Err(RedubError::Config(format!(
                "mix.backend = \"wav\" needs WAV clips, but synth.clip_extension is \"{}\"",
                self.synth.clip_extension
            )));
        }
        Ok(())
    }
}
