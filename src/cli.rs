use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download a video, translate its subtitles, dub it and mux the result
    Process {
        /// Video URL; omit to reuse the newest download
        url: Option<String>,

        /// Also burn the translated subtitles into the picture
        #[arg(long)]
        burn: bool,

        /// Translation provider (google, deepl, openai, ollama)
        #[arg(long)]
        provider: Option<String>,

        /// Translation mode (sentence, simple)
        #[arg(long)]
        translation_mode: Option<String>,
    },

    /// Translate an SRT file
    Translate {
        /// Input subtitle file
        #[arg(short, long)]
        input: PathBuf,

        /// Output subtitle file
        #[arg(short, long)]
        output: PathBuf,

        /// Translation provider (google, deepl, openai, ollama)
        #[arg(long)]
        provider: Option<String>,

        /// Translation mode (sentence, simple)
        #[arg(long)]
        translation_mode: Option<String>,
    },

    /// Synthesize a dubbed audio track from an SRT file
    Dub {
        /// Translated subtitle file
        #[arg(short, long)]
        input: PathBuf,

        /// Output audio file
        #[arg(short, long)]
        output: PathBuf,

        /// Voice name passed to the synthesizer
        #[arg(long)]
        voice: Option<String>,
    },

    /// Replace a video's audio track with a dubbed track
    Mux {
        /// Input video file
        #[arg(short, long)]
        video: PathBuf,

        /// Dubbed audio file
        #[arg(short, long)]
        audio: PathBuf,

        /// Output video file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Burn subtitles into a video
    Burn {
        /// Input video file
        #[arg(short, long)]
        video: PathBuf,

        /// Subtitle file
        #[arg(short, long)]
        subtitles: PathBuf,

        /// Output video file; defaults to `<video>_subtitled.mp4`
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show how the cues of an SRT file merge into sentences
    Groups {
        /// Subtitle file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Write the default configuration
    Config {
        /// Destination file
        #[arg(short, long, default_value = "redub.toml")]
        output: PathBuf,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },

    /// Check that external tools are available
    Check,
}
