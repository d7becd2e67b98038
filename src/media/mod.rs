// Media processing over ffmpeg/ffprobe
//
// - Processor: the operations the pipeline needs (mux, burn, mix, probe)
// - Commands: command builders and the external process runner

pub mod commands;
pub mod processor;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use commands::*;
pub use processor::*;

use crate::config::MediaConfig;
use crate::error::Result;

/// Main trait for media processing operations
#[async_trait]
pub trait MediaProcessorTrait: Send + Sync {
    /// Replace the audio track of a video with a dubbed track
    async fn mux_dub(&self, video_path: &Path, audio_path: &Path, output_path: &Path) -> Result<()>;

    /// Burn subtitles into the video picture
    async fn burn_subtitles(&self, video_path: &Path, subtitle_path: &Path, output_path: &Path) -> Result<()>;

    /// Run a filter graph script over audio inputs, mapping `output_label` to the output file
    async fn mix_with_script(
        &self,
        inputs: &[PathBuf],
        script_path: &Path,
        output_label: &str,
        audio_codec: &str,
        output_path: &Path,
    ) -> Result<()>;

    /// Container duration in milliseconds
    async fn probe_duration_ms(&self, path: &Path) -> Result<u64>;

    /// Check if media processor is available
    async fn check_availability(&self) -> Result<()>;

    /// Get media processor version information
    async fn get_version_info(&self) -> Result<String>;
}

/// Factory for creating media processor instances
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default media processor implementation (FFmpeg-based)
    pub fn create_processor(config: MediaConfig) -> Arc<dyn MediaProcessorTrait> {
        Arc::new(processor::MediaProcessorImpl::new(config))
    }
}
