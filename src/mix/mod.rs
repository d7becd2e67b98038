// Timeline audio mixing
//
// Every clip is delayed to its absolute start time and all delayed signals are
// summed into one track lasting as long as the latest-ending clip. Nothing is
// normalized: overlapping clips add up.
//
// - ffmpeg: adelay/amix filter graph, any input format
// - wav: in-process PCM summation for WAV clips

pub mod ffmpeg;
pub mod wav;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use ffmpeg::FfmpegMixer;
pub use wav::WavMixer;

use crate::config::{MixBackend, MixConfig};
use crate::error::Result;
use crate::media::MediaProcessorTrait;

/// Where a synthesized clip lives. The mixer only reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipSource {
    File(PathBuf),
    Memory(Arc<[u8]>),
}

/// A synthesized clip placed at an absolute position on the timeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSegment {
    pub source: ClipSource,
    /// Absolute start time; negative values are treated as zero
    pub start_ms: i64,
    /// Position of the cue the clip was synthesized for
    pub cue_index: usize,
}

impl AudioSegment {
    pub fn from_file<P: Into<PathBuf>>(path: P, start_ms: i64, cue_index: usize) -> Self {
        Self {
            source: ClipSource::File(path.into()),
            start_ms,
            cue_index,
        }
    }

    pub fn from_bytes<B: Into<Arc<[u8]>>>(bytes: B, start_ms: i64, cue_index: usize) -> Self {
        Self {
            source: ClipSource::Memory(bytes.into()),
            start_ms,
            cue_index,
        }
    }

    pub fn delay_ms(&self) -> u64 {
        self.start_ms.max(0) as u64
    }
}

/// The single mixed output of one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixedTrack {
    pub path: PathBuf,
    pub duration_ms: u64,
    pub segment_count: usize,
}

/// Composes independently timed clips into one track
#[async_trait]
pub trait TrackMixer: Send + Sync {
    /// Mix all segments into `output`. An empty segment set is an error.
    async fn mix(&self, segments: &[AudioSegment], output: &Path) -> Result<MixedTrack>;
}

/// Factory for creating mixer instances
pub struct MixerFactory;

impl MixerFactory {
    pub fn create_mixer(config: &MixConfig, media: Arc<dyn MediaProcessorTrait>) -> Box<dyn TrackMixer> {
        match config.backend {
            MixBackend::Ffmpeg => Box::new(FfmpegMixer::new(media, config.audio_codec.clone())),
            MixBackend::Wav => Box::new(WavMixer::new()),
        }
    }
}

/// Segments sorted by delay, then cue, then source, so the result never depends on arrival order
pub(crate) fn canonical_order(segments: &[AudioSegment]) -> Vec<&AudioSegment> {
    let mut ordered: Vec<&AudioSegment> = segments.iter().collect();
    ordered.sort_by(|a, b| {
        a.delay_ms()
            .cmp(&b.delay_ms())
            .then(a.cue_index.cmp(&b.cue_index))
            .then_with(|| source_key(&a.source).cmp(&source_key(&b.source)))
    });
    ordered
}

fn source_key(source: &ClipSource) -> (u8, &[u8]) {
    match source {
        ClipSource::File(path) => (0, path.as_os_str().as_encoded_bytes()),
        ClipSource::Memory(bytes) => (1, &bytes[..]),
    }
}
