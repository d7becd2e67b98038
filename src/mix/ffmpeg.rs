use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{RedubError, Result};
use crate::media::MediaProcessorTrait;
use super::{canonical_order, AudioSegment, ClipSource, MixedTrack, TrackMixer};

const OUTPUT_LABEL: &str = "aout";

/// Mixer that delegates to an ffmpeg filter graph
pub struct FfmpegMixer {
    media: Arc<dyn MediaProcessorTrait>,
    audio_codec: String,
}

impl FfmpegMixer {
    pub fn new(media: Arc<dyn MediaProcessorTrait>, audio_codec: String) -> Self {
        Self { media, audio_codec }
    }
}

/// Build the filter graph: one `adelay` per input, then a non-normalizing `amix`.
///
/// `adelay` takes one delay per channel; the delay is repeated for stereo input
/// and ffmpeg ignores the extra value for mono.
pub fn build_filter_script(delays_ms: &[u64]) -> String {
    let mut graph = String::new();
    for (i, delay) in delays_ms.iter().enumerate() {
        graph.push_str(&format!("[{i}:a]adelay={delay}|{delay}[a{i}];\n"));
    }
    for i in 0..delays_ms.len() {
        graph.push_str(&format!("[a{i}]"));
    }
    graph.push_str(&format!(
        "amix=inputs={}:duration=longest:normalize=0[{}]\n",
        delays_ms.len(),
        OUTPUT_LABEL
    ));
    graph
}

#[async_trait]
impl TrackMixer for FfmpegMixer {
    async fn mix(&self, segments: &[AudioSegment], output: &Path) -> Result<MixedTrack> {
        if segments.is_empty() {
            return Err(RedubError::NoSegments);
        }

        let ordered = canonical_order(segments);
        let work_dir = tempfile::tempdir()?;

        let mut inputs: Vec<PathBuf> = Vec::with_capacity(ordered.len());
        let mut delays: Vec<u64> = Vec::with_capacity(ordered.len());
        for (i, segment) in ordered.iter().enumerate() {
            let path = match &segment.source {
                ClipSource::File(path) => {
                    if !path.exists() {
                        return Err(RedubError::FileNotFound(path.display().to_string()));
                    }
                    path.clone()
                }
                ClipSource::Memory(bytes) => {
                    let path = work_dir.path().join(format!("clip_{:04}.audio", i));
                    tokio::fs::write(&path, &bytes[..]).await?;
                    path
                }
            };
            inputs.push(path);
            delays.push(segment.delay_ms());
        }

        let script = build_filter_script(&delays);
        let script_path = work_dir.path().join("mix.ffgraph");
        tokio::fs::write(&script_path, &script).await?;
        debug!("Filter graph for {} inputs:\n{}", inputs.len(), script);

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        self.media
            .mix_with_script(&inputs, &script_path, OUTPUT_LABEL, &self.audio_codec, output)
            .await
            .map_err(|e| RedubError::Mix(e.to_string()))?;

        let duration_ms = self.media.probe_duration_ms(output).await?;
        info!("Mixed {} clips into {} ({} ms)", segments.len(), output.display(), duration_ms);

        Ok(MixedTrack {
            path: output.to_path_buf(),
            duration_ms,
            segment_count: segments.len(),
        })
    }
}
