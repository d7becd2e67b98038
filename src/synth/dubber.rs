use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::SynthConfig;
use crate::error::{RedubError, Result};
use crate::mix::AudioSegment;
use crate::subtitle::Cue;
use super::Synthesizer;

/// Result of synthesizing one clip per cue
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynthesisOutcome {
    /// Clips that were produced, ordered by cue position
    pub segments: Vec<AudioSegment>,
    /// Positions of cues whose synthesis failed or timed out
    pub dropped: Vec<usize>,
    /// Positions of cues with no text to speak
    pub skipped: Vec<usize>,
}

/// Synthesizes every cue concurrently, at most `concurrency` at a time.
///
/// Cues are identified by their 0-based position in the input slice, the same
/// indexing `SentenceGroup` uses; the numbers written in the SRT file may repeat.
/// A clip that fails or runs past the timeout is dropped and never retried;
/// the rest of the run continues.
pub struct Dubber {
    synthesizer: Arc<dyn Synthesizer>,
    concurrency: usize,
    timeout: Duration,
    extension: String,
    show_progress: bool,
}

impl Dubber {
    pub fn new(synthesizer: Arc<dyn Synthesizer>, config: &SynthConfig) -> Self {
        Self {
            synthesizer,
            concurrency: config.concurrency.max(1),
            timeout: Duration::from_secs(config.segment_timeout_secs),
            extension: config.clip_extension.clone(),
            show_progress: true,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Synthesize a clip per cue into `clip_dir`
    pub async fn synthesize_cues(&self, cues: &[Cue], clip_dir: &Path) -> Result<SynthesisOutcome> {
        tokio::fs::create_dir_all(clip_dir).await?;

        let mut outcome = SynthesisOutcome::default();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        let mut pending: HashMap<tokio::task::Id, usize> = HashMap::new();

        for (cue_index, cue) in cues.iter().enumerate() {
            let text = cue.normalized_text();
            if text.is_empty() {
                outcome.skipped.push(cue_index);
                continue;
            }

            let clip_path = clip_dir.join(format!("{:04}.{}", cue_index, self.extension));
            let start_ms = i64::try_from(cue.start_ms).unwrap_or(i64::MAX);
            let synthesizer = Arc::clone(&self.synthesizer);
            let semaphore = Arc::clone(&semaphore);
            let timeout = self.timeout;

            let handle = tasks.spawn(async move {
                let result = synthesize_clip(synthesizer, semaphore, timeout, &text, &clip_path).await;
                (cue_index, start_ms, clip_path, result)
            });
            pending.insert(handle.id(), cue_index);
        }

        info!(
            "Synthesizing {} clips with {} ({} at a time)",
            pending.len(),
            self.synthesizer.name(),
            self.concurrency
        );
        let progress = self.progress_bar(pending.len() as u64);

        while let Some(joined) = tasks.join_next_with_id().await {
            progress.inc(1);
            match joined {
                Ok((id, (cue_index, start_ms, clip_path, result))) => {
                    pending.remove(&id);
                    match result {
                        Ok(()) => {
                            debug!("Cue {} synthesized to {}", cue_index, clip_path.display());
                            outcome.segments.push(AudioSegment::from_file(clip_path, start_ms, cue_index));
                        }
                        Err(e) => {
                            warn!("Dropping cue {}: {}", cue_index, e);
                            outcome.dropped.push(cue_index);
                        }
                    }
                }
                Err(e) => {
                    if let Some(cue_index) = pending.remove(&e.id()) {
                        warn!("Dropping cue {}: synthesis task failed: {}", cue_index, e);
                        outcome.dropped.push(cue_index);
                    }
                }
            }
        }
        progress.finish_and_clear();

        outcome.segments.sort_by_key(|segment| segment.cue_index);
        outcome.dropped.sort_unstable();

        info!(
            "Synthesis finished: {} clips, {} dropped, {} skipped",
            outcome.segments.len(),
            outcome.dropped.len(),
            outcome.skipped.len()
        );
        Ok(outcome)
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} clips")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}

async fn synthesize_clip(
    synthesizer: Arc<dyn Synthesizer>,
    semaphore: Arc<Semaphore>,
    timeout: Duration,
    text: &str,
    clip_path: &Path,
) -> Result<()> {
    let _permit = semaphore
        .acquire_owned()
        .await
        .map_err(|e| RedubError::Synthesis(e.to_string()))?;

    // a stale clip from an earlier run must not pass for a fresh one
    if tokio::fs::try_exists(clip_path).await.unwrap_or(false) {
        tokio::fs::remove_file(clip_path).await?;
    }

    match tokio::time::timeout(timeout, synthesizer.synthesize(text, clip_path)).await {
        Ok(result) => result,
        Err(_) => Err(RedubError::SynthesisTimeout(timeout.as_secs())),
    }
}
