use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::TranslateConfig;
use crate::error::Result;
use crate::subtitle::Cue;
use super::{SubtitleTranslator, TextTranslator, TranslationReport};

/// Simple translation: each cue on its own, sent in batches.
///
/// A failed batch is retried cue by cue; a cue that still fails keeps its
/// source text.
pub struct SimpleTranslator {
    provider: Arc<dyn TextTranslator>,
    batch_size: usize,
    request_interval: Duration,
}

impl SimpleTranslator {
    pub fn new(provider: Arc<dyn TextTranslator>, config: &TranslateConfig) -> Self {
        Self {
            provider,
            batch_size: config.batch_size.max(1),
            request_interval: Duration::from_millis(config.request_interval_ms),
        }
    }

    async fn pause(&self) {
        if !self.request_interval.is_zero() {
            tokio::time::sleep(self.request_interval).await;
        }
    }
}

#[async_trait]
impl SubtitleTranslator for SimpleTranslator {
    async fn translate_cues(&self, cues: &mut [Cue]) -> Result<TranslationReport> {
        let pending: Vec<(usize, String)> = cues
            .iter()
            .enumerate()
            .map(|(pos, cue)| (pos, cue.normalized_text()))
            .filter(|(_, text)| !text.is_empty())
            .collect();

        let batches: Vec<&[(usize, String)]> = pending.chunks(self.batch_size).collect();
        info!(
            "Translating {} cues in {} batches with {}",
            pending.len(),
            batches.len(),
            self.provider.name()
        );

        let mut report = TranslationReport {
            groups: batches.len(),
            ..TranslationReport::default()
        };

        for (batch_idx, batch) in batches.iter().enumerate() {
            if batch_idx > 0 {
                self.pause().await;
            }
            info!("┌─ Translating batch {}/{} ({} cues) ────────", batch_idx + 1, batches.len(), batch.len());

            let texts: Vec<String> = batch.iter().map(|(_, text)| text.clone()).collect();
            let translated = match self.provider.translate_batch(&texts).await {
                Ok(translated) if translated.len() == texts.len() => translated.into_iter().map(Some).collect(),
                Ok(translated) => {
                    warn!("│ Batch returned {} of {} lines, retrying cue by cue", translated.len(), texts.len());
                    report.failed_groups.push(batch_idx);
                    self.translate_one_by_one(&texts).await
                }
                Err(e) => {
                    warn!("│ Batch failed, retrying cue by cue: {}", e);
                    report.failed_groups.push(batch_idx);
                    self.translate_one_by_one(&texts).await
                }
            };

            for ((pos, _), translation) in batch.iter().zip(translated) {
                match translation {
                    Some(text) if !text.trim().is_empty() => {
                        cues[*pos].text = text.trim().to_string();
                        report.translated_cues += 1;
                    }
                    _ => report.untranslated.push(*pos),
                }
            }
            info!("└─────────────────────────────────────");
        }

        info!("Translated {} of {} cues", report.translated_cues, cues.len());
        Ok(report)
    }
}

impl SimpleTranslator {
    async fn translate_one_by_one(&self, texts: &[String]) -> Vec<Option<String>> {
        let mut translated = Vec::with_capacity(texts.len());
        for (i, text) in texts.iter().enumerate() {
            if i > 0 {
                self.pause().await;
            }
            match self.provider.translate(text).await {
                Ok(translation) => translated.push(Some(translation)),
                Err(e) => {
                    warn!("│ Skipping \"{}\": {}", text, e);
                    translated.push(None);
                }
            }
        }
        translated
    }
}
