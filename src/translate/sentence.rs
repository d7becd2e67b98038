use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{SegmentConfig, TranslateConfig};
use crate::error::Result;
use crate::segment::{self, PunctuationBoundary, SentenceGrouper, Splitter};
use crate::subtitle::Cue;
use super::{SubtitleTranslator, TextTranslator, TranslationReport};

/// Sentence translation: merge fragmentary cues into sentences, translate each
/// sentence whole, then redistribute the translation over its cues
pub struct SentenceTranslator {
    provider: Arc<dyn TextTranslator>,
    grouper: SentenceGrouper,
    splitter: Splitter<PunctuationBoundary>,
    request_interval: Duration,
}

impl SentenceTranslator {
    pub fn new(provider: Arc<dyn TextTranslator>, config: &TranslateConfig, segment: &SegmentConfig) -> Self {
        let (grouper, splitter) = segment::from_config(segment);
        Self {
            provider,
            grouper,
            splitter,
            request_interval: Duration::from_millis(config.request_interval_ms),
        }
    }
}

#[async_trait]
impl SubtitleTranslator for SentenceTranslator {
    async fn translate_cues(&self, cues: &mut [Cue]) -> Result<TranslationReport> {
        let groups = self.grouper.group(cues);
        info!(
            "Merged {} cues into {} sentences, translating with {}",
            cues.len(),
            groups.len(),
            self.provider.name()
        );

        let mut report = TranslationReport {
            groups: groups.len(),
            ..TranslationReport::default()
        };
        let mut requested = false;

        for (idx, group) in groups.iter().enumerate() {
            if group.text.is_empty() {
                continue;
            }
            if requested && !self.request_interval.is_zero() {
                tokio::time::sleep(self.request_interval).await;
            }
            requested = true;

            info!("┌─ Translating sentence {}/{} ({} cues) ────────", idx + 1, groups.len(), group.len());
            info!("│ Source: {}", group.text);

            let originals: Vec<String> = cues[group.indices()].iter().map(Cue::normalized_text).collect();
            let parts = match self.provider.translate(&group.text).await {
                Ok(translated) => {
                    info!("│ Target: {}", translated);
                    self.splitter.split_group(group, &originals, &translated)
                }
                Err(e) => Err(e),
            };

            match parts {
                Ok(parts) => {
                    for (cue, part) in cues[group.indices()].iter_mut().zip(parts) {
                        cue.text = part;
                    }
                    report.translated_cues += group.len();
                    info!("└─────────────────────────────────────");
                }
                Err(e) => {
                    warn!("│ Failed, keeping source text: {}", e);
                    warn!("└─────────────────────────────────────");
                    report.failed_groups.push(idx);
                    report.untranslated.extend(group.indices());
                }
            }
        }

        info!(
            "Translated {} of {} cues ({} sentences failed)",
            report.translated_cues,
            cues.len(),
            report.failed_groups.len()
        );
        Ok(report)
    }
}
