// Subtitle translation
//
// Two layers:
// - TextTranslator: a provider that turns source text into target text
//   (Google, DeepL, OpenAI, Ollama)
// - SubtitleTranslator: a strategy that drives a provider over a cue list
//   - Sentence: merge cues into sentences, translate, split back onto the cues
//   - Simple: translate cue by cue in batches

pub mod common;
pub mod deepl;
pub mod google;
pub mod ollama;
pub mod openai;
pub mod sentence;
pub mod simple;

use async_trait::async_trait;
use std::sync::Arc;

pub use common::*;
pub use sentence::SentenceTranslator;
pub use simple::SimpleTranslator;

use crate::config::{SegmentConfig, TranslateConfig, TranslationMode, TranslationProvider};
use crate::error::Result;
use crate::subtitle::Cue;

/// A translation provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextTranslator: Send + Sync {
    /// Translate one piece of text
    async fn translate(&self, text: &str) -> Result<String>;

    /// Translate several texts, returning one translation per input in order
    async fn translate_batch(&self, texts: &[String]) -> Result<Vec<String>> {
        let mut translated = Vec::with_capacity(texts.len());
        for text in texts {
            translated.push(self.translate(text).await?);
        }
        Ok(translated)
    }

    fn name(&self) -> &'static str;
}

/// Summary of one subtitle translation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationReport {
    /// Number of request units (sentence groups or batches)
    pub groups: usize,
    /// Units whose request failed
    pub failed_groups: Vec<usize>,
    /// Cues now holding translated text
    pub translated_cues: usize,
    /// 0-based positions of cues left in the source language
    pub untranslated: Vec<usize>,
}

/// Main trait for translating a cue list in place
#[async_trait]
pub trait SubtitleTranslator: Send + Sync {
    async fn translate_cues(&self, cues: &mut [Cue]) -> Result<TranslationReport>;
}

/// Factory for creating translator instances
pub struct TranslatorFactory;

impl TranslatorFactory {
    /// Create the provider selected by the configuration
    pub fn create_text_translator(config: &TranslateConfig) -> Result<Arc<dyn TextTranslator>> {
        let translator: Arc<dyn TextTranslator> = match config.provider {
            TranslationProvider::Google => Arc::new(google::GoogleTranslator::new(config.clone())?),
            TranslationProvider::Deepl => Arc::new(deepl::DeeplTranslator::from_env(config.clone())?),
            TranslationProvider::Openai => Arc::new(openai::OpenAiTranslator::from_env(config.clone())?),
            TranslationProvider::Ollama => Arc::new(ollama::OllamaTranslator::new(config.clone())?),
        };
        Ok(translator)
    }

    /// Create the strategy selected by the translation mode
    pub fn create_translator(
        config: &TranslateConfig,
        segment: &SegmentConfig,
        provider: Arc<dyn TextTranslator>,
    ) -> Box<dyn SubtitleTranslator> {
        match config.mode {
            TranslationMode::Sentence => Box::new(SentenceTranslator::new(provider, config, segment)),
            TranslationMode::Simple => Box::new(SimpleTranslator::new(provider, config)),
        }
    }
}
