// Speech synthesis
//
// - Synthesizer: one text in, one clip file out
// - Providers: OpenAI speech endpoint, or any command line tool (edge-tts by default)
// - Dubber: synthesizes one clip per cue concurrently and places it on the timeline

pub mod command;
pub mod dubber;
pub mod openai;

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

pub use command::CommandSynthesizer;
pub use dubber::{Dubber, SynthesisOutcome};
pub use openai::OpenAiSynthesizer;

use crate::config::{SynthConfig, SynthProvider};
use crate::error::Result;

/// Main trait for text-to-speech
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Speak `text` into a new clip at `output`
    async fn synthesize(&self, text: &str, output: &Path) -> Result<()>;

    /// Short name used in logs
    fn name(&self) -> &str;
}

/// Factory for creating synthesizer instances
pub struct SynthesizerFactory;

impl SynthesizerFactory {
    pub fn create_synthesizer(config: &SynthConfig) -> Result<Arc<dyn Synthesizer>> {
        match config.provider {
            SynthProvider::Openai => Ok(Arc::new(OpenAiSynthesizer::from_env(config.clone())?)),
            SynthProvider::Command => Ok(Arc::new(CommandSynthesizer::new(config.clone()))),
        }
    }
}
