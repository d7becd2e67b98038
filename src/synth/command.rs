use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

use crate::config::SynthConfig;
use crate::error::{RedubError, Result};
use crate::media::MediaCommand;
use super::Synthesizer;

/// Runs an external synthesizer such as `edge-tts`.
///
/// Each configured argument may contain `{text}`, `{voice}` and `{output}`,
/// which are replaced before the program is spawned. The text is passed as a
/// single argument, so no shell quoting is involved.
pub struct CommandSynthesizer {
    config: SynthConfig,
}

impl CommandSynthesizer {
    pub fn new(config: SynthConfig) -> Self {
        Self { config }
    }

    pub fn build_command(&self, text: &str, output: &Path) -> MediaCommand {
        let output = output.to_string_lossy();
        let args = self.config.args.iter().map(|arg| {
            arg.replace("{voice}", &self.config.voice)
                .replace("{output}", &output)
                .replace("{text}", text)
        });

        MediaCommand::new(&self.config.command, "Speech synthesis").args(args)
    }
}

#[async_trait]
impl Synthesizer for CommandSynthesizer {
    async fn synthesize(&self, text: &str, output: &Path) -> Result<()> {
        debug!("Synthesizing {} chars with {}", text.chars().count(), self.config.command);

        self.build_command(text, output)
            .execute()
            .await
            .map_err(|e| RedubError::Synthesis(e.to_string()))?;

        if !output.exists() {
            return Err(RedubError::Synthesis(format!(
                "{} produced no clip at {}",
                self.config.command,
                output.display()
            )));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.config.command
    }
}
