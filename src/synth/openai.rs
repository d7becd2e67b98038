use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::config::SynthConfig;
use crate::error::{RedubError, Result};
use super::Synthesizer;

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/audio/speech";

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

/// OpenAI speech endpoint
pub struct OpenAiSynthesizer {
    client: Client,
    config: SynthConfig,
    api_key: String,
}

impl OpenAiSynthesizer {
    pub fn new(config: SynthConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.segment_timeout_secs))
            .build()?;
        Ok(Self { client, config, api_key })
    }

    /// Read the key from `OPENAI_API_KEY`
    pub fn from_env(config: SynthConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| RedubError::Config("OPENAI_API_KEY is not set".to_string()))?;
        Self::new(config, api_key)
    }

    fn endpoint(&self) -> &str {
        if self.config.endpoint.is_empty() {
            DEFAULT_ENDPOINT
        } else {
            &self.config.endpoint
        }
    }
}

#[async_trait]
impl Synthesizer for OpenAiSynthesizer {
    async fn synthesize(&self, text: &str, output: &Path) -> Result<()> {
        let request = SpeechRequest {
            model: &self.config.model,
            input: text,
            voice: &self.config.voice,
            response_format: &self.config.clip_extension,
        };
        debug!("Requesting speech for {} chars from {}", text.chars().count(), self.endpoint());

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RedubError::Synthesis(format!("Speech API returned {}: {}", status, body)));
        }

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(RedubError::Synthesis("Speech API returned no audio".to_string()));
        }
        tokio::fs::write(output, &audio).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_configured_voice_and_format() {
        let config = SynthConfig::default();
        let request = SpeechRequest {
            model: &config.model,
            input: "你好",
            voice: "alloy",
            response_format: &config.clip_extension,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "tts-1");
        assert_eq!(json["voice"], "alloy");
        assert_eq!(json["response_format"], "mp3");
    }

    #[test]
    fn empty_endpoint_selects_public_api() {
        let synth = OpenAiSynthesizer::new(SynthConfig::default(), "key".to_string()).unwrap();
        assert_eq!(synth.endpoint(), DEFAULT_ENDPOINT);

        let config = SynthConfig {
            endpoint: "http://localhost:8880/v1/audio/speech".to_string(),
            ..SynthConfig::default()
        };
        let synth = OpenAiSynthesizer::new(config, "key".to_string()).unwrap();
        assert_eq!(synth.endpoint(), "http://localhost:8880/v1/audio/speech");
    }
}
