use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::TranslateConfig;
use crate::error::{RedubError, Result};
use super::{common, TextTranslator};

const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
    pub done: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    pub text: String,
}

/// Local Ollama server, prompted for a JSON `{"text": ...}` reply
pub struct OllamaTranslator {
    client: Client,
    config: TranslateConfig,
}

impl OllamaTranslator {
    pub fn new(config: TranslateConfig) -> Result<Self> {
        let client = common::build_client(config.timeout_secs)?;
        Ok(Self { client, config })
    }

    fn base_url(&self) -> &str {
        common::endpoint_or(&self.config.endpoint, DEFAULT_ENDPOINT)
    }

    fn build_prompt(&self, text: &str) -> String {
        let language_name = common::language_name(&self.config.target_language);
        format!(
            "You are a professional subtitle translator.\n\
             \n\
             CRITICAL: You must translate the text to {} ONLY.\n\
             The target language is: {} (language code: {})\n\
             \n\
             Return ONLY the translation in JSON format as {{\"text\":\"your {} translation here\"}}.\n\
             Do not include any explanations, alternatives, or text in other languages.\n\
             \n\
             [Text to translate]\n\
             {}\n",
            language_name, language_name, self.config.target_language, language_name, text
        )
    }

    /// Check the server answers and has the configured model pulled
    pub async fn check_availability(&self) -> Result<()> {
        let url = format!("{}/api/tags", self.base_url());
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RedubError::Translation(format!("Ollama is not reachable at {}: {}", url, e)))?;

        let tags: serde_json::Value = response.json().await?;
        let available = tags["models"]
            .as_array()
            .map(|models| {
                models.iter().any(|m| {
                    m["name"]
                        .as_str()
                        .is_some_and(|name| name == self.config.model || name.starts_with(&format!("{}:", self.config.model)))
                })
            })
            .unwrap_or(false);

        if !available {
            return Err(RedubError::Translation(format!(
                "Model '{}' is not available. Pull it with: ollama pull {}",
                self.config.model, self.config.model
            )));
        }
        info!("Ollama model {} is available", self.config.model);
        Ok(())
    }
}

#[async_trait]
impl TextTranslator for OllamaTranslator {
    async fn translate(&self, text: &str) -> Result<String> {
        let request = GenerateRequest {
            model: self.config.model.clone(),
            prompt: self.build_prompt(text),
            stream: false,
            format: "json".to_string(),
        };

        let url = format!("{}/api/generate", self.base_url());
        debug!("Sending translation request to: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RedubError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RedubError::Translation(format!("Ollama API error {}: {}", status, error_text)));
        }

        let generated: GenerateResponse = response.json().await?;
        parse_generated(&generated.response)
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

/// Prefer the JSON payload; fall back to the first meaningful line of free text
fn parse_generated(raw: &str) -> Result<String> {
    let raw = raw.trim();
    debug!("Raw Ollama response: {}", raw);

    if raw.is_empty() {
        return Err(RedubError::Translation("Empty translation received".to_string()));
    }

    if let Ok(result) = serde_json::from_str::<TranslationResult>(raw) {
        let text = result.text.trim();
        if text.is_empty() {
            return Err(RedubError::Translation("Empty translation received".to_string()));
        }
        return Ok(text.to_string());
    }

    Ok(raw
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with("Translation:") && !line.starts_with("Here"))
        .unwrap_or(raw)
        .to_string())
}
