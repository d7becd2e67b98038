use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TranslateConfig;
use crate::error::{RedubError, Result};
use super::{common, TextTranslator};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// OpenAI chat completions, keyed by `OPENAI_API_KEY`
pub struct OpenAiTranslator {
    client: Client,
    config: TranslateConfig,
    api_key: String,
}

impl OpenAiTranslator {
    pub fn new(config: TranslateConfig, api_key: String) -> Result<Self> {
        let client = common::build_client(config.timeout_secs)?;
        Ok(Self { client, config, api_key })
    }

    pub fn from_env(config: TranslateConfig) -> Result<Self> {
        let api_key = common::api_key("OPENAI_API_KEY")?;
        Self::new(config, api_key)
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are a professional subtitle translator for educational videos. \
             Translate {} into natural, spoken {}. Keep the meaning accurate and the wording easy to follow. \
             Reply with the translation only.",
            common::language_name(&self.config.source_language),
            common::language_name(&self.config.target_language)
        )
    }

    fn batch_prompt(&self, texts: &[String]) -> String {
        format!(
            "Translate each numbered subtitle line into {}. \
             Reply with exactly {} numbered lines in the same order, one translation per line.\n\n{}",
            common::language_name(&self.config.target_language),
            texts.len(),
            common::number_lines(texts)
        )
    }

    async fn complete(&self, user_prompt: String) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage { role: "system".to_string(), content: self.system_prompt() },
                ChatMessage { role: "user".to_string(), content: user_prompt },
            ],
            temperature: 0.3,
        };

        let url = common::endpoint_or(&self.config.endpoint, DEFAULT_ENDPOINT);
        debug!("Sending translation request to: {}", url);

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| RedubError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RedubError::Translation(format!("OpenAI API error {}: {}", status, error_text)));
        }

        let body: ChatResponse = response.json().await?;
        first_choice(body)
    }
}

fn first_choice(body: ChatResponse) -> Result<String> {
    let content = body
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.trim().to_string())
        .unwrap_or_default();

    if content.is_empty() {
        return Err(RedubError::Translation("Empty translation received".to_string()));
    }
    Ok(content)
}

#[async_trait]
impl TextTranslator for OpenAiTranslator {
    async fn translate(&self, text: &str) -> Result<String> {
        self.complete(text.to_string()).await
    }

    async fn translate_batch(&self, texts: &[String]) -> Result<Vec<String>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let reply = self.complete(self.batch_prompt(texts)).await?;
        common::parse_numbered_lines(&reply, texts.len())
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
