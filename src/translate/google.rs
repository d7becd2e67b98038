use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::TranslateConfig;
use crate::error::{RedubError, Result};
use super::{common, TextTranslator};

const DEFAULT_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// Public Google Translate endpoint used by browser extensions; no key needed
pub struct GoogleTranslator {
    client: Client,
    config: TranslateConfig,
}

impl GoogleTranslator {
    pub fn new(config: TranslateConfig) -> Result<Self> {
        let client = common::build_client(config.timeout_secs)?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl TextTranslator for GoogleTranslator {
    async fn translate(&self, text: &str) -> Result<String> {
        let url = common::endpoint_or(&self.config.endpoint, DEFAULT_ENDPOINT);
        debug!("Sending translation request to: {}", url);

        let response = self
            .client
            .get(url)
            .query(&[
                ("client", "gtx"),
                ("sl", self.config.source_language.as_str()),
                ("tl", self.config.target_language.as_str()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| RedubError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RedubError::Translation(format!(
                "Google Translate error {}: {}",
                status, error_text
            )));
        }

        let body: Value = response.json().await?;
        parse_response(&body)
    }

    fn name(&self) -> &'static str {
        "google"
    }
}

/// The reply is a nested array; the first element lists `[translated, source, ...]` chunks
fn parse_response(body: &Value) -> Result<String> {
    let chunks = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| RedubError::Translation("Unexpected Google Translate response".to_string()))?;

    let translated: String = chunks
        .iter()
        .filter_map(|chunk| chunk.get(0).and_then(Value::as_str))
        .collect();

    let translated = translated.trim();
    if translated.is_empty() {
        return Err(RedubError::Translation("Empty translation received".to_string()));
    }
    Ok(translated.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chunks_are_concatenated() {
        let body = json!([
            [
                ["你好，", "Hello, ", null, null, 10],
                ["世界。", "world.", null, null, 10]
            ],
            null,
            "en"
        ]);
        assert_eq!(parse_response(&body).unwrap(), "你好，世界。");
    }

    #[test]
    fn malformed_or_empty_replies_are_errors() {
        assert!(parse_response(&json!({"error": "quota"})).is_err());
        assert!(parse_response(&json!([[]])).is_err());
    }
}
