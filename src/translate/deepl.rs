use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TranslateConfig;
use crate::error::{RedubError, Result};
use super::{common, TextTranslator};

const FREE_ENDPOINT: &str = "https://api-free.deepl.com/v2/translate";
const PRO_ENDPOINT: &str = "https://api.deepl.com/v2/translate";

#[derive(Debug, Serialize)]
struct DeeplRequest<'a> {
    text: &'a [String],
    source_lang: String,
    target_lang: String,
}

#[derive(Debug, Deserialize)]
struct DeeplResponse {
    translations: Vec<DeeplTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeeplTranslation {
    text: String,
}

/// DeepL REST API, keyed by `DEEPL_API_KEY`
pub struct DeeplTranslator {
    client: Client,
    config: TranslateConfig,
    api_key: String,
}

impl DeeplTranslator {
    pub fn new(config: TranslateConfig, api_key: String) -> Result<Self> {
        let client = common::build_client(config.timeout_secs)?;
        Ok(Self { client, config, api_key })
    }

    pub fn from_env(config: TranslateConfig) -> Result<Self> {
        let api_key = common::api_key("DEEPL_API_KEY")?;
        Self::new(config, api_key)
    }

    /// Free-plan keys end in `:fx` and use a separate host
    fn endpoint(&self) -> &str {
        let default = if self.api_key.ends_with(":fx") {
            FREE_ENDPOINT
        } else {
            PRO_ENDPOINT
        };
        common::endpoint_or(&self.config.endpoint, default)
    }
}

#[async_trait]
impl TextTranslator for DeeplTranslator {
    async fn translate(&self, text: &str) -> Result<String> {
        let mut translated = self.translate_batch(&[text.to_string()]).await?;
        translated
            .pop()
            .ok_or_else(|| RedubError::Translation("DeepL returned no translation".to_string()))
    }

    async fn translate_batch(&self, texts: &[String]) -> Result<Vec<String>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = DeeplRequest {
            text: texts,
            source_lang: source_code(&self.config.source_language),
            target_lang: target_code(&self.config.target_language),
        };
        debug!("Sending {} texts to DeepL", texts.len());

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| RedubError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RedubError::Translation(format!("DeepL API error {}: {}", status, error_text)));
        }

        let body: DeeplResponse = response.json().await?;
        if body.translations.len() != texts.len() {
            return Err(RedubError::Translation(format!(
                "DeepL returned {} translations for {} texts",
                body.translations.len(),
                texts.len()
            )));
        }
        Ok(body.translations.into_iter().map(|t| t.text).collect())
    }

    fn name(&self) -> &'static str {
        "deepl"
    }
}

/// DeepL source languages carry no region
fn source_code(code: &str) -> String {
    code.split(['-', '_']).next().unwrap_or(code).to_uppercase()
}

/// Regions are only meaningful for English and Portuguese targets
fn target_code(code: &str) -> String {
    let upper = code.replace('_', "-").to_uppercase();
    match upper.as_str() {
        "EN-US" | "EN-GB" | "PT-BR" | "PT-PT" => upper,
        "ZH-TW" | "ZH-HK" | "ZH-HANT" => "ZH-HANT".to_string(),
        _ => source_code(&upper),
    }
}
