use reqwest::Client;
use std::time::Duration;

use crate::error::{RedubError, Result};

/// HTTP client shared by the providers
pub fn build_client(timeout_secs: u64) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// Read a provider key from the environment
pub fn api_key(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(RedubError::Config(format!("{} is not set", var))),
    }
}

/// Pick the configured endpoint or the provider default
pub fn endpoint_or<'a>(configured: &'a str, default: &'a str) -> &'a str {
    if configured.trim().is_empty() {
        default
    } else {
        configured.trim_end_matches('/')
    }
}

/// Language code to a name an LLM prompt can use
pub fn language_name(code: &str) -> String {
    let lower = code.to_lowercase();
    let name = match lower.as_str() {
        "zh-tw" | "zh-hk" | "zh-hant" => "Traditional Chinese",
        _ => match lower.split(['-', '_']).next().unwrap_or("") {
            "zh" => "Simplified Chinese",
            "en" => "English",
            "ja" => "Japanese",
            "ko" => "Korean",
            "fr" => "French",
            "de" => "German",
            "es" => "Spanish",
            "it" => "Italian",
            "pt" => "Portuguese",
            "ru" => "Russian",
            "nl" => "Dutch",
            "pl" => "Polish",
            "tr" => "Turkish",
            "ar" => "Arabic",
            "hi" => "Hindi",
            "th" => "Thai",
            "vi" => "Vietnamese",
            "uk" => "Ukrainian",
            _ => return code.to_string(),
        },
    };
    name.to_string()
}

/// `1. text` lines for a batch prompt
pub fn number_lines(texts: &[String]) -> String {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| format!("{}. {}", i + 1, text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse a numbered reply back into exactly `expected` lines
pub fn parse_numbered_lines(response: &str, expected: usize) -> Result<Vec<String>> {
    let lines: Vec<String> = response
        .lines()
        .map(strip_numbering)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.len() != expected {
        return Err(RedubError::Translation(format!(
            "Expected {} translated lines, got {}",
            expected,
            lines.len()
        )));
    }
    Ok(lines)
}

/// Drop a leading `12.`, `12)` or `12、` marker
pub fn strip_numbering(line: &str) -> String {
    let trimmed = line.trim();
    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return trimmed.to_string();
    }

    let rest = &trimmed[digits..];
    match rest.chars().next() {
        Some(marker @ ('.' | ')' | '、' | '．' | ':')) => rest[marker.len_utf8()..].trim().to_string(),
        _ => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbering_is_stripped() {
        assert_eq!(strip_numbering("3. 你好"), "你好");
        assert_eq!(strip_numbering(" 12) 世界 "), "世界");
        assert_eq!(strip_numbering("4、早上好"), "早上好");
        assert_eq!(strip_numbering("1984年是个好年份"), "1984年是个好年份");
        assert_eq!(strip_numbering("没有编号"), "没有编号");
    }

    #[test]
    fn numbered_reply_must_match_batch() {
        let texts = vec!["Hello.".to_string(), "World.".to_string()];
        assert_eq!(number_lines(&texts), "1. Hello.\n2. World.");

        let parsed = parse_numbered_lines("1. 你好。\n\n2. 世界。\n", 2).unwrap();
        assert_eq!(parsed, vec!["你好。", "世界。"]);

        assert!(parse_numbered_lines("1. 你好。世界。", 2).is_err());
    }

    #[test]
    fn language_names() {
        assert_eq!(language_name("zh-CN"), "Simplified Chinese");
        assert_eq!(language_name("zh-TW"), "Traditional Chinese");
        assert_eq!(language_name("en"), "English");
        assert_eq!(language_name("xx"), "xx");
    }

    #[test]
    fn endpoint_defaults() {
        assert_eq!(endpoint_or("", "https://example.com"), "https://example.com");
        assert_eq!(endpoint_or("http://localhost:11434/", "x"), "http://localhost:11434");
    }
}
