//! Gemini adapter (hashtag text generation).
//!
//! Uses the `models/{model}:generateContent` endpoint with an API key.

use async_trait::async_trait;
use chanpost_core::{errors::Error, ports::TextGenerator, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Clone, Debug)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        // No request timeout: the service's own deadline bounds a call.
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: API_BASE.to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

fn request_body(prompt: &str) -> GenerateRequest<'_> {
    GenerateRequest {
        contents: [Content {
            parts: [Part { text: prompt }],
        }],
    }
}

/// Text of the first part of the first candidate.
fn extract_text(resp: GenerateResponse) -> Result<String> {
    let text = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(Error::External("gemini returned no text".to_string()));
    }
    Ok(text)
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let resp = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body(prompt))
            .send()
            .await
            .map_err(|e| Error::External(format!("gemini request error: {}", e.without_url())))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::External(format!(
                "gemini request failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| Error::External(format!("gemini json error: {}", e.without_url())))?;

        let text = extract_text(parsed)?;
        debug!(model = %self.model, chars = text.len(), "gemini response received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GenerateResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn request_body_has_single_text_part() {
        let body = serde_json::to_value(request_body("hello")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"contents": [{"parts": [{"text": "hello"}]}]})
        );
    }

    #[test]
    fn endpoint_includes_model() {
        let client = GeminiClient::new("k", "gemini-2.0-flash");
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn extracts_first_candidate_text() {
        let resp = parse(
            r##"{"candidates":[{"content":{"parts":[{"text":"#deals #sale"}],"role":"model"},"finishReason":"STOP"}],
                "usageMetadata":{"totalTokenCount":12}}"##,
        );
        assert_eq!(extract_text(resp).unwrap(), "#deals #sale");
    }

    #[test]
    fn blocked_or_empty_responses_are_errors() {
        assert!(extract_text(parse(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)).is_err());
        assert!(extract_text(parse(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#)).is_err());
        assert!(extract_text(parse(r#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#)).is_err());
    }
}
