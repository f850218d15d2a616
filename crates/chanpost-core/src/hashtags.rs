//! Topic hashtags for a caption, via the text-generation port.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{ports::TextGenerator, Result};

const INSTRUCTION: &str = "Generate between 3 and 5 relevant hashtags for the text below, \
written in the same language as the text. Reply with the hashtags only.";

#[derive(Clone)]
pub struct HashtagGenerator {
    backend: Arc<dyn TextGenerator>,
}

impl HashtagGenerator {
    pub fn new(backend: Arc<dyn TextGenerator>) -> Self {
        Self { backend }
    }

    /// Ask the backend for hashtags. Blank input returns `""` without a call.
    pub async fn try_generate(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }
        let raw = self.backend.generate(&build_prompt(text)).await?;
        let line = normalize_hashtags(&raw);
        debug!(hashtags = %line, "generated hashtags");
        Ok(line)
    }

    /// Best-effort variant: failures are logged and yield an empty line.
    pub async fn generate_or_default(&self, text: &str) -> String {
        match self.try_generate(text).await {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "hashtag generation failed; publishing without hashtags");
                String::new()
            }
        }
    }
}

fn build_prompt(text: &str) -> String {
    format!("{INSTRUCTION}\n\nText: \"{text}\"")
}

/// Turn free-form model output into `#a #b #c`.
pub fn normalize_hashtags(raw: &str) -> String {
    raw.split_whitespace()
        .map(|token| token.trim_start_matches('#').trim_end_matches(','))
        .filter(|token| !token.is_empty())
        .map(|token| format!("#{token}"))
        .collect::<Vec<_>>()
        .join(" ")
}
