use async_trait::async_trait;

use crate::Result;

/// Hexagonal port for the generative-text backend (Gemini today).
///
/// One prompt in, free-form text out. Implementations report transport and
/// response-shape problems as `Error::External`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}
