pub mod openai;

use crate::error::ProviderError;
use crate::history::Turn;
use async_trait::async_trait;

pub use openai::OpenAiClient;

/// Generates a reply for a conversation.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Answer `user_text` given the `system` instruction and prior `history`.
    async fn complete(
        &self,
        system: &str,
        history: &[Turn],
        user_text: &str,
    ) -> Result<String, ProviderError>;
}

/// Renders an image from a text prompt.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Returns the decoded image bytes.
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, ProviderError>;
}
