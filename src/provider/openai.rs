use super::{CompletionProvider, ImageProvider};
use crate::config::OpenAiConfig;
use crate::error::ProviderError;
use crate::history::Turn;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Client for the OpenAI chat completion and image generation endpoints.
#[derive(Clone, Debug)]
pub struct OpenAiClient {
    http: reqwest::Client,
    config: OpenAiConfig,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
}

#[derive(Deserialize)]
struct ImageResponse {
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    b64_json: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Build the message list: system instruction, prior turns, then the new text.
fn chat_messages<'a>(
    system: &'a str,
    history: &'a [Turn],
    user_text: &'a str,
) -> Vec<WireMessage<'a>> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(WireMessage {
        role: "system",
        content: system,
    });
    messages.extend(history.iter().map(|t| WireMessage {
        role: t.role().as_str(),
        content: t.content(),
    }));
    messages.push(WireMessage {
        role: "user",
        content: user_text,
    });
    messages
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(http: reqwest::Client, config: OpenAiConfig) -> Self {
        Self { http, config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ProviderError> {
        let url = self.url(path);
        trace!(target: "llm", %url, "openai request");
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message,
            });
        }
        serde_json::from_str(&text).map_err(|e| ProviderError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn complete(
        &self,
        system: &str,
        history: &[Turn],
        user_text: &str,
    ) -> Result<String, ProviderError> {
        let req = ChatRequest {
            model: &self.config.chat_model,
            messages: chat_messages(system, history, user_text),
        };
        let resp: ChatResponse = self.post("chat/completions", &req).await?;
        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Malformed("no choices in completion".into()))?;
        let content = choice.message.content.unwrap_or_default();
        debug!(target: "llm", response = %content, "openai completion");
        Ok(content)
    }
}

#[async_trait]
impl ImageProvider for OpenAiClient {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, ProviderError> {
        let req = ImageRequest {
            model: &self.config.image_model,
            prompt,
            n: 1,
        };
        let resp: ImageResponse = self.post("images/generations", &req).await?;
        let b64 = resp
            .data
            .into_iter()
            .next()
            .and_then(|d| d.b64_json)
            .ok_or(ProviderError::MissingImage)?;
        let bytes = B64.decode(b64.trim())?;
        debug!(target: "llm", bytes = bytes.len(), "openai image decoded");
        Ok(bytes)
    }
}
