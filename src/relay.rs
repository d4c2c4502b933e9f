//! Transport-independent handling of inbound chat events.
//!
//! [`Relay`] owns no transport: every handler receives an [`Outbox`] bound to
//! the chat the event came from and writes its replies there.

use crate::error::ProviderError;
use crate::history::{HistoryStore, Role, UserId};
use crate::provider::{CompletionProvider, ImageProvider};
use crate::texts::Texts;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Transient status shown while a provider call is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Typing,
    UploadPhoto,
}

/// Outbound side of a single chat.
#[async_trait]
pub trait Outbox: Send + Sync {
    async fn send_text(&self, text: &str) -> anyhow::Result<()>;

    async fn send_photo(&self, image: Vec<u8>, caption: &str) -> anyhow::Result<()>;

    async fn presence(&self, presence: Presence) -> anyhow::Result<()>;
}

/// Connects chat events to the history store and the providers.
#[derive(Clone)]
pub struct Relay {
    history: Arc<HistoryStore>,
    completion: Arc<dyn CompletionProvider>,
    images: Arc<dyn ImageProvider>,
    system_prompt: String,
    texts: &'static Texts,
}

impl Relay {
    pub fn new(
        history: Arc<HistoryStore>,
        completion: Arc<dyn CompletionProvider>,
        images: Arc<dyn ImageProvider>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            history,
            completion,
            images,
            system_prompt: system_prompt.into(),
            texts: &Texts::EN,
        }
    }

    /// Reply with `texts` instead of the English defaults.
    pub fn with_texts(mut self, texts: &'static Texts) -> Self {
        self.texts = texts;
        self
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    async fn show(&self, out: &dyn Outbox, presence: Presence) {
        if let Err(e) = out.presence(presence).await {
            warn!(error = %e, ?presence, "failed to send presence");
        }
    }

    pub async fn start(&self, out: &dyn Outbox) -> anyhow::Result<()> {
        out.send_text(self.texts.greeting).await
    }

    pub async fn help(&self, out: &dyn Outbox) -> anyhow::Result<()> {
        out.send_text(self.texts.help).await
    }

    pub async fn reset(&self, user: UserId, out: &dyn Outbox) -> anyhow::Result<()> {
        self.history.reset(user);
        info!(user, "conversation reset");
        out.send_text(self.texts.reset_done).await
    }

    /// Answer a plain text message, remembering the exchange on success.
    pub async fn chat(&self, user: UserId, text: &str, out: &dyn Outbox) -> anyhow::Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        self.show(out, Presence::Typing).await;

        let history = self.history.get(user);
        debug!(user, turns = history.len(), "requesting completion");
        let answer = match self
            .completion
            .complete(&self.system_prompt, &history, text)
            .await
        {
            Ok(answer) => answer,
            Err(e) => {
                warn!(user, error = %e, "completion failed");
                let reply = format!("{}{e}", self.texts.completion_error);
                return out.send_text(&reply).await;
            }
        };

        let answer = match answer.trim() {
            "" => self.texts.empty_answer,
            trimmed => trimmed,
        };
        self.history.append(user, Role::User, text);
        self.history.append(user, Role::Assistant, answer);
        out.send_text(answer).await
    }

    /// Generate a picture for `prompt` and send it back as a photo.
    pub async fn image(&self, prompt: &str, out: &dyn Outbox) -> anyhow::Result<()> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return out.send_text(self.texts.image_usage).await;
        }
        self.show(out, Presence::UploadPhoto).await;

        match self.images.generate(prompt).await {
            Ok(image) => {
                debug!(bytes = image.len(), "image generated");
                out.send_photo(image, self.texts.image_caption).await
            }
            Err(ProviderError::MissingImage) => {
                warn!("image response had no payload");
                debug!(%prompt, "prompt without image");
                out.send_text(self.texts.image_missing).await
            }
            Err(e) => {
                warn!(error = %e, "image generation failed");
                let reply = format!("{}{e}", self.texts.image_error);
                out.send_text(&reply).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::Turn;
    use crate::test_helpers::*;

    const EN: &Texts = &Texts::EN;

    fn relay(completion: Arc<dyn CompletionProvider>, images: Arc<dyn ImageProvider>) -> Relay {
        Relay::new(Arc::new(HistoryStore::new(10)), completion, images, "system")
    }

    #[tokio::test]
    async fn chat_records_exchange_and_replies() {
        let relay = relay(Arc::new(StaticCompletion::new("  pong  ")), Arc::new(MissingImage));
        let out = RecordingOutbox::default();
        relay.chat(42, " ping ", &out).await.unwrap();
        assert_eq!(
            out.events(),
            vec![Sent::Presence(Presence::Typing), Sent::Text("pong".into())]
        );
        assert_eq!(
            relay.history().get(42),
            vec![Turn::user("ping"), Turn::assistant("pong")]
        );
    }

    #[tokio::test]
    async fn provider_sees_prior_history_only() {
        let completion = Arc::new(RecordingCompletion::new("ok"));
        let relay = relay(completion.clone(), Arc::new(MissingImage));
        let out = RecordingOutbox::default();
        relay.chat(1, "first", &out).await.unwrap();
        relay.chat(1, "second", &out).await.unwrap();
        let calls = completion.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].system, "system");
        assert!(calls[0].history.is_empty());
        assert_eq!(calls[1].history, vec![Turn::user("first"), Turn::assistant("ok")]);
        assert_eq!(calls[1].user_text, "second");
    }

    #[tokio::test]
    async fn failed_completion_leaves_history_untouched() {
        let relay = relay(Arc::new(FailingCompletion), Arc::new(MissingImage));
        relay.history().append(5, Role::User, "old");
        let out = RecordingOutbox::default();
        relay.chat(5, "new", &out).await.unwrap();
        assert_eq!(relay.history().get(5), vec![Turn::user("old")]);
        let texts = out.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].starts_with("Completion error:"));
    }

    #[tokio::test]
    async fn blank_message_is_ignored() {
        let completion = Arc::new(RecordingCompletion::new("ok"));
        let relay = relay(completion.clone(), Arc::new(MissingImage));
        let out = RecordingOutbox::default();
        relay.chat(1, "   \n", &out).await.unwrap();
        assert!(out.events().is_empty());
        assert!(completion.calls().is_empty());
        assert!(relay.history().get(1).is_empty());
    }

    #[tokio::test]
    async fn empty_answer_uses_fallback() {
        let relay = relay(Arc::new(StaticCompletion::new("  ")), Arc::new(MissingImage));
        let out = RecordingOutbox::default();
        relay.chat(9, "hm", &out).await.unwrap();
        assert_eq!(out.texts(), vec![EN.empty_answer.to_string()]);
        assert_eq!(relay.history().get(9)[1], Turn::assistant(EN.empty_answer));
    }

    #[tokio::test]
    async fn presence_failure_does_not_abort_chat() {
        let relay = relay(Arc::new(StaticCompletion::new("still here")), Arc::new(MissingImage));
        let out = RecordingOutbox::failing_presence();
        relay.chat(3, "hello", &out).await.unwrap();
        assert_eq!(out.texts(), vec!["still here".to_string()]);
    }

    #[tokio::test]
    async fn reset_clears_history_and_confirms() {
        let relay = relay(Arc::new(StaticCompletion::new("x")), Arc::new(MissingImage));
        relay.history().append(8, Role::User, "remember me");
        let out = RecordingOutbox::default();
        relay.reset(8, &out).await.unwrap();
        relay.reset(8, &out).await.unwrap();
        assert!(relay.history().get(8).is_empty());
        assert_eq!(out.texts(), vec![EN.reset_done.to_string(), EN.reset_done.to_string()]);
    }

    #[tokio::test]
    async fn start_and_help_send_static_text() {
        let relay = relay(Arc::new(StaticCompletion::new("x")), Arc::new(MissingImage));
        let out = RecordingOutbox::default();
        relay.start(&out).await.unwrap();
        relay.help(&out).await.unwrap();
        let texts = out.texts();
        assert_eq!(texts, vec![EN.greeting.to_string(), EN.help.to_string()]);
        assert!(texts[1].contains("/reset"));
    }

    #[tokio::test]
    async fn empty_prompt_sends_usage_without_calling_provider() {
        let images = Arc::new(StaticImage::new(b"png".to_vec()));
        let relay = relay(Arc::new(StaticCompletion::new("x")), images.clone());
        let out = RecordingOutbox::default();
        relay.image("  ", &out).await.unwrap();
        assert_eq!(out.events(), vec![Sent::Text(EN.image_usage.into())]);
        assert_eq!(images.calls(), 0);
    }

    #[tokio::test]
    async fn image_is_sent_as_photo() {
        let images = Arc::new(StaticImage::new(b"png".to_vec()));
        let relay = relay(Arc::new(StaticCompletion::new("x")), images.clone());
        let out = RecordingOutbox::default();
        relay.image(" a red fox ", &out).await.unwrap();
        assert_eq!(
            out.events(),
            vec![
                Sent::Presence(Presence::UploadPhoto),
                Sent::Photo(b"png".to_vec(), EN.image_caption.into()),
            ]
        );
        assert_eq!(images.calls(), 1);
        assert!(relay.history().get(0).is_empty());
    }

    #[tokio::test]
    async fn missing_image_asks_for_another_prompt() {
        let relay = relay(Arc::new(StaticCompletion::new("x")), Arc::new(MissingImage));
        let out = RecordingOutbox::default();
        relay.image("nothing", &out).await.unwrap();
        assert_eq!(out.texts(), vec![EN.image_missing.to_string()]);
    }

    #[tokio::test]
    async fn image_failure_is_reported() {
        let relay = relay(Arc::new(StaticCompletion::new("x")), Arc::new(FailingImage));
        let out = RecordingOutbox::default();
        relay.image("a cat", &out).await.unwrap();
        let texts = out.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].starts_with("Image generation error:"));
    }

    #[tokio::test]
    async fn concurrent_users_do_not_mix() {
        let relay = relay(Arc::new(StaticCompletion::new("ok")), Arc::new(MissingImage));
        let out = RecordingOutbox::default();
        let (a, b) = tokio::join!(
            relay.chat(1, "from one", &out),
            relay.chat(2, "from two", &out),
        );
        a.unwrap();
        b.unwrap();
        assert_eq!(relay.history().get(1)[0], Turn::user("from one"));
        assert_eq!(relay.history().get(2)[0], Turn::user("from two"));
    }

    #[tokio::test]
    async fn russian_texts_are_used_when_selected() {
        let relay = relay(Arc::new(FailingCompletion), Arc::new(MissingImage))
            .with_texts(&Texts::RU);
        let out = RecordingOutbox::default();
        relay.chat(4, "привет", &out).await.unwrap();
        relay.image("", &out).await.unwrap();
        let texts = out.texts();
        assert!(texts[0].starts_with(Texts::RU.completion_error));
        assert_eq!(texts[1], Texts::RU.image_usage);
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    async fn missing_image_keeps_prompt_out_of_warnings() {
        let relay = relay(Arc::new(StaticCompletion::new("ok")), Arc::new(MissingImage));
        let out = RecordingOutbox::default();
        relay.image("my private prompt", &out).await.unwrap();
        assert!(logs_contain("image response had no payload"));
        logs_assert(|lines: &[&str]| {
            match lines
                .iter()
                .find(|l| l.contains("WARN") && l.contains("my private prompt"))
            {
                Some(line) => Err(format!("prompt logged at warn: {line}")),
                None => Ok(()),
            }
        });
    }
}
