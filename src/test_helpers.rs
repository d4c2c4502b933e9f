#![cfg(test)]

use crate::error::ProviderError;
use crate::history::Turn;
use crate::provider::{CompletionProvider, ImageProvider};
use crate::relay::{Outbox, Presence};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

fn unavailable() -> ProviderError {
    ProviderError::Status {
        status: 503,
        message: "unavailable".into(),
    }
}

/// [`CompletionProvider`] that always answers with the same text.
pub struct StaticCompletion {
    pub reply: String,
}

impl StaticCompletion {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

#[async_trait]
impl CompletionProvider for StaticCompletion {
    async fn complete(&self, _: &str, _: &[Turn], _: &str) -> Result<String, ProviderError> {
        Ok(self.reply.clone())
    }
}

/// Arguments of one [`CompletionProvider::complete`] call.
#[derive(Debug, Clone)]
pub struct CompletionCall {
    pub system: String,
    pub history: Vec<Turn>,
    pub user_text: String,
}

/// Static reply that also remembers every request.
pub struct RecordingCompletion {
    reply: String,
    calls: Mutex<Vec<CompletionCall>>,
}

impl RecordingCompletion {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<CompletionCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for RecordingCompletion {
    async fn complete(
        &self,
        system: &str,
        history: &[Turn],
        user_text: &str,
    ) -> Result<String, ProviderError> {
        self.calls.lock().unwrap().push(CompletionCall {
            system: system.into(),
            history: history.to_vec(),
            user_text: user_text.into(),
        });
        Ok(self.reply.clone())
    }
}

pub struct FailingCompletion;

#[async_trait]
impl CompletionProvider for FailingCompletion {
    async fn complete(&self, _: &str, _: &[Turn], _: &str) -> Result<String, ProviderError> {
        Err(unavailable())
    }
}

/// [`ImageProvider`] returning fixed bytes and counting calls.
pub struct StaticImage {
    bytes: Vec<u8>,
    calls: AtomicUsize,
}

impl StaticImage {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageProvider for StaticImage {
    async fn generate(&self, _prompt: &str) -> Result<Vec<u8>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.bytes.clone())
    }
}

pub struct MissingImage;

#[async_trait]
impl ImageProvider for MissingImage {
    async fn generate(&self, _prompt: &str) -> Result<Vec<u8>, ProviderError> {
        Err(ProviderError::MissingImage)
    }
}

pub struct FailingImage;

#[async_trait]
impl ImageProvider for FailingImage {
    async fn generate(&self, _prompt: &str) -> Result<Vec<u8>, ProviderError> {
        Err(unavailable())
    }
}

/// Something an [`Outbox`] was asked to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text(String),
    Photo(Vec<u8>, String),
    Presence(Presence),
}

/// [`Outbox`] that records everything in order.
#[derive(Default)]
pub struct RecordingOutbox {
    sent: Mutex<Vec<Sent>>,
    fail_presence: bool,
}

impl RecordingOutbox {
    /// Outbox whose presence indicator always errors.
    pub fn failing_presence() -> Self {
        Self {
            fail_presence: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text(t) => Some(t),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Outbox for RecordingOutbox {
    async fn send_text(&self, text: &str) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(Sent::Text(text.into()));
        Ok(())
    }

    async fn send_photo(&self, image: Vec<u8>, caption: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Photo(image, caption.into()));
        Ok(())
    }

    async fn presence(&self, presence: Presence) -> anyhow::Result<()> {
        if self.fail_presence {
            anyhow::bail!("presence rejected");
        }
        self.sent.lock().unwrap().push(Sent::Presence(presence));
        Ok(())
    }
}
