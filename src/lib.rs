//! Telegram relay to an OpenAI chat model.
//!
//! Text messages are answered by a chat completion that sees a bounded
//! per-user history ([`history::HistoryStore`]); `/img` renders a picture
//! from a prompt and sends it back as a photo.

pub mod commands;
pub mod config;
pub mod error;
pub mod history;
pub mod provider;
pub mod relay;
pub mod telegram;
pub mod texts;

mod test_helpers;

pub use commands::Command;
pub use config::{Config, OpenAiConfig};
pub use error::{ConfigError, ProviderError};
pub use history::{HistoryStore, MAX_TURNS, Role, Turn, UserId};
pub use provider::{CompletionProvider, ImageProvider, OpenAiClient};
pub use relay::{Outbox, Presence, Relay};
pub use texts::{Locale, Texts};
