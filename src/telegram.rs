//! Long-polling Telegram front end.

use crate::commands::Command;
use crate::config::Config;
use crate::history::HistoryStore;
use crate::provider::OpenAiClient;
use crate::relay::{Outbox, Presence, Relay};
use anyhow::Context;
use async_trait::async_trait;
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, InputFile, Me};
use teloxide::utils::command::BotCommands;
use tracing::{debug, error, info, warn};

/// Longest text Telegram accepts in one message, in UTF-16 code units.
const MAX_MESSAGE_LEN: usize = 4096;

/// Split `text` into pieces Telegram will accept, preferring line breaks.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    for line in text.split_inclusive('\n') {
        let line_len = line.encode_utf16().count();
        if current_len + line_len <= limit {
            current.push_str(line);
            current_len += line_len;
            continue;
        }
        if !current.is_empty() {
            parts.push(std::mem::take(&mut current));
            current_len = 0;
        }
        for ch in line.chars() {
            let ch_len = ch.len_utf16();
            if current_len + ch_len > limit {
                parts.push(std::mem::take(&mut current));
                current_len = 0;
            }
            current.push(ch);
            current_len += ch_len;
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// [`Outbox`] writing to one Telegram chat.
#[derive(Clone)]
pub struct ChatOutbox {
    bot: Bot,
    chat_id: ChatId,
}

impl ChatOutbox {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }
}

#[async_trait]
impl Outbox for ChatOutbox {
    async fn send_text(&self, text: &str) -> anyhow::Result<()> {
        for part in split_message(text, MAX_MESSAGE_LEN) {
            self.bot.send_message(self.chat_id, part).await?;
        }
        Ok(())
    }

    async fn send_photo(&self, image: Vec<u8>, caption: &str) -> anyhow::Result<()> {
        self.bot
            .send_photo(self.chat_id, InputFile::memory(image))
            .caption(caption)
            .await?;
        Ok(())
    }

    async fn presence(&self, presence: Presence) -> anyhow::Result<()> {
        let action = match presence {
            Presence::Typing => ChatAction::Typing,
            Presence::UploadPhoto => ChatAction::UploadPhoto,
        };
        self.bot.send_chat_action(self.chat_id, action).await?;
        Ok(())
    }
}

/// Hands out the [`Outbox`] replying into a given chat.
pub trait Outboxes: Send + Sync {
    fn for_chat(&self, chat: ChatId) -> Arc<dyn Outbox>;
}

/// [`Outboxes`] backed by the live bot.
pub struct BotOutboxes {
    bot: Bot,
}

impl BotOutboxes {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

impl Outboxes for BotOutboxes {
    fn for_chat(&self, chat: ChatId) -> Arc<dyn Outbox> {
        Arc::new(ChatOutbox::new(self.bot.clone(), chat))
    }
}

/// Username commands may be addressed to (`/start@name`).
#[derive(Clone, Debug)]
pub struct BotName(pub String);

async fn command_handler(
    msg: Message,
    cmd: Command,
    relay: Relay,
    outboxes: Arc<dyn Outboxes>,
) -> ResponseResult<()> {
    let Some(user) = msg.from.as_ref().map(|u| u.id.0) else {
        debug!(chat = msg.chat.id.0, "command without sender ignored");
        return Ok(());
    };
    let out = outboxes.for_chat(msg.chat.id);
    info!(user, chat = msg.chat.id.0, cmd = command_name(&cmd), "command received");
    let res = match cmd {
        Command::Start => relay.start(out.as_ref()).await,
        Command::Help => relay.help(out.as_ref()).await,
        Command::Reset => relay.reset(user, out.as_ref()).await,
        Command::Img(prompt) => relay.image(&prompt, out.as_ref()).await,
    };
    if let Err(e) = res {
        error!(user, error = %e, "failed to answer command");
    }
    Ok(())
}

fn command_name(cmd: &Command) -> &'static str {
    match cmd {
        Command::Start => "start",
        Command::Help => "help",
        Command::Img(_) => "img",
        Command::Reset => "reset",
    }
}

async fn chat_handler(
    msg: Message,
    text: String,
    relay: Relay,
    outboxes: Arc<dyn Outboxes>,
) -> ResponseResult<()> {
    let Some(user) = msg.from.as_ref().map(|u| u.id.0) else {
        debug!(chat = msg.chat.id.0, "message without sender ignored");
        return Ok(());
    };
    let out = outboxes.for_chat(msg.chat.id);
    debug!(user, chat = msg.chat.id.0, %text, "message received");
    if let Err(e) = relay.chat(user, &text, out.as_ref()).await {
        error!(user, error = %e, "failed to answer message");
    }
    Ok(())
}

/// Commands go to the command handler; other non-slash text is a chat turn.
///
/// Needs [`Relay`], [`BotName`] and `Arc<dyn Outboxes>` among the
/// dependencies. Unknown slash commands match neither branch.
pub fn schema() -> UpdateHandler<teloxide::RequestError> {
    Update::filter_message()
        .branch(
            dptree::filter_map(|msg: Message, name: BotName| {
                msg.text()
                    .and_then(|t| Command::parse_message(t, &name.0).ok())
            })
            .endpoint(command_handler),
        )
        .branch(
            dptree::filter_map(|msg: Message| {
                msg.text()
                    .filter(|t| !t.starts_with('/'))
                    .map(str::to_owned)
            })
            .endpoint(chat_handler),
        )
}

/// Connect to Telegram and serve until ctrl-c.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let bot = Bot::new(config.telegram_token.as_str());
    let me: Me = bot
        .get_me()
        .await
        .context("telegram rejected the bot token")?;
    info!(username = me.username(), "bot authenticated");

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!(error = %e, "failed to register command list");
    }

    let openai = Arc::new(OpenAiClient::new(config.openai.clone()));
    let relay = Relay::new(
        Arc::new(HistoryStore::new(config.max_turns)),
        openai.clone(),
        openai,
        config.system_prompt,
    )
    .with_texts(config.locale.texts());
    let name = BotName(me.username().to_owned());
    let outboxes: Arc<dyn Outboxes> = Arc::new(BotOutboxes::new(bot.clone()));

    info!(
        model = %config.openai.chat_model,
        image_model = %config.openai.image_model,
        max_turns = config.max_turns,
        locale = ?config.locale,
        "relay running"
    );
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![relay, name, outboxes])
        .default_handler(|upd| async move {
            debug!(?upd, "unhandled update");
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "error in update handler",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("dispatcher stopped");
    Ok(())
}
