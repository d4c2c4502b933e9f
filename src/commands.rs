use teloxide::utils::command::{BotCommands, ParseError};

/// Slash commands understood by the bot.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Commands:")]
pub enum Command {
    #[command(description = "start")]
    Start,
    #[command(description = "help")]
    Help,
    #[command(description = "generate an image: /img <description>", alias = "image")]
    Img(String),
    #[command(description = "clear the conversation memory")]
    Reset,
}

impl Command {
    /// Parse a message, letting any whitespace end the command token.
    ///
    /// `BotCommands::parse` only splits on a space, so `/img` followed by a
    /// newline or tab would otherwise be an unknown command.
    pub fn parse_message(text: &str, bot_username: &str) -> Result<Self, ParseError> {
        let text = text.trim();
        let normalized = match text.split_once(char::is_whitespace) {
            Some((token, rest)) => format!("{token} {}", rest.trim_start()),
            None => text.to_owned(),
        };
        Self::parse(normalized.trim_end(), bot_username)
    }
}
