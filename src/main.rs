use clap::Parser;
use daemon_common::{LogLevel, init_logging, maybe_daemonize};
use std::path::{Path, PathBuf};
use tg_relay::config::{DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL, DEFAULT_IMAGE_MODEL};
use tg_relay::{Config, ConfigError, Locale, MAX_TURNS};
use tracing::{debug, error, info};

#[derive(Parser, Debug)]
#[command(
    name = "tg-relay",
    version,
    about = "Telegram bot relaying chats to an OpenAI model"
)]
struct Cli {
    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_TOKEN", hide_env_values = true)]
    telegram_token: Option<String>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    openai_base_url: String,

    /// Chat completion model
    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_CHAT_MODEL)]
    model: String,

    /// Image generation model
    #[arg(long, env = "OPENAI_IMAGE_MODEL", default_value = DEFAULT_IMAGE_MODEL)]
    image_model: String,

    /// User/assistant exchanges remembered per user
    #[arg(long, env = "MAX_TURNS", default_value_t = MAX_TURNS)]
    max_turns: usize,

    /// Language of the bot's replies and default system prompt
    #[arg(long, env = "BOT_LOCALE", value_enum, default_value_t = Locale::Ru)]
    locale: Locale,

    /// Override the locale's system prompt
    #[arg(long, env = "SYSTEM_PROMPT")]
    system_prompt: Option<String>,

    /// Logging verbosity level
    #[arg(long, default_value = "info")]
    log_level: LogLevel,

    /// Run as a background daemon
    #[arg(short = 'd', long)]
    daemon: bool,
}

impl Cli {
    fn into_config(self) -> Result<Config, ConfigError> {
        let mut config = Config::new(self.telegram_token, self.openai_api_key)?;
        config.openai.base_url = self.openai_base_url;
        config.openai.chat_model = self.model;
        config.openai.image_model = self.image_model;
        config.max_turns = self.max_turns;
        config.locale = self.locale;
        config.system_prompt = self
            .system_prompt
            .unwrap_or_else(|| self.locale.texts().system_prompt.to_owned());
        Ok(config)
    }
}

/// Load `KEY=value` lines into the process environment.
///
/// Variables already set win over the file. A missing file is not an error.
fn load_env_file(path: Option<&Path>) -> Option<PathBuf> {
    match path {
        Some(path) => dotenvy::from_path(path).ok().map(|_| path.to_path_buf()),
        None => dotenvy::dotenv().ok(),
    }
}

fn main() -> anyhow::Result<()> {
    let env_file = load_env_file(None);
    let cli = Cli::parse();
    init_logging(cli.log_level);
    match &env_file {
        Some(path) => debug!(path = %path.display(), "loaded environment file"),
        None => debug!("no .env file found"),
    }
    let daemon = cli.daemon;

    let config = cli.into_config().inspect_err(|e| {
        error!(error = %e, "invalid configuration");
    })?;
    maybe_daemonize(daemon)?;

    info!(?config, "starting");
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(tg_relay::telegram::run(config))
}
