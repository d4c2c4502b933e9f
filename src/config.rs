use crate::error::ConfigError;
use crate::history::MAX_TURNS;
use crate::texts::Locale;
use std::fmt;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_IMAGE_MODEL: &str = "gpt-image-1";

/// Connection settings for the OpenAI-compatible API.
#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    pub image_model: String,
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("chat_model", &self.chat_model)
            .field("image_model", &self.image_model)
            .finish()
    }
}

/// Everything the relay needs at startup, resolved once in `main`.
#[derive(Clone)]
pub struct Config {
    pub telegram_token: String,
    pub openai: OpenAiConfig,
    pub max_turns: usize,
    pub locale: Locale,
    pub system_prompt: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("telegram_token", &"<redacted>")
            .field("openai", &self.openai)
            .field("max_turns", &self.max_turns)
            .field("locale", &self.locale)
            .field("system_prompt", &self.system_prompt)
            .finish()
    }
}

fn require(name: &'static str, value: Option<String>) -> Result<String, ConfigError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

impl Config {
    /// Build a config from the two required secrets, filling in defaults.
    ///
    /// ```
    /// use tg_relay::config::Config;
    /// use tg_relay::error::ConfigError;
    /// let err = Config::new(Some("token".into()), None).unwrap_err();
    /// assert_eq!(err, ConfigError::Missing("OPENAI_API_KEY"));
    /// ```
    pub fn new(
        telegram_token: Option<String>,
        openai_api_key: Option<String>,
    ) -> Result<Self, ConfigError> {
        let telegram_token = require("TELEGRAM_TOKEN", telegram_token)?;
        let api_key = require("OPENAI_API_KEY", openai_api_key)?;
        Ok(Self {
            telegram_token,
            openai: OpenAiConfig {
                api_key,
                base_url: DEFAULT_BASE_URL.into(),
                chat_model: DEFAULT_CHAT_MODEL.into(),
                image_model: DEFAULT_IMAGE_MODEL.into(),
            },
            max_turns: MAX_TURNS,
            locale: Locale::default(),
            system_prompt: Locale::default().texts().system_prompt.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_token_is_reported_first() {
        let err = Config::new(None, None).unwrap_err();
        assert_eq!(err, ConfigError::Missing("TELEGRAM_TOKEN"));
    }

    #[test]
    fn blank_secret_counts_as_missing() {
        let err = Config::new(Some("t".into()), Some("   ".into())).unwrap_err();
        assert_eq!(err, ConfigError::Missing("OPENAI_API_KEY"));
    }

    #[test]
    fn fills_defaults() {
        let cfg = Config::new(Some(" t ".into()), Some("k".into())).unwrap();
        assert_eq!(cfg.telegram_token, "t");
        assert_eq!(cfg.openai.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.openai.chat_model, "gpt-4o-mini");
        assert_eq!(cfg.max_turns, 10);
        assert_eq!(cfg.locale, Locale::Ru);
        assert_eq!(cfg.system_prompt, Locale::Ru.texts().system_prompt);
    }

    #[test]
    fn debug_hides_secrets() {
        let cfg = Config::new(Some("tg-secret".into()), Some("sk-secret".into())).unwrap();
        let shown = format!("{cfg:?}");
        assert!(!shown.contains("tg-secret"));
        assert!(!shown.contains("sk-secret"));
    }
}
