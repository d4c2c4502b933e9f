//! User-facing strings, one table per locale.

use clap::ValueEnum;

/// Everything the bot says on its own behalf.
#[derive(Debug)]
pub struct Texts {
    pub greeting: &'static str,
    pub help: &'static str,
    pub reset_done: &'static str,
    pub image_usage: &'static str,
    pub image_caption: &'static str,
    pub image_missing: &'static str,
    pub empty_answer: &'static str,
    /// Prefix of the reply sent when a completion fails.
    pub completion_error: &'static str,
    /// Prefix of the reply sent when image generation fails.
    pub image_error: &'static str,
    pub system_prompt: &'static str,
}

impl Texts {
    pub const RU: Texts = Texts {
        greeting: "Привет! Я AI-бот 🤖\n\n\
• Просто пиши текст — отвечу как ChatGPT\n\
• Картинки: /img описание\n\
Пример: /img фотореалистичный портрет, студийный свет",
        help: "Команды:\n\
/start — старт\n\
/help — помощь\n\
/img <описание> — сгенерировать изображение\n\
/reset — очистить память диалога",
        reset_done: "Память диалога очищена ✅",
        image_usage: "Напиши так: /img описание картинки",
        image_caption: "Готово ✅",
        image_missing: "Не смог получить картинку из ответа 😅 Попробуй другое описание.",
        empty_answer: "Не понял 😅",
        completion_error: "Ошибка OpenAI: ",
        image_error: "Ошибка генерации изображения: ",
        system_prompt: "Ты дружелюбный ИИ-помощник в Telegram. Отвечай по-русски, кратко и по делу. \
Если пользователь просит картинку — попроси написать /img и описание.",
    };

    pub const EN: Texts = Texts {
        greeting: "Hi! I'm an AI bot 🤖\n\n\
• Just send text and I'll answer like ChatGPT\n\
• Pictures: /img description\n\
Example: /img photorealistic portrait, studio lighting",
        help: "Commands:\n\
/start — start\n\
/help — help\n\
/img <description> — generate an image\n\
/reset — clear the conversation memory",
        reset_done: "Conversation memory cleared ✅",
        image_usage: "Send it like this: /img image description",
        image_caption: "Done ✅",
        image_missing: "Couldn't get a picture out of the response 😅 Try a different description.",
        empty_answer: "I didn't get that 😅",
        completion_error: "Completion error: ",
        image_error: "Image generation error: ",
        system_prompt: "You are a friendly AI assistant in Telegram. \
Answer briefly and to the point. \
If the user asks for a picture, tell them to send /img followed by a description.",
    };
}

/// Language of the bot's own messages and default system prompt.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Locale {
    #[default]
    Ru,
    En,
}

impl Locale {
    pub fn texts(self) -> &'static Texts {
        match self {
            Locale::Ru => &Texts::RU,
            Locale::En => &Texts::EN,
        }
    }
}
