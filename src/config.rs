use anyhow::{Context as _, Result};
use shuttle_runtime::SecretStore;

/// Descriptions shown next to each slash command in the Discord client.
pub static COMMAND_DESCRIPTIONS: &[(&str, &str)] = &[
    ("chatgpt", "Ask ChatGPT something and get the answer in this channel"),
    ("dm", "Get a direct message from the bot"),
    ("image", "Generate pictures from a description"),
];

/// Body handed to the DM handler when nothing better is available.
pub static DEFAULT_DM_MESSAGE: &str =
    "Hi! I'm here if you want to talk. Reply to this message to keep chatting.";

pub fn command_description(name: &str) -> Option<&'static str> {
    COMMAND_DESCRIPTIONS
        .iter()
        .find(|(command, _)| *command == name)
        .map(|(_, description)| *description)
}

const DEFAULT_CHAT_MODEL: &str = "gpt-4o";
// 256x256 is only offered by dall-e-2
const DEFAULT_IMAGE_MODEL: &str = "dall-e-2";

#[derive(Debug, Clone)]
pub struct Settings {
    pub discord_token: String,
    pub open_ai_token: String,
    pub chat_model: String,
    pub image_model: String,
}

impl Settings {
    pub fn from_secrets(secret_store: &SecretStore) -> Result<Self> {
        Self::from_lookup(|key| secret_store.get(key))
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let discord_token = lookup("DISCORD_TOKEN").context("'DISCORD_TOKEN' was not found")?;
        let open_ai_token = lookup("OPEN_AI_TOKEN").context("'OPEN_AI_TOKEN' was not found")?;

        Ok(Self {
            discord_token,
            open_ai_token,
            chat_model: lookup("OPEN_AI_CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.into()),
            image_model: lookup("OPEN_AI_IMAGE_MODEL")
                .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.into()),
        })
    }
}
