//! The OpenAI cog: `/chatgpt`, `/dm` and `/image`.
//!
//! Every handler ends in exactly one terminal response on the interaction:
//! an immediate reply, a deferral followed by follow-ups, or an ephemeral notice.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::DEFAULT_DM_MESSAGE;
use crate::interaction::{Followup, Invocation, Reply, Responder};
use crate::open_ai::{AiClient, DmHandler};

const COG_NAME: &str = "cogs.openai";

pub const DEFAULT_IMAGE_SIZE: &str = "256x256";
pub const DEFAULT_IMAGE_COUNT: u8 = 1;
pub const DEFAULT_DM_PROMPT: &str =
    "This is the default message when the user doesn't provide one.";

pub const MISSING_CHAT_MESSAGE: &str = "Please provide a message to discuss with ChatGPT.";
pub const MISSING_IMAGE_PROMPT: &str = "You have to provide what you want the AI to generate.";
pub const DM_SENT: &str = "I have sent you a DM";

/// State the bot shares with every cog it loads.
#[derive(Debug, Default)]
pub struct BotState {
    loaded_cogs: AtomicUsize,
}

impl BotState {
    pub fn cog_loaded(&self) {
        self.loaded_cogs.fetch_add(1, Ordering::SeqCst);
    }

    pub fn loaded_cogs(&self) -> usize {
        self.loaded_cogs.load(Ordering::SeqCst)
    }
}

/// Pushes the registered command tree to Discord.
#[async_trait]
pub trait CommandSync: Send + Sync {
    async fn sync(&self) -> Result<()>;
}

pub struct OpenAiCog {
    ai: Arc<dyn AiClient>,
    dm_handler: Arc<dyn DmHandler>,
    bot: String,
}

impl OpenAiCog {
    pub fn new(
        ai: Arc<dyn AiClient>,
        dm_handler: Arc<dyn DmHandler>,
        bot: impl Into<String>,
    ) -> Self {
        Self {
            ai,
            dm_handler,
            bot: bot.into(),
        }
    }

    pub async fn on_ready(&self, sync: &dyn CommandSync, state: &BotState) -> Result<()> {
        info!("{COG_NAME}: Initializing...");
        sync.sync().await?;
        state.cog_loaded();
        info!("{COG_NAME}: Initialized");
        Ok(())
    }

    fn log_command_execution(&self, invocation: &Invocation) {
        info!(
            target: "command",
            command = %invocation.command,
            user = %invocation.user.tag,
            "Command '{}' executed by {}",
            invocation.command,
            invocation.user.tag
        );
    }

    pub async fn chatgpt(&self, invocation: Invocation, responder: &dyn Responder) -> Result<()> {
        self.log_command_execution(&invocation);

        let Some(message) = invocation.message else {
            warn!("No message provided!");
            return responder.reply(Reply::ephemeral(MISSING_CHAT_MESSAGE)).await;
        };
        let user = &invocation.user;

        info!(
            target: "command",
            user = %user.tag,
            bot = %self.bot,
            "{} >> {}: {}",
            user.tag,
            self.bot,
            message
        );
        let completion = self.ai.complete(&message).await?;
        responder
            .reply(Reply::public(format!("{}: {}", user.mention, completion)))
            .await?;
        info!(
            target: "command",
            user = %user.tag,
            bot = %self.bot,
            "{} >> {}: {}",
            self.bot,
            user.tag,
            completion
        );

        Ok(())
    }

    /// Confirms the DM even when the handler failed; the failure only reaches the log.
    pub async fn dm(&self, invocation: Invocation, responder: &dyn Responder) -> Result<()> {
        self.log_command_execution(&invocation);

        // the handler may talk to the AI before the DM goes out
        responder.defer(true).await?;

        let message = invocation
            .message
            .unwrap_or_else(|| DEFAULT_DM_PROMPT.to_string());

        if let Err(e) = self
            .dm_handler
            .handle_dm(
                responder,
                &message,
                DEFAULT_DM_MESSAGE,
                &self.bot,
                &invocation.user.tag,
            )
            .await
        {
            warn!(error = %e, user = %invocation.user.tag, "DM delivery failed");
        }

        responder
            .follow_up(Followup::Text(DM_SENT.to_string()), true)
            .await
    }

    pub async fn image(&self, invocation: Invocation, responder: &dyn Responder) -> Result<()> {
        self.log_command_execution(&invocation);

        let Some(prompt) = invocation.message else {
            return responder.reply(Reply::ephemeral(MISSING_IMAGE_PROMPT)).await;
        };
        let size = invocation
            .size
            .unwrap_or_else(|| DEFAULT_IMAGE_SIZE.to_string());
        let count = invocation.count.unwrap_or(DEFAULT_IMAGE_COUNT);

        // generation outlives the interaction's response window
        responder.defer(true).await?;

        let urls = self.ai.generate_images(&prompt, &size, count).await?;
        info!(?urls, "generated images");

        for url in urls {
            responder.follow_up(Followup::Image { url }, true).await?;
        }

        Ok(())
    }
}
