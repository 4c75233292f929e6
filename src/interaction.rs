//! Request-scoped view of a slash command and the channel used to answer it.

use anyhow::Result;
use async_trait::async_trait;
use poise::serenity_prelude::{self as serenity, Mentionable};
use poise::CreateReply;

use crate::Context;

/// Who invoked a command, in the two forms the cog needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    /// Display form used in logs and handed to the DM handler.
    pub tag: String,
    /// Discord mention markup, e.g. `<@1234>`.
    pub mention: String,
}

impl UserIdentity {
    pub fn new(tag: impl Into<String>, mention: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            mention: mention.into(),
        }
    }

    pub fn from_user(user: &serenity::User) -> Self {
        Self::new(user.tag(), user.mention().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: String,
    pub user: UserIdentity,
    pub message: Option<String>,
    pub size: Option<String>,
    pub count: Option<u8>,
}

impl Invocation {
    pub fn new(command: impl Into<String>, user: UserIdentity) -> Self {
        Self {
            command: command.into(),
            user,
            message: None,
            size: None,
            count: None,
        }
    }

    pub fn message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }

    pub fn size(mut self, size: Option<String>) -> Self {
        self.size = size;
        self
    }

    pub fn count(mut self, count: Option<u8>) -> Self {
        self.count = count;
        self
    }
}

/// An immediate answer to an interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub content: String,
    pub ephemeral: bool,
}

impl Reply {
    pub fn public(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: false,
        }
    }

    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: true,
        }
    }
}

/// A message sent after the interaction was deferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Followup {
    Text(String),
    /// A single embed showing the image at `url`.
    Image { url: String },
}

/// Response channel of one interaction.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn reply(&self, reply: Reply) -> Result<()>;

    async fn defer(&self, ephemeral: bool) -> Result<()>;

    async fn follow_up(&self, followup: Followup, ephemeral: bool) -> Result<()>;

    /// Sends `content` to the invoking user's DM channel.
    async fn direct_message(&self, content: &str) -> Result<()>;
}

pub struct PoiseResponder<'a> {
    ctx: Context<'a>,
}

impl<'a> PoiseResponder<'a> {
    pub fn new(ctx: Context<'a>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Responder for PoiseResponder<'_> {
    async fn reply(&self, reply: Reply) -> Result<()> {
        self.ctx
            .send(
                CreateReply::default()
                    .content(reply.content)
                    .ephemeral(reply.ephemeral),
            )
            .await?;
        Ok(())
    }

    async fn defer(&self, ephemeral: bool) -> Result<()> {
        if ephemeral {
            self.ctx.defer_ephemeral().await?;
        } else {
            self.ctx.defer().await?;
        }
        Ok(())
    }

    // poise turns `send` into a followup once the interaction has been deferred
    async fn follow_up(&self, followup: Followup, ephemeral: bool) -> Result<()> {
        let reply = match followup {
            Followup::Text(content) => CreateReply::default().content(content),
            Followup::Image { url } => {
                CreateReply::default().embed(serenity::CreateEmbed::new().image(url))
            }
        };
        self.ctx.send(reply.ephemeral(ephemeral)).await?;
        Ok(())
    }

    async fn direct_message(&self, content: &str) -> Result<()> {
        self.ctx
            .author()
            .direct_message(
                self.ctx.serenity_context(),
                serenity::CreateMessage::new().content(content),
            )
            .await?;
        Ok(())
    }
}
