use anyhow::{bail, Context as _, Result};
use async_trait::async_trait;
use futures::future::BoxFuture;
use poise::serenity_prelude as serenity;
use tracing::error;

use crate::cog::CommandSync;
use crate::config::command_description;
use crate::interaction::{Invocation, PoiseResponder, UserIdentity};
use crate::{Context, Data, Error};

type Command = poise::Command<Data, Error>;

fn invocation(ctx: Context<'_>) -> Invocation {
    Invocation::new(&ctx.command().name, UserIdentity::from_user(ctx.author()))
}

/// Ask ChatGPT something
#[poise::command(slash_command)]
pub async fn chatgpt(
    ctx: Context<'_>,
    #[description = "What you want to discuss with ChatGPT"] message: Option<String>,
) -> Result<(), Error> {
    let invocation = invocation(ctx).message(message);
    ctx.data()
        .cog
        .chatgpt(invocation, &PoiseResponder::new(ctx))
        .await
}

/// Get a direct message from the bot
#[poise::command(slash_command)]
pub async fn dm(
    ctx: Context<'_>,
    #[description = "What the DM should be about"] message: Option<String>,
) -> Result<(), Error> {
    let invocation = invocation(ctx).message(message);
    ctx.data()
        .cog
        .dm(invocation, &PoiseResponder::new(ctx))
        .await
}

/// Generate pictures from a description
#[poise::command(slash_command)]
pub async fn image(
    ctx: Context<'_>,
    #[description = "What you want the AI to draw"] message: Option<String>,
    #[description = "Picture size, e.g. 256x256, 512x512 or 1024x1024"] size: Option<String>,
    #[description = "How many pictures to generate"]
    #[min = 1]
    #[max = 10]
    num_of_pictures: Option<u8>,
) -> Result<(), Error> {
    let invocation = invocation(ctx)
        .message(message)
        .size(size)
        .count(num_of_pictures);
    ctx.data()
        .cog
        .image(invocation, &PoiseResponder::new(ctx))
        .await
}

/// Command tree handed to the framework, described from the command table.
#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<Command>,
}

impl CommandRegistry {
    pub fn register(mut self, mut command: Command) -> Result<Self> {
        if self.commands.iter().any(|c| c.name == command.name) {
            bail!("command '{}' registered twice", command.name);
        }
        let description = command_description(&command.name)
            .with_context(|| format!("no description for command '{}'", command.name))?;

        command.description = Some(description.to_string());
        self.commands.push(command);
        Ok(self)
    }

    pub fn build(self) -> Vec<Command> {
        self.commands
    }
}

pub fn openai_commands() -> Result<Vec<Command>> {
    Ok(CommandRegistry::default()
        .register(chatgpt())?
        .register(dm())?
        .register(image())?
        .build())
}

/// Registers the command tree globally through the Discord HTTP API.
pub struct GlobalSync<'a> {
    ctx: &'a serenity::Context,
    commands: &'a [Command],
}

impl<'a> GlobalSync<'a> {
    pub fn new(ctx: &'a serenity::Context, commands: &'a [Command]) -> Self {
        Self { ctx, commands }
    }
}

#[async_trait]
impl CommandSync for GlobalSync<'_> {
    async fn sync(&self) -> Result<()> {
        poise::builtins::register_globally(self.ctx, self.commands).await?;
        Ok(())
    }
}

pub fn on_error(error: poise::FrameworkError<'_, Data, Error>) -> BoxFuture<'_, ()> {
    Box::pin(async move {
        if let poise::FrameworkError::Command { error, ctx, .. } = &error {
            error!(command = %ctx.command().name, user = %ctx.author().tag(), "{error:#}");
        }
        if let Err(e) = poise::builtins::on_error(error).await {
            error!("error while handling error: {e}");
        }
    })
}
