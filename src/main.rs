mod cog;
mod commands;
mod config;
mod interaction;
mod open_ai;

use std::sync::Arc;

use cog::{BotState, OpenAiCog};
use commands::GlobalSync;
use config::Settings;
use open_ai::{AiClient, OpenAiClient, OpenAiDm};
use poise::serenity_prelude as serenity;
use shuttle_runtime::{SecretStore, Secrets};
use shuttle_serenity::ShuttleSerenity;
use tracing::info;

type Error = anyhow::Error;
type Context<'a> = poise::Context<'a, Data, Error>;

/// User data every command can reach through `ctx.data()`.
pub struct Data {
    pub cog: OpenAiCog,
}

/**
* Runtime for the bot. Runs on poise and deploys using shuttle, which also
* installs the tracing subscriber.
*/
#[shuttle_runtime::main]
async fn poise(#[Secrets] secret_store: SecretStore) -> ShuttleSerenity {
    let settings = Settings::from_secrets(&secret_store)?;

    let ai: Arc<dyn AiClient> = Arc::new(OpenAiClient::new(&settings));
    let dm_handler = Arc::new(OpenAiDm::new(ai.clone()));
    let state = BotState::default();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::openai_commands()?,
            on_error: commands::on_error,
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                let cog = OpenAiCog::new(ai, dm_handler, ready.user.tag());

                // push the command tree and count the cog as loaded
                let sync = GlobalSync::new(ctx, &framework.options().commands);
                cog.on_ready(&sync, &state).await?;
                info!(
                    bot = %ready.user.tag(),
                    loaded_cogs = state.loaded_cogs(),
                    "bot is ready"
                );

                Ok(Data { cog })
            })
        })
        .build();

    let client = serenity::ClientBuilder::new(
        &settings.discord_token,
        serenity::GatewayIntents::non_privileged(),
    )
    .framework(framework)
    .await
    .map_err(shuttle_runtime::CustomError::new)?;

    Ok(client.into())
}
