use std::sync::Arc;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
        CreateImageRequestArgs, Image, ImageModel, ImageSize,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::interaction::Responder;

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("OpenAI request failed: {0}")]
    Api(#[from] OpenAIError),
    #[error("OpenAI returned no completion")]
    EmptyCompletion,
    #[error("unsupported image size '{0}'")]
    UnsupportedSize(String),
    #[error("cannot generate {0} pictures, pick between 1 and 10")]
    InvalidCount(u8),
}

/// Text and image generation as seen by the cog.
#[async_trait]
pub trait AiClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, AiError>;

    /// Returns one URL per generated picture, in the order the API produced them.
    async fn generate_images(
        &self,
        prompt: &str,
        size: &str,
        count: u8,
    ) -> Result<Vec<String>, AiError>;
}

/// Composes and delivers a direct message on behalf of a `dm` invocation.
#[async_trait]
pub trait DmHandler: Send + Sync {
    async fn handle_dm(
        &self,
        responder: &dyn Responder,
        message: &str,
        default_response: &str,
        bot: &str,
        user: &str,
    ) -> anyhow::Result<()>;
}

pub fn parse_image_size(size: &str) -> Result<ImageSize, AiError> {
    match size.trim() {
        "256x256" => Ok(ImageSize::S256x256),
        "512x512" => Ok(ImageSize::S512x512),
        "1024x1024" => Ok(ImageSize::S1024x1024),
        "1792x1024" => Ok(ImageSize::S1792x1024),
        "1024x1792" => Ok(ImageSize::S1024x1792),
        other => Err(AiError::UnsupportedSize(other.to_string())),
    }
}

pub fn check_image_count(count: u8) -> Result<u8, AiError> {
    if (1..=10).contains(&count) {
        Ok(count)
    } else {
        Err(AiError::InvalidCount(count))
    }
}

fn image_model(name: &str) -> ImageModel {
    match name {
        "dall-e-2" => ImageModel::DallE2,
        "dall-e-3" => ImageModel::DallE3,
        other => ImageModel::Other(other.to_string()),
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    chat_model: String,
    image_model: String,
}

impl OpenAiClient {
    pub fn new(settings: &Settings) -> Self {
        let config = OpenAIConfig::new().with_api_key(&settings.open_ai_token);

        Self {
            client: Client::with_config(config),
            chat_model: settings.chat_model.clone(),
            image_model: settings.image_model.clone(),
        }
    }
}

#[async_trait]
impl AiClient for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String, AiError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.chat_model)
            .messages([ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()?
                .into()])
            .build()?;

        let response = self.client.chat().create(request).await?;
        debug!(
            model = %response.model,
            choices = response.choices.len(),
            "chat completion received"
        );

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(AiError::EmptyCompletion)
    }

    async fn generate_images(
        &self,
        prompt: &str,
        size: &str,
        count: u8,
    ) -> Result<Vec<String>, AiError> {
        let request = CreateImageRequestArgs::default()
            .prompt(prompt)
            .model(image_model(&self.image_model))
            .size(parse_image_size(size)?)
            .n(check_image_count(count)?)
            .build()?;

        let response = self.client.images().create(request).await?;

        // url is the default response format, base64 payloads are skipped
        Ok(response
            .data
            .iter()
            .filter_map(|image| match &**image {
                Image::Url { url, .. } => Some(url.clone()),
                Image::B64Json { .. } => None,
            })
            .collect())
    }
}

/// Answers a `dm` request by DMing the user a completion of their message.
pub struct OpenAiDm {
    ai: Arc<dyn AiClient>,
}

impl OpenAiDm {
    pub fn new(ai: Arc<dyn AiClient>) -> Self {
        Self { ai }
    }
}

#[async_trait]
impl DmHandler for OpenAiDm {
    async fn handle_dm(
        &self,
        responder: &dyn Responder,
        message: &str,
        default_response: &str,
        bot: &str,
        user: &str,
    ) -> anyhow::Result<()> {
        let body = match self.ai.complete(message).await {
            Ok(completion) if !completion.trim().is_empty() => completion,
            Ok(_) => default_response.to_string(),
            Err(e) => {
                warn!(error = %e, %user, "falling back to the default DM");
                default_response.to_string()
            }
        };

        responder.direct_message(&body).await?;
        tracing::info!(target: "command", %bot, %user, "{bot} >> {user} (DM): {body}");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{Followup, Reply};
    use std::sync::Mutex;

    struct CannedAi(Result<String, ()>);

    #[async_trait]
    impl AiClient for CannedAi {
        async fn complete(&self, _prompt: &str) -> Result<String, AiError> {
            self.0.clone().map_err(|_| AiError::EmptyCompletion)
        }

        async fn generate_images(&self, _: &str, _: &str, _: u8) -> Result<Vec<String>, AiError> {
            Ok(vec![])
        }
    }

    #[derive(Default)]
    struct DmInbox(Mutex<Vec<String>>);

    #[async_trait]
    impl Responder for DmInbox {
        async fn reply(&self, _: Reply) -> anyhow::Result<()> {
            Ok(())
        }

        async fn defer(&self, _: bool) -> anyhow::Result<()> {
            Ok(())
        }

        async fn follow_up(&self, _: Followup, _: bool) -> anyhow::Result<()> {
            Ok(())
        }

        async fn direct_message(&self, content: &str) -> anyhow::Result<()> {
            self.0.lock().unwrap().push(content.to_string());
            Ok(())
        }
    }

    #[test]
    fn parses_known_sizes() {
        assert!(matches!(parse_image_size("256x256"), Ok(ImageSize::S256x256)));
        assert!(matches!(parse_image_size(" 1024x1024 "), Ok(ImageSize::S1024x1024)));
        assert!(matches!(
            parse_image_size("300x300"),
            Err(AiError::UnsupportedSize(s)) if s == "300x300"
        ));
    }

    #[test]
    fn image_count_must_be_between_one_and_ten() {
        assert!(matches!(check_image_count(1), Ok(1)));
        assert!(matches!(check_image_count(10), Ok(10)));
        assert!(matches!(check_image_count(0), Err(AiError::InvalidCount(0))));
        assert!(matches!(check_image_count(11), Err(AiError::InvalidCount(11))));
    }

    #[tokio::test]
    async fn dm_carries_the_completion() {
        let dm = OpenAiDm::new(Arc::new(CannedAi(Ok("hey there".into()))));
        let inbox = DmInbox::default();

        dm.handle_dm(&inbox, "hi", "default", "bot#0001", "user#0001")
            .await
            .unwrap();

        assert_eq!(*inbox.0.lock().unwrap(), vec!["hey there".to_string()]);
    }

    #[tokio::test]
    async fn dm_uses_default_when_ai_fails_or_is_blank() {
        for ai in [CannedAi(Err(())), CannedAi(Ok("   ".into()))] {
            let dm = OpenAiDm::new(Arc::new(ai));
            let inbox = DmInbox::default();

            dm.handle_dm(&inbox, "hi", "default", "bot", "user")
                .await
                .unwrap();

            assert_eq!(*inbox.0.lock().unwrap(), vec!["default".to_string()]);
        }
    }
}
