use std::{future::Future, time::Duration};

use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{ChatCompletionRequestMessage, CreateChatCompletionRequestArgs},
};
use schemars::{JsonSchema, r#gen::SchemaGenerator};
use tracing::debug;

use crate::{config::AiConfig, error::GenerationError};

/// A text generation endpoint. Given a prompt it returns free-form text, or
/// `None` when the service answered without any text.
pub trait TextGenerator: Send + Sync {
    fn generate(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<Option<String>, GenerationError>> + Send;
}

/// Chat-completion client for any OpenAI compatible endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiGenerator {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiGenerator {
    pub fn new(config: &AiConfig) -> anyhow::Result<Self> {
        let mut openai = OpenAIConfig::default().with_api_key(config.api_key()?);
        if let Some(base_url) = config.base_url() {
            openai = openai.with_api_base(base_url);
        }
        Ok(Self {
            client: Client::with_config(openai),
            model: config.model(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, prompt: &str) -> Result<Option<String>, GenerationError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.as_str())
            .messages(vec![ChatCompletionRequestMessage::User(prompt.into())])
            .build()?;
        let response = self.client.chat().create(request).await?;
        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content);
        debug!("Raw response: {:?}", text);
        Ok(text)
    }
}

/// Run one generation request, giving up after `timeout`.
pub async fn generate_with_timeout<G: TextGenerator>(
    generator: &G,
    prompt: &str,
    timeout: Duration,
) -> Result<Option<String>, GenerationError> {
    match tokio::time::timeout(timeout, generator.generate(prompt)).await {
        Ok(result) => result,
        Err(_) => Err(GenerationError::Timeout(timeout)),
    }
}

pub fn get_json_generator() -> SchemaGenerator {
    let mut settings = schemars::r#gen::SchemaSettings::draft07();
    settings.option_add_null_type = false;
    settings.option_nullable = false;
    settings.inline_subschemas = true;
    SchemaGenerator::new(settings)
}

/// JSON schema of a list of `T`, pretty printed, for embedding into prompts.
pub fn list_schema<T: JsonSchema>() -> String {
    let schema = get_json_generator().into_root_schema_for::<Vec<T>>();
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}
