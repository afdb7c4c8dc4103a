// Content generation using OpenAI
//
// This is the infrastructure implementation of ContentGenerator.
// Business logic (what to prompt for) lives in the jobs domain.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use openai_client::{ChatRequest, Message, OpenAIClient};

use super::traits::ContentGenerator;

/// OpenAI implementation of content generation.
///
/// Built unconfigured when no API key is present; the worker treats that as a
/// job-fatal condition before touching any target.
#[derive(Clone)]
pub struct OpenAiGenerator {
    client: Option<OpenAIClient>,
    model: String,
    temperature: f32,
}

impl OpenAiGenerator {
    pub fn new(api_key: Option<String>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            client: api_key.map(OpenAIClient::new),
            model: model.into(),
            temperature: temperature.clamp(0.0, 1.0),
        }
    }
}

#[async_trait]
impl ContentGenerator for OpenAiGenerator {
    fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    async fn complete_json(&self, messages: Vec<Message>) -> Result<serde_json::Value> {
        let Some(client) = &self.client else {
            bail!("OpenAI API key is not configured");
        };

        tracing::debug!(
            model = %self.model,
            message_count = messages.len(),
            "calling OpenAI for JSON completion"
        );

        let request = ChatRequest::new(&self.model)
            .temperature(self.temperature)
            .messages(messages);

        client
            .chat_completion_json(request)
            .await
            .context("OpenAI JSON completion failed")
    }
}
