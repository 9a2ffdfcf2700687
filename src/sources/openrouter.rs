//! OpenRouter chat-completion classifier for headlines.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{parse_label, HeadlineClassifier};
use crate::error::SourceError;
use crate::types::Bias;

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Prompt sent for a single headline.
pub fn build_prompt(headline: &str, symbol: &str) -> String {
    format!(
        "Classify this headline for {} as exactly one word: Bullish, Bearish, or Neutral. Headline: '{}'",
        symbol, headline
    )
}

pub struct OpenRouterClassifier {
    client: Client,
    api_key: String,
    model: String,
}

impl OpenRouterClassifier {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl HeadlineClassifier for OpenRouterClassifier {
    fn name(&self) -> &'static str {
        "OpenRouter"
    }

    async fn classify(&self, headline: &str, symbol: &str) -> Result<Bias, SourceError> {
        if self.api_key.is_empty() {
            return Err(SourceError::MissingApiKey("OpenRouter"));
        }

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: build_prompt(headline, symbol),
            }],
        };

        let response = self
            .client
            .post(OPENROUTER_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::Status(response.status().to_string()));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        let reply = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| SourceError::Parse("no choices in response".to_string()))?;

        debug!("OpenRouter reply for {}: {:?}", symbol, reply);
        parse_label(&reply)
    }
}
