use crate::config::Config;
use crate::error::{StoryError, StoryResult};
use crate::prompt::ChatMessage;
use async_trait::async_trait;
use log::{debug, info};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::time::Duration;

#[async_trait]
pub trait LlmClient: Send + Sync + Debug {
    async fn chat(&self, messages: &[ChatMessage]) -> StoryResult<String>;
}

pub fn create_llm(config: &Config) -> StoryResult<Box<dyn LlmClient>> {
    let token = config
        .model_token()
        .ok_or_else(|| StoryError::Config("missing model token".to_string()))?;
    info!("Initializing LLM client: {} @ {}", config.llm.model, config.llm.base_url);
    Ok(Box::new(ChatCompletionClient::new(
        token,
        &config.llm.model,
        &config.llm.base_url,
        config.llm.max_tokens,
        Duration::from_secs(config.llm.timeout_seconds),
    )?))
}

/// Client for OpenAI-compatible `/chat/completions` endpoints.
pub struct ChatCompletionClient {
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl ChatCompletionClient {
    pub fn new(
        api_key: &str,
        model: &str,
        base_url: &str,
        max_tokens: u32,
        timeout: Duration,
    ) -> StoryResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoryError::Config(format!("failed to build http client: {}", e)))?;
        Ok(Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            max_tokens,
            client,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn request_body<'a>(&'a self, messages: &'a [ChatMessage]) -> CompletionRequest<'a> {
        CompletionRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
        }
    }
}

impl Debug for ChatCompletionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatCompletionClient")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

/// Maps a completion response to the story text.
///
/// Only a 200 counts as success. Any other status is returned as-is without
/// looking at the body.
pub fn parse_completion(status: StatusCode, body: &str) -> StoryResult<String> {
    if status != StatusCode::OK {
        return Err(StoryError::GenerationHttp { status: status.as_u16() });
    }

    let result: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| StoryError::GenerationParse(format!("{}. Body: {}", e, body)))?;

    let choice = result
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| StoryError::GenerationParse("response has no choices".to_string()))?;

    choice
        .message
        .content
        .ok_or_else(|| StoryError::GenerationParse("first choice has no content".to_string()))
}

#[async_trait]
impl LlmClient for ChatCompletionClient {
    async fn chat(&self, messages: &[ChatMessage]) -> StoryResult<String> {
        let url = self.endpoint();
        debug!("POST {} ({} messages, max_tokens {})", url, messages.len(), self.max_tokens);

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&self.request_body(messages))
            .send()
            .await
            .map_err(|e| StoryError::GenerationTransport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| StoryError::GenerationTransport(e.to_string()))?;

        parse_completion(status, &body)
    }
}
