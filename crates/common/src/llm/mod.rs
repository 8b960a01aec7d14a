//! Chat completion client
//!
//! The summarizer and the literature-review agent talk to the LLM through
//! [`ChatModel`]; `OpenAIChat` is the production implementation and
//! `MockChat` keeps tests offline.

use crate::config::LlmConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Chat completion interface
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run a single system + user exchange and return the trimmed reply.
    /// An empty system prompt sends the user message alone.
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// OpenAI chat completions client
pub struct OpenAIChat {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAIChat {
    /// Create a new chat client
    pub fn new(api_key: String, config: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key,
            model: config.chat_model.clone(),
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
        })
    }

    async fn call(&self, request: &ChatRequest<'_>) -> Result<String> {
        let response = self.client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::upstream("openai", format!("Chat request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::upstream("openai", format!("API error {}: {}", status, body)));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            AppError::upstream("openai", format!("Failed to parse chat response: {}", e))
        })?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| AppError::upstream("openai", "Empty response from LLM"))
    }
}

#[async_trait]
impl ChatModel for OpenAIChat {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Result<String> {
        let mut messages = Vec::with_capacity(2);
        if !system_prompt.is_empty() {
            messages.push(ChatMessage { role: "system", content: system_prompt });
        }
        messages.push(ChatMessage { role: "user", content: user_prompt });

        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature,
        };

        let start = Instant::now();
        let result = self.call(&request).await;
        crate::metrics::record_llm_call("chat", start.elapsed().as_secs_f64(), result.is_ok());
        result
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Offline chat model for tests and local development
#[derive(Default)]
pub struct MockChat;

impl MockChat {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ChatModel for MockChat {
    async fn complete(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
        _temperature: f32,
    ) -> Result<String> {
        let preview: String = user_prompt.split_whitespace().take(12).collect::<Vec<_>>().join(" ");
        Ok(format!("[mock completion] {}", preview))
    }

    fn model_name(&self) -> &str {
        "mock-chat"
    }
}

/// Create a chat model based on configuration
pub fn create_chat_model(config: &LlmConfig) -> Result<Arc<dyn ChatModel>> {
    match config.provider.as_str() {
        "openai" => {
            let key = config.api_key.clone().filter(|k| !k.is_empty()).ok_or_else(|| {
                AppError::Configuration {
                    message: "OpenAI API key required (llm.api_key or OPENAI_API_KEY)".to_string(),
                }
            })?;
            Ok(Arc::new(OpenAIChat::new(key, config)?))
        }
        "mock" => Ok(Arc::new(MockChat::new())),
        other => Err(AppError::Configuration {
            message: format!("Unknown LLM provider: {}", other),
        }),
    }
}
