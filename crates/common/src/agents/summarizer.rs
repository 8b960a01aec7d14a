use crate::llm::ChatModel;
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "You are a helpful assistant specialized in academic paper summarization. \
Provide a concise summary highlighting key findings, methodology, and conclusions.";

/// Summarizes paper text with the chat model
#[derive(Clone)]
pub struct SummarizerAgent {
    chat: Arc<dyn ChatModel>,
    temperature: f32,
}

impl SummarizerAgent {
    pub fn new(chat: Arc<dyn ChatModel>, temperature: f32) -> Self {
        Self { chat, temperature }
    }

    /// Summarize `text`. Chat failures come back as the error message text
    /// instead of an error.
    pub async fn summarize_text(&self, text: &str) -> String {
        let user_prompt = format!(
            "Summarize the following text:\n\n{}\n\nRespond with a concise paragraph.",
            text
        );

        match self.chat.complete(SYSTEM_PROMPT, &user_prompt, self.temperature).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!(error = %e, "Summarization failed");
                format!("Error during chat completion: {}", e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{AppError, Result};
    use crate::llm::MockChat;
    use async_trait::async_trait;

    struct FailingChat;

    #[async_trait]
    impl ChatModel for FailingChat {
        async fn complete(&self, _: &str, _: &str, _: f32) -> Result<String> {
            Err(AppError::upstream("openai", "rate limited"))
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_summarize_uses_prompt() {
        let agent = SummarizerAgent::new(Arc::new(MockChat::new()), 0.7);
        let summary = agent.summarize_text("transformers replace recurrence").await;
        assert_eq!(
            summary,
            "[mock completion] Summarize the following text: transformers replace recurrence Respond with a concise paragraph."
        );
    }

    #[tokio::test]
    async fn test_summarize_failure_becomes_message() {
        let agent = SummarizerAgent::new(Arc::new(FailingChat), 0.7);
        let summary = agent.summarize_text("anything").await;
        assert!(summary.starts_with("Error during chat completion:"));
        assert!(summary.contains("rate limited"));
    }
}
