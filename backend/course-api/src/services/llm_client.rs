use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::{Duration, Instant};

use crate::config::LlmConfig;
use crate::error::{CourseError, CourseResult};
use crate::metrics::{LLM_REQUESTS_TOTAL, LLM_REQUEST_DURATION_SECONDS};
use crate::models::course::ChatMessage;

/// Text-in/text-out access to a chat-completion model.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> CourseResult<String>;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    response_format: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

/// OpenAI-compatible `/chat/completions` client. No retries.
pub struct OpenAiChatClient {
    http: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiChatClient {
    pub fn new(config: &LlmConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.base_url),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    async fn send(&self, messages: &[ChatMessage]) -> CourseResult<String> {
        let payload = CompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            response_format: json!({ "type": "json_object" }),
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| CourseError::LanguageModel(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CourseError::LanguageModel(format!(
                "model API returned {}: {}",
                status, error_text
            )));
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| CourseError::LanguageModel(format!("unreadable response: {}", e)))?;

        first_content(body)
    }
}

fn first_content(body: CompletionResponse) -> CourseResult<String> {
    body.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| CourseError::LanguageModel("empty response from model".to_string()))
}

#[async_trait]
impl ChatCompletion for OpenAiChatClient {
    async fn complete(&self, messages: &[ChatMessage]) -> CourseResult<String> {
        let start = Instant::now();
        tracing::debug!(
            model = %self.model,
            messages = messages.len(),
            "Calling chat completion API"
        );

        let result = self.send(messages).await;

        let outcome = if result.is_ok() { "success" } else { "error" };
        LLM_REQUESTS_TOTAL.with_label_values(&[outcome]).inc();
        LLM_REQUEST_DURATION_SECONDS
            .with_label_values(&[outcome])
            .observe(start.elapsed().as_secs_f64());

        if let Err(e) = &result {
            tracing::error!("Chat completion failed: {}", e);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LlmConfig {
        LlmConfig {
            api_key: "sk-test".to_string(),
            base_url: "http://localhost:11434/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 4000,
            temperature: 0.7,
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_endpoint_from_base_url() {
        let client = OpenAiChatClient::new(&config()).unwrap();
        assert_eq!(client.endpoint, "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn test_request_payload_shape() {
        let messages = vec![ChatMessage::system("sys"), ChatMessage::user("hi")];
        let payload = CompletionRequest {
            model: "gpt-4o-mini",
            messages: &messages,
            temperature: 0.7,
            max_tokens: 4000,
            response_format: json!({ "type": "json_object" }),
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "hi");
        assert_eq!(value["max_tokens"], 4000);
        assert_eq!(value["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_first_content() {
        let body: CompletionResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "role": "assistant", "content": "{\"modules\": []}" } }]
        }))
        .unwrap();
        assert_eq!(first_content(body).unwrap(), "{\"modules\": []}");
    }

    #[test]
    fn test_empty_or_missing_content_is_error() {
        let empty: CompletionResponse =
            serde_json::from_value(json!({ "choices": [{ "message": { "content": "  " } }] }))
                .unwrap();
        assert!(matches!(
            first_content(empty),
            Err(CourseError::LanguageModel(_))
        ));

        let none: CompletionResponse = serde_json::from_value(json!({ "choices": [] })).unwrap();
        assert!(matches!(
            first_content(none),
            Err(CourseError::LanguageModel(_))
        ));
    }
}
