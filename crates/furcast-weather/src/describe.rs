//! Free-text weather descriptions.
//!
//! Describers never fail: a description is decoration, so every error path
//! ends in a fixed sentence built from the condition label.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::instrument;

const CHAT_TIMEOUT_SECS: u64 = 15;

/// What a describer gets to work with.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptionRequest {
    pub location: String,
    /// Celsius
    pub temperature: i32,
    pub high: i32,
    pub low: i32,
    pub condition: String,
    /// Miles per hour
    pub wind_speed: f64,
    /// Local hour of day, 0-23
    pub hour: u32,
}

impl DescriptionRequest {
    pub fn time_of_day(&self) -> &'static str {
        match self.hour {
            0..=11 => "morning",
            12..=16 => "afternoon",
            _ => "evening",
        }
    }

    fn fallback(&self) -> String {
        format!("{} conditions throughout the day.", self.condition)
    }
}

#[async_trait]
pub trait DescriptionSource: Send + Sync {
    async fn describe(&self, request: &DescriptionRequest) -> String;
}

/// Deterministic description from the condition and wind.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateDescriber;

#[async_trait]
impl DescriptionSource for TemplateDescriber {
    async fn describe(&self, request: &DescriptionRequest) -> String {
        format!(
            "{} conditions throughout the day. Wind gusts up to {} mph.",
            request.condition, request.wind_speed as i32
        )
    }
}

/// Witty description from an OpenAI-compatible chat completions API.
#[derive(Debug, Clone)]
pub struct ChatDescriber {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl ChatDescriber {
    pub fn new(base_url: &str, model: &str, api_key: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(CHAT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn prompt(request: &DescriptionRequest) -> String {
        format!(
            "Write a funny, witty weather description for {} this {}.\n\
             Current temp: {}°C, Condition: {}, High: {}°C, Low: {}°C.\n\
             Include what to wear and be casual, humorous, under 200 characters. Include a relevant emoji.",
            request.location,
            request.time_of_day(),
            request.temperature,
            request.condition,
            request.high,
            request.low,
        )
    }

    async fn complete(&self, prompt: String) -> Result<Option<String>, reqwest::Error> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(prompt),
            }],
        };

        let response: ChatResponse = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()))
    }
}

#[async_trait]
impl DescriptionSource for ChatDescriber {
    #[instrument(skip(self, request), fields(location = %request.location))]
    async fn describe(&self, request: &DescriptionRequest) -> String {
        match self.complete(Self::prompt(request)).await {
            Ok(Some(text)) => text,
            Ok(None) => {
                tracing::warn!("Chat completion returned no content");
                request.fallback()
            }
            Err(e) => {
                tracing::warn!("Description generation failed: {}", e);
                request.fallback()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(hour: u32) -> DescriptionRequest {
        DescriptionRequest {
            location: "Boston".to_string(),
            temperature: 12,
            high: 19,
            low: 11,
            condition: "Rain".to_string(),
            wind_speed: 15.7,
            hour,
        }
    }

    #[test]
    fn test_time_of_day() {
        assert_eq!(request(8).time_of_day(), "morning");
        assert_eq!(request(12).time_of_day(), "afternoon");
        assert_eq!(request(16).time_of_day(), "afternoon");
        assert_eq!(request(17).time_of_day(), "evening");
    }

    #[test]
    fn test_prompt_embeds_conditions() {
        let prompt = ChatDescriber::prompt(&request(18));
        assert!(prompt.contains("Boston this evening"));
        assert!(prompt.contains("Current temp: 12°C, Condition: Rain, High: 19°C, Low: 11°C"));
        assert!(prompt.contains("under 200 characters"));
    }

    #[tokio::test]
    async fn test_template_describer() {
        let text = TemplateDescriber.describe(&request(9)).await;
        assert_eq!(text, "Rain conditions throughout the day. Wind gusts up to 15 mph.");
    }

    #[tokio::test]
    async fn test_chat_describer_returns_completion() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_string_contains("gpt-4o-mini"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [
                    { "message": { "role": "assistant", "content": " Bring a brolly, Boston. ☔ " } }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let describer =
            ChatDescriber::new(&format!("{}/v1/", server.uri()), "gpt-4o-mini", "test-key").unwrap();
        let text = describer.describe(&request(9)).await;
        assert_eq!(text, "Bring a brolly, Boston. ☔");
    }

    #[tokio::test]
    async fn test_chat_describer_falls_back_on_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let describer =
            ChatDescriber::new(&format!("{}/v1", server.uri()), "gpt-4o-mini", "test-key").unwrap();
        let text = describer.describe(&request(9)).await;
        assert_eq!(text, "Rain conditions throughout the day.");
    }

    #[tokio::test]
    async fn test_chat_describer_falls_back_on_empty_choices() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })))
            .mount(&server)
            .await;

        let describer =
            ChatDescriber::new(&format!("{}/v1", server.uri()), "gpt-4o-mini", "test-key").unwrap();
        assert_eq!(
            describer.describe(&request(20)).await,
            "Rain conditions throughout the day."
        );
    }
}
