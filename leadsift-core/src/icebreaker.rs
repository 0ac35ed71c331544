//! OpenAI chat-completions client for lead icebreakers and about-page
//! summaries.
//!
//! Requests are spaced by a minimum interval shared across every clone of
//! the service, and HTTP 429 answers are retried with exponential backoff.

use crate::config::EnrichConfig;
use crate::error::{EnrichError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

pub const NO_CONTENT_FALLBACK: &str =
    "Unable to generate response - no about page content available";
pub const GENERATION_ERROR: &str = "Error generating response";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ATTEMPTS: u32 = 3;
/// Scraped copy beyond this many characters is cut before prompting.
const MAX_CONTENT_CHARS: usize = 12_000;

const ONE_LINER_SYSTEM: &str = "You are a friendly AI assistant that generates personalized, mission-focused messages for lead outreach. Always start with the exact format requested and keep responses concise and genuine.";
const SUMMARY_SYSTEM: &str = "You are a professional AI assistant that creates concise, informative summaries of company information.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseRaw {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

fn truncate_chars(content: &str, max: usize) -> &str {
    match content.char_indices().nth(max) {
        Some((idx, _)) => &content[..idx],
        None => content,
    }
}

/// Greeting the one-liner must open with.
pub fn name_prefix(first_name: Option<&str>) -> String {
    match first_name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => format!("Hey {}, ", name),
        None => "Hey, ".to_string(),
    }
}

pub fn one_liner_prompt(about: &str, first_name: Option<&str>) -> String {
    let prefix = name_prefix(first_name);
    format!(
        "Based on this company's about page content, generate a personalized one-liner message that starts with \"{prefix}I love the mission you're on regarding\" and then summarizes their main mission or purpose in a concise, friendly way.\n\n\
         Content: {content}\n\n\
         Requirements:\n\
         - Start with \"{prefix}I love the mission you're on regarding\"\n\
         - Keep it concise and conversational\n\
         - Focus on their main mission, values, or purpose\n\
         - Make it feel personal and genuine",
        prefix = prefix,
        content = truncate_chars(about, MAX_CONTENT_CHARS),
    )
}

pub fn summary_prompt(about: &str) -> String {
    format!(
        "Summarize this company's about page content in 2-3 sentences, focusing on their mission, what they do, and their key value proposition. Keep it professional and informative.\n\n\
         Content: {}",
        truncate_chars(about, MAX_CONTENT_CHARS)
    )
}

#[derive(Clone)]
pub struct IcebreakerService {
    http_client: Client,
    api_key: String,
    base_url: String,
    model: String,
    min_interval: Duration,
    backoff_unit: Duration,
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl IcebreakerService {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: crate::config::DEFAULT_OPENAI_BASE_URL.to_string(),
            model: crate::config::DEFAULT_OPENAI_MODEL.to_string(),
            min_interval: crate::config::DEFAULT_OPENAI_INTERVAL,
            backoff_unit: Duration::from_secs(1),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// `None` when no OpenAI key is configured.
    pub fn from_config(config: &EnrichConfig) -> Option<Self> {
        config.openai_api_key.as_ref().map(|key| {
            Self::new(key.clone())
                .with_base_url(&config.openai_base_url)
                .with_model(&config.openai_model)
                .with_min_interval(config.openai_min_interval)
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    /// Retry `n` waits `unit * 2^n`.
    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    /// Hold the slot until the interval since the previous request has
    /// passed, then claim it.
    async fn wait_for_slot(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!("Rate limiting: waiting {:?} before next OpenAI request", wait);
                sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }

    pub async fn chat_completion(&self, request: &ChatRequest) -> Result<String> {
        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .timeout(REQUEST_TIMEOUT)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "OpenAI request failed");
                EnrichError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %message, "OpenAI API error");
            return Err(EnrichError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat: ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| EnrichError::Parse(e.to_string()))?;

        chat.choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| EnrichError::Parse("No choices in OpenAI response".into()))
    }

    /// Rate-limited completion, retrying only when the API answers 429.
    pub async fn complete_with_retry(&self, request: &ChatRequest) -> Result<String> {
        let mut attempt = 1;
        loop {
            self.wait_for_slot().await;
            match self.chat_completion(request).await {
                Err(e) if e.is_rate_limited() && attempt < MAX_ATTEMPTS => {
                    let backoff = self.backoff_unit * 2u32.pow(attempt);
                    warn!(
                        "Rate limit hit, retrying in {:?} (attempt {}/{})",
                        backoff, attempt, MAX_ATTEMPTS
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    fn request(&self, system: &str, prompt: String, max_tokens: u32, temperature: f32) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![Message::system(system), Message::user(prompt)],
            temperature: Some(temperature),
            max_tokens: Some(max_tokens),
        }
    }

    /// `Hey {first}, I love the mission you're on regarding ...`
    pub async fn generate_one_liner(&self, about: Option<&str>, first_name: Option<&str>) -> String {
        let Some(about) = about.map(str::trim).filter(|a| !a.is_empty()) else {
            return NO_CONTENT_FALLBACK.to_string();
        };

        let request = self.request(ONE_LINER_SYSTEM, one_liner_prompt(about, first_name), 150, 0.7);
        match self.complete_with_retry(&request).await {
            Ok(text) => {
                info!("One-liner generated for {}", first_name.unwrap_or("lead"));
                text
            }
            Err(e) => {
                warn!("Error generating one-liner: {}", e);
                GENERATION_ERROR.to_string()
            }
        }
    }

    /// Two or three sentence summary; empty when there is nothing to
    /// summarize or the request fails.
    pub async fn generate_about_summary(&self, about: Option<&str>) -> String {
        let Some(about) = about.map(str::trim).filter(|a| !a.is_empty()) else {
            return String::new();
        };

        let request = self.request(SUMMARY_SYSTEM, summary_prompt(about), 200, 0.5);
        self.complete_with_retry(&request).await.unwrap_or_else(|e| {
            warn!("Error generating about summary: {}", e);
            String::new()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_prefix() {
        assert_eq!(name_prefix(Some("Ada")), "Hey Ada, ");
        assert_eq!(name_prefix(Some("  ")), "Hey, ");
        assert_eq!(name_prefix(None), "Hey, ");
    }

    #[test]
    fn test_one_liner_prompt_repeats_opening() {
        let prompt = one_liner_prompt("We roast coffee.", Some("Ada"));
        let opening = "\"Hey Ada, I love the mission you're on regarding\"";

        assert_eq!(prompt.matches(opening).count(), 2);
        assert!(prompt.contains("Content: We roast coffee."));
    }

    #[test]
    fn test_prompt_content_is_capped() {
        let about = "é".repeat(MAX_CONTENT_CHARS + 50);
        let prompt = summary_prompt(&about);
        assert_eq!(prompt.matches('é').count(), MAX_CONTENT_CHARS);
    }

    #[tokio::test]
    async fn test_missing_content_short_circuits() {
        let service = IcebreakerService::new("sk-test").with_base_url("http://127.0.0.1:9");

        assert_eq!(service.generate_one_liner(None, Some("Ada")).await, NO_CONTENT_FALLBACK);
        assert_eq!(service.generate_one_liner(Some("  "), None).await, NO_CONTENT_FALLBACK);
        assert_eq!(service.generate_about_summary(None).await, "");
    }
}
