//! Backend-agnostic LLM adapter: chat-completion shape in, parsed JSON
//! verdict out. Every vendor reuses the same retry/breaker primitives the
//! market-data providers use, so one vendor outage never blocks another.

use async_trait::async_trait;
use market_data::circuit_breaker::{BreakerRegistry, CircuitBreakerConfig};
use market_data::retry::with_retry;
use serde::{Deserialize, Serialize};
use signal_core::SignalError;
use std::time::Duration;

#[async_trait]
pub trait LlmClient: Send + Sync {
    fn vendor(&self) -> &'static str;

    async fn complete(
        &self,
        model: &str,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, SignalError>;
}

/// Shape the model is instructed to emit. Every LLM-backed agent shares
/// this schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmVerdictSchema {
    pub recommendation: String,
    pub confidence: u8,
    pub reasoning: String,
}

/// Strip a single leading/trailing markdown code fence, then parse as the
/// verdict schema. Any failure is a parse-level defect, not a network one.
pub fn parse_llm_verdict(raw: &str) -> Result<LlmVerdictSchema, SignalError> {
    let trimmed = strip_code_fence(raw.trim());
    serde_json::from_str(&trimmed)
        .map_err(|e| SignalError::BadInput(format!("llm response schema violation: {e}")))
}

fn strip_code_fence(text: &str) -> String {
    let text = text.trim();
    if let Some(rest) = text.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        let rest = rest.trim_start_matches('\n');
        if let Some(body) = rest.strip_suffix("```") {
            return body.trim().to_string();
        }
        return rest.trim().to_string();
    }
    text.to_string()
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

/// HTTP-backed client speaking the OpenRouter-shaped chat-completion API,
/// reused across vendors by varying the base URL and API key.
pub struct HttpLlmClient {
    vendor: &'static str,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    breakers: BreakerRegistry,
}

impl HttpLlmClient {
    pub fn new(vendor: &'static str, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            vendor,
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            breakers: BreakerRegistry::new(CircuitBreakerConfig::default()),
        }
    }

    async fn send_once(&self, model: &str, system_prompt: &str, user_prompt: &str) -> Result<String, SignalError> {
        let request = ChatCompletionRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: 0.2,
            max_tokens: 512,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| SignalError::Transient(format!("{} request failed: {e}", self.vendor)))?;

        let status = response.status();
        if status.as_u16() == 429 || status.is_server_error() {
            return Err(SignalError::Transient(format!("{} HTTP {status}", self.vendor)));
        }
        if !status.is_success() {
            return Err(SignalError::Unavailable(format!("{} HTTP {status}", self.vendor)));
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| SignalError::Transient(format!("{} malformed response: {e}", self.vendor)))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .map(|m| m.content)
            .ok_or_else(|| SignalError::Unavailable(format!("{} returned no choices", self.vendor)))
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    fn vendor(&self) -> &'static str {
        self.vendor
    }

    async fn complete(&self, model: &str, system_prompt: &str, user_prompt: &str) -> Result<String, SignalError> {
        let breaker = self.breakers.get(self.vendor);
        if !breaker.is_call_permitted() {
            return Err(SignalError::Unavailable(format!("{} circuit open", self.vendor)));
        }

        let result = with_retry(|| self.send_once(model, system_prompt, user_prompt)).await;
        match &result {
            Ok(_) => breaker.record_success(),
            Err(_) => breaker.record_failure(),
        }
        result
    }
}
