//! OpenAI-compatible chat-completions client.

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::prompt::SYSTEM_INSTRUCTION;
use crate::config::ResolvedConfig;
use crate::error::RemoteError;

const TEMPERATURE: f32 = 0.2;

/// Longest error body kept in an error value.
const MAX_ERROR_BODY: usize = 512;

/// One round trip to the review model.
///
/// Returns the raw text of the first completion choice.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, user_message: &str) -> Result<String, RemoteError>;
}

/// `POST {base_url}/chat/completions` over reqwest.
pub struct HttpChatClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<SecretString>,
    model: String,
    timeout_ms: u64,
}

impl std::fmt::Debug for HttpChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpChatClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl HttpChatClient {
    pub fn new(config: &ResolvedConfig) -> Result<Self, RemoteError> {
        let mut builder = reqwest::Client::builder().timeout(config.timeout());

        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy.as_str()).map_err(RemoteError::ClientBuild)?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(RemoteError::ClientBuild)?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            timeout_ms: config.timeout_ms,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_request<'a>(&'a self, user_message: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_INSTRUCTION,
                },
                ChatMessage {
                    role: "user",
                    content: user_message,
                },
            ],
            temperature: TEMPERATURE,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        }
    }

    fn map_send_error(&self, e: reqwest::Error) -> RemoteError {
        if e.is_timeout() {
            RemoteError::Timeout(self.timeout_ms)
        } else {
            RemoteError::Transport(e)
        }
    }
}

#[async_trait]
impl ChatBackend for HttpChatClient {
    async fn complete(&self, user_message: &str) -> Result<String, RemoteError> {
        debug!("POST {} (model: {})", self.endpoint, self.model);

        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&self.build_request(user_message));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            return Err(status_error(status, body));
        }

        let envelope: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| RemoteError::InvalidEnvelope(e.to_string()))?;

        let content = envelope
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(RemoteError::EmptyCompletion)?;

        debug!("Received {} chars of completion", content.len());
        Ok(content)
    }
}

/// Map a non-success status to its error class.
fn status_error(status: StatusCode, body: String) -> RemoteError {
    let body = clip(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::Unauthorized {
            status: status.as_u16(),
            body,
        },
        StatusCode::TOO_MANY_REQUESTS => RemoteError::RateLimited { body },
        _ => RemoteError::Http {
            status: status.as_u16(),
            body,
        },
    }
}

fn clip(mut body: String) -> String {
    if let Some((idx, _)) = body.char_indices().nth(MAX_ERROR_BODY) {
        body.truncate(idx);
        body.push_str("...");
    }
    body
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}
