//! Remote assistant client.
//!
//! The assistant is an opaque remote collaborator: it receives
//! `{"message": ...}` and answers with `{"message": ...}` or an error
//! payload. [`HttpAssistant`] talks to it over HTTP; tests substitute
//! their own [`AssistantClient`].

use crate::config::Config;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Request body sent to the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantRequest {
    pub message: String,
}

impl AssistantRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Successful reply from the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantReply {
    pub message: String,
}

impl AssistantReply {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A remote assistant capable of answering one message at a time.
#[async_trait]
pub trait AssistantClient: Send + Sync {
    /// Send a message and wait for the reply.
    async fn send(&self, request: AssistantRequest) -> Result<AssistantReply, AssistantError>;
}

/// Errors from an assistant request. `Display` is the user-facing message.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    /// The request never completed (connection, TLS, body read).
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status and no usable message.
    #[error("Assistant endpoint returned {status} {reason}")]
    Status { status: u16, reason: String },

    /// The endpoint reported an error message of its own.
    #[error("{0}")]
    Remote(String),

    /// The response body was not valid JSON.
    #[error("Invalid response from assistant: {0}")]
    Decode(#[source] serde_json::Error),

    /// The response decoded but carried no message.
    #[error("Assistant response did not contain a message")]
    MissingMessage,

    /// The reply was empty or whitespace only.
    #[error("Assistant returned an empty reply")]
    EmptyReply,

    /// The configured request timeout elapsed.
    #[error("Assistant did not respond within {}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// The task running the request panicked or was aborted.
    #[error("Assistant request was interrupted: {0}")]
    Interrupted(String),
}

/// Wire shape of a response body. Success and failure share one object.
#[derive(Debug, Deserialize)]
struct ResponseBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<ErrorField>,
}

/// `error` may be a plain string or an object carrying `message`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorField {
    Text(String),
    Object {
        #[serde(default)]
        message: Option<String>,
    },
}

impl ErrorField {
    fn into_message(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            Self::Object { message } => message,
        }
    }
}

/// HTTP client for a hosted assistant function.
#[derive(Debug, Clone)]
pub struct HttpAssistant {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Option<Duration>,
}

impl HttpAssistant {
    /// Create a client for the given endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: None,
            timeout: None,
        }
    }

    /// Create a client from configuration.
    pub fn from_config(config: &Config) -> Self {
        let mut assistant = Self::new(config.endpoint.clone());
        if let Some(key) = &config.api_key {
            assistant = assistant.with_api_key(key.clone());
        }
        if let Some(secs) = config.request_timeout_secs {
            assistant = assistant.with_timeout(Duration::from_secs(secs));
        }
        assistant
    }

    /// Authenticate requests with the given key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Fail requests that take longer than `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The endpoint this client posts to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, request: &AssistantRequest) -> Result<AssistantReply, AssistantError> {
        let mut builder = self.client.post(&self.endpoint).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key).header("apikey", key);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "assistant responded");

        parse_response(status, &body)
    }
}

#[async_trait]
impl AssistantClient for HttpAssistant {
    async fn send(&self, request: AssistantRequest) -> Result<AssistantReply, AssistantError> {
        info!(endpoint = %self.endpoint, chars = request.message.len(), "sending message to assistant");

        let result = match self.timeout {
            Some(limit) => match timeout(limit, self.post(&request)).await {
                Ok(result) => result,
                Err(_) => Err(AssistantError::Timeout(limit)),
            },
            None => self.post(&request).await,
        };

        if let Err(e) = &result {
            warn!(error = %e, "assistant request failed");
        }
        result
    }
}

/// Turn a status and raw body into a reply or an error.
fn parse_response(
    status: reqwest::StatusCode,
    body: &str,
) -> Result<AssistantReply, AssistantError> {
    if !status.is_success() {
        let remote = serde_json::from_str::<ResponseBody>(body)
            .ok()
            .and_then(|b| b.error.and_then(ErrorField::into_message).or(b.message))
            .filter(|m| !m.trim().is_empty());
        return Err(match remote {
            Some(message) => AssistantError::Remote(message),
            None => AssistantError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            },
        });
    }

    let parsed: ResponseBody = serde_json::from_str(body).map_err(AssistantError::Decode)?;
    if let Some(error) = parsed.error {
        let message = error
            .into_message()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| crate::notification::FALLBACK_ERROR_DESCRIPTION.to_string());
        return Err(AssistantError::Remote(message));
    }

    let message = parsed.message.ok_or(AssistantError::MissingMessage)?;
    if message.trim().is_empty() {
        return Err(AssistantError::EmptyReply);
    }
    Ok(AssistantReply { message })
}
