//! Shared HTTP plumbing for the Ark gateway.

use serde::Deserialize;

/// Connection settings for the Ark gateway.
#[derive(Debug, Clone)]
pub struct ArkConfig {
    /// Base URL, e.g. `https://ark.cn-beijing.volces.com/api/v3`.
    pub base_url: String,
    pub api_key: String,
    /// Model used for pet chat replies.
    pub chat_model: String,
    /// Model used for prompt expansion.
    pub expand_model: String,
    /// Model used for image stylization.
    pub image_model: String,
}

/// Client for the Ark platform endpoints.
pub struct ArkClient {
    pub(crate) client: reqwest::Client,
    pub(crate) config: ArkConfig,
}

/// Errors from the Ark API layer.
#[derive(Debug, thiserror::Error)]
pub enum ArkError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Ark returned a non-2xx status code.
    #[error("Ark API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The response contained no usable choice/data entry.
    #[error("Empty Ark response")]
    EmptyResponse,

    /// Reading a local image file for inlining failed.
    #[error("Image read failed: {0}")]
    ImageRead(String),
}

/// Standard chat-completion response shape (only the fields we use).
#[derive(Debug, Deserialize)]
pub(crate) struct CompletionResponse {
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionChoice {
    pub message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionMessage {
    pub content: Option<String>,
}

impl ArkClient {
    /// Create a new client for the Ark gateway.
    pub fn new(config: ArkConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Run a chat completion with the given model and messages, returning
    /// the first choice's content.
    pub(crate) async fn complete(
        &self,
        model: &str,
        messages: &serde_json::Value,
    ) -> Result<String, ArkError> {
        let body = serde_json::json!({
            "model": model,
            "messages": messages,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let parsed: CompletionResponse = Self::parse_response(response).await?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(ArkError::EmptyResponse)
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the response
    /// unchanged on success, or an [`ArkError::Api`] containing the status
    /// and body text on failure.
    pub(crate) async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ArkError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ArkError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    pub(crate) async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ArkError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}
