//! A model provider for Anthropic-compatible message endpoints.

#[macro_use]
extern crate tracing;

mod config;
mod proto;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use concierge_model::{
    Completion, ErrorKind, ModelProvider, ModelProviderError, Policy,
};
use reqwest::{Client, StatusCode, header};

pub use config::{AnthropicConfig, AnthropicConfigBuilder};

/// Error type for [`AnthropicProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Anthropic-compatible model provider.
#[derive(Clone, Debug)]
pub struct AnthropicProvider {
    client: Client,
    config: Arc<AnthropicConfig>,
}

impl AnthropicProvider {
    /// Creates a new `AnthropicProvider` with the given configuration.
    #[inline]
    pub fn new(config: AnthropicConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

impl ModelProvider for AnthropicProvider {
    type Error = Error;

    fn send_request(
        &self,
        policy: &Policy,
    ) -> impl Future<Output = Result<Completion, Self::Error>> + Send + 'static
    {
        let body = proto::create_request(policy);
        let resp_fut = self
            .client
            .post(format!("{}{}", self.config.base_url, "/v1/messages"))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", &self.config.version)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send();

        async move {
            let resp = match resp_fut.await.and_then(|resp| {
                resp.error_for_status()
            }) {
                Ok(resp) => resp,
                Err(err) => {
                    let kind = if err.status()
                        == Some(StatusCode::TOO_MANY_REQUESTS)
                    {
                        ErrorKind::RateLimitExceeded
                    } else {
                        ErrorKind::Other
                    };
                    return Err(Error::new(format!("{err}"), kind));
                }
            };

            let body: proto::MessagesResponse = match resp.json().await {
                Ok(body) => body,
                Err(err) => {
                    error!("failed to decode response body: {err}");
                    return Err(Error::new(
                        format!("{err}"),
                        ErrorKind::MalformedResponse,
                    ));
                }
            };
            proto::extract_completion(body)
        }
    }
}
