use concierge_model::{ChatMessage, Completion, ErrorKind, Policy};
use serde::{Deserialize, Serialize};

use crate::Error;

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct MessagesResponse {
    pub content: Vec<ContentBlock>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    system: String,
    messages: Vec<ChatMessage>,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(policy: &Policy) -> MessagesRequest {
    MessagesRequest {
        model: policy.model.clone(),
        max_tokens: policy.max_tokens,
        temperature: policy.temperature,
        system: policy.system.clone(),
        messages: policy.messages.clone(),
    }
}

/// Pulls the completion text out of a response body.
///
/// The endpoint is expected to return at least one `text` content block; a
/// body without one is a malformed response, which the routing core treats
/// as an attempt failure.
pub fn extract_completion(resp: MessagesResponse) -> Result<Completion, Error> {
    let text = resp
        .content
        .into_iter()
        .find_map(|block| (block.kind == "text").then_some(block.text).flatten());
    match text {
        Some(text) => Ok(Completion::new(text)),
        None => Err(Error::new(
            "response body contains no text content block",
            ErrorKind::MalformedResponse,
        )),
    }
}
