//! A local fake model for testing purpose.

mod script;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::sync::{Arc, Mutex};

use concierge_model::{
    Completion, ErrorKind, ModelProvider, ModelProviderError, Policy,
};

pub use script::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

#[derive(Default)]
struct Inner {
    script: VecDeque<ScriptedReply>,
    requests: Vec<Policy>,
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the reply script, which is how
/// the model should respond to each request in order. When the script runs
/// out, further requests fail. Every received [`Policy`] is recorded so the
/// tests can assert what was actually dispatched, including the temperature
/// schedule across retries.
///
/// Cloning the provider shares the script and the recording.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    inner: Arc<Mutex<Inner>>,
}

impl TestModelProvider {
    /// Appends a completion reply to the script.
    #[inline]
    pub fn push_completion<S: Into<String>>(&self, text: S) {
        self.push_reply(ScriptedReply::completion(text));
    }

    /// Appends a failure reply to the script.
    #[inline]
    pub fn push_failure(&self, kind: ErrorKind) {
        self.push_reply(ScriptedReply::Failure(kind));
    }

    /// Appends a reply to the script.
    #[inline]
    pub fn push_reply(&self, reply: ScriptedReply) {
        self.inner.lock().unwrap().script.push_back(reply);
    }

    /// Returns copies of every policy received so far.
    #[inline]
    pub fn recorded_policies(&self) -> Vec<Policy> {
        self.inner.lock().unwrap().requests.clone()
    }

    /// Returns how many requests have been received so far.
    #[inline]
    pub fn request_count(&self) -> usize {
        self.inner.lock().unwrap().requests.len()
    }
}

impl ModelProvider for TestModelProvider {
    type Error = Error;

    fn send_request(
        &self,
        policy: &Policy,
    ) -> impl Future<Output = Result<Completion, Self::Error>> + Send + 'static
    {
        let mut inner = self.inner.lock().unwrap();
        inner.requests.push(policy.clone());

        let result = match inner.script.pop_front() {
            Some(ScriptedReply::Completion(text)) => Ok(Completion::new(text)),
            Some(ScriptedReply::Failure(kind)) => Err(Error {
                message: "scripted failure",
                kind,
            }),
            None => Err(Error {
                message: "reply script is exhausted",
                kind: ErrorKind::Other,
            }),
        };
        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use concierge_model::ChatMessage;

    use super::*;

    fn policy(messages: Vec<ChatMessage>, temperature: f32) -> Policy {
        Policy {
            model: "test".to_owned(),
            temperature,
            max_tokens: 100,
            system: "You are a test.".to_owned(),
            messages,
        }
    }

    #[tokio::test]
    async fn test_scripted_replies() {
        let provider = TestModelProvider::default();
        provider.push_completion("first");
        provider.push_failure(ErrorKind::RateLimitExceeded);

        let completion = provider
            .send_request(&policy(vec![ChatMessage::user("Hi")], 0.7))
            .await
            .unwrap();
        assert_eq!(completion.text, "first");

        let err = provider
            .send_request(&policy(vec![ChatMessage::user("Hi")], 0.75))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);

        // The script is now empty, so further requests fail.
        let err = provider
            .send_request(&policy(vec![ChatMessage::user("Hi")], 0.8))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
    }

    #[tokio::test]
    async fn test_records_requests() {
        let provider = TestModelProvider::default();
        provider.push_completion("ok");
        provider.push_completion("ok");

        for temperature in [0.7, 0.75] {
            provider
                .send_request(&policy(
                    vec![ChatMessage::user("Hi")],
                    temperature,
                ))
                .await
                .unwrap();
        }

        let recorded = provider.recorded_policies();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].temperature, 0.7);
        assert_eq!(recorded[1].temperature, 0.75);
    }
}
