use std::error::Error;

use crate::error::ErrorKind;
use crate::request::Policy;
use crate::response::Completion;

/// The error type for a model provider.
pub trait ModelProviderError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A type that represents a model provider, which turns a [`Policy`] into a
/// single text completion.
///
/// Once the provider is created, it should behave like a stateless object.
/// It can still have internal state, but callers should not rely on it, and
/// the provider should be safe to share between concurrent invocations.
pub trait ModelProvider: Send + Sync {
    /// The error type that may be returned by the provider.
    type Error: ModelProviderError;

    /// Sends a policy to the model and awaits its completion.
    fn send_request(
        &self,
        policy: &Policy,
    ) -> impl Future<Output = Result<Completion, Self::Error>> + Send + 'static;
}
