use std::pin::Pin;
use std::sync::Arc;

use concierge_model::{Completion, ModelProvider, ModelProviderError, Policy};
use tracing::Instrument;

type SendResult = Result<Completion, Box<dyn ModelProviderError>>;
type BoxedSendFuture = Pin<Box<dyn Future<Output = SendResult> + Send>>;
type HandlerFn = Arc<dyn Fn(Policy) -> BoxedSendFuture + Send + Sync>;

/// A wrapper around a model provider that erases the provider type and
/// provides a plain request/response interface for the other modules.
///
/// One client is constructed per process and injected into the router;
/// clones share the same underlying provider. The client itself is
/// stateless, so concurrent invocations are safe as long as the provider
/// is.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
}

impl ModelClient {
    /// Creates a client backed by the given provider.
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `ModelClient` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |policy| {
            let fut = provider.send_request(&policy);
            Box::pin(
                async move {
                    trace!("dispatching policy: {:?}", policy);
                    match fut.await {
                        Ok(completion) => Ok(completion),
                        Err(err) => {
                            error!("model provider returned an error: {err}");
                            Err(Box::new(err) as Box<dyn ModelProviderError>)
                        }
                    }
                }
                .instrument(trace_span!("model client req")),
            )
        });
        Self { handler_fn }
    }

    /// Sends a policy and awaits the completion.
    #[inline]
    pub async fn send(&self, policy: Policy) -> SendResult {
        (self.handler_fn)(policy).await
    }
}
