/// A completed response from the model endpoint.
///
/// The routing core only consumes the completion as a single text; any
/// structure inside it is recovered later by the markup extractor, not by
/// the provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Completion {
    /// The raw completion text, exactly as the endpoint returned it.
    pub text: String,
}

impl Completion {
    /// Creates a completion from a raw text.
    #[inline]
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self { text: text.into() }
    }
}
