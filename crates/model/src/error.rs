/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The model endpoint is rate limited.
    RateLimitExceeded,
    /// The endpoint answered, but the response body did not carry a
    /// completion text.
    MalformedResponse,
    /// Any other errors.
    Other,
}
