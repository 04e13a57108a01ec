use concierge_model::ErrorKind;

/// One scripted reply from the fake model.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScriptedReply {
    /// Answer the request with this completion text.
    Completion(String),
    /// Fail the request with an error of this kind.
    Failure(ErrorKind),
}

impl ScriptedReply {
    /// Creates a completion reply.
    #[inline]
    pub fn completion<S: Into<String>>(text: S) -> Self {
        Self::Completion(text.into())
    }

    /// Creates a failure reply with the `Other` kind.
    #[inline]
    pub fn failure() -> Self {
        Self::Failure(ErrorKind::Other)
    }
}
