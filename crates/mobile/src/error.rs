#[derive(Debug, thiserror::Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum EmbedError {
    /// A released session or snapshot was touched again. This is a caller bug.
    #[error("{resource} was used after it was released")]
    UseAfterRelease { resource: &'static str },

    /// The configuration provider failed to open or to produce a style.
    #[error("configuration provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The owning embedding was torn down before the work completed.
    #[error("the map embedding was disposed")]
    Disposed,

    #[error("a lifecycle observer is already attached to this view")]
    AlreadyAttached,
}

impl EmbedError {
    pub(crate) fn provider(error: impl std::fmt::Display) -> Self {
        EmbedError::ProviderUnavailable(error.to_string())
    }
}
