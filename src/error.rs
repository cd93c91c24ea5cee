/// Failures surfaced by the editor components.
///
/// Every host call is fallible; callers receive one of these instead of a
/// partially updated session or selection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditorError {
    #[error("Host is unreachable: {0}")]
    BridgeUnavailable(String),

    #[error("Host rejected the request: {0}")]
    RejectedByHost(String),

    /// The response arrived after the state it was issued against changed.
    /// Not shown to the user.
    #[error("Operation result is stale and was dropped")]
    StaleOperation,

    #[error("Template name must not be empty")]
    InvalidTemplateName,
}

impl EditorError {
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleOperation)
    }
}

impl From<EditorError> for String {
    fn from(e: EditorError) -> Self {
        e.to_string()
    }
}

pub type EditorResult<T> = Result<T, EditorError>;
