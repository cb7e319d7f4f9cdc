/// The single outward-facing failure of the workflow entry points. Wraps
/// the underlying cause exactly once, keeping its message visible.
#[derive(Debug, thiserror::Error)]
#[error("{context}: {source}")]
pub struct WorkflowError {
    context: &'static str,
    #[source]
    source: anyhow::Error,
}

impl WorkflowError {
    pub(crate) fn wrap(context: &'static str, source: anyhow::Error) -> Self {
        Self { context, source }
    }

    /// The original failure, for callers that dispatch on the cause.
    pub fn cause(&self) -> &anyhow::Error {
        &self.source
    }
}
