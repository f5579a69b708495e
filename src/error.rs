use thiserror::Error;

/// Failure taxonomy for one triage run.
///
/// `Auth` and a failed initial listing abort the run; every other variant is
/// scoped to a single message and collected into the skipped/failures lists.
#[derive(Debug, Error)]
pub enum TriageError {
    #[error("authorization failed: {0}")]
    Auth(String),

    #[error("network failure: {0}")]
    Network(String),

    #[error("message not found: {0}")]
    NotFound(String),

    #[error("unable to decode message body: {0}")]
    Decode(String),

    #[error("classification call failed: {0}")]
    Oracle(String),
}
