use crate::error::TriageError;

/// One RFC 822 header as exposed by the mailbox service, order preserved.
#[derive(Debug, Clone)]
pub struct RawHeader {
    pub name: String,
    pub value: String,
}

/// One body part. The transport encoding (URL-safe base64 on the Gmail wire)
/// is already reversed; the bytes are not yet validated as UTF-8.
#[derive(Debug, Clone)]
pub struct RawPart {
    pub mime_type: String,
    pub data: Option<Vec<u8>>,
}

/// A full message payload as returned by the mailbox service.
///
/// Multipart messages carry their parts in `parts` (payload order);
/// single-part messages carry their body in `body` with `parts` empty.
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub id: String,
    pub headers: Vec<RawHeader>,
    pub parts: Vec<RawPart>,
    pub body: Option<RawPart>,
    /// Byte-size estimate reported by the service, passed through verbatim.
    pub size_estimate: u64,
}

/// The mailbox operations the triage pipeline needs: list, fetch, trash.
///
/// `GmailClient` is the production implementation; tests substitute an
/// in-memory one.
#[allow(async_fn_in_trait)]
pub trait Mailbox {
    /// Up to `limit` message ids, most recent first, as ordered by the service.
    async fn list_recent_message_ids(&self, limit: usize) -> Result<Vec<String>, TriageError>;

    /// The full payload for one message id.
    async fn get_message(&self, id: &str) -> Result<RawMessage, TriageError>;

    /// Move one message to trash. Trashing an already-trashed or unknown id
    /// fails with `NotFound`; callers must keep processing the rest of the
    /// batch.
    async fn trash_message(&self, id: &str) -> Result<(), TriageError>;
}
