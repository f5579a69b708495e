use crate::error::TriageError;
use crate::mailbox::{RawMessage, RawPart};

/// Appended to the content when it was cut at the configured cap.
pub const TRUNCATION_MARKER: &str = "...";

/// Flat, oracle-ready view of one message. Immutable once built; lives only
/// for the duration of a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEmail {
    pub id: String,
    pub subject: String,
    /// Plain-text body, at most `max_chars` characters plus the marker.
    pub content: String,
    /// Byte-size estimate copied verbatim from the mailbox service.
    pub size: u64,
}

/// Convert a raw payload into a `NormalizedEmail`.
///
/// Subject: first header named "subject" (case-insensitive), "No Subject"
/// when absent. Body: for multipart messages, the concatenation of every
/// `text/plain` part in payload order; for single-part messages, the body
/// itself; no plain text at all yields an empty string. A body that is not
/// valid UTF-8 is a `Decode` error — the caller skips that message and keeps
/// going.
pub fn normalize(raw: &RawMessage, max_chars: usize) -> Result<NormalizedEmail, TriageError> {
    let subject = raw
        .headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case("subject"))
        .map(|h| h.value.clone())
        .unwrap_or_else(|| "No Subject".to_string());

    let content = if !raw.parts.is_empty() {
        let mut content = String::new();
        for part in raw.parts.iter().filter(|p| p.mime_type == "text/plain") {
            content.push_str(&decode_text(part, &raw.id)?);
        }
        content
    } else if let Some(body) = &raw.body {
        decode_text(body, &raw.id)?
    } else {
        String::new()
    };

    Ok(NormalizedEmail {
        id: raw.id.clone(),
        subject,
        content: truncate(content, max_chars),
        size: raw.size_estimate,
    })
}

fn decode_text(part: &RawPart, id: &str) -> Result<String, TriageError> {
    match &part.data {
        Some(bytes) => String::from_utf8(bytes.clone()).map_err(|e| {
            TriageError::Decode(format!("message {}: body is not valid UTF-8: {}", id, e))
        }),
        None => Ok(String::new()),
    }
}

// Counted in characters after decoding, so the cut always lands on a
// character boundary.
fn truncate(content: String, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content;
    }
    let mut truncated: String = content.chars().take(max_chars).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailbox::RawHeader;

    fn single_part(id: &str, headers: Vec<RawHeader>, body: &[u8]) -> RawMessage {
        RawMessage {
            id: id.to_string(),
            headers,
            parts: Vec::new(),
            body: Some(RawPart {
                mime_type: "text/plain".to_string(),
                data: Some(body.to_vec()),
            }),
            size_estimate: 1024,
        }
    }

    fn header(name: &str, value: &str) -> RawHeader {
        RawHeader {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_subject_case_insensitive_first_match_wins() {
        let raw = single_part(
            "m1",
            vec![
                header("From", "a@example.com"),
                header("SUBJECT", "First subject"),
                header("Subject", "Second subject"),
            ],
            b"hello",
        );
        let email = normalize(&raw, 500).unwrap();
        assert_eq!(email.subject, "First subject");
    }

    #[test]
    fn test_missing_subject_defaults() {
        let raw = single_part("m1", vec![header("From", "a@example.com")], b"hello");
        let email = normalize(&raw, 500).unwrap();
        assert_eq!(email.subject, "No Subject");
    }

    #[test]
    fn test_multipart_concatenates_only_text_plain() {
        let raw = RawMessage {
            id: "m1".to_string(),
            headers: vec![header("Subject", "multi")],
            parts: vec![
                RawPart {
                    mime_type: "text/plain".to_string(),
                    data: Some(b"first ".to_vec()),
                },
                RawPart {
                    mime_type: "text/html".to_string(),
                    data: Some(b"<p>ignored</p>".to_vec()),
                },
                RawPart {
                    mime_type: "text/plain".to_string(),
                    data: Some(b"second".to_vec()),
                },
            ],
            body: None,
            size_estimate: 2048,
        };
        let email = normalize(&raw, 500).unwrap();
        assert_eq!(email.content, "first second");
    }

    #[test]
    fn test_no_plain_text_is_empty_not_an_error() {
        let raw = RawMessage {
            id: "m1".to_string(),
            headers: vec![header("Subject", "html only")],
            parts: vec![RawPart {
                mime_type: "text/html".to_string(),
                data: Some(b"<p>hi</p>".to_vec()),
            }],
            body: None,
            size_estimate: 512,
        };
        let email = normalize(&raw, 500).unwrap();
        assert_eq!(email.content, "");
    }

    #[test]
    fn test_truncation_keeps_first_500_chars_and_marker() {
        let body: String = "a".repeat(600);
        let raw = single_part("m1", vec![header("Subject", "long")], body.as_bytes());
        let email = normalize(&raw, 500).unwrap();
        assert_eq!(email.content.chars().count(), 503);
        assert!(email.content.ends_with(TRUNCATION_MARKER));
        assert_eq!(&email.content[..500], &body[..500]);
    }

    #[test]
    fn test_truncation_is_safe_on_multibyte_content() {
        // 600 two-byte characters; a byte-indexed cut at 500 would split one
        let body: String = "é".repeat(600);
        let raw = single_part("m1", vec![header("Subject", "accents")], body.as_bytes());
        let email = normalize(&raw, 500).unwrap();
        assert_eq!(email.content.chars().count(), 503);
        assert!(email.content.starts_with(&"é".repeat(500)));
    }

    #[test]
    fn test_content_at_cap_is_not_truncated() {
        let body: String = "b".repeat(500);
        let raw = single_part("m1", vec![header("Subject", "exact")], body.as_bytes());
        let email = normalize(&raw, 500).unwrap();
        assert_eq!(email.content, body);
    }

    #[test]
    fn test_invalid_utf8_is_decode_error() {
        let raw = single_part("m1", vec![header("Subject", "broken")], &[0xff, 0xfe, 0xfd]);
        let err = normalize(&raw, 500).unwrap_err();
        assert!(matches!(err, TriageError::Decode(_)));
    }

    #[test]
    fn test_size_passthrough() {
        let raw = single_part("m1", vec![header("Subject", "s")], b"x");
        let email = normalize(&raw, 500).unwrap();
        assert_eq!(email.size, 1024);
    }
}
