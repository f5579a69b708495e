use log::debug;

use crate::error::TriageError;
use crate::normalizer::NormalizedEmail;
use crate::oracle::Oracle;

/// Triage category. Always one of these three values, never free text, no
/// matter how malformed the oracle's answer is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Critical,
    Keep,
    Delete,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Critical => "CRITICAL",
            Category::Keep => "KEEP",
            Category::Delete => "DELETE",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "CRITICAL" => Some(Category::Critical),
            "KEEP" => Some(Category::Keep),
            "DELETE" => Some(Category::Delete),
            _ => None,
        }
    }
}

/// Which tier of the fallback chain produced the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictSource {
    /// The response followed the requested `CATEGORY | Reason` format.
    ExactSplit,
    /// A category literal was found somewhere in the free text.
    KeywordScan,
    /// Nothing recognizable; retained by default.
    DefaultKeep,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVerdict {
    pub category: Category,
    pub reason: String,
    pub source: VerdictSource,
}

/// Structured outcome for one email.
#[derive(Debug, Clone)]
pub struct Classification {
    pub id: String,
    pub category: Category,
    pub reason: String,
    pub size: u64,
}

/// Fixed prompt template: subject, (truncated) content and byte size, with
/// the instruction to pick exactly one category and weigh size for DELETE.
pub fn build_prompt(email: &NormalizedEmail) -> String {
    format!(
        "Analyze this email and categorize it based on the following criteria:\n\
         1. Subject: {}\n\
         2. Content: {}\n\
         3. Size: {} bytes\n\
         \n\
         Categorize into one of these categories and provide a brief reason:\n\
         - CRITICAL (important business/personal communications)\n\
         - KEEP (useful but not critical)\n\
         - DELETE (promotional, spam, outdated, or redundant)\n\
         \n\
         Consider the email size when making recommendations for deletion to save storage.\n\
         Respond in format: CATEGORY | Reason",
        email.subject, email.content, email.size
    )
}

/// Parse the oracle's free text into a category and a reason.
///
/// Ordered fallback chain, robustness policy against a model that ignores the
/// requested format:
/// 1. split on the first `" | "` when the left side is exactly one of the
///    three category tokens; the right side is the reason;
/// 2. otherwise scan the whole text for the literals CRITICAL, KEEP, DELETE
///    in that priority order; the whole text becomes the reason;
/// 3. otherwise Keep — ambiguous output never deletes anything.
pub fn parse_verdict(text: &str) -> ParsedVerdict {
    if let Some((left, right)) = text.split_once(" | ") {
        if let Some(category) = Category::from_token(left.trim()) {
            return ParsedVerdict {
                category,
                reason: right.to_string(),
                source: VerdictSource::ExactSplit,
            };
        }
        // Unrecognized left side: fall through to the scan over the full text
    }

    for (literal, category) in [
        ("CRITICAL", Category::Critical),
        ("KEEP", Category::Keep),
        ("DELETE", Category::Delete),
    ] {
        if text.contains(literal) {
            return ParsedVerdict {
                category,
                reason: text.to_string(),
                source: VerdictSource::KeywordScan,
            };
        }
    }

    ParsedVerdict {
        category: Category::Keep,
        reason: text.to_string(),
        source: VerdictSource::DefaultKeep,
    }
}

/// Classify one email: one oracle call, then the fallback parser. Oracle
/// failures propagate so the engine can skip the message and keep going.
pub async fn classify<O: Oracle>(
    oracle: &O,
    email: &NormalizedEmail,
) -> Result<Classification, TriageError> {
    let prompt = build_prompt(email);
    let response = oracle.complete(&prompt).await?;

    let verdict = parse_verdict(&response);
    debug!(
        "Message {} classified as {} (via {:?})",
        email.id,
        verdict.category.as_str(),
        verdict.source
    );

    Ok(Classification {
        id: email.id.clone(),
        category: verdict.category,
        reason: verdict.reason,
        size: email.size,
    })
}
