use log::{debug, info, warn};

use crate::classifier::{self, Category, Classification};
use crate::config::TriageConfig;
use crate::error::TriageError;
use crate::mailbox::Mailbox;
use crate::normalizer::{self, NormalizedEmail};
use crate::oracle::Oracle;

/// One message recommended for deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionRecommendation {
    pub id: String,
    pub reason: String,
    pub size: u64,
}

/// The DELETE subset of a run, in fetch order, with the total reclaimable
/// bytes. Recomputed each run, never persisted.
#[derive(Debug, Clone, Default)]
pub struct DeletionPlan {
    pub recommendations: Vec<DeletionRecommendation>,
    pub total_reclaimable: u64,
}

impl DeletionPlan {
    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }
}

/// A message dropped from the batch, with a human-readable reason.
#[derive(Debug, Clone)]
pub struct SkippedMessage {
    pub id: String,
    pub reason: String,
}

/// Outcome of the analysis phase.
#[derive(Debug)]
pub struct TriageReport {
    /// All classifications, in fetch order.
    pub classifications: Vec<Classification>,
    /// Messages dropped by per-message failures (fetch, decode or oracle).
    pub skipped: Vec<SkippedMessage>,
    pub plan: DeletionPlan,
}

impl TriageReport {
    pub fn count(&self, category: Category) -> usize {
        self.classifications
            .iter()
            .filter(|c| c.category == category)
            .count()
    }
}

/// Outcome of the deletion phase. `reclaimed` counts only the messages that
/// were actually trashed, so it may be less than the plan's total.
#[derive(Debug, Default)]
pub struct DeletionReport {
    pub trashed: usize,
    pub reclaimed: u64,
    pub failures: Vec<SkippedMessage>,
}

/// Drives the pipeline over one batch: fetch, normalize, classify, aggregate,
/// and — in a separate phase gated by the caller's explicit confirmation —
/// trash the recommended subset.
///
/// Strictly sequential; per-message failures are isolated and reported, only
/// an auth failure or a failed initial listing aborts the run.
pub struct TriageEngine<M: Mailbox, O: Oracle> {
    mailbox: M,
    oracle: O,
    options: TriageConfig,
}

impl<M: Mailbox, O: Oracle> TriageEngine<M, O> {
    pub fn new(mailbox: M, oracle: O, options: TriageConfig) -> Self {
        TriageEngine {
            mailbox,
            oracle,
            options,
        }
    }

    /// Fetch and classify one batch, then aggregate the deletion plan.
    /// Never deletes anything.
    pub async fn analyze(&self) -> Result<TriageReport, TriageError> {
        info!(
            "Fetching up to {} most recent message(s)",
            self.options.batch_limit
        );

        // A failure here happens before any message exists: fatal for the run
        let ids = self
            .mailbox
            .list_recent_message_ids(self.options.batch_limit)
            .await?;

        let mut emails: Vec<NormalizedEmail> = Vec::new();
        let mut skipped: Vec<SkippedMessage> = Vec::new();

        let total = ids.len();
        for (index, id) in ids.iter().enumerate() {
            debug!("Fetching email {}/{} (ID: {})", index + 1, total, id);

            match self.fetch_one(id).await {
                Ok(email) => emails.push(email),
                Err(e) => {
                    warn!("Skipping message {}: {}", id, e);
                    skipped.push(SkippedMessage {
                        id: id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let mut classifications: Vec<Classification> = Vec::new();

        let total = emails.len();
        for (index, email) in emails.iter().enumerate() {
            info!("Analyzing email {}/{}", index + 1, total);

            match classifier::classify(&self.oracle, email).await {
                Ok(classification) => classifications.push(classification),
                Err(e) => {
                    warn!("Skipping message {}: {}", email.id, e);
                    skipped.push(SkippedMessage {
                        id: email.id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let plan = build_plan(&classifications);

        info!(
            "Analysis finished: {} classified, {} skipped, {} recommended for deletion ({} bytes reclaimable)",
            classifications.len(),
            skipped.len(),
            plan.recommendations.len(),
            plan.total_reclaimable
        );

        Ok(TriageReport {
            classifications,
            skipped,
            plan,
        })
    }

    async fn fetch_one(&self, id: &str) -> Result<NormalizedEmail, TriageError> {
        let raw = self.mailbox.get_message(id).await?;
        normalizer::normalize(&raw, self.options.content_max_chars)
    }

    /// Trash every message in the plan. Only reachable after the caller has
    /// shown the plan and observed an explicit confirmation. Per-id failures
    /// are recorded and iteration continues; nothing is rolled back.
    pub async fn execute(&self, plan: &DeletionPlan) -> DeletionReport {
        let mut report = DeletionReport::default();

        let total = plan.recommendations.len();
        for (index, rec) in plan.recommendations.iter().enumerate() {
            info!("Deleting email {}/{} (ID: {})", index + 1, total, rec.id);

            match self.mailbox.trash_message(&rec.id).await {
                Ok(()) => {
                    report.trashed += 1;
                    report.reclaimed += rec.size;
                }
                Err(e) => {
                    warn!("Unable to trash message {}: {}", rec.id, e);
                    report.failures.push(SkippedMessage {
                        id: rec.id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Deletion finished: {} message(s) trashed, {} bytes reclaimed",
            report.trashed, report.reclaimed
        );

        report
    }
}

/// The DELETE-tagged subset in fetch order, sizes summed.
fn build_plan(classifications: &[Classification]) -> DeletionPlan {
    let recommendations: Vec<DeletionRecommendation> = classifications
        .iter()
        .filter(|c| c.category == Category::Delete)
        .map(|c| DeletionRecommendation {
            id: c.id.clone(),
            reason: c.reason.clone(),
            size: c.size,
        })
        .collect();

    let total_reclaimable = recommendations.iter().map(|r| r.size).sum();

    DeletionPlan {
        recommendations,
        total_reclaimable,
    }
}
