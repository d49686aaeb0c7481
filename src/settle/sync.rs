//! # Batch Sync
//!
//! A payee's device reconnects with a backlog of offline transfers and
//! submits them all at once. The coordinator walks the batch in order,
//! runs the full pipeline per item, and isolates failures: one forged,
//! replayed, or broke item never blocks the legitimate ones behind it.
//!
//! There is no shared transactional scope across items — each item's
//! atomicity boundary is itself — and no intra-batch retry; a client that
//! wants a retry sends the item again in a later batch, where the nonce
//! set makes the retry idempotent.
//!
//! Per-item outcomes are both logged (with the offending nonce) and
//! collected into a [`SyncReport`], so batch behavior is observable and
//! testable rather than fire-and-forget.

use tracing::{info, warn};

use crate::error::EngineError;
use crate::ledger::OfflineTransferRecord;

use super::{OfflineSettlement, OfflineSubmission};

// ---------------------------------------------------------------------------
// SyncOutcome / SyncReport
// ---------------------------------------------------------------------------

/// The result of one item in a sync batch.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome {
    /// The item's nonce, for correlation with the submission.
    pub nonce: String,
    /// Settlement record on success, the rejection kind otherwise.
    pub result: Result<OfflineTransferRecord, EngineError>,
}

impl SyncOutcome {
    /// `true` if the item settled.
    pub fn is_accepted(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-item outcomes of one batch, in submission order.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    outcomes: Vec<SyncOutcome>,
}

impl SyncReport {
    /// All outcomes, in the order the items were submitted.
    pub fn outcomes(&self) -> &[SyncOutcome] {
        &self.outcomes
    }

    /// Number of items that settled.
    pub fn accepted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_accepted()).count()
    }

    /// Number of items that were rejected.
    pub fn rejected(&self) -> usize {
        self.outcomes.len() - self.accepted()
    }

    /// Total number of items processed.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// `true` for an empty batch.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// SyncCoordinator
// ---------------------------------------------------------------------------

/// Drives batches of offline submissions through the settlement pipeline.
#[derive(Clone)]
pub struct SyncCoordinator {
    settlement: OfflineSettlement,
}

impl SyncCoordinator {
    /// Creates a coordinator over the given pipeline.
    pub fn new(settlement: OfflineSettlement) -> Self {
        Self { settlement }
    }

    /// Processes a batch, one item at a time, in the given order.
    ///
    /// Never fails at the envelope level: every item is attempted, every
    /// failure is logged with its nonce and recorded in the report, and
    /// processing always continues with the next item.
    pub fn sync_all(&self, items: &[OfflineSubmission]) -> SyncReport {
        let mut report = SyncReport::default();

        for item in items {
            let result = self.settlement.submit(item);
            match &result {
                Ok(record) => {
                    info!(nonce = %record.nonce, "sync item settled");
                }
                Err(err) => {
                    warn!(nonce = %item.nonce, error = %err, "sync item rejected");
                }
            }
            report.outcomes.push(SyncOutcome {
                nonce: item.nonce.clone(),
                result,
            });
        }

        info!(
            total = report.len(),
            accepted = report.accepted(),
            rejected = report.rejected(),
            "sync batch complete"
        );
        report
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
