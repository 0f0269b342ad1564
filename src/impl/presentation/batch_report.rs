use std::fmt::Write as _;

use crate::domain::usecases::batch_driver::{BatchResult, SyncActionSummary};
use crate::entities::ProcessingStatus;

impl ProcessingStatus {
    fn label(&self) -> &'static str {
        match self {
            ProcessingStatus::Success => "SUCCESS",
            ProcessingStatus::Skipped => "SKIPPED",
            ProcessingStatus::Failed => "FAILED",
        }
    }
}

/// Plain-text rendering of a batch result, one line per contract plus a
/// trailing notifications block.
pub(crate) fn print_batch_report(result: &BatchResult, sync_summary: &SyncActionSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Accrual batch for {}: {} processed, {} successful, {} skipped, {} failed",
        result.period_start_date,
        result.summary.total_processed,
        result.summary.successful,
        result.summary.skipped,
        result.summary.failed,
    );
    let _ = writeln!(
        out,
        "Overall: {:?} (total accrued {}, manual review required: {})",
        sync_summary.overall_status,
        sync_summary.total_amount_accrued,
        sync_summary.manual_review_required,
    );
    for r in &result.processing_results {
        let _ = writeln!(
            out,
            "  contract {} [{}]{}: {}",
            r.contract_id,
            r.status.label(),
            r.period_id
                .map(|id| format!(" period {id}"))
                .unwrap_or_default(),
            r.message,
        );
    }
    if !result.notifications.is_empty() {
        let _ = writeln!(out, "Notifications:");
        for n in &result.notifications {
            let _ = writeln!(out, "  [{}] {}", n.timestamp, n.message);
        }
    }
    out
}
