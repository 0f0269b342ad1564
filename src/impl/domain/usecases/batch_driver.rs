use chrono::NaiveDate;
use fractic_server_error::ServerError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::domain::logic::processor::{self, AccrualEngineConfig, ProcessingInputs};
use crate::domain::repositories::contract_repository::ContractRepository;
use crate::domain::repositories::lms_client::LmsClient;
use crate::domain::temporal::month_bounds;
use crate::entities::{
    AccrualStatus, Contract, ContractId, ContractProcessingResult, ContractStatus, Notification,
    ProcessingStatus,
};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub period_start_date: NaiveDate,
    pub summary: BatchSummary,
    pub processing_results: Vec<ContractProcessingResult>,
    pub notifications: Vec<Notification>,
    /// Additive per-contract telemetry, parallel to `processing_results`.
    pub sync_details: Vec<SyncActionDetail>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncOverallStatus {
    Success,
    Partial,
    Failed,
}

/// Additive operational telemetry over a `BatchResult`, useful for an
/// embedding caller deciding whether a sync needs a human look.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncActionSummary {
    pub overall_status: SyncOverallStatus,
    pub total_amount_accrued: Decimal,
    pub completed_count: usize,
    pub closed_count: usize,
    pub canceled_count: usize,
    pub notification_count: usize,
    pub manual_review_required: bool,
}

/// Per-contract operational detail: contract id, accrued amount, final
/// contract status, error message if it failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncActionDetail {
    pub contract_id: ContractId,
    pub accrued_amount: Decimal,
    pub final_status: ContractStatus,
    pub error_message: Option<String>,
}

fn is_recent_contract(contract_date: NaiveDate, month_end: NaiveDate) -> bool {
    use chrono::Datelike;
    contract_date.year() >= month_end.year()
}

/// Candidate filter, applied after the store has already limited to
/// `contract_date <= month_end`.
async fn is_candidate(
    contract: &Contract,
    repository: &dyn ContractRepository,
    month_start: NaiveDate,
    month_end: NaiveDate,
) -> Result<bool, ServerError> {
    let accrual = repository.accrual(contract.id).await?;
    let aggregate_completed = accrual
        .as_ref()
        .map(|a| a.accrual_status == AccrualStatus::Completed)
        .unwrap_or(false);

    if matches!(contract.status, ContractStatus::Closed | ContractStatus::Canceled)
        && aggregate_completed
    {
        let has_accrued_period = !repository.accrued_periods(contract.id).await?.is_empty();
        let zero_amount_audit_row_needed =
            contract.contract_amount == Decimal::ZERO && !has_accrued_period;
        if !zero_amount_audit_row_needed {
            return Ok(false);
        }
    }

    if contract.is_active() {
        let periods = repository.periods(contract.id).await?;
        if !periods.is_empty() {
            let overlaps = periods.iter().any(|p| p.overlaps(month_start, month_end));
            if !overlaps && !is_recent_contract(contract.contract_date, month_end) {
                return Ok(false);
            }
        }
    }

    Ok(true)
}

/// Enumerates accruable contracts for `target_month` and invokes the core
/// per contract, accumulating statistics and notifications. A failure
/// processing one contract never aborts the batch.
pub async fn run_batch(
    repository: &dyn ContractRepository,
    lms_client: &dyn LmsClient,
    target_month: NaiveDate,
    config: &AccrualEngineConfig,
) -> Result<BatchResult, ServerError> {
    let (month_start, month_end) = month_bounds(target_month)?;
    let candidates = repository.contracts_dated_by(month_end).await?;

    let mut summary = BatchSummary::default();
    let mut processing_results = Vec::new();
    let mut notifications = Vec::new();
    let mut sync_details = Vec::new();

    for contract in candidates {
        if !is_candidate(&contract, repository, month_start, month_end).await? {
            continue;
        }

        summary.total_processed += 1;
        let contract_id = contract.id;

        match process_one(&contract, repository, lms_client, target_month, config).await {
            Ok((result, contract_notifications, detail)) => {
                match result.status {
                    ProcessingStatus::Success => summary.successful += 1,
                    ProcessingStatus::Skipped => summary.skipped += 1,
                    ProcessingStatus::Failed => summary.failed += 1,
                }
                notifications.extend(contract_notifications);
                processing_results.push(result);
                sync_details.push(detail);
            }
            Err(err) => {
                error!(contract_id, error = %err, "contract processing failed");
                summary.failed += 1;
                processing_results.push(ContractProcessingResult {
                    contract_id,
                    period_id: None,
                    status: ProcessingStatus::Failed,
                    message: err.to_string(),
                });
                sync_details.push(SyncActionDetail {
                    contract_id,
                    accrued_amount: Decimal::ZERO,
                    final_status: contract.status,
                    error_message: Some(err.to_string()),
                });
            }
        }
    }

    info!(
        total = summary.total_processed,
        successful = summary.successful,
        failed = summary.failed,
        skipped = summary.skipped,
        "batch complete"
    );

    Ok(BatchResult {
        period_start_date: month_start,
        summary,
        processing_results,
        notifications,
        sync_details,
    })
}

async fn process_one(
    contract: &Contract,
    repository: &dyn ContractRepository,
    lms_client: &dyn LmsClient,
    target_month: NaiveDate,
    config: &AccrualEngineConfig,
) -> Result<(ContractProcessingResult, Vec<Notification>, SyncActionDetail), ServerError> {
    let service = repository.service(contract.service_ref).await?;
    let client = repository.client(contract.client_ref).await?;
    let periods = repository.periods(contract.id).await?;
    let invoices = repository.invoices(contract.id).await?;
    let accrual = repository.accrual(contract.id).await?;
    let existing_accrued_periods = repository.accrued_periods(contract.id).await?;

    let inputs = ProcessingInputs {
        contract: contract.clone(),
        service,
        client,
        periods,
        invoices,
        accrual,
        existing_accrued_periods,
    };

    let outcome = processor::process(inputs, target_month, lms_client, config).await?;

    let accrued_amount = outcome
        .new_accrued_period
        .as_ref()
        .map(|ap| ap.accrued_amount)
        .unwrap_or(Decimal::ZERO);
    let detail = SyncActionDetail {
        contract_id: contract.id,
        accrued_amount,
        final_status: outcome.contract_status,
        error_message: None,
    };

    repository
        .commit(
            contract.id,
            outcome.contract_status,
            outcome.accrual,
            outcome.new_accrued_period,
        )
        .await?;

    let result = ContractProcessingResult {
        contract_id: contract.id,
        period_id: outcome.period_id,
        status: outcome.status,
        message: outcome.message,
    };
    Ok((result, outcome.notifications, detail))
}

/// Turns a raw batch result into the richer operational summary an
/// embedding caller uses to decide whether a sync needs a human look.
pub fn summarize_for_sync(result: &BatchResult) -> SyncActionSummary {
    let total_amount_accrued: Decimal = result.sync_details.iter().map(|d| d.accrued_amount).sum();
    let completed_count = result
        .sync_details
        .iter()
        .filter(|d| matches!(d.final_status, ContractStatus::Closed | ContractStatus::Canceled))
        .count();
    let closed_count = result
        .sync_details
        .iter()
        .filter(|d| d.final_status == ContractStatus::Closed)
        .count();
    let canceled_count = result
        .sync_details
        .iter()
        .filter(|d| d.final_status == ContractStatus::Canceled)
        .count();

    let overall_status = if result.summary.failed == 0 {
        SyncOverallStatus::Success
    } else if result.summary.successful > 0 || result.summary.skipped > 0 {
        SyncOverallStatus::Partial
    } else {
        SyncOverallStatus::Failed
    };

    let failure_rate = if result.summary.total_processed == 0 {
        0.0
    } else {
        result.summary.failed as f64 / result.summary.total_processed as f64
    };
    let manual_review_required =
        !result.notifications.is_empty() || result.summary.failed > 0 || failure_rate > 0.10;

    SyncActionSummary {
        overall_status,
        total_amount_accrued,
        completed_count,
        closed_count,
        canceled_count,
        notification_count: result.notifications.len(),
        manual_review_required,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use crate::data::in_memory_contract_repository::InMemoryContractRepository;
    use crate::data::in_memory_lms_client::InMemoryLmsClient;
    use crate::entities::{Client, Period, PeriodStatus, Service};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn run_batch_accrues_a_single_active_contract() {
        let repo = InMemoryContractRepository::new();
        let lms = InMemoryLmsClient::new();

        repo.seed_contract(Contract {
            id: 1,
            client_ref: 1,
            service_ref: 1,
            contract_date: date("2023-06-01"),
            contract_amount: dec!(6000),
            currency: "EUR".into(),
            status: ContractStatus::Active,
        })
        .await;
        repo.seed_service(Service {
            id: 1,
            sessions_per_week: 5,
            total_sessions: 200,
        })
        .await;
        repo.seed_client(Client {
            id: 1,
            identifier: "student@example.com".into(),
            external_ids: Default::default(),
        })
        .await;
        repo.seed_periods(
            1,
            vec![Period {
                id: 1,
                contract_id: 1,
                external_id: "ext1".into(),
                name: "period 1".into(),
                start_date: date("2024-01-01"),
                end_date: date("2024-12-31"),
                status: PeriodStatus::Active,
                status_change_date: None,
            }],
        )
        .await;

        let result = run_batch(&repo, &lms, date("2024-03-01"), &AccrualEngineConfig::default())
            .await
            .unwrap();

        assert_eq!(result.summary.total_processed, 1);
        assert_eq!(result.summary.successful, 1);
        assert_eq!(result.sync_details.len(), 1);
        assert!(result.sync_details[0].accrued_amount > Decimal::ZERO);

        let summary = summarize_for_sync(&result);
        assert_eq!(summary.overall_status, SyncOverallStatus::Success);
        assert_eq!(summary.total_amount_accrued, result.sync_details[0].accrued_amount);
        assert!(!summary.manual_review_required);
    }

    #[tokio::test]
    async fn is_candidate_excludes_an_active_contract_with_no_overlapping_period_unless_recent() {
        let repo = InMemoryContractRepository::new();
        let old_contract = Contract {
            id: 1,
            client_ref: 1,
            service_ref: 1,
            contract_date: date("2020-01-01"),
            contract_amount: dec!(1000),
            currency: "EUR".into(),
            status: ContractStatus::Active,
        };
        repo.seed_periods(
            1,
            vec![Period {
                id: 1,
                contract_id: 1,
                external_id: "ext1".into(),
                name: "period 1".into(),
                start_date: date("2020-01-01"),
                end_date: date("2020-06-30"),
                status: PeriodStatus::Ended,
                status_change_date: None,
            }],
        )
        .await;

        let (ms, me) = month_bounds(date("2024-03-01")).unwrap();
        assert!(!is_candidate(&old_contract, &repo, ms, me).await.unwrap());

        let recent_contract = Contract {
            contract_date: date("2024-03-10"),
            ..old_contract
        };
        assert!(is_candidate(&recent_contract, &repo, ms, me).await.unwrap());
    }

    #[test]
    fn summarize_for_sync_flags_manual_review_when_a_contract_failed() {
        let result = BatchResult {
            period_start_date: date("2024-03-01"),
            summary: BatchSummary {
                total_processed: 1,
                successful: 0,
                failed: 1,
                skipped: 0,
            },
            processing_results: vec![],
            notifications: vec![],
            sync_details: vec![SyncActionDetail {
                contract_id: 1,
                accrued_amount: Decimal::ZERO,
                final_status: ContractStatus::Active,
                error_message: Some("boom".into()),
            }],
        };
        let summary = summarize_for_sync(&result);
        assert_eq!(summary.overall_status, SyncOverallStatus::Failed);
        assert!(summary.manual_review_required);
    }
}
