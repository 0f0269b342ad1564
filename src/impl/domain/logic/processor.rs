use chrono::{Datelike, NaiveDate};
use fractic_server_error::ServerError;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::domain::logic::aggregate_mutator::{
    accrue_full_remainder, accrue_portion, cascade_on_completion, new_aggregate,
};
use crate::domain::logic::lms_reconciler::{self, LmsReconciliation};
use crate::domain::logic::period_arbiter;
use crate::domain::logic::session_allocator::sessions_in_range;
use crate::domain::repositories::lms_client::LmsClient;
use crate::domain::temporal::month_bounds;
use crate::entities::{
    AccrualStatus, AccruedPeriod, Client, Contract, ContractAccrual, ContractStatus, Invoice,
    LmsClassification, LmsRecord, Notification, NotificationType, Period, PeriodStatus, Service,
};

/// Everything the core needs for one `(contract, target_month)` decision.
/// Fetched up front by the batch driver; the decision tree itself performs
/// no I/O except for the LMS reconciler call threaded through below.
pub(crate) struct ProcessingInputs {
    pub contract: Contract,
    pub service: Service,
    pub client: Client,
    pub periods: Vec<Period>,
    pub invoices: Vec<Invoice>,
    pub accrual: Option<ContractAccrual>,
    pub existing_accrued_periods: Vec<AccruedPeriod>,
}

#[derive(Debug, Clone, Copy)]
pub struct AccrualEngineConfig {
    /// Window (days) around `month_end` within which a CRM-missing contract
    /// is treated as "possibly not yet linked" rather than a resignation.
    pub resignation_congruence_window_days: i64,
    /// How many whole months a contract must be billed after all its
    /// periods end before the invoice-based override fires.
    pub invoice_based_accrual_gap_months: i64,
}

impl Default for AccrualEngineConfig {
    fn default() -> Self {
        Self {
            resignation_congruence_window_days: 15,
            invoice_based_accrual_gap_months: 6,
        }
    }
}

pub(crate) struct ProcessingOutcome {
    pub status: crate::entities::ProcessingStatus,
    pub period_id: Option<i64>,
    pub message: String,
    pub notifications: Vec<Notification>,
    pub contract_status: ContractStatus,
    pub accrual: ContractAccrual,
    pub new_accrued_period: Option<AccruedPeriod>,
}

struct State {
    contract: Contract,
    service: Service,
    accrual: ContractAccrual,
    contract_status: ContractStatus,
    invoices: Vec<Invoice>,
    existing: Vec<AccruedPeriod>,
    notifications: Vec<Notification>,
    new_accrued_period: Option<AccruedPeriod>,
    /// Set when a branch deliberately processed a period this month, even if
    /// the resulting delta was zero (e.g. a postponed period whose effective
    /// window already closed in an earlier month). Distinguishes that case
    /// from genuinely declining to act, for the final status derivation.
    acted: bool,
}

fn notify(notifications: &mut Vec<Notification>, message: impl Into<String>) {
    notifications.push(Notification {
        notification_type: NotificationType::NotCongruentStatus,
        message: message.into(),
        timestamp: chrono::Utc::now(),
    });
}

fn is_recent_contract(contract_date: NaiveDate, month_end: NaiveDate) -> bool {
    contract_date.year() >= month_end.year()
}

fn months_between(earlier: NaiveDate, later: NaiveDate) -> i64 {
    (later.year() as i64 - earlier.year() as i64) * 12 + later.month() as i64
        - earlier.month() as i64
}

fn latest_credit_note_month_start(invoices: &[Invoice]) -> Option<NaiveDate> {
    invoices
        .iter()
        .filter(|inv| inv.is_credit_note())
        .map(|inv| inv.invoice_date)
        .max()
        .map(crate::domain::temporal::month_start)
}

/// Runs the full resignation path, including the zero-amount audit-row
/// special case. `post_status` is the caller's explicit status
/// decision for this branch and always wins over the generic sign-based
/// cascade.
fn resignation(state: &mut State, target_month: NaiveDate, post_status: ContractStatus) {
    if state.contract.contract_amount == Decimal::ZERO
        && !state
            .existing
            .iter()
            .any(|ap| ap.contract_accrual_id == state.contract.id)
    {
        let accrual_date =
            latest_credit_note_month_start(&state.invoices).unwrap_or(target_month);
        let ap = AccruedPeriod {
            contract_accrual_id: state.contract.id,
            service_period_id: None,
            accrual_date,
            accrued_amount: Decimal::ZERO,
            accrual_portion: Decimal::ONE,
            status: PeriodStatus::Ended,
            sessions_in_period: 0,
            total_contract_amount: state.contract.contract_amount,
            status_change_date: None,
        };
        state.accrual.total_amount_accrued = state.accrual.total_amount_to_accrue;
        state.accrual.total_sessions_accrued = state.accrual.total_sessions_to_accrue;
        state.accrual.accrual_status = AccrualStatus::Completed;
        state.new_accrued_period = Some(ap);
    } else if let Some((ap, _)) =
        accrue_full_remainder(&state.contract, &mut state.accrual, target_month, &state.existing)
    {
        state.new_accrued_period = Some(ap);
    }
    state.contract_status = post_status;
}

/// No periods on the contract: consult the LMS.
async fn no_periods(
    state: &mut State,
    target_month: NaiveDate,
    month_end: NaiveDate,
    client: &Client,
    lms_client: &dyn LmsClient,
    config: &AccrualEngineConfig,
    fallback_cascade: ContractStatus,
) -> Result<(String, Option<i64>), ServerError> {
    let reconciliation = lms_reconciler::reconcile(client, lms_client).await?;

    let Some(LmsReconciliation {
        classification,
        record,
        ..
    }) = reconciliation
    else {
        let within_congruence_window = (month_end - state.contract.contract_date).num_days().abs()
            <= config.resignation_congruence_window_days;
        if within_congruence_window {
            notify(
                &mut state.notifications,
                format!(
                    "Contract {} possibly missing in CRM: no LMS record found",
                    state.contract.id
                ),
            );
            return Ok(("no LMS record found near contract date".to_string(), None));
        }
        resignation(state, target_month, fallback_cascade);
        return Ok(("resignation: LMS record missing".to_string(), None));
    };

    match classification {
        LmsClassification::Dropped => {
            let scd = record.status_change_date;
            if scd.map(|d| d <= month_end).unwrap_or(true) {
                resignation(state, target_month, fallback_cascade);
                Ok(("resignation: dropped per LMS".to_string(), None))
            } else {
                Ok(("drop change date after month end".to_string(), None))
            }
        }
        LmsClassification::Ended => {
            let scd = record.status_change_date;
            if scd.map(|d| d <= month_end).unwrap_or(true) {
                resignation(state, target_month, ContractStatus::Closed);
                Ok(("resignation: ended per LMS".to_string(), None))
            } else {
                Ok(("end change date after month end".to_string(), None))
            }
        }
        LmsClassification::Active => {
            if is_recent_contract(state.contract.contract_date, month_end) {
                Ok(("recent contract without period in CRM".to_string(), None))
            } else {
                notify(
                    &mut state.notifications,
                    format!(
                        "Contract {} has no period in CRM but LMS status is not a resignation",
                        state.contract.id
                    ),
                );
                Ok(("client without period in CRM".to_string(), None))
            }
        }
    }
}

/// The monthly-portion calculation shared by active-period accrual and
/// postponement accrual: the allocator already caps the effective end at
/// `status_change_date` when the period has been postponed.
fn monthly_portion_accrual(
    state: &mut State,
    period: &Period,
    month_start: NaiveDate,
    month_end: NaiveDate,
    target_month: NaiveDate,
) -> Result<(), ServerError> {
    let effective_end = match (period.status, period.status_change_date) {
        (PeriodStatus::Postponed, Some(scd)) if scd < period.end_date => scd,
        _ => period.end_date,
    };
    let overlap_start = period.start_date.max(month_start);
    let overlap_end = effective_end.min(month_end);

    let sessions_remaining = state.accrual.sessions_remaining_to_accrue();
    if sessions_remaining == 0 || overlap_start > overlap_end {
        return Ok(());
    }

    let sessions_in_overlap = sessions_in_range(
        period,
        &state.service,
        overlap_start,
        overlap_end,
        sessions_remaining,
    );
    let portion = Decimal::from(sessions_in_overlap) / Decimal::from(sessions_remaining);
    let portion = portion.min(Decimal::ONE);

    if let Some((ap, contract_status)) = accrue_portion(
        &state.contract,
        &mut state.accrual,
        portion,
        target_month,
        period,
        sessions_in_overlap,
        &state.existing,
    )? {
        state.new_accrued_period = Some(ap);
        state.contract_status = contract_status;
    }
    Ok(())
}

fn was_active(accrual: &ContractAccrual) -> bool {
    matches!(accrual.accrual_status, AccrualStatus::Active)
}

/// Dispatch for a contract that has periods.
fn with_periods(
    state: &mut State,
    periods: &[Period],
    target_month: NaiveDate,
    month_start: NaiveDate,
    month_end: NaiveDate,
    config: &AccrualEngineConfig,
) -> Result<(String, Option<i64>), ServerError> {
    let all_ended = !periods.is_empty() && periods.iter().all(|p| p.status == PeriodStatus::Ended);
    if all_ended {
        let latest_end = periods.iter().map(|p| p.end_date).max().unwrap();
        let gap_ok = months_between(latest_end, state.contract.contract_date)
            >= config.invoice_based_accrual_gap_months;
        let contract_date_in_month =
            state.contract.contract_date >= month_start && state.contract.contract_date <= month_end;
        if gap_ok && !state.invoices.is_empty() && contract_date_in_month {
            if let Some((ap, _)) = accrue_full_remainder(
                &state.contract,
                &mut state.accrual,
                target_month,
                &state.existing,
            ) {
                state.new_accrued_period = Some(ap);
            }
            state.contract_status = ContractStatus::Closed;
            return Ok((
                "invoice-based late billing: periods ended long before contract date".to_string(),
                None,
            ));
        }
    }

    let Some(period) = period_arbiter::authoritative_period(periods, month_start, month_end)
    else {
        return Ok(("no period overlaps target month".to_string(), None));
    };

    let naturally_completed = matches!(period.status, PeriodStatus::Ended | PeriodStatus::Dropped)
        && period
            .status_change_date
            .map(|scd| scd > period.end_date)
            .unwrap_or(false)
        && period.end_date >= month_start
        && period.end_date <= month_end;

    let in_month_transition = period
        .status_change_date
        .map(|scd| scd <= month_end)
        .unwrap_or(false);

    if in_month_transition || naturally_completed {
        match period.status {
            PeriodStatus::Postponed => {
                let was_active_before = was_active(&state.accrual);
                monthly_portion_accrual(state, &period, month_start, month_end, target_month)?;
                if was_active_before && !state.accrual.is_completed() {
                    state.accrual.accrual_status = AccrualStatus::Paused;
                }
                state.acted = true;
                return Ok(("postponement accrual".to_string(), Some(period.id)));
            }
            PeriodStatus::Dropped => {
                let negative_before_accrual =
                    state.accrual.remaining_amount_to_accrue() < Decimal::ZERO
                        && state.accrual.total_amount_accrued == Decimal::ZERO;
                if let Some((ap, _)) = accrue_full_remainder(
                    &state.contract,
                    &mut state.accrual,
                    target_month,
                    &state.existing,
                ) {
                    state.new_accrued_period = Some(ap);
                }
                state.contract_status = ContractStatus::Canceled;
                let message = if negative_before_accrual {
                    "period dropped before accrual"
                } else {
                    "period dropped"
                };
                return Ok((message.to_string(), Some(period.id)));
            }
            PeriodStatus::Ended => {
                if let Some((ap, _)) = accrue_full_remainder(
                    &state.contract,
                    &mut state.accrual,
                    target_month,
                    &state.existing,
                ) {
                    state.new_accrued_period = Some(ap);
                }
                state.contract_status = ContractStatus::Closed;
                return Ok(("period ended".to_string(), Some(period.id)));
            }
            PeriodStatus::Active => {
                monthly_portion_accrual(state, &period, month_start, month_end, target_month)?;
                return Ok(("monthly portion accrued".to_string(), Some(period.id)));
            }
        }
    }

    monthly_portion_accrual(state, &period, month_start, month_end, target_month)?;
    Ok(("monthly portion accrued".to_string(), Some(period.id)))
}

/// Dispatch for an active contract.
async fn active_contract(
    state: &mut State,
    periods: &[Period],
    client: &Client,
    target_month: NaiveDate,
    month_start: NaiveDate,
    month_end: NaiveDate,
    lms_client: &dyn LmsClient,
    config: &AccrualEngineConfig,
) -> Result<(String, Option<i64>), ServerError> {
    if state.accrual.is_completed() {
        state.contract_status = cascade_on_completion(
            ContractStatus::Active,
            state.accrual.total_amount_to_accrue,
        );
        return Ok(("aggregate already completed".to_string(), None));
    }

    let remaining = state.accrual.remaining_amount_to_accrue();
    if remaining == Decimal::ZERO {
        if periods.is_empty() {
            return no_periods(
                state,
                target_month,
                month_end,
                client,
                lms_client,
                config,
                ContractStatus::Canceled,
            )
            .await;
        }
        state.accrual.accrual_status = AccrualStatus::Completed;
        return Ok(("remaining amount already zero".to_string(), None));
    }

    if remaining < Decimal::ZERO {
        if let Some((ap, _)) = accrue_full_remainder(
            &state.contract,
            &mut state.accrual,
            target_month,
            &state.existing,
        ) {
            state.new_accrued_period = Some(ap);
        }
        state.contract_status = ContractStatus::Canceled;
        return Ok(("negative remaining amount: closed out".to_string(), None));
    }

    if periods.is_empty() {
        no_periods(
            state,
            target_month,
            month_end,
            client,
            lms_client,
            config,
            ContractStatus::Canceled,
        )
        .await
    } else {
        with_periods(state, periods, target_month, month_start, month_end, config)
    }
}

/// Dispatch for a canceled contract.
async fn canceled_contract(
    state: &mut State,
    periods: &[Period],
    client: &Client,
    target_month: NaiveDate,
    month_start: NaiveDate,
    month_end: NaiveDate,
    lms_client: &dyn LmsClient,
    config: &AccrualEngineConfig,
) -> Result<(String, Option<i64>), ServerError> {
    if state.accrual.is_completed() {
        return Ok(("aggregate already completed".to_string(), None));
    }

    let remaining = state.accrual.remaining_amount_to_accrue();
    if remaining == Decimal::ZERO {
        if periods.is_empty() {
            return no_periods(
                state,
                target_month,
                month_end,
                client,
                lms_client,
                config,
                ContractStatus::Canceled,
            )
            .await;
        }
        state.accrual.accrual_status = AccrualStatus::Completed;
        return Ok(("remaining amount already zero".to_string(), None));
    }

    if remaining < Decimal::ZERO {
        if let Some((ap, _)) = accrue_full_remainder(
            &state.contract,
            &mut state.accrual,
            target_month,
            &state.existing,
        ) {
            state.new_accrued_period = Some(ap);
        }
        state.contract_status = ContractStatus::Canceled;
        return Ok(("negative remaining amount: closed out".to_string(), None));
    }

    if periods.is_empty() {
        let result = no_periods(
            state,
            target_month,
            month_end,
            client,
            lms_client,
            config,
            ContractStatus::Canceled,
        )
        .await?;
        state.contract_status = ContractStatus::Canceled;
        return Ok(result);
    }

    let disqualifying = periods
        .iter()
        .any(|p| matches!(p.status, PeriodStatus::Active | PeriodStatus::Ended));
    if disqualifying {
        notify(
            &mut state.notifications,
            format!(
                "Canceled contract {} has an active or ended period",
                state.contract.id
            ),
        );
        return Ok((
            "canceled contract has an incongruent active/ended period".to_string(),
            None,
        ));
    }
    if let Some((ap, _)) = accrue_full_remainder(
        &state.contract,
        &mut state.accrual,
        target_month,
        &state.existing,
    ) {
        state.new_accrued_period = Some(ap);
    }
    state.contract_status = ContractStatus::Canceled;
    Ok(("canceled contract accrued full remainder".to_string(), None))
}

/// Dispatch for a closed contract.
async fn closed_contract(
    state: &mut State,
    periods: &[Period],
    client: &Client,
    target_month: NaiveDate,
    month_start: NaiveDate,
    month_end: NaiveDate,
    lms_client: &dyn LmsClient,
    config: &AccrualEngineConfig,
) -> Result<(String, Option<i64>), ServerError> {
    if state.accrual.is_completed() {
        if periods.is_empty() {
            return Ok(("aggregate already completed".to_string(), None));
        }
        let non_ended = periods.iter().any(|p| p.status != PeriodStatus::Ended);
        if non_ended {
            notify(
                &mut state.notifications,
                format!(
                    "Closed contract {} has a non-ended period",
                    state.contract.id
                ),
            );
            return Ok(("closed contract has a non-ended period".to_string(), None));
        }
        if let Some((ap, _)) = accrue_full_remainder(
            &state.contract,
            &mut state.accrual,
            target_month,
            &state.existing,
        ) {
            state.new_accrued_period = Some(ap);
        }
        state.contract_status = ContractStatus::Closed;
        return Ok(("closed contract audit accrual".to_string(), None));
    }

    let remaining = state.accrual.remaining_amount_to_accrue();
    if remaining == Decimal::ZERO {
        state.accrual.accrual_status = AccrualStatus::Completed;
        return Ok(("remaining amount already zero".to_string(), None));
    }

    if remaining < Decimal::ZERO {
        if let Some((ap, _)) = accrue_full_remainder(
            &state.contract,
            &mut state.accrual,
            target_month,
            &state.existing,
        ) {
            state.new_accrued_period = Some(ap);
        }
        state.contract_status = ContractStatus::Closed;
        return Ok(("negative remaining amount: closed out".to_string(), None));
    }

    if periods.is_empty() {
        let result = no_periods(
            state,
            target_month,
            month_end,
            client,
            lms_client,
            config,
            ContractStatus::Closed,
        )
        .await?;
        state.contract_status = ContractStatus::Closed;
        return Ok(result);
    }

    // Stalled closed contract with periods still owing: finish accruing as
    // if ACTIVE, but never revert the explicit CLOSED status.
    with_periods(state, periods, target_month, month_start, month_end, config)
}

pub(crate) async fn process(
    inputs: ProcessingInputs,
    target_month: NaiveDate,
    lms_client: &dyn LmsClient,
    config: &AccrualEngineConfig,
) -> Result<ProcessingOutcome, ServerError> {
    let (month_start, month_end) = month_bounds(target_month)?;
    let ProcessingInputs {
        contract,
        service,
        client,
        periods,
        invoices,
        accrual,
        existing_accrued_periods,
    } = inputs;

    let accrual = accrual.unwrap_or_else(|| new_aggregate(&contract, &service));
    let contract_status = contract.status;

    let mut state = State {
        contract,
        service,
        accrual,
        contract_status,
        invoices,
        existing: existing_accrued_periods,
        notifications: Vec::new(),
        new_accrued_period: None,
        acted: false,
    };

    info!(
        contract_id = state.contract.id,
        target_month = %target_month,
        "processing contract"
    );

    let (message, period_id) = match state.contract.status {
        ContractStatus::Active => {
            active_contract(
                &mut state,
                &periods,
                &client,
                target_month,
                month_start,
                month_end,
                lms_client,
                config,
            )
            .await?
        }
        ContractStatus::Canceled => {
            canceled_contract(
                &mut state,
                &periods,
                &client,
                target_month,
                month_start,
                month_end,
                lms_client,
                config,
            )
            .await?
        }
        ContractStatus::Closed => {
            closed_contract(
                &mut state,
                &periods,
                &client,
                target_month,
                month_start,
                month_end,
                lms_client,
                config,
            )
            .await?
        }
    };

    let status = if state.new_accrued_period.is_some() || state.acted {
        crate::entities::ProcessingStatus::Success
    } else {
        crate::entities::ProcessingStatus::Skipped
    };

    if !state.notifications.is_empty() {
        warn!(
            contract_id = state.contract.id,
            count = state.notifications.len(),
            "contract produced notifications"
        );
    }

    Ok(ProcessingOutcome {
        status,
        period_id,
        message,
        notifications: state.notifications,
        contract_status: state.contract_status,
        accrual: state.accrual,
        new_accrued_period: state.new_accrued_period,
    })
}
