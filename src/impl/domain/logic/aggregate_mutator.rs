use chrono::NaiveDate;
use fractic_server_error::{CriticalError, ServerError};
use rust_decimal::Decimal;

use crate::entities::{
    AccrualStatus, AccruedPeriod, Contract, ContractAccrual, ContractStatus, Period, PeriodStatus,
    Service,
};

/// Fetch-or-create semantics for the per-contract aggregate. The caller is
/// responsible for the actual fetch; this only constructs the fresh row.
pub(crate) fn new_aggregate(contract: &Contract, service: &Service) -> ContractAccrual {
    ContractAccrual::new(contract.id, contract.contract_amount, service.total_sessions)
}

/// `contract.contract_amount > 0` and the contract is currently `ACTIVE` ->
/// `CLOSED`; `<= 0` and `ACTIVE` -> `CANCELED`; any other current status is
/// left untouched (never override an explicit non-ACTIVE status already set
/// earlier in the same decision).
pub(crate) fn cascade_on_completion(
    current_status: ContractStatus,
    contract_amount: Decimal,
) -> ContractStatus {
    if current_status != ContractStatus::Active {
        return current_status;
    }
    if contract_amount > Decimal::ZERO {
        ContractStatus::Closed
    } else {
        ContractStatus::Canceled
    }
}

fn duplicate_portion_exists(
    existing: &[AccruedPeriod],
    contract_id: i64,
    period_id: i64,
    target_month: NaiveDate,
) -> bool {
    existing.iter().any(|ap| {
        ap.contract_accrual_id == contract_id
            && ap.service_period_id == Some(period_id)
            && ap.accrual_date == target_month
    })
}

fn duplicate_full_remainder_exists(
    existing: &[AccruedPeriod],
    contract_id: i64,
    target_month: NaiveDate,
) -> bool {
    existing
        .iter()
        .any(|ap| ap.contract_accrual_id == contract_id && ap.is_full_remainder() && ap.accrual_date == target_month)
}

/// Accrue a fractional `portion` of the remaining amount against `period`
/// for `target_month`. Returns `None` if a row for this
/// `(aggregate, period, month)` already exists (pre-write duplicate check;
/// the store additionally enforces uniqueness).
pub(crate) fn accrue_portion(
    contract: &Contract,
    accrual: &mut ContractAccrual,
    portion: Decimal,
    target_month: NaiveDate,
    period: &Period,
    sessions_in_overlap: u32,
    existing: &[AccruedPeriod],
) -> Result<Option<(AccruedPeriod, ContractStatus)>, ServerError> {
    if accrual.remaining_amount_to_accrue() == Decimal::ZERO {
        return Err(CriticalError::with_debug(
            "accrue_portion called with a zero remaining amount",
            &format!("contract_id: {}", contract.id),
        ));
    }
    if duplicate_portion_exists(existing, contract.id, period.id, target_month) {
        return Ok(None);
    }

    let remaining = accrual.remaining_amount_to_accrue();
    let amount = remaining * portion;
    let sessions_remaining = accrual.sessions_remaining_to_accrue();
    let sessions_written = sessions_in_overlap.min(sessions_remaining);

    let accrued_period = AccruedPeriod {
        contract_accrual_id: contract.id,
        service_period_id: Some(period.id),
        accrual_date: target_month,
        accrued_amount: amount,
        accrual_portion: portion,
        status: period.status,
        sessions_in_period: sessions_written,
        total_contract_amount: contract.contract_amount,
        status_change_date: period.status_change_date,
    };

    accrual.total_amount_accrued += amount;
    accrual.total_sessions_accrued = accrual
        .total_sessions_accrued
        .checked_add(sessions_written)
        .ok_or_else(|| {
            CriticalError::with_debug(
                "total_sessions_accrued overflow",
                &format!("contract_id: {}", contract.id),
            )
        })?;

    let mut contract_status = contract.status;
    if accrual.remaining_amount_to_accrue() <= Decimal::ZERO {
        accrual.accrual_status = AccrualStatus::Completed;
        contract_status = cascade_on_completion(contract.status, contract.contract_amount);
    }

    Ok(Some((accrued_period, contract_status)))
}

/// Accrue the entire remaining amount as a single full-remainder row
/// (`service_period_id = None`). Silently skipped if one already exists for
/// this `(aggregate, month)`.
pub(crate) fn accrue_full_remainder(
    contract: &Contract,
    accrual: &mut ContractAccrual,
    target_month: NaiveDate,
    existing: &[AccruedPeriod],
) -> Option<(AccruedPeriod, ContractStatus)> {
    if duplicate_full_remainder_exists(existing, contract.id, target_month) {
        return None;
    }

    let remaining = accrual.remaining_amount_to_accrue();
    let accrued_period = AccruedPeriod {
        contract_accrual_id: contract.id,
        service_period_id: None,
        accrual_date: target_month,
        accrued_amount: remaining,
        accrual_portion: Decimal::ONE,
        status: PeriodStatus::Ended,
        sessions_in_period: 0,
        total_contract_amount: contract.contract_amount,
        status_change_date: None,
    };

    accrual.total_amount_accrued = accrual.total_amount_to_accrue;
    accrual.total_sessions_accrued = accrual.total_sessions_to_accrue;
    accrual.accrual_status = AccrualStatus::Completed;

    let contract_status = cascade_on_completion(contract.status, contract.contract_amount);
    Some((accrued_period, contract_status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ContractStatus;
    use rust_decimal_macros::dec;

    fn contract(amount: Decimal, status: ContractStatus) -> Contract {
        Contract {
            id: 1,
            client_ref: 1,
            service_ref: 1,
            contract_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            contract_amount: amount,
            currency: "EUR".into(),
            status,
        }
    }

    #[test]
    fn cascade_closes_positive_contracts_on_completion() {
        assert_eq!(
            cascade_on_completion(ContractStatus::Active, dec!(100)),
            ContractStatus::Closed
        );
    }

    #[test]
    fn cascade_cancels_non_positive_contracts_on_completion() {
        assert_eq!(
            cascade_on_completion(ContractStatus::Active, dec!(0)),
            ContractStatus::Canceled
        );
        assert_eq!(
            cascade_on_completion(ContractStatus::Active, dec!(-10)),
            ContractStatus::Canceled
        );
    }

    #[test]
    fn cascade_never_overrides_non_active_status() {
        assert_eq!(
            cascade_on_completion(ContractStatus::Canceled, dec!(100)),
            ContractStatus::Canceled
        );
    }

    #[test]
    fn accrue_full_remainder_completes_and_zeroes_out() {
        let c = contract(dec!(4800), ContractStatus::Active);
        let mut acc = ContractAccrual::new(c.id, c.contract_amount, 120);
        acc.total_amount_accrued = dec!(1200);
        acc.total_sessions_accrued = 30;
        let target = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let (ap, status) = accrue_full_remainder(&c, &mut acc, target, &[]).unwrap();
        assert_eq!(ap.accrued_amount, dec!(3600));
        assert_eq!(acc.remaining_amount_to_accrue(), Decimal::ZERO);
        assert!(acc.is_completed());
        assert_eq!(status, ContractStatus::Closed);
    }

    #[test]
    fn accrue_full_remainder_is_idempotent() {
        let c = contract(dec!(4800), ContractStatus::Active);
        let mut acc = ContractAccrual::new(c.id, c.contract_amount, 120);
        let target = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let existing = vec![AccruedPeriod {
            contract_accrual_id: c.id,
            service_period_id: None,
            accrual_date: target,
            accrued_amount: dec!(4800),
            accrual_portion: Decimal::ONE,
            status: PeriodStatus::Ended,
            sessions_in_period: 0,
            total_contract_amount: c.contract_amount,
            status_change_date: None,
        }];
        assert!(accrue_full_remainder(&c, &mut acc, target, &existing).is_none());
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn accrue_portion_never_writes_more_than_what_remains(
            total in 1i64..1_000_000,
            already_accrued in 0i64..1_000_000,
            portion_hundredths in 0u32..=100,
        ) {
            let total = Decimal::from(total);
            let already_accrued = Decimal::from(already_accrued).min(total);
            let portion = Decimal::from(portion_hundredths) / Decimal::from(100);

            let c = contract(total, ContractStatus::Active);
            let mut acc = ContractAccrual::new(c.id, total, 100);
            acc.total_amount_accrued = already_accrued;
            let before_accrued = acc.total_amount_accrued;
            let remaining_before = acc.remaining_amount_to_accrue();

            if remaining_before == Decimal::ZERO {
                return Ok(());
            }
            let target = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
            let period = Period {
                id: 1,
                contract_id: c.id,
                external_id: "ext".into(),
                name: "p".into(),
                start_date: target,
                end_date: target,
                status: PeriodStatus::Active,
                status_change_date: None,
            };

            let result = accrue_portion(&c, &mut acc, portion, target, &period, 0, &[]).unwrap();
            if let Some((ap, _)) = result {
                prop_assert!(ap.accrued_amount >= Decimal::ZERO);
                prop_assert!(ap.accrued_amount <= remaining_before);
                prop_assert_eq!(acc.total_amount_accrued, before_accrued + ap.accrued_amount);
                prop_assert_eq!(
                    acc.is_completed(),
                    acc.remaining_amount_to_accrue() <= Decimal::ZERO
                );
            }
        }
    }
}
