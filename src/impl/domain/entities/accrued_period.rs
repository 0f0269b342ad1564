use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::contract::ContractId;
use super::period::{PeriodId, PeriodStatus};

/// An immutable accrual fact. `service_period_id = None` marks a
/// full-remainder accrual (resignation, natural completion, zero-amount
/// audit row). Never updated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct AccruedPeriod {
    pub contract_accrual_id: ContractId,
    pub service_period_id: Option<PeriodId>,
    pub accrual_date: NaiveDate,
    pub accrued_amount: Decimal,
    pub accrual_portion: Decimal,
    pub status: PeriodStatus,
    pub sessions_in_period: u32,
    pub total_contract_amount: Decimal,
    pub status_change_date: Option<NaiveDate>,
}

impl AccruedPeriod {
    pub fn is_full_remainder(&self) -> bool {
        self.service_period_id.is_none()
    }
}
