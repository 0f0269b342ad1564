use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::contract::ContractId;

pub type PeriodId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodStatus {
    Active,
    Postponed,
    Dropped,
    Ended,
}

/// A contiguous enrollment window. A postponement creates a second `Period`
/// that takes over service delivery on `status_change_date`; both rows
/// coexist and the period arbiter decides which is authoritative for a
/// given month.
#[derive(Debug, Clone, PartialEq)]
pub struct Period {
    pub id: PeriodId,
    pub contract_id: ContractId,
    pub external_id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: PeriodStatus,
    pub status_change_date: Option<NaiveDate>,
}

impl Period {
    pub fn overlaps(&self, range_start: NaiveDate, range_end: NaiveDate) -> bool {
        self.start_date <= range_end && range_start <= self.end_date
    }
}
