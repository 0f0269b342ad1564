use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::client::ClientId;
use super::service::ServiceId;

pub type ContractId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractStatus {
    Active,
    Canceled,
    Closed,
}

/// A signed contract value and its billing identity. Periods and the
/// accrual aggregate are looked up by `id` through the repository, not
/// embedded here, to avoid the cyclic Contract <-> ContractAccrual reference
/// (see DESIGN.md's note on this).
#[derive(Debug, Clone, PartialEq)]
pub struct Contract {
    pub id: ContractId,
    pub client_ref: ClientId,
    pub service_ref: ServiceId,
    pub contract_date: NaiveDate,
    pub contract_amount: Decimal,
    pub currency: String,
    pub status: ContractStatus,
}

impl Contract {
    pub fn is_active(&self) -> bool {
        matches!(self.status, ContractStatus::Active)
    }
}
