use serde::{Deserialize, Serialize};

use super::contract::ContractId;
use super::period::PeriodId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingStatus {
    Success,
    Skipped,
    Failed,
}

/// The core's public outcome for one `(contract, target_month)`. Exactly
/// one is produced per candidate contract, never aborting the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractProcessingResult {
    pub contract_id: ContractId,
    pub period_id: Option<PeriodId>,
    pub status: ProcessingStatus,
    pub message: String,
}
