use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::contract::ContractId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccrualStatus {
    Active,
    Paused,
    Completed,
}

/// The per-contract aggregate tracking cumulative totals. Created lazily on
/// first processing, never destroyed; `contract_id` is unique.
///
/// Invariant: `remaining_amount_to_accrue` is clamped to zero (and
/// `accrual_status` forced to `Completed`) the moment an accrual would push
/// it negative, but `total_amount_accrued` is never clamped - it absorbs
/// the true overshoot so the sum-of-accruals invariant holds exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractAccrual {
    pub contract_id: ContractId,
    pub total_amount_to_accrue: Decimal,
    pub total_amount_accrued: Decimal,
    pub total_sessions_to_accrue: u32,
    pub total_sessions_accrued: u32,
    pub accrual_status: AccrualStatus,
}

impl ContractAccrual {
    pub fn new(contract_id: ContractId, total_amount: Decimal, total_sessions: u32) -> Self {
        Self {
            contract_id,
            total_amount_to_accrue: total_amount,
            total_amount_accrued: Decimal::ZERO,
            total_sessions_to_accrue: total_sessions,
            total_sessions_accrued: 0,
            accrual_status: AccrualStatus::Active,
        }
    }

    pub fn remaining_amount_to_accrue(&self) -> Decimal {
        self.total_amount_to_accrue - self.total_amount_accrued
    }

    pub fn sessions_remaining_to_accrue(&self) -> u32 {
        self.total_sessions_to_accrue
            .saturating_sub(self.total_sessions_accrued)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.accrual_status, AccrualStatus::Completed)
    }
}
