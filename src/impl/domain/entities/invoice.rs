use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::contract::ContractId;

/// External billing record, consumed read-only. The core never writes
/// invoices.
#[derive(Debug, Clone, PartialEq)]
pub struct Invoice {
    pub contract_id: ContractId,
    pub invoice_date: NaiveDate,
    pub total_amount: Decimal,
    pub invoice_number: String,
}

impl Invoice {
    /// A credit note is a negative-amount invoice, or one whose number
    /// carries the conventional `CN` prefix - either condition suffices.
    pub fn is_credit_note(&self) -> bool {
        self.total_amount < Decimal::ZERO || self.invoice_number.starts_with("CN")
    }
}
