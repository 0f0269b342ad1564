use async_trait::async_trait;
use chrono::NaiveDate;
use fractic_server_error::ServerError;

use crate::entities::{
    AccruedPeriod, Client, ClientId, Contract, ContractAccrual, ContractId, ContractStatus,
    Invoice, Period, Service, ServiceId,
};

/// The persistence/query seam onto contracts, their periods, their
/// accruals, and the invoicing/client records the core reads. The real
/// implementation is a relational store; this crate ships only an
/// in-memory reference implementation.
#[async_trait]
pub trait ContractRepository: Send + Sync {
    /// All contracts with `contract_date <= month_end`, in an arbitrary but
    /// stable order. The remaining candidate-filter rules are
    /// applied by the batch driver, not the store.
    async fn contracts_dated_by(
        &self,
        month_end: NaiveDate,
    ) -> Result<Vec<Contract>, ServerError>;

    async fn periods(&self, contract_id: ContractId) -> Result<Vec<Period>, ServerError>;
    async fn service(&self, service_id: ServiceId) -> Result<Service, ServerError>;
    async fn client(&self, client_id: ClientId) -> Result<Client, ServerError>;
    async fn invoices(&self, contract_id: ContractId) -> Result<Vec<Invoice>, ServerError>;
    async fn accrual(
        &self,
        contract_id: ContractId,
    ) -> Result<Option<ContractAccrual>, ServerError>;
    async fn accrued_periods(
        &self,
        contract_id: ContractId,
    ) -> Result<Vec<AccruedPeriod>, ServerError>;

    /// Commits one contract's decision atomically: the (possibly new)
    /// aggregate, the new accrued period if the decision produced one, and
    /// the contract's resulting status. Rolled back by the caller (never
    /// this trait) on a later contract's failure - failures are isolated
    /// per contract, not per batch.
    async fn commit(
        &self,
        contract_id: ContractId,
        contract_status: ContractStatus,
        accrual: ContractAccrual,
        new_accrued_period: Option<AccruedPeriod>,
    ) -> Result<(), ServerError>;
}
