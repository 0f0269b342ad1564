use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use fractic_server_error::ServerError;
use tokio::sync::Mutex;

use crate::domain::repositories::contract_repository::ContractRepository;
use crate::entities::{
    AccruedPeriod, Client, ClientId, Contract, ContractAccrual, ContractId, ContractStatus,
    Invoice, Period, Service, ServiceId,
};
use crate::errors::{DuplicateAccruedPeriod, StoreError};

/// Reference implementation of `ContractRepository` backed by in-process
/// maps. The real store is relational; this is the only
/// implementation this crate ships.
#[derive(Default)]
pub struct InMemoryContractRepository {
    contracts: Mutex<HashMap<ContractId, Contract>>,
    periods: Mutex<HashMap<ContractId, Vec<Period>>>,
    services: Mutex<HashMap<ServiceId, Service>>,
    clients: Mutex<HashMap<ClientId, Client>>,
    invoices: Mutex<HashMap<ContractId, Vec<Invoice>>>,
    accruals: Mutex<HashMap<ContractId, ContractAccrual>>,
    accrued_periods: Mutex<HashMap<ContractId, Vec<AccruedPeriod>>>,
}

impl InMemoryContractRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_contract(&self, contract: Contract) {
        self.contracts.lock().await.insert(contract.id, contract);
    }

    pub async fn seed_service(&self, service: Service) {
        self.services.lock().await.insert(service.id, service);
    }

    pub async fn seed_client(&self, client: Client) {
        self.clients.lock().await.insert(client.id, client);
    }

    pub async fn seed_periods(&self, contract_id: ContractId, periods: Vec<Period>) {
        self.periods.lock().await.insert(contract_id, periods);
    }

    pub async fn seed_invoices(&self, contract_id: ContractId, invoices: Vec<Invoice>) {
        self.invoices.lock().await.insert(contract_id, invoices);
    }
}

#[async_trait]
impl ContractRepository for InMemoryContractRepository {
    async fn contracts_dated_by(
        &self,
        month_end: NaiveDate,
    ) -> Result<Vec<Contract>, ServerError> {
        let contracts = self.contracts.lock().await;
        let mut matching: Vec<Contract> = contracts
            .values()
            .filter(|c| c.contract_date <= month_end)
            .cloned()
            .collect();
        matching.sort_by_key(|c| c.id);
        Ok(matching)
    }

    async fn periods(&self, contract_id: ContractId) -> Result<Vec<Period>, ServerError> {
        Ok(self
            .periods
            .lock()
            .await
            .get(&contract_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn service(&self, service_id: ServiceId) -> Result<Service, ServerError> {
        self.services
            .lock()
            .await
            .get(&service_id)
            .cloned()
            .ok_or_else(|| StoreError::new(&format!("no service with id {service_id}")))
    }

    async fn client(&self, client_id: ClientId) -> Result<Client, ServerError> {
        self.clients
            .lock()
            .await
            .get(&client_id)
            .cloned()
            .ok_or_else(|| StoreError::new(&format!("no client with id {client_id}")))
    }

    async fn invoices(&self, contract_id: ContractId) -> Result<Vec<Invoice>, ServerError> {
        Ok(self
            .invoices
            .lock()
            .await
            .get(&contract_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn accrual(
        &self,
        contract_id: ContractId,
    ) -> Result<Option<ContractAccrual>, ServerError> {
        Ok(self.accruals.lock().await.get(&contract_id).cloned())
    }

    async fn accrued_periods(
        &self,
        contract_id: ContractId,
    ) -> Result<Vec<AccruedPeriod>, ServerError> {
        Ok(self
            .accrued_periods
            .lock()
            .await
            .get(&contract_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn commit(
        &self,
        contract_id: ContractId,
        contract_status: ContractStatus,
        accrual: ContractAccrual,
        new_accrued_period: Option<AccruedPeriod>,
    ) -> Result<(), ServerError> {
        if let Some(ap) = &new_accrued_period {
            let mut accrued_periods = self.accrued_periods.lock().await;
            let existing = accrued_periods.entry(contract_id).or_default();
            let duplicate = existing.iter().any(|e| {
                e.service_period_id == ap.service_period_id && e.accrual_date == ap.accrual_date
            });
            if duplicate {
                return Err(DuplicateAccruedPeriod::new(
                    contract_id,
                    ap.service_period_id
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "<full remainder>".to_string())
                        .as_str(),
                    &ap.accrual_date,
                ));
            }
            existing.push(ap.clone());
        }

        self.accruals.lock().await.insert(contract_id, accrual);

        let mut contracts = self.contracts.lock().await;
        if let Some(contract) = contracts.get_mut(&contract_id) {
            contract.status = contract_status;
        }
        Ok(())
    }
}
