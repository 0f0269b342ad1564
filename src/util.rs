use chrono::NaiveDate;
use fractic_server_error::ServerError;

use crate::{
    data::{
        in_memory_contract_repository::InMemoryContractRepository,
        in_memory_lms_client::InMemoryLmsClient,
    },
    domain::{
        logic::processor::AccrualEngineConfig,
        usecases::batch_driver::{self, BatchResult, SyncActionSummary},
    },
    presentation::batch_report,
    repositories::{contract_repository::ContractRepository, lms_client::LmsClient},
};

pub type Report = String;

/// Facade over the batch driver: a single entry point that runs the core
/// end to end and hands back both the structured result and a
/// human-readable report.
pub struct AccrualEngine<R = InMemoryContractRepository, L = InMemoryLmsClient>
where
    R: ContractRepository,
    L: LmsClient,
{
    repository: R,
    lms_client: L,
    config: AccrualEngineConfig,
}

impl AccrualEngine<InMemoryContractRepository, InMemoryLmsClient> {
    pub fn new() -> Self {
        Self {
            repository: InMemoryContractRepository::new(),
            lms_client: InMemoryLmsClient::new(),
            config: AccrualEngineConfig::default(),
        }
    }
}

impl Default for AccrualEngine<InMemoryContractRepository, InMemoryLmsClient> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, L> AccrualEngine<R, L>
where
    R: ContractRepository,
    L: LmsClient,
{
    pub fn with_backends(repository: R, lms_client: L, config: AccrualEngineConfig) -> Self {
        Self {
            repository,
            lms_client,
            config,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn lms_client(&self) -> &L {
        &self.lms_client
    }

    pub async fn process_contracts(
        &self,
        target_month: NaiveDate,
    ) -> Result<(BatchResult, SyncActionSummary, Report), ServerError> {
        let result =
            batch_driver::run_batch(&self.repository, &self.lms_client, target_month, &self.config)
                .await?;
        let sync_summary = batch_driver::summarize_for_sync(&result);
        let report = batch_report::print_batch_report(&result, &sync_summary);
        Ok((result, sync_summary, report))
    }
}
