use std::collections::HashMap;

use async_trait::async_trait;
use fractic_server_error::ServerError;
use tokio::sync::Mutex;

use crate::domain::repositories::lms_client::LmsClient;
use crate::entities::LmsRecord;

/// Reference implementation of `LmsClient` backed by in-process maps. The
/// real LMS is an external HTTP collaborator, out of scope here; this is
/// the only implementation this crate ships.
#[derive(Default)]
pub struct InMemoryLmsClient {
    by_external_id: Mutex<HashMap<String, LmsRecord>>,
    by_email: Mutex<HashMap<String, LmsRecord>>,
}

impl InMemoryLmsClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_by_external_id(&self, external_id: impl Into<String>, record: LmsRecord) {
        self.by_external_id
            .lock()
            .await
            .insert(external_id.into(), record);
    }

    pub async fn seed_by_email(&self, email: impl Into<String>, record: LmsRecord) {
        self.by_email.lock().await.insert(email.into(), record);
    }
}

#[async_trait]
impl LmsClient for InMemoryLmsClient {
    async fn fetch_page_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<LmsRecord>, ServerError> {
        Ok(self.by_external_id.lock().await.get(external_id).cloned())
    }

    async fn fetch_page_by_email(&self, email: &str) -> Result<Option<LmsRecord>, ServerError> {
        Ok(self.by_email.lock().await.get(email).cloned())
    }
}
