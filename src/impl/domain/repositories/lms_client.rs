use async_trait::async_trait;
use fractic_server_error::ServerError;

use crate::entities::LmsRecord;

/// The LMS interface consumed by the reconciler. Only three fields of the
/// underlying record matter: educational status, drop date, certification
/// date - already folded into `LmsRecord` by the implementation.
#[async_trait]
pub trait LmsClient: Send + Sync {
    async fn fetch_page_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<LmsRecord>, ServerError>;

    async fn fetch_page_by_email(&self, email: &str) -> Result<Option<LmsRecord>, ServerError>;
}
