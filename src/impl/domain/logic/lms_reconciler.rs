use fractic_server_error::ServerError;

use crate::domain::repositories::lms_client::LmsClient;
use crate::entities::{Client, LmsClassification, LmsRecord, PeriodStatus};

use super::status::classify_lms_status;

pub(crate) const LMS_SYSTEM: &str = "lms";

pub(crate) struct LmsReconciliation {
    pub record: LmsRecord,
    pub period_status: PeriodStatus,
    pub classification: LmsClassification,
}

/// Uppercases and turns whitespace runs into underscores, so `"Not
/// Completing"` and `"not_completing"` both classify the same way.
fn normalize_status(raw: &str) -> String {
    raw.trim()
        .to_uppercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Fetch by stored external id, falling back to email when the id is
/// absent or the lookup comes back empty; both paths are equally
/// authoritative, so a hit from either ends the search.
pub(crate) async fn reconcile(
    client_entity: &Client,
    lms_client: &dyn LmsClient,
) -> Result<Option<LmsReconciliation>, ServerError> {
    let by_id = match client_entity.external_id(LMS_SYSTEM) {
        Some(external_id) => lms_client.fetch_page_by_external_id(external_id).await?,
        None => None,
    };
    let record = match by_id {
        Some(r) => Some(r),
        None => {
            lms_client
                .fetch_page_by_email(&client_entity.identifier)
                .await?
        }
    };

    Ok(record.map(|record| {
        let normalized = normalize_status(&record.educational_status);
        let (period_status, classification) = classify_lms_status(&normalized);
        LmsReconciliation {
            record,
            period_status,
            classification,
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    struct FakeLmsClient {
        by_id: Option<LmsRecord>,
        by_email: Option<LmsRecord>,
    }

    #[async_trait]
    impl LmsClient for FakeLmsClient {
        async fn fetch_page_by_external_id(
            &self,
            _external_id: &str,
        ) -> Result<Option<LmsRecord>, ServerError> {
            Ok(self.by_id.clone())
        }

        async fn fetch_page_by_email(
            &self,
            _email: &str,
        ) -> Result<Option<LmsRecord>, ServerError> {
            Ok(self.by_email.clone())
        }
    }

    fn client_with_external_id() -> Client {
        let mut ids = HashMap::new();
        ids.insert(LMS_SYSTEM.to_string(), "notion-123".to_string());
        Client {
            id: 1,
            identifier: "student@example.com".into(),
            external_ids: ids,
        }
    }

    #[tokio::test]
    async fn falls_back_to_email_when_external_id_lookup_is_empty() {
        let record = LmsRecord {
            educational_status: "GRADUATED".into(),
            status_change_date: Some(NaiveDate::from_ymd_opt(2024, 3, 12).unwrap()),
        };
        let lms = FakeLmsClient {
            by_id: None,
            by_email: Some(record.clone()),
        };
        let result = reconcile(&client_with_external_id(), &lms)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.classification, LmsClassification::Ended);
        assert_eq!(result.period_status, PeriodStatus::Ended);
    }

    #[tokio::test]
    async fn returns_none_when_client_cannot_be_located() {
        let lms = FakeLmsClient {
            by_id: None,
            by_email: None,
        };
        assert!(reconcile(&client_with_external_id(), &lms)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn normalizes_mixed_case_and_spaced_statuses_before_classifying() {
        let record = LmsRecord {
            educational_status: "Not Completing".into(),
            status_change_date: None,
        };
        let lms = FakeLmsClient {
            by_id: None,
            by_email: Some(record),
        };
        let result = reconcile(&client_with_external_id(), &lms)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.classification, LmsClassification::Ended);
        assert_eq!(result.period_status, PeriodStatus::Ended);
    }
}
