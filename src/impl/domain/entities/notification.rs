use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationType {
    /// External systems disagree: status mismatch, missing CRM profile for
    /// a recent contract, closed contract with non-ended periods, canceled
    /// contract with active/ended periods.
    NotCongruentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub notification_type: NotificationType,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}
