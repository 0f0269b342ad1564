use chrono::NaiveDate;

/// What the LMS reconciler returns for a client: the raw educational status
/// string and the date it last changed (from a "drop date" field, falling
/// back to a certification date).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LmsRecord {
    pub educational_status: String,
    pub status_change_date: Option<NaiveDate>,
}

/// The two resignation-like classes that drive full-remainder accrual, plus
/// `Active` for everything else (including unmapped/unknown statuses).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LmsClassification {
    Active,
    Ended,
    Dropped,
}
