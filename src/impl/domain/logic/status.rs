use crate::entities::{LmsClassification, PeriodStatus};

/// Maps an LMS educational status string (already uppercased,
/// whitespace-to-underscore normalized by the reconciler) to the period
/// status it implies and the resignation classification used by the core.
/// Unknown strings default to `ACTIVE`.
pub(crate) fn classify_lms_status(educational_status: &str) -> (PeriodStatus, LmsClassification) {
    match educational_status {
        "ACTIVE" => (PeriodStatus::Active, LmsClassification::Active),
        "GRADUATED" | "NOT_COMPLETING" | "ENDED" => {
            (PeriodStatus::Ended, LmsClassification::Ended)
        }
        "POSTPONED" | "EARLY_POSTPONED" => (PeriodStatus::Postponed, LmsClassification::Active),
        "DROPPED" | "EARLY_DROPPED" | "SUSPENDED" => {
            (PeriodStatus::Dropped, LmsClassification::Dropped)
        }
        _ => (PeriodStatus::Active, LmsClassification::Active),
    }
}
