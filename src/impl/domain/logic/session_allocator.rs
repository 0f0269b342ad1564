use chrono::NaiveDate;

use crate::entities::{Period, Service};

/// Computes the number of sessions a period delivers within `[a, b]`,
/// honoring weekly cadence and the period's total-sessions cap, then
/// clamps to `sessions_remaining` to prevent over-allocation across months
/// (holidays can cause earlier under-counting).
pub(crate) fn sessions_in_range(
    period: &Period,
    service: &Service,
    a: NaiveDate,
    b: NaiveDate,
    sessions_remaining: u32,
) -> u32 {
    if a > b {
        return 0;
    }
    let total_days = (period.end_date - period.start_date).num_days() + 1;
    if total_days <= 0 {
        return 0;
    }
    let total_weeks = total_days as f64 / 7.0;
    let period_cap = (total_weeks * service.sessions_per_week as f64)
        .round()
        .min(service.total_sessions as f64)
        .max(0.0);

    let days = (b - a).num_days() + 1;
    let final_sessions = (period_cap * days as f64 / total_days as f64).round();

    let final_sessions = if final_sessions < 0.0 {
        0
    } else {
        final_sessions as u32
    };
    final_sessions.min(sessions_remaining)
}
