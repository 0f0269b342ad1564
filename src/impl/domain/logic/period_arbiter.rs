use chrono::NaiveDate;

use crate::domain::temporal::mid_month;
use crate::entities::{Period, PeriodStatus};

/// Among a contract's periods, selects the one authoritative for
/// `[month_start, month_end]`, resolving postponement transitions.
pub(crate) fn authoritative_period(
    periods: &[Period],
    month_start: NaiveDate,
    month_end: NaiveDate,
) -> Option<Period> {
    let overlapping: Vec<&Period> = periods
        .iter()
        .filter(|p| p.overlaps(month_start, month_end))
        .collect();
    if overlapping.is_empty() {
        return None;
    }
    if overlapping.len() == 1 {
        return Some(overlapping[0].clone());
    }

    let mid = mid_month(month_start);

    let mut postponed: Vec<&Period> = periods
        .iter()
        .filter(|p| p.status == PeriodStatus::Postponed && p.status_change_date.is_some())
        .collect();
    postponed.sort_by_key(|p| p.status_change_date.unwrap());

    for pp in &postponed {
        let scd = pp.status_change_date.unwrap();
        let pp_overlapping = overlapping.iter().any(|p| p.id == pp.id);

        if month_end < scd {
            if pp_overlapping {
                return Some((*pp).clone());
            }
            continue;
        }

        if scd >= month_start && scd <= month_end {
            if let Some(cp) = continuing_period(periods, pp, month_start, month_end) {
                let overlap_in_time = pp.start_date <= cp.end_date && cp.start_date <= pp.end_date;
                if overlap_in_time {
                    if scd <= mid {
                        return Some(cp);
                    } else if pp_overlapping {
                        return Some((*pp).clone());
                    }
                } else {
                    return Some(cp);
                }
            }
            continue;
        }

        if month_start > scd {
            if let Some(cp) = continuing_period(periods, pp, month_start, month_end) {
                return Some(cp);
            }
            continue;
        }
    }

    // Fallback: no transition applied. Prefer ACTIVE, tie-break latest start.
    let mut ranked = overlapping.clone();
    ranked.sort_by(|a, b| {
        let a_active = a.status == PeriodStatus::Active;
        let b_active = b.status == PeriodStatus::Active;
        b_active.cmp(&a_active).then(b.start_date.cmp(&a.start_date))
    });
    ranked.first().map(|p| (*p).clone())
}

/// The period that takes over service delivery after `pp`'s postponement.
fn continuing_period(
    periods: &[Period],
    pp: &Period,
    month_start: NaiveDate,
    month_end: NaiveDate,
) -> Option<Period> {
    let scd = pp.status_change_date.unwrap();
    let candidates: Vec<&Period> = periods
        .iter()
        .filter(|p| {
            matches!(
                p.status,
                PeriodStatus::Active | PeriodStatus::Ended | PeriodStatus::Dropped
            ) && p.id != pp.id
        })
        .collect();

    let mut containing: Vec<&Period> = candidates
        .iter()
        .copied()
        .filter(|p| p.start_date <= scd && scd <= p.end_date)
        .collect();
    if !containing.is_empty() {
        containing.sort_by(|a, b| {
            let a_active = a.status == PeriodStatus::Active;
            let b_active = b.status == PeriodStatus::Active;
            b_active.cmp(&a_active).then(b.start_date.cmp(&a.start_date))
        });
        return Some(containing[0].clone());
    }

    let mut fallback: Vec<&Period> = candidates
        .iter()
        .copied()
        .filter(|p| p.start_date > scd && p.overlaps(month_start, month_end))
        .collect();
    fallback.sort_by_key(|p| p.start_date);
    fallback.into_iter().next().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(id: i64, start: &str, end: &str, status: PeriodStatus, scd: Option<&str>) -> Period {
        Period {
            id,
            contract_id: 1,
            external_id: format!("ext{id}"),
            name: format!("p{id}"),
            start_date: NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap(),
            end_date: NaiveDate::parse_from_str(end, "%Y-%m-%d").unwrap(),
            status,
            status_change_date: scd.map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()),
        }
    }

    #[test]
    fn single_overlapping_period_is_returned_directly() {
        let periods = vec![period(1, "2024-01-01", "2024-04-30", PeriodStatus::Active, None)];
        let (ms, me) = (
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        );
        let p = authoritative_period(&periods, ms, me).unwrap();
        assert_eq!(p.id, 1);
    }

    #[test]
    fn no_overlap_returns_none() {
        let periods = vec![period(1, "2024-01-01", "2024-01-31", PeriodStatus::Active, None)];
        let (ms, me) = (
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        );
        assert!(authoritative_period(&periods, ms, me).is_none());
    }

    #[test]
    fn postponement_before_month_end_returns_postponed_period() {
        let pp = period(
            1,
            "2024-12-01",
            "2025-04-30",
            PeriodStatus::Postponed,
            Some("2025-01-15"),
        );
        let periods = vec![pp];
        let (ms, me) = (
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
        );
        // Only one overlapping period -> returned directly by rule 1.
        let p = authoritative_period(&periods, ms, me).unwrap();
        assert_eq!(p.id, 1);
    }

    #[test]
    fn postponement_after_mid_month_with_overlapping_continuation_keeps_postponed() {
        let pp = period(
            1,
            "2024-12-01",
            "2025-04-30",
            PeriodStatus::Postponed,
            Some("2025-01-20"),
        );
        let cp = period(2, "2025-01-05", "2025-06-30", PeriodStatus::Active, None);
        let periods = vec![pp, cp];
        let (ms, me) = (
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
        );
        let p = authoritative_period(&periods, ms, me).unwrap();
        assert_eq!(p.id, 1);
    }

    #[test]
    fn postponement_before_mid_month_with_overlapping_continuation_picks_continuation() {
        let pp = period(
            1,
            "2024-12-01",
            "2025-04-30",
            PeriodStatus::Postponed,
            Some("2025-01-05"),
        );
        let cp = period(2, "2025-01-01", "2025-06-30", PeriodStatus::Active, None);
        let periods = vec![pp, cp];
        let (ms, me) = (
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
        );
        let p = authoritative_period(&periods, ms, me).unwrap();
        assert_eq!(p.id, 2);
    }

    #[test]
    fn fallback_prefers_active_over_other_overlapping_statuses() {
        let active = period(1, "2024-01-01", "2024-03-31", PeriodStatus::Active, None);
        let ended = period(2, "2024-01-01", "2024-03-31", PeriodStatus::Ended, None);
        let periods = vec![ended, active];
        let (ms, me) = (
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        );
        let p = authoritative_period(&periods, ms, me).unwrap();
        assert_eq!(p.id, 1);
    }
}
