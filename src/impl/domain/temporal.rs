use chrono::{Datelike, Duration, NaiveDate};
use fractic_server_error::{CriticalError, ServerError};

/// First civil day of `date`'s month.
pub(crate) fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .expect("copying a NaiveDate with overridden day=1 should never fail")
}

/// Last civil day of `date`'s month (28-31), handling December's year wrap.
pub(crate) fn month_end(date: NaiveDate) -> Result<NaiveDate, ServerError> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    let next_month_start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        CriticalError::with_debug(
            "last-date-of-month calculation unexpectedly resulted in invalid date",
            &format!("year: {}, month: {}", year, month),
        )
    })?;
    Ok(next_month_start - Duration::days(1))
}

pub(crate) fn month_bounds(date: NaiveDate) -> Result<(NaiveDate, NaiveDate), ServerError> {
    Ok((month_start(date), month_end(date)?))
}

/// Mid-month split point used by the period arbiter's postponement rule.
pub(crate) fn mid_month(month_start: NaiveDate) -> NaiveDate {
    month_start + Duration::days(15)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_end_handles_december_year_wrap() {
        let d = NaiveDate::from_ymd_opt(2024, 12, 10).unwrap();
        assert_eq!(month_end(d).unwrap(), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    }

    #[test]
    fn month_end_handles_leap_february() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert_eq!(month_end(d).unwrap(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn month_bounds_round_trips_start_and_end() {
        let d = NaiveDate::from_ymd_opt(2025, 6, 17).unwrap();
        let (s, e) = month_bounds(d).unwrap();
        assert_eq!(s, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert_eq!(e, NaiveDate::from_ymd_opt(2025, 6, 30).unwrap());
    }
}
