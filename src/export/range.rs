use chrono::{Duration, NaiveDate};

/// The portal reports the current day with not-yet-occurred intervals as
/// zero, so yesterday is the last day worth fetching.
pub fn clamp_to_yesterday(date: NaiveDate, today: NaiveDate) -> NaiveDate {
    date.min(today - Duration::days(1))
}

/// Computes the range of days that actually need fetching.
///
/// The start is pushed past the last stored day, both ends are clamped to
/// yesterday, and `None` means the stored artifact already covers the
/// request.
pub fn resolve_range(
    requested_start: NaiveDate,
    requested_end: NaiveDate,
    last_stored: Option<NaiveDate>,
    today: NaiveDate,
) -> Option<(NaiveDate, NaiveDate)> {
    let end = clamp_to_yesterday(requested_end, today);
    let mut start = clamp_to_yesterday(requested_start, today);
    if let Some(last) = last_stored {
        start = start.max(last + Duration::days(1));
    }
    (start <= end).then_some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_today_and_future_clamp_to_yesterday() {
        let today = date(2023, 6, 10);
        assert_eq!(clamp_to_yesterday(today, today), date(2023, 6, 9));
        assert_eq!(clamp_to_yesterday(date(2023, 7, 1), today), date(2023, 6, 9));
        assert_eq!(clamp_to_yesterday(date(2023, 6, 1), today), date(2023, 6, 1));
    }

    #[test]
    fn test_fresh_export_uses_requested_range() {
        let today = date(2023, 6, 10);
        assert_eq!(
            resolve_range(date(2023, 6, 1), date(2023, 6, 5), None, today),
            Some((date(2023, 6, 1), date(2023, 6, 5)))
        );
    }

    #[test]
    fn test_stored_data_pushes_start_forward() {
        let today = date(2023, 6, 10);
        assert_eq!(
            resolve_range(
                date(2023, 6, 1),
                date(2023, 6, 8),
                Some(date(2023, 6, 5)),
                today
            ),
            Some((date(2023, 6, 6), date(2023, 6, 8)))
        );
    }

    #[test]
    fn test_fully_stored_range_fetches_nothing() {
        let today = date(2023, 6, 10);
        assert_eq!(
            resolve_range(
                date(2023, 6, 1),
                date(2023, 6, 5),
                Some(date(2023, 6, 5)),
                today
            ),
            None
        );
    }

    #[test]
    fn test_request_beyond_today_is_clamped() {
        let today = date(2023, 6, 10);
        assert_eq!(
            resolve_range(date(2023, 6, 10), date(2023, 6, 20), None, today),
            Some((date(2023, 6, 9), date(2023, 6, 9)))
        );
    }

    #[test]
    fn test_inverted_request_fetches_nothing() {
        let today = date(2023, 6, 10);
        assert_eq!(
            resolve_range(date(2023, 6, 5), date(2023, 6, 1), None, today),
            None
        );
    }
}
