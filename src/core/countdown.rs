use chrono::{NaiveDateTime, NaiveTime, TimeDelta, Timelike};

/// The forecast refreshes on a six-hour cycle: 06:00, 12:00, 18:00, midnight.
#[must_use]
pub fn next_refresh(now: NaiveDateTime) -> NaiveDateTime {
    let next_hour = (now.hour() + 1).div_ceil(6) * 6;
    now.date().and_time(NaiveTime::MIN) + TimeDelta::hours(i64::from(next_hour))
}

/// Time left on the cycle. Display only: nothing is refetched when it hits zero.
#[must_use]
pub fn until_next_refresh(now: NaiveDateTime) -> TimeDelta {
    next_refresh(now) - now
}

#[must_use]
pub fn format_countdown(remaining: TimeDelta) -> String {
    format!("{}h {}m", remaining.num_hours(), remaining.num_minutes() % 60)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 27)
            .and_then(|date| date.and_hms_opt(hour, minute, 0))
            .expect("valid test timestamp")
    }

    #[test]
    fn refresh_boundaries_land_on_the_six_hour_grid() {
        assert_eq!(next_refresh(at(5, 0)), at(6, 0));
        assert_eq!(next_refresh(at(13, 47)), at(18, 0));
        assert_eq!(next_refresh(at(18, 0)), at(0, 0) + TimeDelta::days(1));
    }

    #[test]
    fn countdown_rolls_over_midnight() {
        let remaining = until_next_refresh(at(23, 59));
        assert_eq!(format_countdown(remaining), "0h 1m");
    }

    #[test]
    fn countdown_formats_hours_and_minutes() {
        assert_eq!(format_countdown(until_next_refresh(at(13, 47))), "4h 13m");
    }
}
