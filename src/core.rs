pub mod command;
pub mod countdown;
pub mod plan;
pub mod slot;
pub mod submission;

use chrono::FixedOffset;

/// India Standard Time (UTC+05:30). Every displayed time is IST civil time.
#[must_use]
pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap()
}
