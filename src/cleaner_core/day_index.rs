//! Logical-day assignment with a configurable day-start offset

use super::event::TimeSeries;
use chrono::Duration;

/// Attach a logical day to every row: the calendar date of
/// `timestamp - day_start_offset`.
///
/// A patient's "day" does not reset at midnight — a 1am snack belongs to the
/// previous evening. With the default 4-hour offset, everything before 4am
/// groups with the prior date. Pure and total; never fails on a sorted series.
pub fn assign_logical_days(series: &mut TimeSeries, day_start_offset: Duration) {
    for event in &mut series.events {
        event.day_start_shift = Some((event.timestamp - day_start_offset).date());
    }
}
