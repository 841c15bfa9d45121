//! Fixed-grid time resampling for raw CGM event streams

use super::error::CleanerError;
use super::event::{Event, MsgType, TimeSeries};
use chrono::{Duration, NaiveDateTime, Timelike};

/// Align an irregular event stream onto a fixed time grid.
///
/// Produces exactly one row per grid slot spanning the input's full time
/// range. Meal announcements and non-meal rows are resampled independently
/// with first-observation-wins semantics per slot, then re-joined with meal
/// rows taking priority — a meal announcement must not be shadowed by an
/// insulin dose sampled into the same slot.
///
/// The grid origin is the first timestamp floored to a whole multiple of
/// `interval` within its calendar day, so slot boundaries line up across
/// reruns regardless of when the first reading arrived.
///
/// Slots with no contributing event get a null glucose reading and an empty
/// message type. Nulls are meaningful downstream (the gap censor keys off
/// them) and are never collapsed to zero readings.
pub fn resample_to_grid(
    series: &TimeSeries,
    interval: Duration,
) -> Result<TimeSeries, CleanerError> {
    if interval <= Duration::zero() {
        return Err(CleanerError::Schema(format!(
            "grid interval must be positive, got {}s",
            interval.num_seconds()
        )));
    }
    if series.is_empty() {
        return Ok(TimeSeries::default());
    }

    let min_ts = series.events[0].timestamp;
    let max_ts = series.events[series.events.len() - 1].timestamp;

    let origin = floor_to_interval(min_ts, interval);
    let step = interval.num_seconds();
    let n_slots = ((max_ts - origin).num_seconds() / step) as usize + 1;

    let slot_of = |ts: NaiveDateTime| ((ts - origin).num_seconds() / step) as usize;

    // First-observation-wins per slot, meal and non-meal subsets separately.
    let mut non_meal: Vec<Option<&Event>> = vec![None; n_slots];
    let mut meal: Vec<Option<&Event>> = vec![None; n_slots];
    for event in &series.events {
        let slot = slot_of(event.timestamp);
        let bucket = if event.msg_type.is_meal() {
            &mut meal[slot]
        } else {
            &mut non_meal[slot]
        };
        if bucket.is_none() {
            *bucket = Some(event);
        }
    }

    let mut out = Vec::with_capacity(n_slots);
    for slot in 0..n_slots {
        let slot_ts = origin + Duration::seconds(step * slot as i64);

        // Baseline from the non-meal subset; empty slot otherwise.
        let mut row = match non_meal[slot] {
            Some(base) => {
                let mut row = base.clone();
                row.timestamp = slot_ts;
                row.food_g_keep = None;
                row
            }
            None => Event::empty_at(slot_ts),
        };

        // Meal subset overrides glucose, message type, and carbs. The
        // glucose reading falls back to the non-meal value when the meal
        // announcement carried none.
        if let Some(meal_event) = meal[slot] {
            row.bgl = meal_event.bgl.or(row.bgl);
            row.msg_type = MsgType::AnnounceMeal;
            row.food_g = meal_event.food_g;
            row.food_g_keep = Some(meal_event.food_g);
        }

        out.push(row);
    }

    Ok(TimeSeries { events: out })
}

/// Floor a timestamp to a whole multiple of `interval` since its day start.
fn floor_to_interval(ts: NaiveDateTime, interval: Duration) -> NaiveDateTime {
    let day_start = ts
        .date()
        .and_hms_opt(0, 0, 0)
        .unwrap_or(ts.with_nanosecond(0).unwrap_or(ts));
    let offset = (ts - day_start).num_seconds();
    let step = interval.num_seconds();
    day_start + Duration::seconds(offset - offset % step)
}
