//! Meal-overlap resolution: merge announcements inside a lookahead window

use super::event::{MsgType, TimeSeries};
use chrono::Duration;

/// Merge meal announcements that fall inside an earlier meal's window.
///
/// Patients often log one meal as several announcements a few minutes apart.
/// This pass walks announced meals in chronological order; each qualifying
/// anchor absorbs the carbs of every event inside `(anchor, anchor +
/// meal_length]` and those events are zeroed and cleared so they can never
/// anchor a later window. Total carb mass is conserved: carbs move into the
/// anchor, they are never created or destroyed.
///
/// An announcement with `food_g <= min_carbs` does not qualify as an anchor
/// (strict `>`; a meal of exactly `min_carbs` grams is not a meal). It is
/// relabeled [`MsgType::LowCarbMeal`] so downstream stages can tell it apart
/// from both real meals and cleared rows. Sub-threshold carbs still roll into
/// a larger meal when an earlier anchor's window covers them.
///
/// The anchor list is snapshotted before any mutation; absorption updates the
/// series in place by index. An index cleared by an earlier anchor is skipped
/// when the walk reaches it.
pub fn erase_meal_overlap(series: &mut TimeSeries, meal_length: Duration, min_carbs: f64) {
    let anchors = series.meal_indices();

    for idx in anchors {
        // Absorbed by an earlier window since the snapshot was taken.
        if !series.events[idx].msg_type.is_meal() {
            continue;
        }

        if series.events[idx].food_g <= min_carbs {
            series.events[idx].msg_type = MsgType::LowCarbMeal;
            continue;
        }

        let window_end = series.events[idx].timestamp + meal_length;
        let mut absorbed = 0.0;
        let mut j = idx + 1;
        while j < series.events.len() && series.events[j].timestamp <= window_end {
            if series.events[j].food_g > 0.0 {
                absorbed += series.events[j].food_g;
            }
            series.events[j].food_g = 0.0;
            series.events[j].msg_type = MsgType::None;
            j += 1;
        }

        series.events[idx].food_g += absorbed;
    }
}
