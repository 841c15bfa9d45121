//! Per-day top-N meal selection

use super::error::CleanerError;
use super::event::{MsgType, TimeSeries};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Keep only the `n` largest announced meals per logical day.
///
/// Every other announced meal in the day is zeroed and relabeled
/// [`MsgType::DroppedCandidate`], recording "was a candidate, was dropped" —
/// distinct from both a real meal and an empty row. Ties on carb grams break
/// by original chronological order (stable sort), so the earliest of two
/// equal meals wins. Days with no announced meals are untouched.
///
/// Requires the day-index stage to have run: an announced meal without a
/// logical day is a caller bug and fails with a precondition error rather
/// than silently defaulting to calendar grouping.
pub fn keep_top_n_carb_meals(series: &mut TimeSeries, n: usize) -> Result<(), CleanerError> {
    // (day, candidate indices), chronological within each day.
    let mut days: BTreeMap<NaiveDate, Vec<usize>> = BTreeMap::new();
    for idx in series.meal_indices() {
        let day = series.events[idx].day_start_shift.ok_or_else(|| {
            CleanerError::Precondition(
                "day_start_shift not assigned; run the day-index stage before top-N selection"
                    .to_string(),
            )
        })?;
        days.entry(day).or_default().push(idx);
    }

    for (_, mut candidates) in days {
        if candidates.len() <= n {
            continue;
        }
        // Stable: equal carb values keep chronological order.
        candidates.sort_by(|&a, &b| {
            series.events[b]
                .food_g
                .partial_cmp(&series.events[a].food_g)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        for &idx in &candidates[n..] {
            series.events[idx].food_g = 0.0;
            series.events[idx].msg_type = MsgType::DroppedCandidate;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner_core::event::Event;
    use chrono::{Duration, NaiveDateTime};

    fn ts(day: u32, min: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
            + Duration::minutes(min)
    }

    fn meal(day: u32, min: i64, food_g: f64) -> Event {
        let mut e = Event::empty_at(ts(day, min));
        e.msg_type = MsgType::AnnounceMeal;
        e.food_g = food_g;
        e.day_start_shift = Some(NaiveDate::from_ymd_opt(2024, 3, day).unwrap());
        e
    }

    #[test]
    fn test_smallest_meal_dropped_even_after_surviving_overlap() {
        let mut series =
            TimeSeries::new(vec![meal(1, 0, 5.0), meal(1, 120, 40.0), meal(1, 300, 60.0)]);
        keep_top_n_carb_meals(&mut series, 2).unwrap();

        assert_eq!(series.events[0].msg_type, MsgType::DroppedCandidate);
        assert_eq!(series.events[0].food_g, 0.0);
        assert_eq!(series.events[1].msg_type, MsgType::AnnounceMeal);
        assert_eq!(series.events[2].msg_type, MsgType::AnnounceMeal);
    }

    #[test]
    fn test_bound_holds_per_day_not_globally() {
        let mut series = TimeSeries::new(vec![
            meal(1, 0, 30.0),
            meal(1, 120, 40.0),
            meal(2, 0, 20.0),
            meal(2, 120, 25.0),
        ]);
        keep_top_n_carb_meals(&mut series, 1).unwrap();

        for day in [1, 2] {
            let kept = series
                .events
                .iter()
                .filter(|e| {
                    e.msg_type.is_meal()
                        && e.day_start_shift == Some(NaiveDate::from_ymd_opt(2024, 3, day).unwrap())
                })
                .count();
            assert_eq!(kept, 1);
        }
    }

    #[test]
    fn test_ties_keep_the_earliest_meal() {
        let mut series = TimeSeries::new(vec![meal(1, 0, 40.0), meal(1, 120, 40.0)]);
        keep_top_n_carb_meals(&mut series, 1).unwrap();

        assert_eq!(series.events[0].msg_type, MsgType::AnnounceMeal);
        assert_eq!(series.events[1].msg_type, MsgType::DroppedCandidate);
    }

    #[test]
    fn test_day_with_fewer_meals_than_n_is_untouched() {
        let mut series = TimeSeries::new(vec![meal(1, 0, 30.0)]);
        let before = series.clone();
        keep_top_n_carb_meals(&mut series, 3).unwrap();
        assert_eq!(series, before);
    }

    #[test]
    fn test_missing_day_index_is_a_precondition_error() {
        let mut unassigned = meal(1, 0, 30.0);
        unassigned.day_start_shift = None;
        let mut series = TimeSeries::new(vec![unassigned]);

        let err = keep_top_n_carb_meals(&mut series, 2).unwrap_err();
        assert!(matches!(err, CleanerError::Precondition(_)));
    }

    #[test]
    fn test_low_carb_and_dropped_rows_are_not_candidates() {
        let mut low = meal(1, 0, 5.0);
        low.msg_type = MsgType::LowCarbMeal;
        let mut series = TimeSeries::new(vec![low.clone(), meal(1, 120, 40.0)]);
        keep_top_n_carb_meals(&mut series, 1).unwrap();

        // The low-carb row keeps its label and carbs; only announced meals compete.
        assert_eq!(series.events[0], low);
        assert_eq!(series.events[1].msg_type, MsgType::AnnounceMeal);
    }
}
