//! Event and TimeSeries types shared by every pipeline stage

use chrono::{NaiveDate, NaiveDateTime};

/// Message category attached to a CGM log row.
///
/// Replaces the raw-file string sentinels (`''`, `'0'`, `'LOW_CARB_MEAL'`)
/// with an explicit tagged enum. The CSV mapping is preserved verbatim so
/// outputs stay compatible with existing downstream tooling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MsgType {
    /// Patient announced a meal.
    AnnounceMeal,
    /// Insulin dose row.
    DoseInsulin,
    /// Meal announcement at or below the carb threshold; never a merge anchor.
    LowCarbMeal,
    /// Was an announced meal, lost the per-day top-N selection.
    DroppedCandidate,
    /// No message on this row (plain glucose reading or empty grid slot).
    None,
    /// Any other raw message type, carried through untouched.
    Other(String),
}

impl MsgType {
    /// CSV cell representation (inverse of `from_raw`).
    pub fn as_str(&self) -> &str {
        match self {
            MsgType::AnnounceMeal => "ANNOUNCE_MEAL",
            MsgType::DoseInsulin => "DOSE_INSULIN",
            MsgType::LowCarbMeal => "LOW_CARB_MEAL",
            MsgType::DroppedCandidate => "0",
            MsgType::None => "",
            MsgType::Other(s) => s,
        }
    }

    pub fn from_raw(raw: &str) -> Self {
        match raw.trim() {
            "ANNOUNCE_MEAL" => MsgType::AnnounceMeal,
            "DOSE_INSULIN" => MsgType::DoseInsulin,
            "LOW_CARB_MEAL" => MsgType::LowCarbMeal,
            "0" => MsgType::DroppedCandidate,
            "" => MsgType::None,
            other => MsgType::Other(other.to_string()),
        }
    }

    pub fn is_meal(&self) -> bool {
        matches!(self, MsgType::AnnounceMeal)
    }
}

/// One row of a patient's event log.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub timestamp: NaiveDateTime,
    /// Blood glucose level in mg/dL; `None` for rows with no reading.
    pub bgl: Option<f64>,
    pub msg_type: MsgType,
    /// Carbohydrate grams; 0.0 when the row carries no meal.
    pub food_g: f64,
    /// Pre-merge meal-only carb value, kept for audit.
    pub food_g_keep: Option<f64>,
    /// Logical day assigned by the day-index stage.
    pub day_start_shift: Option<NaiveDate>,
    // Passthrough metadata from the raw export.
    pub affects_fob: Option<String>,
    pub affects_iob: Option<String>,
    pub dose_units: Option<f64>,
    pub food_glycemic_index: Option<f64>,
}

impl Event {
    /// An empty grid slot at `timestamp`: no reading, no message, no carbs.
    pub fn empty_at(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            bgl: None,
            msg_type: MsgType::None,
            food_g: 0.0,
            food_g_keep: None,
            day_start_shift: None,
            affects_fob: None,
            affects_iob: None,
            dose_units: None,
            food_glycemic_index: None,
        }
    }
}

/// One patient's event log, ordered by timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    pub events: Vec<Event>,
}

impl TimeSeries {
    pub fn new(mut events: Vec<Event>) -> Self {
        events.sort_by_key(|e| e.timestamp);
        Self { events }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Total carb mass; the overlap resolver must preserve this.
    pub fn total_food_g(&self) -> f64 {
        self.events.iter().map(|e| e.food_g).sum()
    }

    /// Indices of rows currently flagged as announced meals.
    pub fn meal_indices(&self) -> Vec<usize> {
        self.events
            .iter()
            .enumerate()
            .filter(|(_, e)| e.msg_type.is_meal())
            .map(|(i, _)| i)
            .collect()
    }
}
