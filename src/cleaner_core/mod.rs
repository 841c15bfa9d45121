//! Cleaner Core - Meal-Labeling Pipeline Stages
//!
//! The stages that turn a raw, irregularly-sampled CGM event log into a
//! clean, day-segmented series with at most N real meals per day.
//!
//! # Architecture
//!
//! ```text
//! Raw patient CSV → resampler (fixed 5-min grid)
//!     ↓
//! day_index (logical day = date of timestamp - day_start_offset)
//!     ↓
//! gap_censor (optional: drop days with long missing-glucose runs)
//!     ↓
//! overlap (merge meal announcements inside the lookahead window)
//!     ↓
//! top_n (keep the N largest meals per logical day)
//!     ↓
//! schema (range validation gate) → labeled output CSV
//! ```

pub mod day_index;
pub mod error;
pub mod event;
pub mod gap_censor;
pub mod overlap;
pub mod resampler;
pub mod schema;
pub mod top_n;

pub use day_index::assign_logical_days;
pub use error::CleanerError;
pub use event::{Event, MsgType, TimeSeries};
pub use gap_censor::{erase_consecutive_nan, DayGrouping};
pub use overlap::erase_meal_overlap;
pub use resampler::resample_to_grid;
pub use schema::{TableValidator, Violation};
pub use top_n::keep_top_n_carb_meals;
