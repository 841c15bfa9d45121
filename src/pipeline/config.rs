//! Generator configuration from environment variables

use chrono::Duration;
use std::env;

/// Configuration for the dataset generator run.
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Raw patient CSVs, relative to the project root unless absolute.
    pub raw_data_path: String,

    /// Where labeled outputs land, relative to the project root unless absolute.
    pub output_dir: String,

    /// Marker directory that identifies the project root.
    pub root_marker: String,

    /// Fixed grid interval in minutes.
    pub coerce_time_interval_mins: i64,

    /// Hours past midnight at which a patient's logical day starts.
    pub day_start_hours: i64,

    /// Minimum carb grams for an announcement to anchor a merge window.
    pub min_carbs_g: f64,

    /// Meal lookahead window in hours.
    pub meal_length_hours: i64,

    /// Meals kept per logical day; -1 disables top-N selection.
    pub n_top_carb_meals: i64,

    /// Longest tolerated run of missing glucose rows per day; negative
    /// disables gap censoring.
    pub max_consecutive_nan: i64,

    /// Recompute outputs that already exist.
    pub overwrite: bool,

    /// Prefix output filenames with the generation date.
    pub include_gen_date_label: bool,
}

impl GeneratorConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `GLUCOFLOW_RAW_DATA_PATH` (default: data/raw)
    /// - `GLUCOFLOW_OUTPUT_DIR` (default: data/interim)
    /// - `GLUCOFLOW_ROOT_MARKER` (default: .github)
    /// - `COERCE_TIME_INTERVAL_MINS` (default: 5)
    /// - `DAY_START_HOURS` (default: 4)
    /// - `MIN_CARBS_G` (default: 10)
    /// - `MEAL_LENGTH_HOURS` (default: 2)
    /// - `N_TOP_CARB_MEALS` (default: 3, -1 disables)
    /// - `MAX_CONSECUTIVE_NAN` (default: -1, disabled)
    /// - `OVERWRITE_EXISTING` (default: false)
    /// - `INCLUDE_GEN_DATE_LABEL` (default: true)
    pub fn from_env() -> Self {
        Self {
            raw_data_path: env::var("GLUCOFLOW_RAW_DATA_PATH")
                .unwrap_or_else(|_| "data/raw".to_string()),

            output_dir: env::var("GLUCOFLOW_OUTPUT_DIR")
                .unwrap_or_else(|_| "data/interim".to_string()),

            root_marker: env::var("GLUCOFLOW_ROOT_MARKER")
                .unwrap_or_else(|_| ".github".to_string()),

            coerce_time_interval_mins: parse_env("COERCE_TIME_INTERVAL_MINS", 5),
            day_start_hours: parse_env("DAY_START_HOURS", 4),
            min_carbs_g: parse_env("MIN_CARBS_G", 10.0),
            meal_length_hours: parse_env("MEAL_LENGTH_HOURS", 2),
            n_top_carb_meals: parse_env("N_TOP_CARB_MEALS", 3),
            max_consecutive_nan: parse_env("MAX_CONSECUTIVE_NAN", -1),
            overwrite: parse_env("OVERWRITE_EXISTING", false),
            include_gen_date_label: parse_env("INCLUDE_GEN_DATE_LABEL", true),
        }
    }

    pub fn grid_interval(&self) -> Duration {
        Duration::minutes(self.coerce_time_interval_mins)
    }

    pub fn day_start_offset(&self) -> Duration {
        Duration::hours(self.day_start_hours)
    }

    pub fn meal_length(&self) -> Duration {
        Duration::hours(self.meal_length_hours)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test so the env mutations never race a parallel test runner.
    #[test]
    fn test_config_from_env() {
        env::remove_var("GLUCOFLOW_RAW_DATA_PATH");
        env::remove_var("COERCE_TIME_INTERVAL_MINS");
        env::remove_var("N_TOP_CARB_MEALS");
        env::remove_var("OVERWRITE_EXISTING");

        let config = GeneratorConfig::from_env();

        assert_eq!(config.raw_data_path, "data/raw");
        assert_eq!(config.output_dir, "data/interim");
        assert_eq!(config.coerce_time_interval_mins, 5);
        assert_eq!(config.day_start_hours, 4);
        assert_eq!(config.min_carbs_g, 10.0);
        assert_eq!(config.meal_length_hours, 2);
        assert_eq!(config.n_top_carb_meals, 3);
        assert_eq!(config.max_consecutive_nan, -1);
        assert!(!config.overwrite);
        assert!(config.include_gen_date_label);

        env::set_var("GLUCOFLOW_RAW_DATA_PATH", "/tmp/raw");
        env::set_var("COERCE_TIME_INTERVAL_MINS", "15");
        env::set_var("N_TOP_CARB_MEALS", "-1");
        env::set_var("OVERWRITE_EXISTING", "true");

        let config = GeneratorConfig::from_env();

        assert_eq!(config.raw_data_path, "/tmp/raw");
        assert_eq!(config.coerce_time_interval_mins, 15);
        assert_eq!(config.n_top_carb_meals, -1);
        assert!(config.overwrite);
        assert_eq!(config.grid_interval(), Duration::minutes(15));

        env::remove_var("GLUCOFLOW_RAW_DATA_PATH");
        env::remove_var("COERCE_TIME_INTERVAL_MINS");
        env::remove_var("N_TOP_CARB_MEALS");
        env::remove_var("OVERWRITE_EXISTING");
    }
}
