//! Parameter-encoded dataset labels and output filenames

use super::config::GeneratorConfig;

/// Build the transformation label encoded into every output filename:
/// `i{interval}mins_d{day_start}hrs_c{min_carbs}g_l{meal_len}hrs_n{top_n}`.
///
/// A parameter combination maps to exactly one label, which is what makes
/// the skip-if-exists rerun check sound.
pub fn dataset_label(config: &GeneratorConfig) -> String {
    let mut label = String::new();

    label.push_str(&format!("i{}mins_", config.coerce_time_interval_mins));
    label.push_str(&format!("d{}hrs_", config.day_start_hours));
    label.push_str(&format!(
        "c{}g_l{}hrs_",
        config.min_carbs_g, config.meal_length_hours
    ));
    if config.max_consecutive_nan >= 0 {
        label.push_str(&format!("g{}nan_", config.max_consecutive_nan));
    }
    label.push_str(&format!("n{}", config.n_top_carb_meals));

    label
}

/// Output filename for one patient, optionally prefixed with the generation
/// date.
pub fn output_filename(
    patient_id: &str,
    label: &str,
    gen_date: Option<&str>,
) -> String {
    match gen_date {
        Some(date) => format!("{}_{}_{}.csv", date, patient_id, label),
        None => format!("{}_{}.csv", patient_id, label),
    }
}

/// Raw filename stem, untruncated.
pub fn patient_stem(filename: &str) -> &str {
    filename.strip_suffix(".csv").unwrap_or(filename)
}

/// Patient id: the raw filename stem, truncated the way the labeling
/// convention expects. Callers must disambiguate when two raw files share
/// a truncated id, or the skip-if-exists check conflates their outputs.
pub fn patient_id_from_filename(filename: &str) -> String {
    patient_stem(filename).chars().take(7).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GeneratorConfig {
        GeneratorConfig {
            raw_data_path: "data/raw".to_string(),
            output_dir: "data/interim".to_string(),
            root_marker: ".github".to_string(),
            coerce_time_interval_mins: 5,
            day_start_hours: 4,
            min_carbs_g: 10.0,
            meal_length_hours: 2,
            n_top_carb_meals: 3,
            max_consecutive_nan: -1,
            overwrite: false,
            include_gen_date_label: true,
        }
    }

    #[test]
    fn test_label_encodes_full_parameter_set() {
        assert_eq!(dataset_label(&config()), "i5mins_d4hrs_c10g_l2hrs_n3");
    }

    #[test]
    fn test_label_includes_gap_threshold_when_enabled() {
        let mut c = config();
        c.max_consecutive_nan = 3;
        assert_eq!(dataset_label(&c), "i5mins_d4hrs_c10g_l2hrs_g3nan_n3");
    }

    #[test]
    fn test_same_parameters_same_label() {
        assert_eq!(dataset_label(&config()), dataset_label(&config()));
    }

    #[test]
    fn test_output_filename_with_and_without_date() {
        assert_eq!(
            output_filename("patient", "i5mins_n3", Some("2026-08-30")),
            "2026-08-30_patient_i5mins_n3.csv"
        );
        assert_eq!(
            output_filename("patient", "i5mins_n3", None),
            "patient_i5mins_n3.csv"
        );
    }

    #[test]
    fn test_patient_id_truncates_stem() {
        assert_eq!(patient_id_from_filename("679372fa2.csv"), "679372f");
        assert_eq!(patient_id_from_filename("p1.csv"), "p1");
    }
}
