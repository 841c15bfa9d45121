//! End-to-end tests for the dataset pipeline
//!
//! Exercise the full path a raw patient file takes: CSV load, resampling,
//! day indexing, overlap resolution, top-N selection, validation, labeled
//! CSV output, and the idempotent-rerun contract.

use chrono::Datelike;
use glucoflow::cleaner_core::MsgType;
use glucoflow::pipeline::{DatasetOrchestrator, GeneratorConfig};
use glucoflow::storage::load_patient_csv;
use std::io::Write;
use std::path::Path;

fn config(raw: &Path, out: &Path) -> GeneratorConfig {
    GeneratorConfig {
        raw_data_path: raw.to_string_lossy().to_string(),
        output_dir: out.to_string_lossy().to_string(),
        root_marker: ".github".to_string(),
        coerce_time_interval_mins: 5,
        day_start_hours: 4,
        min_carbs_g: 10.0,
        meal_length_hours: 2,
        n_top_carb_meals: 3,
        max_consecutive_nan: 3,
        overwrite: false,
        include_gen_date_label: false,
    }
}

/// A day and a half of raw data. Day one is usable: continuous readings
/// every 5 minutes with two overlapping meal announcements and an insulin
/// dose. Day two has a 30-minute missing-glucose hole (6 empty grid slots,
/// past the threshold of 3) and must be censored entirely.
fn write_fixture(raw_dir: &Path) {
    use chrono::{Duration, NaiveDate};

    let start = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap();
    let hole_start = NaiveDate::from_ymd_opt(2024, 3, 2)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    // Past the 08:00 meal's 2h merge window, which clears everything inside.
    let dose_slot = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(10, 30, 0)
        .unwrap();

    let mut f = std::fs::File::create(raw_dir.join("patient_a.csv")).unwrap();
    writeln!(f, "date,bgl,msg_type,food_g,dose_units").unwrap();

    // Continuous readings from 2024-03-01 08:00 through 2024-03-02 12:00.
    for i in 0..=336 {
        let ts = start + Duration::minutes(5 * i);
        if ts >= hole_start && ts < hole_start + Duration::minutes(30) {
            continue; // the censored gap on day two
        }
        if ts == dose_slot {
            continue; // this slot belongs to the dose row below
        }
        writeln!(f, "{},{},,,", ts.format("%Y-%m-%d %H:%M:%S"), 100 + i % 50).unwrap();
    }
    writeln!(f, "2024-03-01 08:02:00,105,ANNOUNCE_MEAL,50,").unwrap();
    writeln!(f, "2024-03-01 08:40:00,118,ANNOUNCE_MEAL,25,").unwrap();
    writeln!(f, "2024-03-01 10:32:00,130,DOSE_INSULIN,,4").unwrap();
}

#[test]
fn test_end_to_end_labeled_output() {
    let temp = tempfile::tempdir().unwrap();
    let raw = temp.path().join("raw");
    let out = temp.path().join("interim");
    std::fs::create_dir_all(&raw).unwrap();
    write_fixture(&raw);

    let summary = DatasetOrchestrator::new(config(&raw, &out)).run().unwrap();
    assert_eq!(summary.processed, vec!["patient_a.csv"]);
    assert_eq!(summary.label, "i5mins_d4hrs_c10g_l2hrs_g3nan_n3");

    let out_path = out.join("patient_i5mins_d4hrs_c10g_l2hrs_g3nan_n3.csv");
    let series = load_patient_csv(&out_path).unwrap();

    // Gap censor: day two's 30-minute hole (6 empty slots > 3) removed the
    // whole day; day one survives with no missing readings left.
    assert!(series
        .events
        .iter()
        .all(|e| e.timestamp.date().day() == 1 && e.bgl.is_some()));

    // Overlap: the 08:40 meal fell inside the 08:02 anchor's 2h window.
    let meals: Vec<f64> = series
        .events
        .iter()
        .filter(|e| e.msg_type.is_meal())
        .map(|e| e.food_g)
        .collect();
    assert_eq!(meals, vec![75.0]);

    // The insulin dose row survived resampling untouched.
    assert!(series
        .events
        .iter()
        .any(|e| e.msg_type == MsgType::DoseInsulin && e.dose_units == Some(4.0)));

    // Carbs were merged, not duplicated.
    assert_eq!(series.total_food_g(), 75.0);
}

#[test]
fn test_rerun_is_idempotent_and_respects_overwrite() {
    let temp = tempfile::tempdir().unwrap();
    let raw = temp.path().join("raw");
    let out = temp.path().join("interim");
    std::fs::create_dir_all(&raw).unwrap();
    write_fixture(&raw);

    let cfg = config(&raw, &out);
    DatasetOrchestrator::new(cfg.clone()).run().unwrap();

    let rerun = DatasetOrchestrator::new(cfg.clone()).run().unwrap();
    assert_eq!(rerun.skipped, vec!["patient_a.csv"]);
    assert!(rerun.processed.is_empty());

    let mut overwriting = cfg;
    overwriting.overwrite = true;
    let third = DatasetOrchestrator::new(overwriting).run().unwrap();
    assert_eq!(third.processed, vec!["patient_a.csv"]);
}

#[test]
fn test_manifest_records_run_outcome() {
    let temp = tempfile::tempdir().unwrap();
    let raw = temp.path().join("raw");
    let out = temp.path().join("interim");
    std::fs::create_dir_all(&raw).unwrap();
    write_fixture(&raw);

    DatasetOrchestrator::new(config(&raw, &out)).run().unwrap();

    let manifest = std::fs::read_to_string(out.join("run_manifest.json")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&manifest).unwrap();
    assert_eq!(parsed["label"], "i5mins_d4hrs_c10g_l2hrs_g3nan_n3");
    assert_eq!(parsed["processed"][0], "patient_a.csv");
}
