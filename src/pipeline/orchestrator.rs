//! Batch orchestration: one patient file at a time, start to finish

use super::config::GeneratorConfig;
use super::label::{dataset_label, output_filename, patient_id_from_filename, patient_stem};
use crate::cleaner_core::{
    assign_logical_days, erase_consecutive_nan, erase_meal_overlap, keep_top_n_carb_meals,
    resample_to_grid, DayGrouping, TableValidator, TimeSeries,
};
use crate::storage::{
    discover_csv_files, load_patient_csv, resolve_data_path, save_labeled_csv, PipelineError,
};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Outcome of one batch run, also persisted as the JSON run manifest.
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub label: String,
    pub processed: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<FailedFile>,
}

#[derive(Debug, Serialize)]
pub struct FailedFile {
    pub file: String,
    pub error: String,
}

/// Sequences the cleaning stages against each patient file and persists the
/// labeled output.
///
/// Strictly sequential and synchronous: one file is loaded fully, processed
/// start to finish, and written before the next begins. A failure on one
/// file is logged and the batch continues; outputs already produced are
/// never rolled back. Existing outputs are skipped unless overwrite is set,
/// so reruns with the same parameters are idempotent.
pub struct DatasetOrchestrator {
    config: GeneratorConfig,
    validator: TableValidator,
}

impl DatasetOrchestrator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            validator: TableValidator::default(),
        }
    }

    /// Run the full batch. Fatal only before processing starts: a missing
    /// raw directory or an empty one fails the run immediately.
    pub fn run(&self) -> Result<RunSummary, PipelineError> {
        let raw_dir = resolve_data_path(&self.config.raw_data_path, &self.config.root_marker)?;
        let out_dir = resolve_data_path(&self.config.output_dir, &self.config.root_marker)?;
        let files = discover_csv_files(&raw_dir)?;

        let label = dataset_label(&self.config);
        let gen_date = self
            .config
            .include_gen_date_label
            .then(|| chrono::Local::now().date_naive().to_string());

        log::info!("Processing {} patient file(s) from {}", files.len(), raw_dir.display());
        log::info!("Dataset label: {}", label);

        let mut summary = RunSummary {
            label: label.clone(),
            ..RunSummary::default()
        };

        // Truncated ids can collide across raw files; count them up front so
        // colliding files fall back to their full stem instead of silently
        // sharing one output path.
        let mut id_counts: HashMap<String, usize> = HashMap::new();
        for path in &files {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            *id_counts.entry(patient_id_from_filename(&name)).or_insert(0) += 1;
        }

        for path in &files {
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let mut patient_id = patient_id_from_filename(&filename);
            if id_counts.get(&patient_id).copied().unwrap_or(0) > 1 {
                let stem = patient_stem(&filename).to_string();
                log::warn!(
                    "Patient id '{}' is shared by multiple raw files; using full stem '{}'",
                    patient_id,
                    stem
                );
                patient_id = stem;
            }
            let out_path =
                out_dir.join(output_filename(&patient_id, &label, gen_date.as_deref()));

            if out_path.exists() && !self.config.overwrite {
                log::info!("Skipping {} (output exists): {}", patient_id, out_path.display());
                summary.skipped.push(filename);
                continue;
            }

            log::info!("=========================");
            log::info!("Processing: {}", patient_id);

            match self.process_file(path, &out_path) {
                Ok(rows) => {
                    log::info!("Saved {} rows to {}", rows, out_path.display());
                    summary.processed.push(filename);
                }
                Err(e) => {
                    log::error!("Failed to process {}: {}", filename, e);
                    summary.failed.push(FailedFile {
                        file: filename,
                        error: e.to_string(),
                    });
                }
            }
        }

        self.write_manifest(&out_dir, &summary)?;
        log::info!(
            "Batch complete: {} processed, {} skipped, {} failed",
            summary.processed.len(),
            summary.skipped.len(),
            summary.failed.len()
        );

        Ok(summary)
    }

    /// Load, clean, validate, and save one patient file.
    fn process_file(&self, path: &Path, out_path: &Path) -> Result<usize, PipelineError> {
        let raw = load_patient_csv(path)?;
        let cleaned = self.clean_series(&raw)?;
        self.validator.validate(&cleaned)?;
        save_labeled_csv(&cleaned, out_path)?;
        Ok(cleaned.len())
    }

    /// The stage sequence of the core pipeline, pure over an in-memory series.
    pub fn clean_series(&self, raw: &TimeSeries) -> Result<TimeSeries, PipelineError> {
        let mut series = resample_to_grid(raw, self.config.grid_interval())?;

        assign_logical_days(&mut series, self.config.day_start_offset());

        if self.config.max_consecutive_nan >= 0 {
            let before = series.len();
            series =
                erase_consecutive_nan(&series, self.config.max_consecutive_nan, DayGrouping::Calendar)?;
            log::info!(
                "Gap censor dropped {} row(s) (threshold {})",
                before - series.len(),
                self.config.max_consecutive_nan
            );
        }

        log::info!(
            "Erasing meal overlap with minCarb {}g and {}hr meal window",
            self.config.min_carbs_g,
            self.config.meal_length_hours
        );
        erase_meal_overlap(&mut series, self.config.meal_length(), self.config.min_carbs_g);

        if self.config.n_top_carb_meals != -1 {
            keep_top_n_carb_meals(&mut series, self.config.n_top_carb_meals.max(0) as usize)?;
        }

        Ok(series)
    }

    fn write_manifest(&self, out_dir: &PathBuf, summary: &RunSummary) -> Result<(), PipelineError> {
        std::fs::create_dir_all(out_dir)?;
        let manifest_path = out_dir.join("run_manifest.json");
        let json = serde_json::to_string_pretty(summary).map_err(|e| {
            PipelineError::Io(std::io::Error::new(std::io::ErrorKind::Other, e))
        })?;
        std::fs::write(&manifest_path, json)?;
        log::info!("Run manifest written to {}", manifest_path.display());
        Ok(())
    }
}
