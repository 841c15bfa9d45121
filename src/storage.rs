//! Raw-file discovery and CSV load/save for patient event logs

use crate::cleaner_core::{CleanerError, Event, MsgType, TimeSeries};
use crate::obfuscator::ObfuscatedSeries;
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum PipelineError {
    Io(std::io::Error),
    Csv(csv::Error),
    Schema(String),
    Cleaner(CleanerError),
    /// Project root marker directory not found walking up from cwd.
    RootNotFound(String),
    /// The raw-data directory contains no CSV files.
    NoCsvFiles(PathBuf),
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err)
    }
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        PipelineError::Csv(err)
    }
}

impl From<CleanerError> for PipelineError {
    fn from(err: CleanerError) -> Self {
        PipelineError::Cleaner(err)
    }
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Io(e) => write!(f, "IO error: {}", e),
            PipelineError::Csv(e) => write!(f, "CSV error: {}", e),
            PipelineError::Schema(msg) => write!(f, "Schema error: {}", msg),
            PipelineError::Cleaner(e) => write!(f, "{}", e),
            PipelineError::RootNotFound(marker) => {
                write!(f, "Project root not found: no '{}' directory in any parent", marker)
            }
            PipelineError::NoCsvFiles(dir) => {
                write!(f, "No CSV files found in: {}", dir.display())
            }
        }
    }
}

impl std::error::Error for PipelineError {}

/// Walk up from `start` to the first directory containing `marker`.
///
/// The marker directory (`.github` by convention) pins the project root so
/// data paths in config can stay relative no matter where the binary runs.
pub fn find_root_dir(start: &Path, marker: &str) -> Result<PathBuf, PipelineError> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(marker).is_dir() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(PipelineError::RootNotFound(marker.to_string()));
        }
    }
}

/// Resolve a data path against the project root, unless already absolute.
pub fn resolve_data_path(path: &str, marker: &str) -> Result<PathBuf, PipelineError> {
    let p = Path::new(path);
    if p.is_absolute() {
        return Ok(p.to_path_buf());
    }
    let cwd = std::env::current_dir()?;
    Ok(find_root_dir(&cwd, marker)?.join(p))
}

/// List `*.csv` files in `dir`, sorted by filename for a stable batch order.
pub fn discover_csv_files(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    if !dir.is_dir() {
        return Err(PipelineError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("raw data path does not exist: {}", dir.display()),
        )));
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.extension().map(|ext| ext == "csv").unwrap_or(false))
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(PipelineError::NoCsvFiles(dir.to_path_buf()));
    }
    Ok(files)
}

/// Raw CSV row as exported by the CGM app. Everything beyond the required
/// four columns is optional passthrough.
#[derive(Debug, Deserialize)]
struct RawRecord {
    date: String,
    bgl: Option<f64>,
    msg_type: Option<String>,
    food_g: Option<f64>,
    #[serde(default)]
    affects_fob: Option<String>,
    #[serde(default)]
    affects_iob: Option<String>,
    #[serde(default)]
    dose_units: Option<f64>,
    #[serde(default)]
    food_glycemic_index: Option<f64>,
}

const REQUIRED_COLUMNS: [&str; 4] = ["date", "bgl", "msg_type", "food_g"];

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim().trim_end_matches('Z');
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
}

/// Load one patient file into a sorted [`TimeSeries`].
///
/// A missing required column fails the file with a schema error. Rows whose
/// timestamp does not parse are dropped with a warning, matching the
/// historical coerce-and-drop behavior.
pub fn load_patient_csv(path: &Path) -> Result<TimeSeries, PipelineError> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    let headers = reader.headers()?.clone();
    for required in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == required) {
            return Err(PipelineError::Schema(format!(
                "missing required column '{}' in {}",
                required,
                path.display()
            )));
        }
    }

    let mut events = Vec::new();
    let mut dropped = 0usize;
    for record in reader.deserialize::<RawRecord>() {
        let record = record?;
        let Some(timestamp) = parse_timestamp(&record.date) else {
            dropped += 1;
            continue;
        };
        events.push(Event {
            timestamp,
            bgl: record.bgl,
            msg_type: MsgType::from_raw(record.msg_type.as_deref().unwrap_or("")),
            food_g: record.food_g.unwrap_or(0.0),
            food_g_keep: None,
            day_start_shift: None,
            affects_fob: record.affects_fob,
            affects_iob: record.affects_iob,
            dose_units: record.dose_units,
            food_glycemic_index: record.food_glycemic_index,
        });
    }

    if dropped > 0 {
        log::warn!(
            "Dropped {} row(s) with unparseable timestamps from {}",
            dropped,
            path.display()
        );
    }

    Ok(TimeSeries::new(events))
}

fn fmt_opt_f64(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn fmt_opt_msg(value: &Option<MsgType>) -> String {
    value
        .as_ref()
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

const LABELED_COLUMNS: [&str; 10] = [
    "date",
    "bgl",
    "msg_type",
    "affects_fob",
    "affects_iob",
    "dose_units",
    "food_g",
    "food_glycemic_index",
    "food_g_keep",
    "day_start_shift",
];

fn labeled_record(event: &Event) -> [String; 10] {
    [
        event.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        fmt_opt_f64(event.bgl),
        event.msg_type.as_str().to_string(),
        event.affects_fob.clone().unwrap_or_default(),
        event.affects_iob.clone().unwrap_or_default(),
        fmt_opt_f64(event.dose_units),
        event.food_g.to_string(),
        fmt_opt_f64(event.food_glycemic_index),
        fmt_opt_f64(event.food_g_keep),
        event
            .day_start_shift
            .map(|d| d.to_string())
            .unwrap_or_default(),
    ]
}

/// Persist a labeled series; one row per grid timestamp.
pub fn save_labeled_csv(series: &TimeSeries, path: &Path) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(file));

    writer.write_record(LABELED_COLUMNS)?;
    for event in &series.events {
        writer.write_record(labeled_record(event))?;
    }

    writer.flush()?;
    Ok(())
}

/// Persist an obfuscated series: the labeled column set with the untouched
/// ground-truth `msg_type`, plus the simulated `msg_type_log` and
/// `msg_type_log_shifted` label layers. One file carries both truths.
pub fn save_obfuscated_csv(obf: &ObfuscatedSeries, path: &Path) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(file));

    let mut header: Vec<&str> = LABELED_COLUMNS.to_vec();
    header.push("msg_type_log");
    header.push("msg_type_log_shifted");
    writer.write_record(&header)?;

    for (idx, event) in obf.series.events.iter().enumerate() {
        let mut record: Vec<String> = labeled_record(event).to_vec();
        record.push(fmt_opt_msg(&obf.msg_type_log[idx]));
        record.push(fmt_opt_msg(&obf.msg_type_log_shifted[idx]));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}
