//! Data obfuscator - simulates meal-logging behavior over cleaned datasets
//!
//! Reads every cleaned CSV from the output directory, draws a logging
//! behaviour and a logging timing profile per patient, and writes an
//! obfuscated variant alongside with both profile tags in the filename.
//! Seed the draws with `GLUCOFLOW_OBFUSCATOR_SEED` for reproducible batches.

use glucoflow::obfuscator::{
    obfuscate_series, LoggerProfile, TimingProfile, DEFAULT_LOGGER_DISTRIBUTION,
    DEFAULT_TIMING_DISTRIBUTION,
};
use glucoflow::pipeline::GeneratorConfig;
use glucoflow::storage::{
    discover_csv_files, load_patient_csv, resolve_data_path, save_obfuscated_csv,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = GeneratorConfig::from_env();
    let mut rng = match std::env::var("GLUCOFLOW_OBFUSCATOR_SEED")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
    {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    if let Err(e) = run(&config, &mut rng) {
        log::error!("Fatal: {}", e);
        std::process::exit(1);
    }
}

fn run(config: &GeneratorConfig, rng: &mut StdRng) -> Result<(), glucoflow::PipelineError> {
    let in_dir = resolve_data_path(&config.output_dir, &config.root_marker)?;
    let files = discover_csv_files(&in_dir)?;
    log::info!("Obfuscating {} cleaned file(s) from {}", files.len(), in_dir.display());

    for path in &files {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        if stem.contains("_obf_") {
            continue; // already an obfuscated variant
        }

        let behaviour = LoggerProfile::sample(rng, &DEFAULT_LOGGER_DISTRIBUTION);
        let timing = TimingProfile::sample(rng, &DEFAULT_TIMING_DISTRIBUTION);
        let out_path = in_dir.join(format!(
            "{}_obf_{}_{}.csv",
            stem,
            behaviour.as_str(),
            timing.as_str()
        ));

        match load_patient_csv(path) {
            Ok(series) => {
                let obf = obfuscate_series(&series, behaviour, timing, rng);
                save_obfuscated_csv(&obf, &out_path)?;
                let kept = obf
                    .msg_type_log
                    .iter()
                    .filter(|m| matches!(m, Some(t) if t.is_meal()))
                    .count();
                let original = series.events.iter().filter(|e| e.msg_type.is_meal()).count();
                log::info!(
                    "{}: behaviour {} / timing {} kept {}/{} meal announcements -> {}",
                    stem,
                    behaviour.as_str(),
                    timing.as_str(),
                    kept,
                    original,
                    out_path.display()
                );
            }
            Err(e) => {
                log::error!("Failed to obfuscate {}: {}", stem, e);
            }
        }
    }

    Ok(())
}
