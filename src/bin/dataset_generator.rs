//! Dataset generator - cleans every raw patient file into a labeled dataset

use glucoflow::pipeline::{DatasetOrchestrator, GeneratorConfig};

fn main() {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = GeneratorConfig::from_env();
    log::info!("Starting GlucoFlow dataset generator");
    log::info!("Configuration:");
    log::info!("   raw data:   {}", config.raw_data_path);
    log::info!("   output dir: {}", config.output_dir);
    log::info!(
        "   grid {}min, day start {}h, min carbs {}g, meal window {}h, top-N {}",
        config.coerce_time_interval_mins,
        config.day_start_hours,
        config.min_carbs_g,
        config.meal_length_hours,
        config.n_top_carb_meals
    );

    let orchestrator = DatasetOrchestrator::new(config);
    match orchestrator.run() {
        Ok(summary) => {
            if !summary.failed.is_empty() {
                log::warn!("{} file(s) failed; see log above", summary.failed.len());
            }
            log::info!("All data saved successfully");
        }
        Err(e) => {
            log::error!("Fatal: {}", e);
            std::process::exit(1);
        }
    }
}
