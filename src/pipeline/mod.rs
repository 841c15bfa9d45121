//! Batch pipeline runtime: configuration, labeling, and orchestration

pub mod config;
pub mod label;
pub mod orchestrator;

pub use config::GeneratorConfig;
pub use label::{dataset_label, output_filename, patient_id_from_filename};
pub use orchestrator::{DatasetOrchestrator, RunSummary};
