//! GlucoFlow - CGM meal-labeling dataset pipeline
//!
//! Transforms raw continuous-glucose-monitor event logs into labeled
//! datasets for meal-detection modeling, and simulates realistic
//! meal-logging behavior on top of the cleaned output.


pub mod cleaner_core;
pub mod obfuscator;
pub mod pipeline;
pub mod storage;

pub use cleaner_core::{CleanerError, Event, MsgType, TimeSeries};
pub use pipeline::{DatasetOrchestrator, GeneratorConfig};
pub use storage::PipelineError;
