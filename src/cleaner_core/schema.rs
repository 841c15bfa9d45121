//! Structural table validation run once per series before persisting

use super::error::CleanerError;
use super::event::{Event, TimeSeries};

/// A single out-of-domain cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub row: usize,
    pub column: &'static str,
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {}: {}: {}", self.row, self.column, self.message)
    }
}

/// Compiled per-column range checks, applied in one pass over the table.
///
/// One fixed rule set evaluated per row is both clearer and cheaper than
/// constructing a validation model per row. Stages never clamp values; a
/// series failing this gate fails the file.
#[derive(Debug, Clone)]
pub struct TableValidator {
    /// Physiological glucose range, mg/dL.
    pub bgl_range: (f64, f64),
}

impl Default for TableValidator {
    fn default() -> Self {
        // Meters clip to roughly 20-600 mg/dL; leave headroom either side
        // rather than reject sensor-edge readings.
        Self {
            bgl_range: (10.0, 1000.0),
        }
    }
}

impl TableValidator {
    /// Validate the whole series; `Err` carries every violation found.
    pub fn validate(&self, series: &TimeSeries) -> Result<(), CleanerError> {
        let mut violations = Vec::new();
        for (row, event) in series.events.iter().enumerate() {
            self.check_row(row, event, &mut violations);
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(CleanerError::Validation(violations))
        }
    }

    fn check_row(&self, row: usize, event: &Event, out: &mut Vec<Violation>) {
        if event.food_g < 0.0 {
            out.push(Violation {
                row,
                column: "food_g",
                message: format!("negative carbs: {}", event.food_g),
            });
        }
        if let Some(keep) = event.food_g_keep {
            if keep < 0.0 {
                out.push(Violation {
                    row,
                    column: "food_g_keep",
                    message: format!("negative carbs: {}", keep),
                });
            }
        }
        if let Some(bgl) = event.bgl {
            let (lo, hi) = self.bgl_range;
            if !(lo..=hi).contains(&bgl) || !bgl.is_finite() {
                out.push(Violation {
                    row,
                    column: "bgl",
                    message: format!("glucose {} outside [{}, {}]", bgl, lo, hi),
                });
            }
        }
    }
}
