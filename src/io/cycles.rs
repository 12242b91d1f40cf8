//! Read/write cycle JSON files.
//!
//! The schema is defined by `domain::CycleFile`.

use std::fs::File;
use std::path::Path;

use tracing::info;

use crate::domain::{Cycle, CycleFile, CycleSet, DetectorConfig, POLICY_RATE};
use crate::error::AppError;
use crate::resample::AlignedSet;

/// Assemble the portable record of a detection run.
pub fn cycle_file(
    source: &str,
    aligned: &AlignedSet,
    detector: DetectorConfig,
    all_cycles: &[Cycle],
    selected: &CycleSet,
) -> CycleFile {
    CycleFile {
        tool: "cuts".to_string(),
        source: source.to_string(),
        series_id: POLICY_RATE.to_string(),
        detector,
        first_month: aligned.timeline().first(),
        last_month: aligned.timeline().last(),
        all_cycles: all_cycles.to_vec(),
        selected: selected.clone(),
    }
}

/// Write a cycle JSON file.
pub fn write_cycles_json(path: &Path, cycles: &CycleFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create cycle JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, cycles)
        .map_err(|e| AppError::new(2, format!("Failed to write cycle JSON: {e}")))?;
    info!(path = %path.display(), cycles = cycles.all_cycles.len(), "wrote cycle JSON");
    Ok(())
}

/// Read a cycle JSON file.
pub fn read_cycles_json(path: &Path) -> Result<CycleFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open cycle JSON '{}': {e}", path.display())))?;
    let cycles: CycleFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid cycle JSON: {e}")))?;
    Ok(cycles)
}
