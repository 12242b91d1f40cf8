//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw and month-aligned series (`RawSeries`, `MonthlySeries`)
//! - detected easing episodes (`Cycle`, `CycleSet`) and detector parameters
//! - panel definitions and the run configuration (`Panel`, `RunConfig`)

pub mod types;

pub use types::*;
