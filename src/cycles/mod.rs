//! Rate-cut cycle detection and selection.
//!
//! - `detector`: the easing state machine over the policy-rate series
//! - `select_recent`: caller-side truncation to the N most recent cycles

pub mod detector;

pub use detector::detect_cycles;

use crate::domain::{Cycle, CycleSet};

/// Keep the first `n` cycles of a most-recent-first list.
pub fn select_recent(cycles: &[Cycle], n: usize) -> CycleSet {
    CycleSet {
        limit: n,
        cycles: cycles.iter().take(n).copied().collect(),
    }
}
