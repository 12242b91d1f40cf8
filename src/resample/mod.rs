//! Mixed-frequency alignment.
//!
//! Raw series arrive at daily, weekly, monthly or quarterly cadence with
//! reporting gaps. Everything downstream (cycle detection, overlays, tables)
//! works on one shared month-start timeline:
//!
//! - readings are bucketed into their month and averaged
//! - empty months carry the last known value forward
//! - months before a series' first reading are explicitly missing

pub mod monthly;

pub use monthly::*;
