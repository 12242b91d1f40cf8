//! File input/output.
//!
//! - aligned-panel CSV export (`export`)
//! - cycle JSON read/write (`cycles`)

pub mod cycles;
pub mod export;

pub use cycles::*;
pub use export::*;
