//! `cut-cycles` library crate.
//!
//! Aligns FRED series of mixed cadence onto one monthly timeline, detects
//! easing cycles in the policy rate and reports how lending rates, credit
//! quality and spending moved around each cycle.
//!
//! The binary (`cuts`) is a thin wrapper around this library so the core
//! stays testable without spawning processes.

pub mod app;
pub mod cli;
pub mod cycles;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod plot;
pub mod report;
pub mod resample;
