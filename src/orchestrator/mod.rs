//! Test run orchestration
//!
//! Drives the fixed pipeline: describe both variants, fan the
//! descriptions out to every persona, then aggregate, compare, and
//! recommend.

mod runner;

pub use runner::{Orchestrator, RunOutcome};
