//! Core pipeline orchestration for postsmith.
//!
//! This crate ties together reference search, article generation, HTML
//! assembly, and CMS publishing into the end-to-end `run` workflow.

pub mod assembler;
pub mod pipeline;

pub use pipeline::{ProgressReporter, SilentProgress, run};
