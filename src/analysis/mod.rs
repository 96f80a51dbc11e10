//! Biomarker evaluation and differential-diagnosis scoring.
//!
//! Leaf-first: the evaluator classifies channels, the baseline aggregator
//! supplies trend context, the scorer runs the rule catalogue, the composer
//! writes the report text and the orchestrator sequences them.

pub mod baseline;
pub mod catalogue;
pub mod composer;
pub mod evaluator;
pub mod orchestrator;
pub mod scorer;

pub use orchestrator::{analyze, report_id, HistoryStore, Orchestrator, ThresholdStore};
