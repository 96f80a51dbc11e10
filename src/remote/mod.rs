//! Model-backed analysis.
//!
//! An alternative body for the analyze contract that asks a local Ollama
//! model for the differential instead of running the rule catalogue.

pub mod analyzer;

pub use analyzer::RemoteAnalyzer;
