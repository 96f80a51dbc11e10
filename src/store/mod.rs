//! Report history storage.

pub mod history;

pub use history::{JsonHistoryStore, MemoryHistoryStore};
