//! Progress statistics for the session being recorded.

pub mod counters;

pub use counters::{create_shared_counters, ReadingCounters, ReadingStats, SharedReadingCounters};
