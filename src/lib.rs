//! Metrics aggregation and scoring for the HR operations dashboard.
//!
//! One aggregation pass reads candidates, interviews and mentors from a
//! [`store::RecordSource`], builds daily and monthly activity buckets, a status
//! distribution and a weighted performance score, and compares the pass's
//! rollup against the previously persisted snapshot to produce a trend.

pub mod buckets;
pub mod config;
pub mod db;
pub mod distribution;
pub mod engine;
pub mod error;
pub mod logging;
pub mod models;
pub mod report;
pub mod scheduler;
pub mod score;
pub mod store;
pub mod trend;
