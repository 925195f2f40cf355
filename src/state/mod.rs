//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `RunPhase`: lifecycle of a run (idle, running, draining, done)
//! - `RunState`: frontier, visited set, external-link cache and findings
//! - `CrawlTarget`: a frontier entry with its provenance

mod run_phase;
mod run_state;

// Re-export main types
pub use run_phase::RunPhase;
pub use run_state::{CrawlTarget, RunState};
