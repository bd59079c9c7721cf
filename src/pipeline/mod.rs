//! # Pipeline
//!
//! Runs one effect over a single image or a whole frame sequence: input
//! resolution, frame extraction, the parallel frame loop, reassembly, and
//! cleanup of intermediate frames.

pub mod context;
pub mod engine;

// Re-exports for convenience
pub use context::WorkingContext;
pub use engine::{BackgroundSource, InputKind, Pipeline, RunReport, RunRequest, SequenceSource};
