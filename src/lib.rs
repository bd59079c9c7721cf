//! # framefx
//!
//! Split a video into frames, apply a per-pixel effect to every frame, and
//! reassemble the result.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use framefx::{
//!     config::Config,
//!     effects::EffectSpec,
//!     pipeline::{Pipeline, RunRequest, WorkingContext},
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let pipeline = Pipeline::with_ffmpeg(Config::default(), EffectSpec::Negative);
//! let ctx = WorkingContext::new("work", None, true);
//!
//! let report = pipeline.run(ctx, RunRequest {
//!     input: "clip.mp4".into(),
//!     background: None,
//!     output: "negative.mp4".into(),
//! }).await?;
//! println!("{} frames written", report.succeeded.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`effects`] - Chroma key, negative and colored-light effects
//! - [`video`] - Frames, on-disk frame sequences, and the ffmpeg codec
//! - [`pipeline`] - Run orchestration over single images and sequences
//! - [`config`] - Configuration management

pub mod config;
pub mod effects;
pub mod error;
pub mod pipeline;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    config::Config,
    effects::{EffectSpec, RgbColor},
    error::{FxError, Result},
    pipeline::{Pipeline, RunReport, RunRequest, WorkingContext},
};
