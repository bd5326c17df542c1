//! # PixelMorph Library
//!
//! The `pixelmorph` library turns two equal-sized photos into an animation that
//! "morphs" the source into the target by moving pixels rather than blending
//! colors. Every source pixel is paired with exactly one target coordinate, and
//! each pair gets a deterministic trajectory.
//!
//! ## Overview of Modules
//!
//! - **`pixelmorph_processor`**: Orchestrates the workflow: extract both photos,
//!   rank the pixel sequences, pair them into an [AnimationPlan].
//!
//! - **`photo`**: Defines the `Photo` RGBA raster used for inputs and rendered frames,
//!   plus the `Bounds` shared by both inputs.
//!
//! - **`pixel_extractor`**: Produces one `PixelRecord` per pixel, scored by BT.601 luma.
//!
//! - **`correspondence_ranking`**: The two ranking strategies (`default`, `featured`)
//!   and the local-contrast "interval depth" used by `featured`.
//!
//! - **`animation_plan`**: Pairs ranked sequences into per-pixel motions and the
//!   global frame count. Plans can be serialized for inspection or reuse.
//!
//! - **`trajectory`**: The linear-synchronized and randomized-jitter motion models.
//!
//! - **`frame_renderer`**: Rasterizes frames from a plan and streams them into a
//!   `FrameSink`, optionally rendering linear frames in parallel.
//!
//! - **`invariant_checker`**: Verifies total luma is conserved by the correspondence.
//!
//! - **`config`** and **`error`**: Run configuration and the error taxonomy.

pub mod pixelmorph_processor;

pub mod animation_plan;
pub mod config;
pub mod correspondence_ranking;
pub mod error;
pub mod frame_renderer;
pub mod invariant_checker;
pub mod photo;
pub mod pixel_extractor;
pub mod trajectory;

pub use animation_plan::{AnimationPlan, PixelMotion};
pub use config::{FrameDelay, MorphConfig, RenderThreading};
pub use correspondence_ranking::RankingAlgorithm;
pub use error::{PixelMorphError, PixelMorphResult};
pub use frame_renderer::{FrameSink, InMemorySink, SinkConfig};
pub use invariant_checker::LumaReport;
pub use photo::{Bounds, Photo};
pub use pixelmorph_processor::PixelMorphProcessor;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
