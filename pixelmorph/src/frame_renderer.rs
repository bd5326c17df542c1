use rand::Rng;
use rayon::prelude::*;

use crate::animation_plan::AnimationPlan;
use crate::config::{FrameDelay, RenderThreading};
use crate::error::{PixelMorphError, PixelMorphResult};
use crate::photo::{Bounds, Photo};
use crate::trajectory::{linear_position, RandomWalk};

/// Configuration handed to a [FrameSink] before the first frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    pub bounds: Bounds,
    pub delay: FrameDelay,
    /// Total frames to expect, when known up front (not for random walks).
    pub frame_count: Option<usize>,
}

/// Consumer of rendered frames, typically an encoder.
///
/// `push_frame` is called with strictly increasing indices starting at 0.
pub trait FrameSink {
    fn begin(&mut self, cfg: SinkConfig) -> PixelMorphResult<()>;
    fn push_frame(&mut self, index: usize, frame: &Photo) -> PixelMorphResult<()>;
    fn end(&mut self) -> PixelMorphResult<()>;
}

/// Keeps every frame in memory. Used by tests and for debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<Photo>,
    finished: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    pub fn frames(&self) -> &[Photo] {
        &self.frames
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> PixelMorphResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.finished = false;
        Ok(())
    }

    fn push_frame(&mut self, index: usize, frame: &Photo) -> PixelMorphResult<()> {
        if index != self.frames.len() {
            return Err(PixelMorphError::validation(format!(
                "frame {index} pushed out of order, expected {}",
                self.frames.len()
            )));
        }
        self.frames.push(frame.clone());
        Ok(())
    }

    fn end(&mut self) -> PixelMorphResult<()> {
        self.finished = true;
        Ok(())
    }
}

/// Paints every pixel of `plan` at its linear-model position for `frame`.
///
/// Overlapping pixels in intermediate frames resolve last-write-wins in plan order.
///
/// # Errors
/// [PixelMorphError::FrameOutOfRange] if `frame >= plan.frame_count`.
pub fn render_frame(plan: &AnimationPlan, frame: usize) -> PixelMorphResult<Photo> {
    if frame >= plan.frame_count {
        return Err(PixelMorphError::FrameOutOfRange {
            frame,
            frame_count: plan.frame_count,
        });
    }
    let mut photo = Photo::new_blank(plan.bounds);
    for motion in &plan.pixels {
        let (x, y) = linear_position(motion, frame);
        photo.set_rgba(x, y, motion.color);
    }
    Ok(photo)
}

/// The final composite: every pixel at its target coordinate.
///
/// An empty plan gives a blank photo of the plan's bounds.
pub fn render_final(plan: &AnimationPlan) -> Photo {
    let mut photo = Photo::new_blank(plan.bounds);
    for motion in &plan.pixels {
        photo.set_rgba(motion.target_x, motion.target_y, motion.color);
    }
    photo
}

/// Paints every pixel of `plan` at the matching entry of `positions`.
fn render_positions(plan: &AnimationPlan, positions: &[(usize, usize)]) -> Photo {
    let mut photo = Photo::new_blank(plan.bounds);
    for (motion, &(x, y)) in plan.pixels.iter().zip(positions) {
        photo.set_rgba(x, y, motion.color);
    }
    photo
}

/// Renders every linear-model frame of `plan` into `sink`, in order.
///
/// With `threading.parallel`, frames are rendered in chunks on a rayon pool;
/// each chunk is pushed in frame order before the next one starts. Returns the
/// number of frames pushed.
#[tracing::instrument(skip_all, fields(frames = plan.frame_count, parallel = threading.parallel))]
pub fn render_frames(
    plan: &AnimationPlan,
    threading: &RenderThreading,
    delay: FrameDelay,
    sink: &mut dyn FrameSink,
) -> PixelMorphResult<usize> {
    sink.begin(SinkConfig {
        bounds: plan.bounds,
        delay,
        frame_count: Some(plan.frame_count),
    })?;

    let total = plan.frame_count;
    let progress_every = total / 10 + 1;
    tracing::info!("rendering {total} frames with delay {delay}");

    if !threading.parallel {
        for f in 0..total {
            let frame = render_frame(plan, f)?;
            sink.push_frame(f, &frame)?;
            if f % progress_every == 0 {
                tracing::info!("rendered frame {f}/{total}");
            }
        }
        sink.end()?;
        return Ok(total);
    }

    let pool = build_thread_pool(threading.threads)?;
    let chunk_size = threading.chunk_size.max(1);

    let mut chunk_start = 0;
    while chunk_start < total {
        let chunk_end = (chunk_start + chunk_size).min(total);
        let rendered = pool.install(|| {
            (chunk_start..chunk_end)
                .into_par_iter()
                .map(|f| render_frame(plan, f))
                .collect::<Vec<_>>()
        });
        for (f, frame) in (chunk_start..chunk_end).zip(rendered) {
            sink.push_frame(f, &frame?)?;
            if f % progress_every == 0 {
                tracing::info!("rendered frame {f}/{total}");
            }
        }
        chunk_start = chunk_end;
    }

    sink.end()?;
    Ok(total)
}

/// Renders the randomized-jitter animation of `plan` into `sink`.
///
/// Frame 0 is the untouched source. Each later frame advances the walk once;
/// the walk ends with the first frame in which every pixel has arrived.
/// An empty plan pushes no frames. Returns the number of frames pushed.
#[tracing::instrument(skip_all, fields(pixels = plan.pixels.len()))]
pub fn render_random_walk<R: Rng>(
    plan: &AnimationPlan,
    rng: R,
    delay: FrameDelay,
    sink: &mut dyn FrameSink,
) -> PixelMorphResult<usize> {
    sink.begin(SinkConfig {
        bounds: plan.bounds,
        delay,
        frame_count: None,
    })?;

    if plan.is_empty() {
        tracing::info!("plan has no pixels, nothing to animate");
        sink.end()?;
        return Ok(0);
    }

    let mut walk = RandomWalk::new(plan, rng);
    sink.push_frame(0, &render_positions(plan, walk.positions()))?;
    let mut frames = 1;

    tracing::info!("generating random-step animation");
    while walk.advance() {
        sink.push_frame(frames, &render_positions(plan, walk.positions()))?;
        frames += 1;
        if frames % 20 == 0 {
            tracing::info!("generated {frames} frames");
        }
    }
    tracing::info!("all pixels arrived after {frames} frames");

    sink.end()?;
    Ok(frames)
}

fn build_thread_pool(threads: Option<usize>) -> PixelMorphResult<rayon::ThreadPool> {
    if threads == Some(0) {
        return Err(PixelMorphError::validation(
            "render threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder.build().map_err(|e| {
        PixelMorphError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}"))
    })
}
