use std::fmt;

use crate::animation_plan::AnimationPlan;
use crate::frame_renderer::render_final;
use crate::photo::Photo;

/// Largest total-luma difference still accepted as lossless.
pub const LUMA_TOLERANCE: f64 = 1e-4;

/// Outcome of comparing the total luma of two rasters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LumaReport {
    pub expected: f64,
    pub actual: f64,
}

impl LumaReport {
    pub fn new(expected: f64, actual: f64) -> Self {
        LumaReport { expected, actual }
    }

    pub fn difference(&self) -> f64 {
        (self.expected - self.actual).abs()
    }

    pub fn is_conserved(&self) -> bool {
        self.difference() < LUMA_TOLERANCE
    }
}

impl fmt::Display for LumaReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "expected {:.4}, got {:.4}, difference {:.6} ({})",
            self.expected,
            self.actual,
            self.difference(),
            if self.is_conserved() { "conserved" } else { "NOT conserved" }
        )
    }
}

/// Checks that applying `plan` to `source` loses and duplicates no pixel, by
/// comparing the total luma of `source` with that of the final composite.
#[tracing::instrument(skip_all)]
pub fn analyze(source: &Photo, plan: &AnimationPlan) -> LumaReport {
    let report = LumaReport::new(source.total_luma(), render_final(plan).total_luma());
    if report.is_conserved() {
        tracing::info!("luma conserved: {report}");
    } else {
        tracing::warn!("luma not conserved: {report}");
    }
    report
}
