use crate::animation_plan::AnimationPlan;
use crate::correspondence_ranking::{rank_pixels, RankingAlgorithm};
use crate::error::{PixelMorphError, PixelMorphResult};
use crate::invariant_checker::{analyze, LumaReport};
use crate::photo::Photo;
use crate::pixel_extractor::extract_pixels;

/// Runs the planning pipeline for a source and a target photo.
///
/// The process is:
/// 1. **Extraction** of one record per pixel from both photos.
/// 2. **Ranking** of both sequences under the selected [RankingAlgorithm].
/// 3. **Pairing** equal ranks into an [AnimationPlan].
///
/// The resulting plan can be rendered any number of times (GIF, still image,
/// per-frame PNGs) without being recomputed.
pub struct PixelMorphProcessor {
    /// The photo whose pixels are moved.
    source: Photo,

    /// The photo whose arrangement the pixels end up in.
    target: Photo,

    algorithm: RankingAlgorithm,
}

impl PixelMorphProcessor {
    /// Constructs a new `PixelMorphProcessor`.
    ///
    /// # Errors
    /// [PixelMorphError::DimensionMismatch] if the photos differ in width or height.
    pub fn new(
        source: Photo,
        target: Photo,
        algorithm: RankingAlgorithm,
    ) -> PixelMorphResult<Self> {
        if source.bounds() != target.bounds() {
            return Err(PixelMorphError::DimensionMismatch {
                expected: source.bounds(),
                actual: target.bounds(),
            });
        }
        Ok(PixelMorphProcessor {
            source,
            target,
            algorithm,
        })
    }

    pub fn source(&self) -> &Photo {
        &self.source
    }

    pub fn target(&self) -> &Photo {
        &self.target
    }

    pub fn algorithm(&self) -> RankingAlgorithm {
        self.algorithm
    }

    /// Extracts, ranks and pairs both photos.
    #[tracing::instrument(
        skip_all,
        fields(algorithm = %self.algorithm, bounds = %self.source.bounds())
    )]
    pub fn plan(&self) -> PixelMorphResult<AnimationPlan> {
        let bounds = self.source.bounds();
        let ranked = rank_pixels(
            extract_pixels(&self.source),
            extract_pixels(&self.target),
            bounds,
            self.algorithm,
        )?;
        let plan = AnimationPlan::compute(&ranked, bounds)?;
        tracing::info!(
            "planned {} pixels over {} frames",
            plan.pixels.len(),
            plan.frame_count
        );
        Ok(plan)
    }

    /// Plans the morph and checks that it conserves total luma.
    pub fn analyze(&self) -> PixelMorphResult<(AnimationPlan, LumaReport)> {
        let plan = self.plan()?;
        let report = analyze(&self.source, &plan);
        Ok((plan, report))
    }
}
