use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{PixelMorphError, PixelMorphResult};
use crate::photo::Bounds;
use crate::pixel_extractor::PixelRecord;

/// Weight of the 3x3 neighbourhood average in the interval depth.
const INNER_WEIGHT: f64 = 0.75;
/// Weight of the 5x5 neighbourhood average in the interval depth.
const OUTER_WEIGHT: f64 = 0.25;

/// Selects how the target sequence is ranked before positional pairing.
/// The source sequence is always ranked with [compare_default].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankingAlgorithm {
    /// `(luma, green, red)` ascending on both sides.
    #[default]
    Default,
    /// Target re-ranked by `(luma, interval depth)` ascending.
    Featured,
}

impl RankingAlgorithm {
    pub const NAMES: [&'static str; 2] = ["default", "featured"];

    pub fn name(&self) -> &'static str {
        match self {
            RankingAlgorithm::Default => "default",
            RankingAlgorithm::Featured => "featured",
        }
    }
}

impl fmt::Display for RankingAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RankingAlgorithm {
    type Err = PixelMorphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" => Ok(RankingAlgorithm::Default),
            "featured" => Ok(RankingAlgorithm::Featured),
            _ => Err(PixelMorphError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Total order `(score, green, red, scan index)`, all ascending.
pub fn compare_default(a: &PixelRecord, b: &PixelRecord) -> Ordering {
    a.score
        .total_cmp(&b.score)
        .then(a.color[1].cmp(&b.color[1]))
        .then(a.color[0].cmp(&b.color[0]))
        .then(a.index.cmp(&b.index))
}

/// Total order `(score, secondary score, scan index)`, all ascending.
pub fn compare_featured(a: &PixelRecord, b: &PixelRecord) -> Ordering {
    a.score
        .total_cmp(&b.score)
        .then(a.secondary_score.total_cmp(&b.secondary_score))
        .then(a.index.cmp(&b.index))
}

/// Luma values of a photo laid out row-major, used for neighbourhood averages.
pub struct LumaGrid {
    bounds: Bounds,
    values: Vec<f64>,
}

impl LumaGrid {
    /// Builds the grid from extracted records. Records may be in any order;
    /// each one is placed by its scan index.
    ///
    /// # Errors
    /// Fails if the records do not cover `bounds` exactly.
    pub fn from_pixels(pixels: &[PixelRecord], bounds: Bounds) -> PixelMorphResult<Self> {
        if pixels.len() != bounds.area() {
            return Err(PixelMorphError::validation(format!(
                "{} pixel records cannot cover a {bounds} grid",
                pixels.len()
            )));
        }
        let mut values = vec![0.0; bounds.area()];
        for p in pixels {
            let slot = values.get_mut(p.index).ok_or_else(|| {
                PixelMorphError::validation(format!(
                    "pixel scan index {} is outside a {bounds} grid",
                    p.index
                ))
            })?;
            *slot = p.score;
        }
        Ok(LumaGrid { bounds, values })
    }

    /// Mean luma over the `(2 * radius + 1)` square centred on `(cx, cy)`.
    ///
    /// The window is clipped at the borders and divided by the number of
    /// in-bounds samples, not by the nominal window area.
    pub fn average(&self, cx: usize, cy: usize, radius: usize) -> f64 {
        let x_start = cx.saturating_sub(radius);
        let y_start = cy.saturating_sub(radius);
        let x_end = (cx + radius).min(self.bounds.width.saturating_sub(1));
        let y_end = (cy + radius).min(self.bounds.height.saturating_sub(1));

        let mut sum = 0.0;
        let mut count = 0usize;
        for y in y_start..=y_end {
            for x in x_start..=x_end {
                if self.bounds.contains(x, y) {
                    sum += self.values[y * self.bounds.width + x];
                    count += 1;
                }
            }
        }
        if count == 0 {
            return 0.0;
        }
        sum / count as f64
    }

    /// Local-contrast score: `0.75 * avg(3x3) + 0.25 * avg(5x5)`.
    pub fn interval_depth(&self, x: usize, y: usize) -> f64 {
        self.average(x, y, 1) * INNER_WEIGHT + self.average(x, y, 2) * OUTER_WEIGHT
    }
}

/// Source and target sequences, each a permutation of its extraction order.
/// Equal positions are paired by the plan computer.
#[derive(Debug, Clone)]
pub struct RankedPixels {
    pub source: Vec<PixelRecord>,
    pub target: Vec<PixelRecord>,
}

/// Ranks both sequences under `algorithm`.
///
/// # Errors
/// [PixelMorphError::SequenceLengthMismatch] if the two sequences differ in length.
#[tracing::instrument(skip_all, fields(algorithm = %algorithm, pixels = source.len()))]
pub fn rank_pixels(
    mut source: Vec<PixelRecord>,
    mut target: Vec<PixelRecord>,
    bounds: Bounds,
    algorithm: RankingAlgorithm,
) -> PixelMorphResult<RankedPixels> {
    if source.len() != target.len() {
        return Err(PixelMorphError::SequenceLengthMismatch {
            source_len: source.len(),
            target_len: target.len(),
        });
    }

    source.sort_unstable_by(compare_default);

    match algorithm {
        RankingAlgorithm::Default => target.sort_unstable_by(compare_default),
        RankingAlgorithm::Featured => {
            let grid = LumaGrid::from_pixels(&target, bounds)?;
            for p in target.iter_mut() {
                p.secondary_score = grid.interval_depth(p.x, p.y);
            }
            target.sort_unstable_by(compare_featured);
        }
    }
    tracing::debug!("ranked {} source and {} target pixels", source.len(), target.len());

    Ok(RankedPixels { source, target })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photo::Photo;
    use crate::pixel_extractor::extract_pixels;

    fn record(index: usize, color: [u8; 4], score: f64, secondary_score: f64) -> PixelRecord {
        PixelRecord {
            x: index,
            y: 0,
            color,
            score,
            secondary_score,
            index,
        }
    }

    #[test]
    fn algorithm_names_parse_case_insensitively() {
        assert_eq!("default".parse::<RankingAlgorithm>().unwrap(), RankingAlgorithm::Default);
        assert_eq!(" Featured ".parse::<RankingAlgorithm>().unwrap(), RankingAlgorithm::Featured);
        for name in RankingAlgorithm::NAMES {
            assert_eq!(name.parse::<RankingAlgorithm>().unwrap().name(), name);
        }
    }

    #[test]
    fn unknown_algorithm_is_rejected() {
        let err = "sharpest".parse::<RankingAlgorithm>().unwrap_err();
        assert!(matches!(err, PixelMorphError::UnknownAlgorithm(ref n) if n == "sharpest"));
    }

    #[test]
    fn default_order_breaks_luma_ties_by_green_then_red() {
        let low_green = record(0, [10, 5, 0, 255], 50.0, 0.0);
        let high_green = record(1, [0, 9, 0, 255], 50.0, 0.0);
        let low_red = record(2, [3, 5, 0, 255], 50.0, 0.0);
        assert_eq!(compare_default(&low_green, &high_green), Ordering::Less);
        assert_eq!(compare_default(&low_red, &low_green), Ordering::Less);
    }

    #[test]
    fn exhausted_keys_fall_back_to_scan_index() {
        let a = record(4, [7, 7, 7, 255], 7.0, 1.5);
        let b = record(9, [7, 7, 7, 255], 7.0, 1.5);
        assert_eq!(compare_default(&a, &b), Ordering::Less);
        assert_eq!(compare_default(&b, &a), Ordering::Greater);
        assert_eq!(compare_featured(&a, &b), Ordering::Less);
        assert_eq!(compare_default(&a, &a), Ordering::Equal);
    }

    #[test]
    fn featured_order_uses_secondary_score_before_index() {
        let shallow = record(5, [0, 0, 0, 255], 1.0, 0.5);
        let deep = record(2, [0, 0, 0, 255], 1.0, 3.0);
        assert_eq!(compare_featured(&shallow, &deep), Ordering::Less);
    }

    #[test]
    fn window_average_is_clipped_at_borders() {
        let mut photo = Photo::new_blank(Bounds::new(3, 3));
        photo.set_rgba(0, 0, [255, 255, 255, 255]);
        let pixels = extract_pixels(&photo);
        let grid = LumaGrid::from_pixels(&pixels, photo.bounds()).unwrap();

        // Corner 3x3 window only has 4 in-bounds samples.
        assert!((grid.average(0, 0, 1) - 255.0 / 4.0).abs() < 1e-9);
        // Centre 3x3 window covers all 9 samples.
        assert!((grid.average(1, 1, 1) - 255.0 / 9.0).abs() < 1e-9);
        // A 5x5 window on a 3x3 grid always covers the whole grid.
        assert!((grid.average(2, 2, 2) - 255.0 / 9.0).abs() < 1e-9);

        let depth = grid.interval_depth(0, 0);
        assert!((depth - (0.75 * 255.0 / 4.0 + 0.25 * 255.0 / 9.0)).abs() < 1e-9);
    }

    #[test]
    fn mismatched_lengths_are_an_invariant_violation() {
        let photo = Photo::new_blank(Bounds::new(2, 1));
        let source = extract_pixels(&photo);
        let mut target = source.clone();
        target.pop();
        let err =
            rank_pixels(source, target, photo.bounds(), RankingAlgorithm::Default).unwrap_err();
        assert!(matches!(
            err,
            PixelMorphError::SequenceLengthMismatch { source_len: 2, target_len: 1 }
        ));
    }

    #[test]
    fn featured_keeps_the_source_ranked_by_default_order() {
        let mut photo = Photo::new_blank(Bounds::new(3, 1));
        photo.set_rgba(0, 0, [200, 200, 200, 255]);
        photo.set_rgba(2, 0, [90, 90, 90, 255]);
        let pixels = extract_pixels(&photo);

        let bounds = photo.bounds();
        let default =
            rank_pixels(pixels.clone(), pixels.clone(), bounds, RankingAlgorithm::Default).unwrap();
        let featured =
            rank_pixels(pixels.clone(), pixels, bounds, RankingAlgorithm::Featured).unwrap();
        assert_eq!(default.source, featured.source);
        assert!(featured.target.iter().any(|p| p.secondary_score > 0.0));
    }

    #[test]
    fn featured_prefers_smoother_neighbourhoods_among_equal_luma() {
        // Two black pixels: (0,0) next to white, (4,0) surrounded by black.
        let mut photo = Photo::new_blank(Bounds::new(5, 1));
        for x in 0..5 {
            photo.set_rgba(x, 0, [0, 0, 0, 255]);
        }
        photo.set_rgba(1, 0, [255, 255, 255, 255]);
        let pixels = extract_pixels(&photo);
        let bounds = photo.bounds();
        let ranked =
            rank_pixels(pixels.clone(), pixels, bounds, RankingAlgorithm::Featured).unwrap();

        let blacks: Vec<_> = ranked.target.iter().filter(|p| p.score == 0.0).map(|p| p.x).collect();
        assert_eq!(blacks.first(), Some(&4));
        assert_eq!(ranked.target.last().map(|p| p.x), Some(1));
    }
}
