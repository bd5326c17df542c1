use crate::correspondence_ranking::RankedPixels;
use crate::error::{PixelMorphError, PixelMorphResult};
use crate::photo::Bounds;

/// Size of the serialized header: width, height, frame count and pixel count as `u64`.
const HEADER_LEN: usize = 4 * 8;
/// Size of one serialized [PixelMotion]: four `u32` coordinates plus RGBA.
const MOTION_LEN: usize = 4 * 4 + 4;

/// Where one source pixel starts, where it ends, and what color it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelMotion {
    pub start_x: usize,
    pub start_y: usize,
    pub target_x: usize,
    pub target_y: usize,
    pub color: [u8; 4],
}

impl PixelMotion {
    /// Number of diagonal-capable unit steps between start and target.
    pub fn chebyshev_distance(&self) -> usize {
        self.start_x
            .abs_diff(self.target_x)
            .max(self.start_y.abs_diff(self.target_y))
    }
}

/// The render-agnostic result of the correspondence: every pixel's trajectory
/// endpoints and the number of frames the linear model needs.
///
/// Start coordinates cover every pixel of `bounds` exactly once, and so do
/// target coordinates.
///
/// Computed once per (source, target, algorithm) and then only read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationPlan {
    pub pixels: Vec<PixelMotion>,
    /// `1 + max` Chebyshev distance over all pixels, or 0 for an empty plan.
    pub frame_count: usize,
    pub bounds: Bounds,
}

impl AnimationPlan {
    /// Pairs `ranked.source[i]` with `ranked.target[i]` for every `i`.
    ///
    /// Each motion starts at the source pixel's coordinate with the source
    /// pixel's color and ends at the target pixel's coordinate.
    ///
    /// # Errors
    /// [PixelMorphError::SequenceLengthMismatch] if the sequences differ in length.
    #[tracing::instrument(skip_all, fields(bounds = %bounds))]
    pub fn compute(ranked: &RankedPixels, bounds: Bounds) -> PixelMorphResult<Self> {
        if ranked.source.len() != ranked.target.len() {
            return Err(PixelMorphError::SequenceLengthMismatch {
                source_len: ranked.source.len(),
                target_len: ranked.target.len(),
            });
        }

        let pixels: Vec<PixelMotion> = ranked
            .source
            .iter()
            .zip(ranked.target.iter())
            .map(|(s, t)| PixelMotion {
                start_x: s.x,
                start_y: s.y,
                target_x: t.x,
                target_y: t.y,
                color: s.color,
            })
            .collect();

        let frame_count = frame_count_for(&pixels);
        tracing::debug!(pixels = pixels.len(), frame_count, "animation plan computed");

        Ok(AnimationPlan {
            pixels,
            frame_count,
            bounds,
        })
    }

    /// Index of the frame in which every pixel sits on its target.
    pub fn last_frame(&self) -> Option<usize> {
        self.frame_count.checked_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Serializes the plan to a little-endian byte vector.
    ///
    /// Identical plans always produce identical bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(HEADER_LEN + self.pixels.len() * MOTION_LEN);
        data.extend_from_slice(&(self.bounds.width as u64).to_le_bytes());
        data.extend_from_slice(&(self.bounds.height as u64).to_le_bytes());
        data.extend_from_slice(&(self.frame_count as u64).to_le_bytes());
        data.extend_from_slice(&(self.pixels.len() as u64).to_le_bytes());
        for p in &self.pixels {
            for v in [p.start_x, p.start_y, p.target_x, p.target_y] {
                data.extend_from_slice(&(v as u32).to_le_bytes());
            }
            data.extend_from_slice(&p.color);
        }
        data
    }

    /// Reads a plan written by [AnimationPlan::serialize].
    ///
    /// # Errors
    /// [PixelMorphError::InvalidPlanData] if the data is truncated or has
    /// trailing bytes, if the pixel count differs from the bounds' area, if a
    /// pixel lies outside the bounds, if two pixels share a start or a target
    /// coordinate, or if the recorded frame count does not match the pixels.
    pub fn deserialize(data: &[u8]) -> PixelMorphResult<Self> {
        let mut offset = 0;
        let width = read_u64(data, &mut offset)? as usize;
        let height = read_u64(data, &mut offset)? as usize;
        let frame_count = read_u64(data, &mut offset)? as usize;
        let pixel_count = read_u64(data, &mut offset)? as usize;
        let bounds = Bounds::new(width, height);

        let area = width
            .checked_mul(height)
            .ok_or_else(|| PixelMorphError::invalid_plan("bounds overflow"))?;
        if pixel_count != area {
            return Err(PixelMorphError::invalid_plan(format!(
                "{pixel_count} pixels cannot cover {bounds}"
            )));
        }

        let expected_len = pixel_count
            .checked_mul(MOTION_LEN)
            .and_then(|n| n.checked_add(HEADER_LEN))
            .ok_or_else(|| PixelMorphError::invalid_plan("pixel count overflows"))?;
        if data.len() != expected_len {
            return Err(PixelMorphError::invalid_plan(format!(
                "expected {expected_len} bytes for {pixel_count} pixels, got {}",
                data.len()
            )));
        }

        let mut pixels = Vec::with_capacity(pixel_count);
        let mut started = vec![false; area];
        let mut targeted = vec![false; area];
        for _ in 0..pixel_count {
            let start_x = read_u32(data, &mut offset)? as usize;
            let start_y = read_u32(data, &mut offset)? as usize;
            let target_x = read_u32(data, &mut offset)? as usize;
            let target_y = read_u32(data, &mut offset)? as usize;
            let color = [data[offset], data[offset + 1], data[offset + 2], data[offset + 3]];
            offset += 4;

            if !bounds.contains(start_x, start_y) || !bounds.contains(target_x, target_y) {
                return Err(PixelMorphError::invalid_plan(format!(
                    "pixel ({start_x},{start_y}) -> ({target_x},{target_y}) lies outside {bounds}"
                )));
            }
            if std::mem::replace(&mut started[start_y * width + start_x], true) {
                return Err(PixelMorphError::invalid_plan(format!(
                    "start ({start_x},{start_y}) is used by more than one pixel"
                )));
            }
            if std::mem::replace(&mut targeted[target_y * width + target_x], true) {
                return Err(PixelMorphError::invalid_plan(format!(
                    "target ({target_x},{target_y}) is used by more than one pixel"
                )));
            }
            pixels.push(PixelMotion {
                start_x,
                start_y,
                target_x,
                target_y,
                color,
            });
        }

        if frame_count != frame_count_for(&pixels) {
            return Err(PixelMorphError::invalid_plan(format!(
                "recorded frame count {frame_count} does not match the pixel trajectories"
            )));
        }

        Ok(AnimationPlan {
            pixels,
            frame_count,
            bounds,
        })
    }
}

fn frame_count_for(pixels: &[PixelMotion]) -> usize {
    pixels
        .iter()
        .map(PixelMotion::chebyshev_distance)
        .max()
        .map_or(0, |steps| steps + 1)
}

fn read_u64(data: &[u8], offset: &mut usize) -> PixelMorphResult<u64> {
    let bytes: [u8; 8] = data
        .get(*offset..*offset + 8)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| PixelMorphError::invalid_plan("truncated header"))?;
    *offset += 8;
    Ok(u64::from_le_bytes(bytes))
}

fn read_u32(data: &[u8], offset: &mut usize) -> PixelMorphResult<u32> {
    let bytes: [u8; 4] = data
        .get(*offset..*offset + 4)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| PixelMorphError::invalid_plan("truncated pixel entry"))?;
    *offset += 4;
    Ok(u32::from_le_bytes(bytes))
}
