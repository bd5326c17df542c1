use crate::photo::Photo;

const LUMA_R: f64 = 0.299;
const LUMA_G: f64 = 0.587;
const LUMA_B: f64 = 0.114;

/// ITU-R BT.601 luma of an RGBA8 color. Alpha does not contribute.
pub fn luma(rgba: [u8; 4]) -> f64 {
    rgba[0] as f64 * LUMA_R + rgba[1] as f64 * LUMA_G + rgba[2] as f64 * LUMA_B
}

/// One pixel of a photo, as seen by the correspondence ranking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRecord {
    /// Column of the pixel in the photo it was extracted from.
    pub x: usize,
    /// Row of the pixel in the photo it was extracted from.
    pub y: usize,
    /// Original color, RGBA8.
    pub color: [u8; 4],
    /// Primary ranking key (luma).
    pub score: f64,
    /// Ranking-strategy specific tiebreak. Zero until a strategy fills it in.
    pub secondary_score: f64,
    /// Position in row-major scan order; the last-resort tiebreak.
    pub index: usize,
}

/// Produces one [PixelRecord] per pixel, in row-major order (y outer, x inner).
///
/// A zero-area photo yields an empty sequence. Pixels missing from a short
/// `img_data` buffer are skipped.
pub fn extract_pixels(photo: &Photo) -> Vec<PixelRecord> {
    let mut pixels = Vec::with_capacity(photo.bounds().area());
    for y in 0..photo.height {
        for x in 0..photo.width {
            let Some(color) = photo.get_rgba(x, y) else {
                continue;
            };
            pixels.push(PixelRecord {
                x,
                y,
                color,
                score: luma(color),
                secondary_score: 0.0,
                index: y * photo.width + x,
            });
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photo::Bounds;

    #[test]
    fn luma_weights_match_bt601() {
        assert_eq!(luma([0, 0, 0, 255]), 0.0);
        assert!((luma([255, 255, 255, 0]) - 255.0).abs() < 1e-9);
        assert!((luma([100, 0, 0, 255]) - 29.9).abs() < 1e-9);
        assert!((luma([0, 100, 0, 255]) - 58.7).abs() < 1e-9);
        assert!((luma([0, 0, 100, 255]) - 11.4).abs() < 1e-9);
    }

    #[test]
    fn extraction_visits_rows_then_columns() {
        let mut photo = Photo::new_blank(Bounds::new(3, 2));
        photo.set_rgba(2, 0, [1, 2, 3, 4]);
        photo.set_rgba(0, 1, [5, 6, 7, 8]);

        let pixels = extract_pixels(&photo);
        assert_eq!(pixels.len(), 6);
        let coords: Vec<_> = pixels.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(coords, vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);
        assert_eq!(pixels[2].color, [1, 2, 3, 4]);
        assert_eq!(pixels[3].color, [5, 6, 7, 8]);
        assert_eq!(pixels[3].index, 3);
        assert!((pixels[3].score - luma([5, 6, 7, 8])).abs() < 1e-12);
    }

    #[test]
    fn zero_area_photo_yields_nothing() {
        assert!(extract_pixels(&Photo::default()).is_empty());
        assert!(extract_pixels(&Photo::new_blank(Bounds::new(0, 7))).is_empty());
    }

    #[test]
    fn zero_width_with_leftover_data_yields_nothing() {
        let photo = Photo {
            img_data: vec![9; 16],
            width: 0,
            height: 2,
        };
        assert!(extract_pixels(&photo).is_empty());
    }

    #[test]
    fn short_buffers_only_yield_the_pixels_they_hold() {
        let photo = Photo {
            img_data: vec![7; 12],
            width: 2,
            height: 2,
        };
        let coords: Vec<_> = extract_pixels(&photo).iter().map(|p| (p.x, p.y, p.index)).collect();
        assert_eq!(coords, vec![(0, 0, 0), (1, 0, 1), (0, 1, 2)]);
    }
}
