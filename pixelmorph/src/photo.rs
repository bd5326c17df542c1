use std::fmt;

use crate::error::{PixelMorphError, PixelMorphResult};
use crate::pixel_extractor::luma;

/// Width and height of a raster, shared by the source, the target and every rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bounds {
    pub width: usize,
    pub height: usize,
}

impl Bounds {
    pub fn new(width: usize, height: usize) -> Self {
        Bounds { width, height }
    }

    /// Number of pixels covered by these bounds.
    pub fn area(&self) -> usize {
        self.width * self.height
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A basic representation of an image with RGBA pixel data.
/// Each pixel occupies 4 bytes: R, G, B, and A (alpha).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    /// Pixel data stored in a 1D `Vec<u8>`, in RGBA format (4 bytes per pixel), row-major.
    pub img_data: Vec<u8>,
    /// The width (in pixels) of the image.
    pub width: usize,
    /// The height (in pixels) of the image.
    pub height: usize,
}

impl Default for Photo {
    /// Creates an empty `Photo` with zero width and height, and no image data.
    fn default() -> Photo {
        Photo {
            img_data: Vec::new(),
            width: 0,
            height: 0,
        }
    }
}

impl Photo {
    /// Creates a fully transparent black `Photo` covering `bounds`.
    pub fn new_blank(bounds: Bounds) -> Photo {
        Photo {
            img_data: vec![0u8; bounds.area() * 4],
            width: bounds.width,
            height: bounds.height,
        }
    }

    /// Wraps an existing RGBA8 buffer.
    ///
    /// # Errors
    /// Returns a validation error when `img_data` does not hold exactly
    /// `width * height * 4` bytes.
    pub fn from_rgba(width: usize, height: usize, img_data: Vec<u8>) -> PixelMorphResult<Photo> {
        let expected = width * height * 4;
        if img_data.len() != expected {
            return Err(PixelMorphError::validation(format!(
                "RGBA buffer for a {width}x{height} photo must hold {expected} bytes, got {}",
                img_data.len()
            )));
        }
        Ok(Photo {
            img_data,
            width,
            height,
        })
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.width, self.height)
    }

    /// Returns the `[R, G, B, A]` components at `(x, y)`, or `None` if out of bounds.
    pub fn get_rgba(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if !self.bounds().contains(x, y) {
            return None;
        }
        let index = (y * self.width + x) * 4;
        let px = self.img_data.get(index..index + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Writes `rgba` at `(x, y)`. Writes outside the photo are dropped.
    pub fn set_rgba(&mut self, x: usize, y: usize, rgba: [u8; 4]) {
        if !self.bounds().contains(x, y) {
            return;
        }
        let index = (y * self.width + x) * 4;
        if let Some(px) = self.img_data.get_mut(index..index + 4) {
            px.copy_from_slice(&rgba);
        }
    }

    /// Sum of the BT.601 luma of every pixel. Alpha is ignored.
    pub fn total_luma(&self) -> f64 {
        self.img_data
            .chunks_exact(4)
            .map(|px| luma([px[0], px[1], px[2], px[3]]))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_photo_is_transparent_black() {
        let photo = Photo::new_blank(Bounds::new(3, 2));
        assert_eq!(photo.img_data.len(), 24);
        assert_eq!(photo.get_rgba(2, 1), Some([0, 0, 0, 0]));
        assert_eq!(photo.total_luma(), 0.0);
    }

    #[test]
    fn set_then_get_uses_row_major_layout() {
        let mut photo = Photo::new_blank(Bounds::new(2, 2));
        photo.set_rgba(1, 0, [10, 20, 30, 255]);
        assert_eq!(&photo.img_data[4..8], &[10, 20, 30, 255]);
        assert_eq!(photo.get_rgba(1, 0), Some([10, 20, 30, 255]));
    }

    #[test]
    fn out_of_bounds_access_is_ignored() {
        let mut photo = Photo::new_blank(Bounds::new(2, 2));
        photo.set_rgba(2, 0, [255, 255, 255, 255]);
        assert_eq!(photo.get_rgba(2, 0), None);
        assert!(photo.img_data.iter().all(|&b| b == 0));
    }

    #[test]
    fn from_rgba_rejects_short_buffers() {
        assert!(Photo::from_rgba(2, 2, vec![0; 15]).is_err());
        assert!(Photo::from_rgba(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn bounds_display_is_width_by_height() {
        assert_eq!(Bounds::new(640, 480).to_string(), "640x480");
    }
}
