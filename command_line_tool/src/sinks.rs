use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use image::RgbaImage;
use pixelmorph::{Bounds, FrameSink, Photo, PixelMorphError, PixelMorphResult, SinkConfig};

pub fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

pub fn to_rgba_image(photo: &Photo) -> anyhow::Result<RgbaImage> {
    RgbaImage::from_raw(photo.width as u32, photo.height as u32, photo.img_data.clone())
        .context("photo buffer does not match its dimensions")
}

/// Encodes frames into an infinitely looping animated GIF.
///
/// Each frame is palette-quantized on its own; `speed` trades quality (1) for
/// encoding time (30).
pub struct GifSink {
    path: PathBuf,
    speed: i32,
    width: u16,
    height: u16,
    delay: u16,
    encoder: Option<gif::Encoder<BufWriter<File>>>,
    frames: usize,
}

impl GifSink {
    pub fn new(path: impl Into<PathBuf>, speed: i32) -> Self {
        GifSink {
            path: path.into(),
            speed,
            width: 0,
            height: 0,
            delay: 1,
            encoder: None,
            frames: 0,
        }
    }
}

fn gif_dimension(value: usize, name: &str) -> PixelMorphResult<u16> {
    u16::try_from(value).map_err(|_| {
        PixelMorphError::validation(format!("GIF {name} {value} exceeds {}", u16::MAX))
    })
}

impl FrameSink for GifSink {
    fn begin(&mut self, cfg: SinkConfig) -> PixelMorphResult<()> {
        self.width = gif_dimension(cfg.bounds.width, "width")?;
        self.height = gif_dimension(cfg.bounds.height, "height")?;
        self.delay = cfg.delay.hundredths();

        ensure_parent_dir(&self.path)?;
        let file = File::create(&self.path)
            .with_context(|| format!("failed to create output GIF '{}'", self.path.display()))?;
        let mut encoder = gif::Encoder::new(BufWriter::new(file), self.width, self.height, &[])
            .with_context(|| format!("failed to write GIF header to '{}'", self.path.display()))?;
        encoder
            .set_repeat(gif::Repeat::Infinite)
            .context("failed to configure GIF looping")?;
        self.encoder = Some(encoder);
        self.frames = 0;
        Ok(())
    }

    fn push_frame(&mut self, index: usize, frame: &Photo) -> PixelMorphResult<()> {
        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| PixelMorphError::validation("GIF sink received a frame before begin"))?;
        let expected = Bounds::new(usize::from(self.width), usize::from(self.height));
        if frame.bounds() != expected || frame.img_data.len() != expected.area() * 4 {
            return Err(PixelMorphError::validation(format!(
                "frame {index} is {}, expected {expected}",
                frame.bounds()
            )));
        }

        let mut rgba = frame.img_data.clone();
        let mut gif_frame =
            gif::Frame::from_rgba_speed(self.width, self.height, &mut rgba, self.speed);
        gif_frame.delay = self.delay;
        encoder
            .write_frame(&gif_frame)
            .with_context(|| format!("failed to encode GIF frame {index}"))?;
        self.frames += 1;
        Ok(())
    }

    fn end(&mut self) -> PixelMorphResult<()> {
        let Some(encoder) = self.encoder.take() else {
            return Err(PixelMorphError::validation("GIF sink ended before begin"));
        };
        let mut writer = encoder
            .into_inner()
            .with_context(|| format!("failed to write GIF trailer to '{}'", self.path.display()))?;
        writer
            .flush()
            .with_context(|| format!("failed to flush GIF '{}'", self.path.display()))?;

        if self.frames == 0 {
            return Err(PixelMorphError::validation(format!(
                "no frames were written to '{}'",
                self.path.display()
            )));
        }
        tracing::info!("wrote {} frames to {}", self.frames, self.path.display());
        Ok(())
    }
}

/// Writes every frame as `frame_00000.png`, `frame_00001.png`, ... in a directory.
pub struct PngDirectorySink {
    dir: PathBuf,
    frames: usize,
}

impl PngDirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        PngDirectorySink {
            dir: dir.into(),
            frames: 0,
        }
    }

    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("frame_{index:05}.png"))
    }
}

impl FrameSink for PngDirectorySink {
    fn begin(&mut self, _cfg: SinkConfig) -> PixelMorphResult<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create frame directory '{}'", self.dir.display()))?;
        self.frames = 0;
        Ok(())
    }

    fn push_frame(&mut self, index: usize, frame: &Photo) -> PixelMorphResult<()> {
        let path = self.frame_path(index);
        image::save_buffer_with_format(
            &path,
            &frame.img_data,
            frame.width as u32,
            frame.height as u32,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("failed to write frame '{}'", path.display()))?;
        self.frames += 1;
        Ok(())
    }

    fn end(&mut self) -> PixelMorphResult<()> {
        tracing::info!("wrote {} frames to {}", self.frames, self.dir.display());
        Ok(())
    }
}
