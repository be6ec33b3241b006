use std::path::PathBuf;

use anyhow::Context as _;

use crate::{
    adjustment::Adjustment,
    core::Rgb,
    error::{FramescriptError, FramescriptResult},
    properties::Properties,
};

/// Pixel supplier for one entity. The renderer never decodes image formats
/// itself; it only asks an opened source for dimensions and RGB values.
///
/// `open`/`close` are idempotent. Sources are opened once before rendering
/// starts and only read afterwards, so render jobs can share them across
/// threads.
pub trait ImageSource: Send + Sync + std::fmt::Debug {
    fn open(&mut self) -> FramescriptResult<()>;
    fn close(&mut self);
    fn is_opened(&self) -> bool;
    fn width(&self) -> FramescriptResult<u32>;
    fn height(&self) -> FramescriptResult<u32>;
    fn pixel_at(&self, x: u32, y: u32) -> FramescriptResult<Rgb>;
}

/// Image file on disk, decoded lazily via the `image` crate.
///
/// The decoded pixels live only between `open` and `close`; dropping the
/// owning [`Reference`] releases them deterministically.
#[derive(Debug)]
pub struct FileImageSource {
    path: PathBuf,
    pixels: Option<image::RgbImage>,
}

impl FileImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pixels: None,
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn opened(&self) -> FramescriptResult<&image::RgbImage> {
        self.pixels.as_ref().ok_or_else(|| {
            FramescriptError::validation(format!(
                "image source '{}' is not opened",
                self.path.display()
            ))
        })
    }
}

impl ImageSource for FileImageSource {
    fn open(&mut self) -> FramescriptResult<()> {
        if self.pixels.is_some() {
            return Ok(());
        }
        let decoded = image::open(&self.path)
            .with_context(|| format!("failed to decode image '{}'", self.path.display()))?;
        self.pixels = Some(decoded.to_rgb8());
        Ok(())
    }

    fn close(&mut self) {
        self.pixels = None;
    }

    fn is_opened(&self) -> bool {
        self.pixels.is_some()
    }

    fn width(&self) -> FramescriptResult<u32> {
        Ok(self.opened()?.width())
    }

    fn height(&self) -> FramescriptResult<u32> {
        Ok(self.opened()?.height())
    }

    fn pixel_at(&self, x: u32, y: u32) -> FramescriptResult<Rgb> {
        let img = self.opened()?;
        if x >= img.width() || y >= img.height() {
            return Err(FramescriptError::validation(format!(
                "pixel ({x}, {y}) out of bounds for {}x{} image",
                img.width(),
                img.height()
            )));
        }
        let p = img.get_pixel(x, y);
        Ok(Rgb::new(p[0], p[1], p[2]))
    }
}

/// In-memory pixel buffer, row-major RGB. Useful for programmatic entities
/// and deterministic tests.
#[derive(Clone, Debug)]
pub struct RasterImageSource {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
    opened: bool,
}

impl RasterImageSource {
    pub fn new(width: u32, height: u32, pixels: Vec<Rgb>) -> FramescriptResult<Self> {
        if pixels.len() != width as usize * height as usize {
            return Err(FramescriptError::validation(format!(
                "raster pixel buffer has {} entries, expected {}",
                pixels.len(),
                width as usize * height as usize
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
            opened: false,
        })
    }

    pub fn solid(width: u32, height: u32, color: Rgb) -> FramescriptResult<Self> {
        Self::new(width, height, vec![color; width as usize * height as usize])
    }
}

impl ImageSource for RasterImageSource {
    fn open(&mut self) -> FramescriptResult<()> {
        self.opened = true;
        Ok(())
    }

    fn close(&mut self) {
        self.opened = false;
    }

    fn is_opened(&self) -> bool {
        self.opened
    }

    fn width(&self) -> FramescriptResult<u32> {
        Ok(self.width)
    }

    fn height(&self) -> FramescriptResult<u32> {
        Ok(self.height)
    }

    fn pixel_at(&self, x: u32, y: u32) -> FramescriptResult<Rgb> {
        if x >= self.width || y >= self.height {
            return Err(FramescriptError::validation(format!(
                "pixel ({x}, {y}) out of bounds for {}x{} raster",
                self.width, self.height
            )));
        }
        Ok(self.pixels[(y * self.width + x) as usize])
    }
}

/// A placed, adjustable visual element: an identifier, an image source, a
/// base [`Properties`] record, and the adjustments declared directly on it.
#[derive(Debug)]
pub struct Reference {
    pub id: String,
    pub source: Box<dyn ImageSource>,
    pub properties: Properties,
    adjustments: Vec<Adjustment>,
}

impl Reference {
    pub fn new(
        id: impl Into<String>,
        source: Box<dyn ImageSource>,
        properties: Properties,
    ) -> Self {
        Self {
            id: id.into(),
            source,
            properties,
            adjustments: Vec::new(),
        }
    }

    pub fn from_file(
        id: impl Into<String>,
        path: impl Into<PathBuf>,
        properties: Properties,
    ) -> Self {
        Self::new(id, Box::new(FileImageSource::new(path)), properties)
    }

    /// Attach an adjustment declared on this reference. The adjustment keeps
    /// its own target id; separation routes it by that id, not by `self.id`.
    pub fn add_adjustment(&mut self, adjustment: Adjustment) {
        self.adjustments.push(adjustment);
    }

    pub fn with_adjustment(mut self, adjustment: Adjustment) -> Self {
        self.add_adjustment(adjustment);
        self
    }

    pub fn adjustments(&self) -> &[Adjustment] {
        &self.adjustments
    }

    pub(crate) fn take_adjustments(&mut self) -> Vec<Adjustment> {
        std::mem::take(&mut self.adjustments)
    }
}
