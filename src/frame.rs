use std::path::Path;

use anyhow::Context as _;

use crate::{
    core::{Canvas, Rgb},
    error::{FramescriptError, FramescriptResult},
    properties::{MergeMode, Visibility},
    reference::Reference,
    separate::SeparatedInstructions,
};

/// One output raster: tightly packed RGB8 rows over an opaque white
/// background.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            data: vec![255u8; canvas.pixel_count() * 3],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw rgb24 bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Write one pixel. Coordinates outside the canvas are silently
    /// discarded.
    pub fn set_pixel(&mut self, x: i64, y: i64, rgb: Rgb) {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 3;
        self.data[offset] = rgb.r;
        self.data[offset + 1] = rgb.g;
        self.data[offset + 2] = rgb.b;
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 3;
        Some(Rgb::new(
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        ))
    }

    pub fn save_png(&self, path: &Path) -> FramescriptResult<()> {
        let img = image::RgbImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| FramescriptError::validation("frame buffer size mismatch"))?;
        img.save(path)
            .with_context(|| format!("failed to write frame '{}'", path.display()))?;
        Ok(())
    }
}

/// An entity's fully-resolved visual state for one frame index.
#[derive(Debug)]
pub struct ResolvedEntity<'a> {
    pub reference: &'a Reference,
    pub layer: i32,
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl ResolvedEntity<'_> {
    pub fn id(&self) -> &str {
        &self.reference.id
    }

    /// Exclusive right edge of the placed bounding box.
    pub fn x_end(&self) -> i64 {
        self.x + i64::from(self.width)
    }

    /// Exclusive bottom edge of the placed bounding box.
    pub fn y_end(&self) -> i64 {
        self.y + i64::from(self.height)
    }
}

/// Reconstruct every visible entity's state at `index` by replaying its
/// adjustment queue from the start.
///
/// Each enacted contribution merges onto the entity's base properties with
/// [`MergeMode::ReverseAppend`], non-strict: numeric fields accumulate
/// additively across moves, visibility takes the most recently enacted
/// value. The canonical queues are read through a cursor and never mutated.
/// Entities resolving to `Hide` are omitted; the rest come back ordered by
/// ascending `(layer, id)`, ready for compositing.
///
/// Requires every visible entity's image source to be opened already.
pub fn resolve_frame<'a>(
    index: u64,
    separated: &'a SeparatedInstructions,
) -> FramescriptResult<Vec<ResolvedEntity<'a>>> {
    let mut resolved = Vec::new();

    for reference in separated.references.values() {
        let mut state = reference.properties;

        if let Some(queue) = separated.adjustments.get(&reference.id) {
            for adjustment in queue {
                if adjustment.time > index {
                    break;
                }
                state = state.merge(&adjustment.enact(index), MergeMode::ReverseAppend, false)?;
            }
        }

        if state.visibility == Some(Visibility::Hide) {
            continue;
        }

        let layer = require(state.layer, &reference.id, "layer")?;
        let x = require(state.x, &reference.id, "x")?;
        let y = require(state.y, &reference.id, "y")?;

        resolved.push(ResolvedEntity {
            reference,
            layer,
            x,
            y,
            width: reference.source.width()?,
            height: reference.source.height()?,
        });
    }

    resolved.sort_by(|a, b| (a.layer, a.id()).cmp(&(b.layer, b.id())));
    Ok(resolved)
}

fn require<T>(value: Option<T>, id: &str, field: &str) -> FramescriptResult<T> {
    value.ok_or_else(|| {
        FramescriptError::missing_attribute(format!(
            "reference '{id}' resolved without a '{field}' value"
        ))
    })
}

/// Composite the frame at `index` onto a fresh canvas.
///
/// Entities draw in ascending layer order; writes falling outside the canvas
/// are discarded without error.
pub fn render_frame(
    index: u64,
    separated: &SeparatedInstructions,
    canvas: Canvas,
) -> FramescriptResult<FrameBuffer> {
    let mut buffer = FrameBuffer::new(canvas);

    for entity in resolve_frame(index, separated)? {
        for sy in 0..entity.height {
            for sx in 0..entity.width {
                let rgb = entity.reference.source.pixel_at(sx, sy)?;
                buffer.set_pixel(entity.x + i64::from(sx), entity.y + i64::from(sy), rgb);
            }
        }
    }

    Ok(buffer)
}
