use anyhow::{Context, Result};
use image::{ImageFormat, Rgba, RgbaImage};
use std::{
    fs,
    io::Cursor,
    path::{Path, PathBuf},
};

use super::{CanvasEngine, RasterSurface};

const ENABLE_LOGS: bool = true;

use crate::log_info;

pub const EXPORT_FILE_NAME: &str = "playful-pause-doodle.png";

/// The drawing composited over opaque white, at device resolution.
pub fn flatten_on_white(surface: &RasterSurface) -> RgbaImage {
    let src = surface.pixels();
    RgbaImage::from_fn(src.width(), src.height(), |x, y| {
        let [r, g, b, a] = src.get_pixel(x, y).0;
        let alpha = a as f32 / 255.0;
        let over_white = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        Rgba([over_white(r), over_white(g), over_white(b), 255])
    })
}

impl CanvasEngine<RasterSurface> {
    /// Encode the current drawing as PNG. Engine state is untouched.
    pub fn export_png(&self) -> Result<Vec<u8>> {
        let flattened = flatten_on_white(self.surface());
        let mut buffer = Cursor::new(Vec::new());
        flattened
            .write_to(&mut buffer, ImageFormat::Png)
            .context("failed to encode doodle as PNG")?;
        Ok(buffer.into_inner())
    }

    /// Write the PNG into `dir` under the fixed export file name.
    pub fn export_to(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create export directory {}", dir.display()))?;
        let path = dir.join(EXPORT_FILE_NAME);
        let bytes = self.export_png()?;
        fs::write(&path, &bytes)
            .with_context(|| format!("failed to write doodle to {}", path.display()))?;
        log_info!("Doodle exported to {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}
