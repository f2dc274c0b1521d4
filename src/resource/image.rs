//! Raster images: dimensions probed at load for `<img>` sizing.

use anyhow::{Context, Result};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Image {
    width: Option<u32>,
    height: Option<u32>,
}

impl Image {
    pub fn load(&mut self, file: &Path) -> Result<()> {
        let (width, height) = image::image_dimensions(file)
            .with_context(|| format!("failed to read image size of {}", file.display()))?;
        self.width = Some(width);
        self.height = Some(height);
        Ok(())
    }

    /// `None` until loaded.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.width.zip(self.height)
    }
}
