//! Image decoding boundary
//!
//! The pipeline reads any [`PixelGrid`]; this module adapts the `image`
//! crate's RGB buffers so screenshots on disk can be fed straight in.

use std::path::Path;

use image::RgbImage;

use crate::error::{ChartError, Result};
use crate::types::{PixelGrid, Rgb};

impl PixelGrid for RgbImage {
    fn width(&self) -> usize {
        self.dimensions().0 as usize
    }

    fn height(&self) -> usize {
        self.dimensions().1 as usize
    }

    fn pixel(&self, x: usize, y: usize) -> Rgb {
        let p = self.get_pixel(x as u32, y as u32);
        Rgb::new(p[0], p[1], p[2])
    }
}

/// Decode a screenshot into an RGB grid. Alpha is dropped.
pub fn load_grid(path: impl AsRef<Path>) -> Result<RgbImage> {
    let path = path.as_ref();
    let img = image::open(path).map_err(|source| ChartError::ImageDecode {
        path: path.display().to_string(),
        source,
    })?;
    let rgb = img.to_rgb8();
    tracing::debug!(
        path = %path.display(),
        width = rgb.width(),
        height = rgb.height(),
        "Decoded chart image"
    );
    Ok(rgb)
}
