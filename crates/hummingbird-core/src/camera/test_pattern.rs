use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};

use super::{FrameSource, Resolution};
use crate::error::{CoreError, CoreResult};

/// Synthetic camera: a scrolling colour gradient, encoded as JPEG.
///
/// Useful for running the server on a machine without a camera.
#[derive(Debug, Clone)]
pub struct TestPatternSource {
    width: u32,
    height: u32,
    frame: u32,
}

impl TestPatternSource {
    pub fn new(resolution: Resolution) -> Self {
        let (width, height) = resolution.dimensions();
        Self {
            width,
            height,
            frame: 0,
        }
    }
}

impl FrameSource for TestPatternSource {
    fn capture(&mut self) -> CoreResult<Vec<u8>> {
        let offset = self.frame;
        self.frame = self.frame.wrapping_add(4);

        let img = RgbImage::from_fn(self.width, self.height, |x, y| {
            Rgb([
                (x.wrapping_add(offset) % 256) as u8,
                (y % 256) as u8,
                (offset % 256) as u8,
            ])
        });

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, 80)
            .encode_image(&img)
            .map_err(|e| CoreError::Capture(format!("failed to encode test pattern: {e}")))?;
        Ok(jpeg)
    }
}
