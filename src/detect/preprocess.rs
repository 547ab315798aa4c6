use anyhow::{anyhow, Result};
use image::imageops::{self, FilterType};

use crate::frame::Frame;

/// Network input: planar R, G, B planes of `size x size` values in 0..1.
///
/// The frame is scaled directly to the square input, with no letterboxing.
#[derive(Clone, Debug)]
pub struct InputBlob {
    size: u32,
    data: Vec<f32>,
}

impl InputBlob {
    pub fn from_frame(frame: &Frame, size: u32) -> Result<Self> {
        if size == 0 {
            return Err(anyhow!("network input size must be > 0"));
        }
        let rgb = frame.to_rgb_image().ok_or_else(|| {
            anyhow!(
                "cannot build network input from degenerate frame {}x{}x{}",
                frame.width(),
                frame.height(),
                frame.channels()
            )
        })?;
        let resized = imageops::resize(&rgb, size, size, FilterType::Triangle);

        let plane = size as usize * size as usize;
        let mut data = vec![0f32; plane * 3];
        for (index, pixel) in resized.pixels().enumerate() {
            for (channel, value) in pixel.0.iter().enumerate() {
                data[channel * plane + index] = *value as f32 / 255.0;
            }
        }
        Ok(Self { size, data })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Shape as `(batch, channels, height, width)`.
    pub fn shape(&self) -> (usize, usize, usize, usize) {
        let size = self.size as usize;
        (1, 3, size, size)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}
