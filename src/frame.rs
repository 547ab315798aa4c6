//! Camera frame and crop types.
//!
//! - `Frame`: B-G-R pixel grid handed in by the frame-acquisition side. Bytes are private.
//! - `Crop`: borrowed rectangular view of a `Frame`, clamped to frame extents.
//!
//! A `Crop` always has non-zero width and height. The only constructor is
//! `Frame::crop`, which returns `None` instead of building an empty view.

use anyhow::{anyhow, Result};
use image::{Rgb, RgbImage};

/// Channel count of a well-formed frame (B, G, R).
pub const BGR_CHANNELS: u32 = 3;

// ----------------------------------------------------------------------------
// Frame
// ----------------------------------------------------------------------------

/// Interleaved pixel grid, row-major, channel order B-G-R for 3-channel frames.
///
/// Frames with zero dimensions or a channel count other than 3 can be
/// constructed; they are degenerate and classify as UNKNOWN downstream.
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u32,
}

impl Frame {
    /// Wrap an interleaved pixel buffer. The buffer length must match the dimensions.
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u32) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(channels as usize))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if data.len() != expected {
            return Err(anyhow!(
                "frame length mismatch: expected {} bytes for {}x{}x{}, got {}",
                expected,
                width,
                height,
                channels,
                data.len()
            ));
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    /// Wrap a 3-channel B-G-R buffer.
    pub fn bgr(data: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        Self::new(data, width, height, BGR_CHANNELS)
    }

    /// Build a B-G-R frame from a decoded RGB image.
    pub fn from_rgb_image(image: &RgbImage) -> Self {
        let (width, height) = image.dimensions();
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for pixel in image.pixels() {
            let [r, g, b] = pixel.0;
            data.extend_from_slice(&[b, g, r]);
        }
        Self {
            data,
            width,
            height,
            channels: BGR_CHANNELS,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u32 {
        self.channels
    }

    /// True when the frame cannot carry detections: zero area or not B-G-R.
    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0 || self.channels != BGR_CHANNELS
    }

    /// Copy into an RGB image for resizing. `None` for degenerate frames.
    pub fn to_rgb_image(&self) -> Option<RgbImage> {
        if self.is_degenerate() {
            return None;
        }
        let width = self.width as usize;
        Some(RgbImage::from_fn(self.width, self.height, |x, y| {
            let offset = (y as usize * width + x as usize) * 3;
            let bgr = &self.data[offset..offset + 3];
            Rgb([bgr[2], bgr[1], bgr[0]])
        }))
    }

    /// Cut the rectangle at `(x, y)` of size `w x h` out of the frame.
    ///
    /// Row and column ranges are clamped into the frame. Returns `None` when
    /// the clamped rectangle is empty or the frame is degenerate.
    pub fn crop(&self, x: i64, y: i64, w: i64, h: i64) -> Option<Crop<'_>> {
        if self.is_degenerate() {
            return None;
        }
        let (x0, x1) = clamp_span(x, w, self.width);
        let (y0, y1) = clamp_span(y, h, self.height);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Crop {
            frame: self,
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        })
    }

    /// Whole-frame crop.
    pub fn full_crop(&self) -> Option<Crop<'_>> {
        self.crop(0, 0, self.width as i64, self.height as i64)
    }
}

fn clamp_span(start: i64, len: i64, extent: u32) -> (usize, usize) {
    let extent = extent as i64;
    let begin = start.clamp(0, extent);
    let end = start.saturating_add(len).clamp(0, extent);
    (begin as usize, end as usize)
}

// ----------------------------------------------------------------------------
// Crop
// ----------------------------------------------------------------------------

/// Non-empty rectangular view into a `Frame`.
#[derive(Clone, Copy)]
pub struct Crop<'a> {
    frame: &'a Frame,
    x: usize,
    y: usize,
    width: usize,
    height: usize,
}

impl<'a> Crop<'a> {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Top-left corner in frame pixel coordinates.
    pub fn origin(&self) -> (usize, usize) {
        (self.x, self.y)
    }

    /// B-G-R bytes of one crop row (`width * 3` bytes).
    ///
    /// Panics if `row >= height`.
    pub fn row(&self, row: usize) -> &'a [u8] {
        assert!(row < self.height, "crop row {} out of range", row);
        let stride = self.frame.width as usize * 3;
        let start = (self.y + row) * stride + self.x * 3;
        &self.frame.data[start..start + self.width * 3]
    }
}

impl std::fmt::Debug for Crop<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crop")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
