//! Packed 24-bit BGR pixel storage with row padding, the layout a native
//! 24bpp bitmap hands out when its bits are locked.

use image::{ImageBuffer, Rgb, RgbImage};
use tracing::trace;

use crate::error::ImagingError;

pub const BYTES_PER_PIXEL: usize = 3;

/// Rows are padded to a multiple of this many bytes.
const ROW_ALIGNMENT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImageBuffer {
    width: u32,
    height: u32,
    stride: usize,
    data: Vec<u8>,
}

impl RawImageBuffer {
    /// Pack an RGB image into BGR rows with 4-byte aligned stride.
    pub fn from_rgb(img: &RgbImage) -> Self {
        let (width, height) = img.dimensions();
        let row_len = width as usize * BYTES_PER_PIXEL;
        let stride = row_len.div_ceil(ROW_ALIGNMENT) * ROW_ALIGNMENT;
        let mut data = vec![0u8; stride * height as usize];

        for (x, y, px) in img.enumerate_pixels() {
            let o = y as usize * stride + x as usize * BYTES_PER_PIXEL;
            let Rgb([r, g, b]) = *px;
            data[o] = b;
            data[o + 1] = g;
            data[o + 2] = r;
        }

        Self { width, height, stride, data }
    }

    /// Wrap an existing BGR buffer. `stride` may exceed `width * 3`.
    pub fn from_raw(width: u32, height: u32, stride: usize, data: Vec<u8>) -> Result<Self, ImagingError> {
        let row_len = width as usize * BYTES_PER_PIXEL;
        if stride < row_len {
            return Err(ImagingError::InvalidArgument(format!(
                "stride {stride} is smaller than a {width}px row ({row_len} bytes)"
            )));
        }
        let expected = stride * height as usize;
        if data.len() != expected {
            return Err(ImagingError::InvalidArgument(format!(
                "buffer holds {} bytes, expected {expected} for {width}x{height} at stride {stride}",
                data.len()
            )));
        }
        Ok(Self { width, height, stride, data })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Raw bytes including row padding.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Logical RGB value at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb<u8>> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let o = y as usize * self.stride + x as usize * BYTES_PER_PIXEL;
        Some(Rgb([self.data[o + 2], self.data[o + 1], self.data[o]]))
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        ImageBuffer::from_fn(self.width, self.height, |x, y| {
            let o = y as usize * self.stride + x as usize * BYTES_PER_PIXEL;
            Rgb([self.data[o + 2], self.data[o + 1], self.data[o]])
        })
    }

    /// Take exclusive read/write access to the whole pixel rectangle.
    /// Access ends when the returned guard is dropped.
    pub fn lock(&mut self) -> PixelLock<'_> {
        trace!(width = self.width, height = self.height, "pixel buffer locked");
        PixelLock { buffer: self }
    }
}

/// Scoped write access to a [`RawImageBuffer`].
pub struct PixelLock<'a> {
    buffer: &'a mut RawImageBuffer,
}

impl PixelLock<'_> {
    pub fn width(&self) -> usize {
        self.buffer.width as usize
    }

    pub fn height(&self) -> usize {
        self.buffer.height as usize
    }

    pub fn stride(&self) -> usize {
        self.buffer.stride
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.buffer.data
    }
}

impl Drop for PixelLock<'_> {
    fn drop(&mut self) {
        trace!("pixel buffer released");
    }
}
