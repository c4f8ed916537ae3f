use image::{DynamicImage, ImageFormat, Rgb};
use std::convert::Infallible;
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;
use tracing::debug;

use crate::buffer::{RawImageBuffer, BYTES_PER_PIXEL};
use crate::error::ImagingError;
use crate::transform::PixelTransform;

/// Encoding of the engine's output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
    Bmp,
    Gif,
    Tiff,
}

impl OutputFormat {
    pub fn image_format(self) -> ImageFormat {
        match self {
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Bmp => ImageFormat::Bmp,
            OutputFormat::Gif => ImageFormat::Gif,
            OutputFormat::Tiff => ImageFormat::Tiff,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Bmp => "bmp",
            OutputFormat::Gif => "gif",
            OutputFormat::Tiff => "tiff",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = ImagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpg" | "jpeg" => Ok(OutputFormat::Jpeg),
            "bmp" => Ok(OutputFormat::Bmp),
            "gif" => Ok(OutputFormat::Gif),
            "tif" | "tiff" => Ok(OutputFormat::Tiff),
            other => Err(ImagingError::InvalidArgument(format!("Unsupported output format: '{other}'"))),
        }
    }
}

/// Rewrite every pixel of `image` in place.
pub fn apply_transform(image: &mut RawImageBuffer, transform: &PixelTransform) {
    let result: Result<(), Infallible> = try_apply_transform(image, |px| Ok(transform.apply(px)));
    if let Err(never) = result {
        match never {}
    }
}

/// Fallible variant of [`apply_transform`]. Stops at the first error; pixels
/// already visited keep their new value.
pub fn try_apply_transform<E>(
    image: &mut RawImageBuffer,
    mut f: impl FnMut(Rgb<u8>) -> Result<Rgb<u8>, E>,
) -> Result<(), E> {
    let mut lock = image.lock();
    let (width, height, stride) = (lock.width(), lock.height(), lock.stride());
    let data = lock.bytes_mut();

    // Padding past width * 3 in each row is never touched.
    for y in 0..height {
        let row = y * stride;
        for x in 0..width {
            let p = row + x * BYTES_PER_PIXEL;
            let Rgb([r, g, b]) = f(Rgb([data[p + 2], data[p + 1], data[p]]))?;
            data[p] = b;
            data[p + 1] = g;
            data[p + 2] = r;
        }
    }
    Ok(())
}

/// Decode `data`, run `transform` over every pixel, and encode as `format`.
pub fn transform_bytes(
    data: &[u8],
    transform: &PixelTransform,
    format: OutputFormat,
) -> Result<Vec<u8>, ImagingError> {
    let img = image::load_from_memory(data)?;
    let mut raw = RawImageBuffer::from_rgb(&img.to_rgb8());

    debug!(
        transform = transform.name(),
        width = raw.width(),
        height = raw.height(),
        stride = raw.stride(),
        "applying pixel transform"
    );
    apply_transform(&mut raw, transform);

    encode(DynamicImage::ImageRgb8(raw.to_rgb_image()), format)
}

pub fn encode(img: DynamicImage, format: OutputFormat) -> Result<Vec<u8>, ImagingError> {
    // The GIF encoder only takes RGBA frames.
    let img = match format {
        OutputFormat::Gif => DynamicImage::ImageRgba8(img.to_rgba8()),
        _ => img,
    };
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format.image_format())
        .map_err(|e| ImagingError::Encode(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Channel;
    use image::{ImageBuffer, RgbImage};

    fn pattern(width: u32, height: u32) -> RgbImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x * 40) as u8, (y * 60) as u8, (x * y * 9) as u8])
        })
    }

    fn png_bytes(img: &RgbImage) -> Vec<u8> {
        encode(DynamicImage::ImageRgb8(img.clone()), OutputFormat::Png).unwrap()
    }

    #[test]
    fn visits_pixels_row_major() {
        let mut raw = RawImageBuffer::from_rgb(&pattern(3, 2));
        let mut seen = Vec::new();
        let result: Result<(), Infallible> = try_apply_transform(&mut raw, |px| {
            seen.push(px);
            Ok(px)
        });
        assert!(result.is_ok());
        let expected: Vec<_> = pattern(3, 2).pixels().copied().collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn padding_bytes_are_left_alone() {
        // width 1 -> row of 3 bytes, stride 4 -> one padding byte per row
        let data = vec![1, 2, 3, 0xAA, 4, 5, 6, 0xBB];
        let mut raw = RawImageBuffer::from_raw(1, 2, 4, data).unwrap();
        apply_transform(&mut raw, &PixelTransform::invert());
        assert_eq!(raw.as_bytes(), &[254, 253, 252, 0xAA, 251, 250, 249, 0xBB]);
    }

    #[test]
    fn transform_sees_rgb_while_memory_is_bgr() {
        // memory B=1 G=2 R=3
        let mut raw = RawImageBuffer::from_raw(1, 1, 4, vec![1, 2, 3, 0]).unwrap();
        let mut seen = None;
        let _: Result<(), Infallible> = try_apply_transform(&mut raw, |px| {
            seen = Some(px);
            Ok(Rgb([100, 0, 0]))
        });
        assert_eq!(seen, Some(Rgb([3, 2, 1])));
        assert_eq!(&raw.as_bytes()[..3], &[0, 0, 100]);
    }

    #[test]
    fn error_stops_early_and_releases_buffer() {
        let mut raw = RawImageBuffer::from_rgb(&pattern(4, 4));
        let mut calls = 0;
        let result = try_apply_transform(&mut raw, |_px| {
            calls += 1;
            if calls == 3 {
                Err("boom")
            } else {
                Ok(Rgb([0, 0, 0]))
            }
        });
        assert_eq!(result, Err("boom"));
        assert_eq!(calls, 3);
        assert_eq!(raw.pixel(0, 0), Some(Rgb([0, 0, 0])));
        assert_eq!(raw.pixel(2, 0), pattern(4, 4).get_pixel_checked(2, 0).copied());

        // Lock is available again after the failed pass.
        apply_transform(&mut raw, &PixelTransform::invert());
        assert_eq!(raw.pixel(0, 0), Some(Rgb([255, 255, 255])));
    }

    #[test]
    fn double_invert_restores_image() {
        let original = pattern(5, 3);
        let mut raw = RawImageBuffer::from_rgb(&original);
        let invert = PixelTransform::invert();
        apply_transform(&mut raw, &invert);
        apply_transform(&mut raw, &invert);
        assert_eq!(raw.to_rgb_image(), original);
    }

    #[test]
    fn single_channel_over_whole_image() {
        let original = pattern(5, 3);
        let mut zeroed = RawImageBuffer::from_rgb(&original);
        apply_transform(&mut zeroed, &PixelTransform::single_channel(Channel::Red, false));
        let mut cloned = RawImageBuffer::from_rgb(&original);
        apply_transform(&mut cloned, &PixelTransform::single_channel(Channel::Red, true));

        for (x, y, px) in original.enumerate_pixels() {
            let r = px.0[0];
            assert_eq!(zeroed.pixel(x, y), Some(Rgb([r, 0, 0])));
            assert_eq!(cloned.pixel(x, y), Some(Rgb([r, r, r])));
        }
    }

    #[test]
    fn transform_bytes_emits_png_by_default() {
        let original = pattern(6, 4);
        let out = transform_bytes(&png_bytes(&original), &PixelTransform::invert(), OutputFormat::default())
            .unwrap();
        assert_eq!(&out[..4], b"\x89PNG");

        let decoded = image::load_from_memory(&out).unwrap().to_rgb8();
        for (x, y, px) in original.enumerate_pixels() {
            let Rgb([r, g, b]) = *px;
            assert_eq!(*decoded.get_pixel(x, y), Rgb([255 - r, 255 - g, 255 - b]));
        }
    }

    #[test]
    fn transform_bytes_honours_output_format() {
        let out = transform_bytes(&png_bytes(&pattern(4, 4)), &PixelTransform::greyscale(), OutputFormat::Bmp)
            .unwrap();
        assert_eq!(&out[..2], b"BM");
    }

    #[test]
    fn gamma_one_keeps_bytes() {
        let original = pattern(7, 5);
        let out = transform_bytes(&png_bytes(&original), &PixelTransform::gamma(1.0).unwrap(), OutputFormat::Png)
            .unwrap();
        assert_eq!(image::load_from_memory(&out).unwrap().to_rgb8(), original);
    }

    #[test]
    fn undecodable_bytes_fail_with_decode_error() {
        let err = transform_bytes(b"definitely not an image", &PixelTransform::invert(), OutputFormat::Png)
            .unwrap_err();
        assert!(matches!(err, ImagingError::Decode(_)));
    }

    #[test]
    fn output_format_parsing() {
        assert_eq!("JPEG".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert_eq!("tif".parse::<OutputFormat>().unwrap(), OutputFormat::Tiff);
        assert!(matches!("webm".parse::<OutputFormat>(), Err(ImagingError::InvalidArgument(_))));
    }
}
