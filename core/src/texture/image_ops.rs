use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, ImageResult};

/// An encoded image produced by [`downscale`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Encoded bytes.
    pub data: Vec<u8>,
    /// MIME type of `data`.
    pub mime_type: String,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
}

/// Guess a MIME type from the leading bytes of an encoded image.
pub fn sniff_mime_type(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes).ok().map(|format| format.to_mime_type())
}

fn decode(bytes: &[u8], mime_type: &str) -> ImageResult<DynamicImage> {
    let mut reader = ImageReader::new(Cursor::new(bytes));
    if let Some(format) = ImageFormat::from_mime_type(mime_type) {
        reader.set_format(format);
    }
    // Content sniffing wins over a wrong declared type, as browsers do.
    reader.with_guessed_format()?.decode()
}

/// Decode an encoded image and report its pixel dimensions.
pub fn probe_dimensions(bytes: &[u8], mime_type: &str) -> ImageResult<(u32, u32)> {
    let image = decode(bytes, mime_type)?;
    Ok((image.width(), image.height()))
}

/// Target size that fits `width x height` within `max_dimension`, keeping the
/// aspect ratio. Returns `None` when the image already fits.
pub fn fit_within(width: u32, height: u32, max_dimension: u32) -> Option<(u32, u32)> {
    let max_dimension = max_dimension.max(1);
    let longest = width.max(height);
    if longest <= max_dimension {
        return None;
    }
    let scale = f64::from(max_dimension) / f64::from(longest);
    let scaled = |side: u32| ((f64::from(side) * scale).round() as u32).clamp(1, max_dimension);
    Some((scaled(width), scaled(height)))
}

/// Shrink an encoded image so its longer side is at most `max_dimension`.
///
/// PNG and JPEG sources are re-encoded in their own format; anything else
/// becomes PNG. Returns `Ok(None)` when the image already fits, so callers
/// can keep the original bytes.
pub fn downscale(
    bytes: &[u8],
    mime_type: &str,
    max_dimension: u32,
) -> ImageResult<Option<EncodedImage>> {
    let image = decode(bytes, mime_type)?;
    let Some((width, height)) = fit_within(image.width(), image.height(), max_dimension) else {
        return Ok(None);
    };

    log::debug!(
        "downscaling {}x{} -> {}x{}",
        image.width(),
        image.height(),
        width,
        height
    );
    let resized = image.resize_exact(width, height, FilterType::Lanczos3);

    let format = match ImageFormat::from_mime_type(mime_type) {
        Some(ImageFormat::Jpeg) => ImageFormat::Jpeg,
        _ => ImageFormat::Png,
    };
    // JPEG has no alpha channel.
    let resized = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(resized.to_rgb8()),
        _ => resized,
    };

    let mut data = Vec::new();
    resized.write_to(&mut Cursor::new(&mut data), format)?;

    Ok(Some(EncodedImage {
        data,
        mime_type: format.to_mime_type().to_owned(),
        width,
        height,
    }))
}

#[cfg(test)]
mod tests {
    use image::{ImageBuffer, Rgb, Rgba};

    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgba([10u8, 20, 30, 255]));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png).unwrap();
        out
    }

    fn jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgb([200u8, 100, 50]));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ImageFormat::Jpeg).unwrap();
        out
    }

    #[test]
    fn probe_png_and_jpeg() {
        assert_eq!(probe_dimensions(&png(7, 3), "image/png").unwrap(), (7, 3));
        assert_eq!(probe_dimensions(&jpeg(16, 8), "image/jpeg").unwrap(), (16, 8));
    }

    #[test]
    fn probe_ignores_wrong_mime() {
        assert_eq!(probe_dimensions(&png(5, 5), "image/jpeg").unwrap(), (5, 5));
        assert_eq!(probe_dimensions(&png(5, 5), "application/octet-stream").unwrap(), (5, 5));
    }

    #[test]
    fn probe_rejects_garbage() {
        assert!(probe_dimensions(b"definitely not an image", "image/png").is_err());
    }

    #[test]
    fn sniffing() {
        assert_eq!(sniff_mime_type(&png(1, 1)), Some("image/png"));
        assert_eq!(sniff_mime_type(&jpeg(1, 1)), Some("image/jpeg"));
        assert_eq!(sniff_mime_type(b"xx"), None);
    }

    #[test]
    fn fit_keeps_aspect() {
        assert_eq!(fit_within(2048, 1024, 1024), Some((1024, 512)));
        assert_eq!(fit_within(1000, 3000, 300), Some((100, 300)));
        assert_eq!(fit_within(512, 512, 1024), None);
        assert_eq!(fit_within(1024, 1024, 1024), None);
        assert_eq!(fit_within(4000, 1, 100), Some((100, 1)));
    }

    #[test]
    fn downscale_png() {
        let out = downscale(&png(64, 32), "image/png", 16).unwrap().unwrap();
        assert_eq!((out.width, out.height), (16, 8));
        assert_eq!(out.mime_type, "image/png");
        assert_eq!(probe_dimensions(&out.data, &out.mime_type).unwrap(), (16, 8));
    }

    #[test]
    fn downscale_jpeg_stays_jpeg() {
        let out = downscale(&jpeg(40, 40), "image/jpeg", 10).unwrap().unwrap();
        assert_eq!(out.mime_type, "image/jpeg");
        assert_eq!(sniff_mime_type(&out.data), Some("image/jpeg"));
    }

    #[test]
    fn downscale_noop_when_small() {
        assert!(downscale(&png(8, 8), "image/png", 8).unwrap().is_none());
    }
}
