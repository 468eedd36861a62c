use std::io::Cursor;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::codecs::gif::GifDecoder;
use image::imageops::FilterType;
use image::AnimationDecoder;
use image::{DynamicImage, GenericImageView, ImageFormat};

use crate::models::Thumbnail;

pub fn open_image(path: &Path) -> Result<DynamicImage> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read image: {:?}", path))?;
    let format = image::guess_format(&bytes).ok();

    if format == Some(ImageFormat::Gif) {
        let decoder = GifDecoder::new(Cursor::new(bytes))
            .with_context(|| format!("Failed to decode GIF: {:?}", path))?;
        let mut frames = decoder.into_frames();
        if let Some(frame) = frames.next() {
            let frame = frame.context("Failed to decode GIF frame")?;
            return Ok(DynamicImage::ImageRgba8(frame.into_buffer()));
        }
        return Err(anyhow!("GIF has no frames: {:?}", path));
    }

    match format {
        Some(fmt) => image::load_from_memory_with_format(&bytes, fmt)
            .with_context(|| format!("Failed to decode image: {:?}", path)),
        None => image::load_from_memory(&bytes)
            .with_context(|| format!("Failed to decode image: {:?}", path)),
    }
}

/// Decodes an image and scales it to fit within `max_width` x `max_height`,
/// preserving aspect ratio. Images already inside the box are not upscaled.
pub fn render_fit(path: &Path, max_width: u32, max_height: u32) -> Result<Thumbnail> {
    let img = open_image(path)?;
    let (src_width, src_height) = img.dimensions();
    let (width, height) = fit_within(src_width, src_height, max_width, max_height);

    // CatmullRom provides good quality/speed balance for downscaling
    let fitted = img.resize_exact(width, height, FilterType::CatmullRom);
    let rgba = fitted.to_rgba8().into_raw();
    Ok(Thumbnail::new(rgba, width, height))
}

/// Aspect-fit dimensions for a `src_width` x `src_height` image inside a
/// `max_width` x `max_height` box, without upscaling.
pub fn fit_within(src_width: u32, src_height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if src_width == 0 || src_height == 0 {
        return (1, 1);
    }
    if src_width <= max_width && src_height <= max_height {
        return (src_width, src_height);
    }

    let scale_w = max_width as f64 / src_width as f64;
    let scale_h = max_height as f64 / src_height as f64;
    let scale = scale_w.min(scale_h);

    let width = (src_width as f64 * scale).round() as u32;
    let height = (src_height as f64 * scale).round() as u32;
    (width.max(1), height.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};
    use tempfile::tempdir;

    fn write_test_png(path: &Path, width: u32, height: u32) {
        let img = ImageBuffer::from_pixel(width, height, Rgba([200u8, 60, 30, 255]));
        img.save(path).unwrap();
    }

    #[test]
    fn test_fit_within_landscape() {
        // 2000x1000 into 500x500 -> 500x250
        assert_eq!(fit_within(2000, 1000, 500, 500), (500, 250));
    }

    #[test]
    fn test_fit_within_portrait() {
        assert_eq!(fit_within(1000, 2000, 500, 500), (250, 500));
    }

    #[test]
    fn test_fit_within_no_upscale() {
        assert_eq!(fit_within(120, 90, 500, 500), (120, 90));
    }

    #[test]
    fn test_fit_within_degenerate() {
        assert_eq!(fit_within(0, 100, 500, 500), (1, 1));
    }

    #[test]
    fn test_render_fit_produces_rgba() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("photo.png");
        write_test_png(&path, 800, 400);

        let thumb = render_fit(&path, 500, 500).unwrap();
        assert_eq!((thumb.width, thumb.height), (500, 250));
        assert_eq!(thumb.rgba.len(), 500 * 250 * 4);
    }

    #[test]
    fn test_render_fit_missing_file() {
        let dir = tempdir().unwrap();
        assert!(render_fit(&dir.path().join("gone.png"), 500, 500).is_err());
    }
}
