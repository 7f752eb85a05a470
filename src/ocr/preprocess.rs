use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageError, Luma};
use std::str::FromStr;

use crate::config::PhotoLimits;

/// Contrast boost applied before OCR.
const OCR_CONTRAST: f32 = 1.5;

/// Crops narrower or shorter than this many pixels are ignored.
const MIN_CROP_SIDE: u32 = 10;

/// A rectangle in relative coordinates (0.0–1.0) of an image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RelativeRect {
    /// X position of top-left corner (0.0 = left edge, 1.0 = right edge)
    pub x: f32,
    /// Y position of top-left corner (0.0 = top edge, 1.0 = bottom edge)
    pub y: f32,
    /// Width as fraction of image width
    pub width: f32,
    /// Height as fraction of image height
    pub height: f32,
}

impl FromStr for RelativeRect {
    type Err = String;

    /// Parses "x,y,width,height", e.g. "0.1,0.4,0.8,0.5".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<f32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("invalid crop '{}': {}", s, e))?;

        match parts[..] {
            [x, y, width, height] => Ok(Self {
                x,
                y,
                width,
                height,
            }),
            _ => Err(format!(
                "invalid crop '{}': expected x,y,width,height",
                s
            )),
        }
    }
}

/// Converts to grayscale and stretches contrast around mid-gray.
pub fn enhance_contrast(img: &DynamicImage) -> GrayImage {
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    let mut output = GrayImage::new(width, height);

    let factor = (259.0 * (OCR_CONTRAST + 255.0)) / (255.0 * (259.0 - OCR_CONTRAST));

    for (x, y, pixel) in rgb.enumerate_pixels() {
        let gray = 0.299 * pixel[0] as f32 + 0.587 * pixel[1] as f32 + 0.114 * pixel[2] as f32;
        let value = (factor * (gray - 128.0) + 128.0).clamp(0.0, 255.0);
        output.put_pixel(x, y, Luma([value.round() as u8]));
    }

    output
}

/// Crops a sub-region from an image using relative coordinates.
///
/// Converts the relative rect to pixels and clamps it to the image bounds.
/// If what is left is 10 pixels or less on either side, the whole image is
/// returned instead.
pub fn crop_region(img: &DynamicImage, region: &RelativeRect) -> DynamicImage {
    let (w, h) = (img.width(), img.height());

    let x0 = ((region.x * w as f32) as u32).min(w);
    let y0 = ((region.y * h as f32) as u32).min(h);
    let rw = ((region.width * w as f32) as u32).min(w - x0);
    let rh = ((region.height * h as f32) as u32).min(h - y0);

    if rw <= MIN_CROP_SIDE || rh <= MIN_CROP_SIDE {
        crate::log(&format!(
            "Crop area too small ({}x{}), using original image",
            rw, rh
        ));
        return img.clone();
    }

    crate::log(&format!("Applying crop: {} {} {} {}", x0, y0, rw, rh));
    img.crop_imm(x0, y0, rw, rh)
}

/// Encodes an image as baseline JPEG.
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, ImageError> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality).encode_image(&img.to_rgb8())?;
    Ok(out)
}

/// Shrinks a photo to fit `limits` and re-encodes it as JPEG.
///
/// Photos already within the size limit, and anything that cannot be
/// decoded or encoded, are returned unchanged.
pub fn compress_for_storage(bytes: &[u8], limits: PhotoLimits) -> Vec<u8> {
    let img = match image::load_from_memory(bytes) {
        Ok(img) => img,
        Err(e) => {
            crate::log(&format!("Could not decode photo, keeping original: {}", e));
            return bytes.to_vec();
        }
    };

    let (w, h) = (img.width(), img.height());
    if w <= limits.max_side && h <= limits.max_side {
        return bytes.to_vec();
    }

    let ratio = (limits.max_side as f32 / w as f32).min(limits.max_side as f32 / h as f32);
    let new_w = ((w as f32 * ratio).round() as u32).max(1);
    let new_h = ((h as f32 * ratio).round() as u32).max(1);
    let resized = img.resize_exact(new_w, new_h, FilterType::Triangle);

    match encode_jpeg(&resized, limits.quality) {
        Ok(jpeg) => {
            crate::log(&format!(
                "Compressed photo {}x{} -> {}x{} ({} -> {} bytes)",
                w,
                h,
                new_w,
                new_h,
                bytes.len(),
                jpeg.len()
            ));
            jpeg
        }
        Err(e) => {
            crate::log(&format!("Could not encode photo, keeping original: {}", e));
            bytes.to_vec()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba, RgbaImage};

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([x as u8, y as u8, 0, 255])
        }))
    }

    #[test]
    fn test_crop_region() {
        // 100x200 image
        let img = gradient(100, 200);

        let region = RelativeRect { x: 0.1, y: 0.25, width: 0.5, height: 0.1 };
        let cropped = crop_region(&img, &region).to_rgba8();

        assert_eq!(cropped.dimensions(), (50, 20));
        // Top-left pixel should be (10, 50) from original
        assert_eq!(cropped.get_pixel(0, 0)[0], 10);
        assert_eq!(cropped.get_pixel(0, 0)[1], 50);
    }

    #[test]
    fn test_crop_region_clamps() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(200, 200));
        let region = RelativeRect { x: 0.8, y: 0.8, width: 0.5, height: 0.5 };
        let cropped = crop_region(&img, &region);

        // Should clamp to 40x40 (remaining pixels)
        assert_eq!((cropped.width(), cropped.height()), (40, 40));
    }

    #[test]
    fn test_tiny_crop_falls_back_to_original() {
        let img = gradient(100, 100);
        let region = RelativeRect { x: 0.95, y: 0.0, width: 0.5, height: 1.0 };
        let cropped = crop_region(&img, &region);

        assert_eq!((cropped.width(), cropped.height()), (100, 100));
    }

    #[test]
    fn test_enhance_contrast() {
        let mut img = RgbaImage::new(3, 1);
        img.put_pixel(0, 0, Rgba([0, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([255, 255, 255, 255]));
        img.put_pixel(2, 0, Rgba([128, 128, 128, 255]));

        let result = enhance_contrast(&DynamicImage::ImageRgba8(img));

        assert_eq!(result.get_pixel(0, 0)[0], 0, "Black stays black");
        assert_eq!(result.get_pixel(1, 0)[0], 255, "White stays white");
        assert_eq!(result.get_pixel(2, 0)[0], 128, "Mid-gray is the pivot");
    }

    #[test]
    fn test_parse_relative_rect() {
        let rect: RelativeRect = "0.1, 0.2,0.5,0.25".parse().unwrap();
        assert_eq!(rect, RelativeRect { x: 0.1, y: 0.2, width: 0.5, height: 0.25 });

        assert!("0.1,0.2,0.5".parse::<RelativeRect>().is_err());
        assert!("a,b,c,d".parse::<RelativeRect>().is_err());
    }

    #[test]
    fn test_compress_large_photo() {
        let jpeg = encode_jpeg(&gradient(1600, 400), 90).unwrap();
        let limits = PhotoLimits { max_side: 800, quality: 80 };

        let compressed = compress_for_storage(&jpeg, limits);
        let img = image::load_from_memory(&compressed).unwrap();
        assert_eq!((img.width(), img.height()), (800, 200));
    }

    #[test]
    fn test_small_photo_unchanged() {
        let jpeg = encode_jpeg(&gradient(300, 200), 90).unwrap();
        let limits = PhotoLimits { max_side: 800, quality: 80 };

        assert_eq!(compress_for_storage(&jpeg, limits), jpeg);
    }

    #[test]
    fn test_undecodable_photo_unchanged() {
        let limits = PhotoLimits { max_side: 800, quality: 80 };
        assert_eq!(compress_for_storage(b"not an image", limits), b"not an image".to_vec());
    }
}
