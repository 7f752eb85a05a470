pub mod engine;
pub mod preprocess;
pub mod setup;

pub use engine::{TesseractEngine, TextRecognizer};
pub use preprocess::{compress_for_storage, crop_region, enhance_contrast, RelativeRect};
pub use setup::ensure_tesseract;

use crate::config::AppConfig;
use crate::error::RecognitionError;
use preprocess::encode_jpeg;

/// High-level function: label photo → raw OCR text.
///
/// Decodes the photo, applies the optional crop, boosts contrast and hands a
/// JPEG to the recognizer.
pub fn run_ocr(
    recognizer: &dyn TextRecognizer,
    photo: &[u8],
    crop: Option<&RelativeRect>,
    config: &AppConfig,
    on_progress: &mut dyn FnMut(u8),
) -> Result<String, RecognitionError> {
    let img = image::load_from_memory(photo)?;
    crate::log(&format!("OCR input: {}x{}", img.width(), img.height()));

    let img = match crop {
        Some(region) => crop_region(&img, region),
        None => img,
    };

    let enhanced = image::DynamicImage::ImageLuma8(enhance_contrast(&img));
    let jpeg =
        encode_jpeg(&enhanced, config.ocr_jpeg_quality).map_err(RecognitionError::Encode)?;

    let text = recognizer.recognize(&jpeg, &config.ocr_languages, on_progress)?;
    crate::log(&format!("OCR text: {} chars", text.len()));
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, ImageBuffer, ImageFormat, Rgba};
    use std::cell::Cell;
    use std::io::Cursor;

    /// Records what it was given and returns fixed text.
    struct FixedText {
        text: &'static str,
        seen_languages: Cell<Option<String>>,
        seen_size: Cell<Option<(u32, u32)>>,
    }

    impl TextRecognizer for FixedText {
        fn recognize(
            &self,
            image: &[u8],
            languages: &str,
            on_progress: &mut dyn FnMut(u8),
        ) -> Result<String, RecognitionError> {
            on_progress(0);
            let img = image::load_from_memory(image)?;
            self.seen_size.set(Some((img.width(), img.height())));
            self.seen_languages.set(Some(languages.to_string()));
            on_progress(100);
            Ok(self.text.to_string())
        }
    }

    fn photo(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(ImageBuffer::from_fn(width, height, |x, _| {
            Rgba([(x % 256) as u8, 200, 10, 255])
        }));
        encode_jpeg(&img, 90).unwrap()
    }

    #[test]
    fn test_run_ocr_crops_and_forwards() {
        let recognizer = FixedText {
            text: "proteine 10%",
            seen_languages: Cell::new(None),
            seen_size: Cell::new(None),
        };
        let crop = RelativeRect { x: 0.0, y: 0.5, width: 0.5, height: 0.5 };
        let mut progress = Vec::new();

        let text = run_ocr(
            &recognizer,
            &photo(200, 100),
            Some(&crop),
            &AppConfig::default(),
            &mut |p| progress.push(p),
        )
        .unwrap();

        assert_eq!(text, "proteine 10%");
        assert_eq!(recognizer.seen_size.take(), Some((100, 50)));
        assert_eq!(recognizer.seen_languages.take().as_deref(), Some("eng+ita"));
        assert_eq!(progress, vec![0, 100]);
    }

    #[test]
    fn test_run_ocr_rejects_undecodable_photo() {
        let recognizer = FixedText {
            text: "",
            seen_languages: Cell::new(None),
            seen_size: Cell::new(None),
        };
        let err = run_ocr(
            &recognizer,
            b"garbage",
            None,
            &AppConfig::default(),
            &mut |_| {},
        )
        .unwrap_err();

        assert!(matches!(err, RecognitionError::Decode(_)));
    }

    #[test]
    fn test_run_ocr_reports_encode_failure() {
        // Wider than a JPEG frame can describe
        let wide = DynamicImage::ImageLuma8(GrayImage::new(70_000, 1));
        let mut png = Vec::new();
        wide.write_to(&mut Cursor::new(&mut png), ImageFormat::Png).unwrap();

        let recognizer = FixedText {
            text: "unused",
            seen_languages: Cell::new(None),
            seen_size: Cell::new(None),
        };
        let err = run_ocr(&recognizer, &png, None, &AppConfig::default(), &mut |_| {})
            .unwrap_err();

        assert!(matches!(err, RecognitionError::Encode(_)));
        assert!(recognizer.seen_size.take().is_none());
    }
}
