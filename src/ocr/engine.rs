use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::process::Command;
use tempfile::NamedTempFile;

use super::setup::TesseractPaths;
use crate::error::RecognitionError;

/// Turns an encoded image into text.
pub trait TextRecognizer {
    /// `languages` uses tesseract's "eng+ita" form. `on_progress` receives
    /// percentages from 0 to 100; it is informational only.
    fn recognize(
        &self,
        image: &[u8],
        languages: &str,
        on_progress: &mut dyn FnMut(u8),
    ) -> Result<String, RecognitionError>;
}

/// Runs the tesseract command-line tool.
pub struct TesseractEngine {
    executable: PathBuf,
    tessdata_dir: Option<PathBuf>,
    page_segmentation_mode: u8,
}

impl TesseractEngine {
    pub fn new(paths: TesseractPaths, page_segmentation_mode: u8) -> Self {
        Self {
            executable: paths.executable,
            tessdata_dir: paths.tessdata,
            page_segmentation_mode,
        }
    }
}

impl TextRecognizer for TesseractEngine {
    fn recognize(
        &self,
        image: &[u8],
        languages: &str,
        on_progress: &mut dyn FnMut(u8),
    ) -> Result<String, RecognitionError> {
        on_progress(0);

        // Save image to temporary file
        let mut temp_input = NamedTempFile::with_suffix(".jpg")?;
        temp_input.write_all(image)?;
        temp_input.flush()?;

        // Run Tesseract to stdout
        let mut command = Command::new(&self.executable);
        command
            .arg(temp_input.path())
            .arg("stdout")
            .arg("-l")
            .arg(languages)
            .arg("--psm")
            .arg(self.page_segmentation_mode.to_string());
        if let Some(dir) = &self.tessdata_dir {
            command.arg("--tessdata-dir").arg(dir);
        }

        let output = command.output().map_err(|e| match e.kind() {
            ErrorKind::NotFound => RecognitionError::EngineNotFound,
            _ => RecognitionError::Io(e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RecognitionError::Engine(stderr.trim().to_string()));
        }

        on_progress(100);

        let text = String::from_utf8_lossy(&output.stdout).to_string();
        if text.trim().is_empty() {
            return Err(RecognitionError::EmptyText);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_executable() {
        let engine = TesseractEngine::new(
            TesseractPaths {
                executable: PathBuf::from("/nonexistent/miaocarb-tesseract"),
                tessdata: None,
            },
            6,
        );

        let mut progress = Vec::new();
        let err = engine
            .recognize(b"jpeg", "eng", &mut |p| progress.push(p))
            .unwrap_err();

        assert!(matches!(err, RecognitionError::EngineNotFound));
        assert_eq!(progress, vec![0]);
    }
}
