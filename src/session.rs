//! One food analysis in progress: photos, label reading, scoring, saving.

use crate::catalog::{Catalog, CatalogEntry, Photos};
use crate::config::AppConfig;
use crate::error::{InputError, PersistenceError, RecognitionError};
use crate::label::{read_label_text, ExtractedNutrients, NutrientExtractor};
use crate::nutrition::{analyze, AnalysisResult, FoodComposition, FoodType};
use crate::ocr::{compress_for_storage, run_ocr, RelativeRect, TextRecognizer};

/// Where the session is in the photo → values → verdict flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStage {
    /// No label read yet
    AwaitingLabel,
    /// OCR failed or was skipped; values must be typed in
    AwaitingManualInput,
    /// Label values extracted, waiting for confirmation
    Extracted,
    /// A verdict is ready to save
    Analyzed,
}

impl SessionStage {
    pub fn status_text(&self) -> &'static str {
        match self {
            Self::AwaitingLabel => "Waiting for a label photo",
            Self::AwaitingManualInput => "Enter the label values manually",
            Self::Extracted => "Check the extracted values",
            Self::Analyzed => "Analysis ready",
        }
    }
}

pub struct Session {
    config: AppConfig,
    front_photo: Option<Vec<u8>>,
    label_photo: Option<Vec<u8>>,
    extracted: Option<ExtractedNutrients>,
    manual_input: bool,
    analysis: Option<AnalysisResult>,
}

impl Session {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            front_photo: None,
            label_photo: None,
            extracted: None,
            manual_input: false,
            analysis: None,
        }
    }

    pub fn stage(&self) -> SessionStage {
        if self.analysis.is_some() {
            SessionStage::Analyzed
        } else if self.extracted.is_some() {
            SessionStage::Extracted
        } else if self.manual_input {
            SessionStage::AwaitingManualInput
        } else {
            SessionStage::AwaitingLabel
        }
    }

    /// Keeps a compressed copy of the front-of-pack photo.
    pub fn attach_front_photo(&mut self, bytes: &[u8]) {
        self.front_photo = Some(compress_for_storage(bytes, self.config.front_photo));
    }

    /// Keeps a compressed copy of the label photo. Anything read from a
    /// previous label is discarded.
    pub fn attach_label_photo(&mut self, bytes: &[u8]) {
        self.label_photo = Some(compress_for_storage(bytes, self.config.label_photo));
        self.extracted = None;
        self.manual_input = false;
        self.analysis = None;
    }

    pub fn front_photo(&self) -> Option<&[u8]> {
        self.front_photo.as_deref()
    }

    pub fn label_photo(&self) -> Option<&[u8]> {
        self.label_photo.as_deref()
    }

    /// Runs OCR on the label photo and extracts nutrient values.
    ///
    /// On failure the session moves to manual input and the error carries
    /// guidance for the user.
    pub fn read_label(
        &mut self,
        recognizer: &dyn TextRecognizer,
        extractor: &NutrientExtractor,
        crop: Option<&RelativeRect>,
        on_progress: &mut dyn FnMut(u8),
    ) -> Result<&ExtractedNutrients, RecognitionError> {
        self.extracted = None;
        self.analysis = None;

        let text = match &self.label_photo {
            Some(photo) => run_ocr(recognizer, photo, crop, &self.config, on_progress),
            None => Err(RecognitionError::NoPhoto),
        };

        let text = match text {
            Ok(text) => text,
            Err(e) => {
                crate::log(&format!("Label reading failed: {}", e));
                self.manual_input = true;
                return Err(e);
            }
        };

        let extracted = read_label_text(extractor, &text);
        self.manual_input = false;
        Ok(self.extracted.insert(extracted))
    }

    /// Skips OCR and goes straight to typing values in.
    pub fn enter_manually(&mut self) {
        self.extracted = None;
        self.analysis = None;
        self.manual_input = true;
    }

    pub fn extracted(&self) -> Option<&ExtractedNutrients> {
        self.extracted.as_ref()
    }

    /// Composition pre-filled with whatever the label reading found.
    pub fn prefill(&self, name: &str, food_type: FoodType) -> FoodComposition {
        FoodComposition::prefill(
            name,
            food_type,
            self.extracted.as_ref().unwrap_or(&ExtractedNutrients::default()),
        )
    }

    /// Scores the confirmed values and keeps the result as the current
    /// analysis.
    pub fn analyze(&mut self, food: &FoodComposition) -> Result<&AnalysisResult, InputError> {
        let result = analyze(food)?;
        Ok(self.analysis.insert(result))
    }

    pub fn current_analysis(&self) -> Option<&AnalysisResult> {
        self.analysis.as_ref()
    }

    /// Moves the current analysis and photos into the catalog and starts
    /// over. On failure nothing is lost: the session keeps its analysis.
    pub fn save(&mut self, catalog: &Catalog<'_>) -> Result<CatalogEntry, PersistenceError> {
        let result = self
            .analysis
            .as_ref()
            .ok_or(PersistenceError::NothingToSave)?;

        let entry = catalog.save(
            result,
            Photos {
                front: self.front_photo.as_deref(),
                label: self.label_photo.as_deref(),
            },
        )?;

        self.reset();
        Ok(entry)
    }

    /// Clears photos, extraction and analysis.
    pub fn reset(&mut self) {
        self.front_photo = None;
        self.label_photo = None;
        self.extracted = None;
        self.manual_input = false;
        self.analysis = None;
    }
}
