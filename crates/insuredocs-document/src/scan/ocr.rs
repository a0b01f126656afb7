// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `ocrs` recognition backend.
//
// A pure-Rust OCR engine backed by neural network models executed via `rten`,
// configured for English text on the CPU.
//
// # Feature Gate
//
// This module is only available when the `ocr` feature is enabled:
//
// ```toml
// insuredocs-document = { path = "crates/insuredocs-document", features = ["ocr"] }
// ```
//
// # Model Setup
//
// The engine requires two model files:
//
// - **Detection model** (`text-detection.rten`): locates text regions in the image.
// - **Recognition model** (`text-recognition.rten`): decodes characters from detected regions.
//
// Running `ocrs-cli` once downloads both into `$XDG_CACHE_HOME/ocrs`
// (typically `~/.cache/ocrs`), which is the default lookup directory.

use std::path::{Path, PathBuf};

use insuredocs_core::config::OcrSettings;
use insuredocs_core::error::{InsureDocsError, Result};
use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams};
use rten::Model;
use tracing::{debug, info, instrument};

use super::engine::{EngineFactory, RecognitionEngine};

/// Well-known filenames for the detection and recognition models.
const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// Vertical gap, in multiples of the previous line's height, that starts a
/// new paragraph.
const PARAGRAPH_GAP_FACTOR: f32 = 0.8;

/// Default directory for cached OCR model files.
///
/// `$XDG_CACHE_HOME/ocrs`, falling back to `~/.cache/ocrs`.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Locations of the two model files.
#[derive(Debug, Clone)]
pub struct OcrModelPaths {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
}

impl OcrModelPaths {
    /// Expects `dir` to contain `text-detection.rten` and `text-recognition.rten`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    /// Resolve from settings, defaulting to the engine cache directory.
    pub fn from_settings(settings: &OcrSettings) -> Self {
        match &settings.model_dir {
            Some(dir) => Self::from_dir(dir),
            None => Self::from_dir(default_model_dir()),
        }
    }

    /// Verify that both model files exist.
    pub fn validate(&self) -> Result<()> {
        for path in [&self.detection_model_path, &self.recognition_model_path] {
            if !path.exists() {
                return Err(InsureDocsError::EngineUnavailable(format!(
                    "OCR model not found at {}; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// English, CPU-only recognizer built on `ocrs`.
pub struct OcrsRecognizer {
    engine: OcrsEngine,
}

impl OcrsRecognizer {
    /// Load both models and build the engine.
    ///
    /// Model loading is the expensive step; the OCR service calls this once.
    #[instrument(skip_all, fields(
        detection = %paths.detection_model_path.display(),
        recognition = %paths.recognition_model_path.display(),
    ))]
    pub fn load(paths: &OcrModelPaths) -> Result<Self> {
        paths.validate()?;

        info!("Loading OCR detection model");
        let detection_model = Model::load_file(&paths.detection_model_path).map_err(|err| {
            InsureDocsError::EngineUnavailable(format!(
                "failed to load detection model from {}: {}",
                paths.detection_model_path.display(),
                err
            ))
        })?;

        info!("Loading OCR recognition model");
        let recognition_model =
            Model::load_file(&paths.recognition_model_path).map_err(|err| {
                InsureDocsError::EngineUnavailable(format!(
                    "failed to load recognition model from {}: {}",
                    paths.recognition_model_path.display(),
                    err
                ))
            })?;

        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| {
            InsureDocsError::EngineUnavailable(format!("failed to initialise OCR engine: {}", err))
        })?;

        Ok(Self { engine })
    }

    /// Factory for [`OcrService`](super::engine::OcrService).
    pub fn factory(settings: &OcrSettings) -> EngineFactory {
        let paths = OcrModelPaths::from_settings(settings);
        Box::new(move || {
            let recognizer = Self::load(&paths)?;
            Ok(Box::new(recognizer) as Box<dyn RecognitionEngine>)
        })
    }
}

impl RecognitionEngine for OcrsRecognizer {
    fn recognize(&self, image: &[u8]) -> Result<Vec<String>> {
        let decoded = image::load_from_memory(image)
            .map_err(|err| InsureDocsError::ImageError(format!("cannot decode page image: {err}")))?;

        // ocrs expects packed RGB8.
        let rgb = decoded.to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            InsureDocsError::OcrError(format!(
                "failed to create image source ({}x{}): {}",
                width, height, err
            ))
        })?;

        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| InsureDocsError::OcrError(format!("OCR preprocessing failed: {}", err)))?;

        let word_rects = self
            .engine
            .detect_words(&input)
            .map_err(|err| InsureDocsError::OcrError(format!("word detection failed: {}", err)))?;
        let line_rects = self.engine.find_text_lines(&input, &word_rects);

        let line_texts = self
            .engine
            .recognize_text(&input, &line_rects)
            .map_err(|err| InsureDocsError::OcrError(format!("line recognition failed: {}", err)))?;

        // Group consecutive lines into paragraphs on large vertical gaps.
        let mut paragraphs: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut previous: Option<(f32, f32)> = None;

        for (rects, text) in line_rects.iter().zip(line_texts.iter()) {
            let Some(text) = text.as_ref().map(|line| line.to_string()) else {
                continue;
            };
            let text = text.trim();
            if text.is_empty() {
                continue;
            }

            let top = rects.iter().map(|r| r.bounding_rect().top()).fold(f32::MAX, f32::min);
            let bottom = rects.iter().map(|r| r.bounding_rect().bottom()).fold(f32::MIN, f32::max);

            let breaks = match previous {
                Some((prev_top, prev_bottom)) => {
                    let height = (prev_bottom - prev_top).max(1.0);
                    top - prev_bottom > height * PARAGRAPH_GAP_FACTOR
                }
                None => false,
            };

            if breaks && !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(text);
            previous = Some((top, bottom));
        }

        if !current.is_empty() {
            paragraphs.push(current);
        }

        debug!(width, height, paragraphs = paragraphs.len(), "OCR recognition complete");
        Ok(paragraphs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_paths_from_dir() {
        let paths = OcrModelPaths::from_dir("/tmp/my-models");
        assert_eq!(
            paths.detection_model_path,
            PathBuf::from("/tmp/my-models/text-detection.rten")
        );
        assert_eq!(
            paths.recognition_model_path,
            PathBuf::from("/tmp/my-models/text-recognition.rten")
        );
    }

    #[test]
    fn missing_models_are_engine_unavailable() {
        let paths = OcrModelPaths::from_dir("/nonexistent/path/ocr-models");
        assert!(matches!(
            paths.validate(),
            Err(InsureDocsError::EngineUnavailable(_))
        ));
    }

    #[test]
    fn factory_failure_surfaces_as_error() {
        let settings = OcrSettings {
            model_dir: Some(PathBuf::from("/nonexistent/path/ocr-models")),
            ..Default::default()
        };
        let factory = OcrsRecognizer::factory(&settings);
        assert!(factory().is_err());
    }
}
