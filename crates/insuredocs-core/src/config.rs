// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{InsureDocsError, Result};

/// Persistent application settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub text_layer: TextLayerConfig,
    pub ocr: OcrSettings,
    pub extraction: ExtractionConfig,
    pub workers: WorkerConfig,
}

/// Where documents, artifacts, and records live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory for stored PDFs.
    pub upload_dir: PathBuf,
    /// Subdirectory of `upload_dir` that receives text artifacts.
    pub text_subdir: String,
    /// SQLite database file. Relative paths resolve against the data dir.
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploaded_documents"),
            text_subdir: "extracted_text".into(),
            database_path: PathBuf::from("insuredocs.db"),
        }
    }
}

/// Sufficiency heuristic for embedded text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextLayerConfig {
    /// A page counts as sufficient when its trimmed text is longer than this.
    pub min_page_chars: usize,
    /// The text layer is accepted when sufficient/total is strictly greater.
    pub sufficiency_ratio: f64,
}

impl Default for TextLayerConfig {
    fn default() -> Self {
        Self {
            min_page_chars: 30,
            sufficiency_ratio: 0.5,
        }
    }
}

/// OCR engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Recognition language. Only English models are shipped.
    pub language: String,
    /// Rasterization resolution.
    pub dpi: u32,
    /// GPU execution is not supported; kept so configs can say so explicitly.
    pub use_gpu: bool,
    /// Directory holding the recognition models. `None` uses the engine cache.
    pub model_dir: Option<PathBuf>,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            language: "en".into(),
            dpi: 300,
            use_gpu: false,
            model_dir: None,
        }
    }
}

/// Which extractor(s) the pipeline runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionProfile {
    /// Policy numbers, dates, and normalized amounts only.
    Summary,
    /// Pattern + model entity recognizers.
    Entities,
    /// Both, merged into one mapping.
    #[default]
    Combined,
}

impl std::str::FromStr for ExtractionProfile {
    type Err = InsureDocsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "summary" => Ok(Self::Summary),
            "entities" => Ok(Self::Entities),
            "combined" => Ok(Self::Combined),
            other => Err(InsureDocsError::Config(format!(
                "unknown extraction profile '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub profile: ExtractionProfile,
}

/// Background worker pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Maximum documents processed at once.
    pub max_concurrent: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { max_concurrent: 2 }
    }
}

impl AppConfig {
    /// Reject settings the pipeline cannot honour.
    pub fn validate(&self) -> Result<()> {
        let ratio = self.text_layer.sufficiency_ratio;
        if !(0.0..1.0).contains(&ratio) {
            return Err(InsureDocsError::Config(format!(
                "text_layer.sufficiency_ratio must be in [0, 1), got {ratio}"
            )));
        }
        if self.ocr.dpi == 0 {
            return Err(InsureDocsError::Config("ocr.dpi must be positive".into()));
        }
        if self.ocr.language != "en" {
            return Err(InsureDocsError::Config(format!(
                "ocr.language '{}' is not supported (only 'en')",
                self.ocr.language
            )));
        }
        if self.ocr.use_gpu {
            return Err(InsureDocsError::Config(
                "ocr.use_gpu is not supported; the engine runs on CPU".into(),
            ));
        }
        if self.workers.max_concurrent == 0 {
            return Err(InsureDocsError::Config(
                "workers.max_concurrent must be at least 1".into(),
            ));
        }
        if self.storage.text_subdir.trim().is_empty() {
            return Err(InsureDocsError::Config(
                "storage.text_subdir must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Parse a JSON config document, filling gaps with defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}
