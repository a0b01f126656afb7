// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Hybrid text extraction: embedded text layer first, OCR when the layer is
// insufficient or unreadable.

use std::path::Path;
use std::sync::Arc;

use insuredocs_core::config::AppConfig;
use insuredocs_core::error::{InsureDocsError, Result};
use insuredocs_core::TextSource;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::pdf::reader::PdfReader;
use crate::pdf::text_layer::TextLayerAnalyzer;
use crate::scan::engine::OcrService;
use crate::scan::raster::Rasterizer;

/// Aggregate document text and where it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedText {
    pub text: String,
    pub source: TextSource,
}

/// Text layer analyzer plus shared OCR fallback.
#[derive(Clone)]
pub struct HybridTextExtractor {
    analyzer: TextLayerAnalyzer,
    ocr: Arc<OcrService>,
    rasterizer: Arc<dyn Rasterizer>,
}

impl HybridTextExtractor {
    pub fn new(
        analyzer: TextLayerAnalyzer,
        ocr: Arc<OcrService>,
        rasterizer: Arc<dyn Rasterizer>,
    ) -> Self {
        Self {
            analyzer,
            ocr,
            rasterizer,
        }
    }

    /// Build from application config around an existing OCR service.
    pub fn from_config(
        config: &AppConfig,
        ocr: Arc<OcrService>,
        rasterizer: Arc<dyn Rasterizer>,
    ) -> Self {
        Self::new(TextLayerAnalyzer::new(&config.text_layer), ocr, rasterizer)
    }

    pub fn ocr(&self) -> &OcrService {
        &self.ocr
    }

    /// Produce the document text.
    ///
    /// A missing file is `InputMissing`. A file `lopdf` cannot parse skips the
    /// text layer and goes straight to OCR. OCR failures propagate.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn extract(&self, path: &Path) -> Result<ExtractedText> {
        if !path.exists() {
            return Err(InsureDocsError::InputMissing(path.display().to_string()));
        }

        match PdfReader::open(path) {
            Ok(reader) => {
                if let Some(text) = self.analyzer.extract(&reader) {
                    return Ok(ExtractedText {
                        text,
                        source: TextSource::TextLayer,
                    });
                }
            }
            Err(err @ InsureDocsError::InputMissing(_)) => return Err(err),
            Err(err) => {
                warn!(error = %err, "text layer unreadable, using OCR");
            }
        }

        info!(dpi = self.ocr.dpi(), "running OCR");
        let text = self.ocr.recognize(self.rasterizer.as_ref(), path)?;
        Ok(ExtractedText {
            text,
            source: TextSource::Ocr,
        })
    }
}
