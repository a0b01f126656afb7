// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// insuredocs-document: Turning a stored PDF into text.
//
// Reads the embedded text layer with `lopdf`, judges whether it is usable,
// and otherwise rasterizes each page and runs it through a lazily
// constructed OCR engine. Per-page failures are folded into the artifact as
// inline markers rather than aborting the document.

pub mod hybrid;
pub mod pdf;
pub mod report;
pub mod scan;

// Re-export the primary structs so callers can use `insuredocs_document::PdfReader` etc.
pub use hybrid::{ExtractedText, HybridTextExtractor};
pub use pdf::reader::PdfReader;
pub use pdf::text_layer::{PageTextSource, TextLayerAnalysis, TextLayerAnalyzer};
pub use report::{PageOutcome, PageReport};
pub use scan::engine::{EngineFactory, OcrService, RecognitionEngine};
pub use scan::raster::{RasterDocument, Rasterizer, UnavailableRasterizer};

#[cfg(feature = "ocr")]
pub use scan::ocr::OcrsRecognizer;

#[cfg(feature = "render")]
pub use scan::raster::PdfiumRasterizer;
