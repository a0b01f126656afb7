// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline: page rasterization and optical character recognition
// (OCR).

pub mod engine;
pub mod raster;

#[cfg(feature = "ocr")]
pub mod ocr;

pub use engine::OcrService;

#[cfg(feature = "ocr")]
pub use ocr::OcrsRecognizer;
