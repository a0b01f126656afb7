// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: opening documents and judging their embedded text layer.

pub mod reader;
pub mod text_layer;

pub use reader::PdfReader;
pub use text_layer::TextLayerAnalyzer;
