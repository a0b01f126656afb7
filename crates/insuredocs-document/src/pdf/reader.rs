// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader: open existing PDF documents and pull the embedded text of each
// page using the `lopdf` crate.

use std::path::Path;

use insuredocs_core::error::InsureDocsError;
use lopdf::Document;
use tracing::{debug, info, instrument};

use super::text_layer::PageTextSource;

/// Reads existing PDF files.
///
/// Wraps `lopdf::Document` and exposes the per-page text the text layer
/// analyzer needs.
pub struct PdfReader {
    document: Document,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, InsureDocsError> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        if !path_ref.exists() {
            return Err(InsureDocsError::InputMissing(path_ref.display().to_string()));
        }

        let document = Document::load(path_ref).map_err(|err| {
            InsureDocsError::PdfError(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self { document })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    // -- Extraction -----------------------------------------------------------

    /// Extract the embedded text of a single page (1-indexed).
    pub fn page_text(&self, page_number: u32) -> Result<String, InsureDocsError> {
        let total = self.page_count();
        if page_number == 0 || page_number as usize > total {
            return Err(InsureDocsError::PdfError(format!(
                "page {} out of range (document has {} pages)",
                page_number, total
            )));
        }

        self.document
            .extract_text(&[page_number])
            .map_err(|err| InsureDocsError::PageFailure {
                page: page_number,
                message: err.to_string(),
            })
    }
}

impl PageTextSource for PdfReader {
    fn page_count(&self) -> usize {
        PdfReader::page_count(self)
    }

    fn page_text(&self, page_number: u32) -> Result<String, InsureDocsError> {
        PdfReader::page_text(self, page_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_are_a_pdf_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("claim.pdf");
        std::fs::write(&path, b"definitely not a pdf").expect("write");
        let result = PdfReader::open(&path);
        assert!(matches!(result, Err(InsureDocsError::PdfError(_))));
    }

    #[test]
    fn missing_file_is_input_missing() {
        let result = PdfReader::open("/nonexistent/insuredocs/claim.pdf");
        assert!(matches!(result, Err(InsureDocsError::InputMissing(_))));
    }
}
