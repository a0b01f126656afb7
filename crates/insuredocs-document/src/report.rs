// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-page outcomes and their rendering into the aggregate text artifact.

use insuredocs_core::TextSource;
use serde::Serialize;

/// What happened to one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageOutcome {
    /// Recognized or embedded text (already trimmed for text-layer pages).
    Text(String),
    /// The page failed; the message is written inline into the artifact.
    Failed(String),
}

/// Outcome for a single page, tagged with its number and origin.
///
/// Never persisted on its own: only folded into the artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageReport {
    /// 1-indexed page number.
    pub page_number: u32,
    pub origin: TextSource,
    pub outcome: PageOutcome,
}

impl PageReport {
    pub fn text(page_number: u32, origin: TextSource, text: impl Into<String>) -> Self {
        Self {
            page_number,
            origin,
            outcome: PageOutcome::Text(text.into()),
        }
    }

    pub fn failed(page_number: u32, origin: TextSource, message: impl Into<String>) -> Self {
        Self {
            page_number,
            origin,
            outcome: PageOutcome::Failed(message.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, PageOutcome::Failed(_))
    }

    /// Append this page's block to `out`.
    pub fn render_into(&self, out: &mut String) {
        let n = self.page_number;
        match (&self.origin, &self.outcome) {
            (TextSource::TextLayer, PageOutcome::Text(text)) => {
                out.push_str(&format!("\n--- Page {n} (Text Layer) ---\n{text}\n"));
            }
            (TextSource::TextLayer, PageOutcome::Failed(msg)) => {
                out.push_str(&format!("\n--- Page {n} (TEXT EXTRACT ERROR: {msg}) ---\n"));
            }
            (TextSource::Ocr, PageOutcome::Text(text)) => {
                out.push_str(&format!("\n--- Page {n} (OCR) ---\n{text}\n"));
            }
            (TextSource::Ocr, PageOutcome::Failed(msg)) => {
                out.push_str(&format!("\n--- Page {n} (OCR ERROR: {msg}) ---\n"));
            }
        }
    }
}

/// Concatenate page blocks in order.
pub fn render_pages(reports: &[PageReport]) -> String {
    let mut out = String::new();
    for report in reports {
        report.render_into(&mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_carry_page_numbers_and_markers() {
        let reports = vec![
            PageReport::text(1, TextSource::Ocr, "first"),
            PageReport::failed(2, TextSource::Ocr, "render timeout"),
        ];
        let text = render_pages(&reports);
        assert_eq!(
            text,
            "\n--- Page 1 (OCR) ---\nfirst\n\n--- Page 2 (OCR ERROR: render timeout) ---\n"
        );
    }

    #[test]
    fn text_layer_blocks_are_labelled() {
        let mut out = String::new();
        PageReport::text(3, TextSource::TextLayer, "body").render_into(&mut out);
        assert!(out.contains("--- Page 3 (Text Layer) ---"));
    }
}
