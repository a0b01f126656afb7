// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text layer analysis: decide whether a PDF's embedded text is good enough to
// skip OCR.
//
// A page is "sufficient" when its trimmed text is longer than
// `min_page_chars`. The layer is accepted only when the share of sufficient
// pages is strictly greater than `sufficiency_ratio`; exactly half falls back
// to OCR with the default ratio.

use insuredocs_core::config::TextLayerConfig;
use insuredocs_core::error::InsureDocsError;
use insuredocs_core::TextSource;
use tracing::{debug, info, instrument, warn};

use crate::report::{PageReport, render_pages};

/// Anything that can hand out the embedded text of its pages.
pub trait PageTextSource {
    fn page_count(&self) -> usize;

    /// Embedded text of a 1-indexed page.
    fn page_text(&self, page_number: u32) -> Result<String, InsureDocsError>;
}

/// Result of inspecting every page of a document.
#[derive(Debug, Clone)]
pub struct TextLayerAnalysis {
    pub reports: Vec<PageReport>,
    pub sufficient_pages: usize,
    pub total_pages: usize,
}

impl TextLayerAnalysis {
    /// Share of pages that carried enough text.
    pub fn coverage(&self) -> f64 {
        if self.total_pages == 0 {
            0.0
        } else {
            self.sufficient_pages as f64 / self.total_pages as f64
        }
    }

    /// Render the per-page blocks into artifact text.
    pub fn render(&self) -> String {
        render_pages(&self.reports)
    }
}

/// Applies the sufficiency heuristic to a document's text layer.
#[derive(Debug, Clone)]
pub struct TextLayerAnalyzer {
    min_page_chars: usize,
    sufficiency_ratio: f64,
}

impl Default for TextLayerAnalyzer {
    fn default() -> Self {
        Self::new(&TextLayerConfig::default())
    }
}

impl TextLayerAnalyzer {
    pub fn new(config: &TextLayerConfig) -> Self {
        Self {
            min_page_chars: config.min_page_chars,
            sufficiency_ratio: config.sufficiency_ratio,
        }
    }

    /// Inspect every page. Page errors become inline markers and count as
    /// insufficient; they never abort the scan.
    #[instrument(skip_all, fields(pages = source.page_count()))]
    pub fn analyze<S: PageTextSource + ?Sized>(&self, source: &S) -> TextLayerAnalysis {
        let total_pages = source.page_count();
        let mut reports = Vec::with_capacity(total_pages);
        let mut sufficient_pages = 0;

        for page_number in (1..=total_pages).map(|n| n as u32) {
            match source.page_text(page_number) {
                Ok(raw) => {
                    let text = raw.trim();
                    let chars = text.chars().count();
                    if chars > self.min_page_chars {
                        sufficient_pages += 1;
                    }
                    debug!(page_number, chars, "text layer page read");
                    reports.push(PageReport::text(page_number, TextSource::TextLayer, text));
                }
                Err(err) => {
                    warn!(page_number, error = %err, "text layer extraction failed for page");
                    reports.push(PageReport::failed(
                        page_number,
                        TextSource::TextLayer,
                        err.to_string(),
                    ));
                }
            }
        }

        TextLayerAnalysis {
            reports,
            sufficient_pages,
            total_pages,
        }
    }

    /// Whether an analysis clears the sufficiency bar.
    pub fn is_sufficient(&self, analysis: &TextLayerAnalysis) -> bool {
        analysis.total_pages > 0 && analysis.coverage() > self.sufficiency_ratio
    }

    /// Return the aggregate text if the layer is sufficient, `None` to signal
    /// OCR fallback.
    pub fn extract<S: PageTextSource + ?Sized>(&self, source: &S) -> Option<String> {
        let analysis = self.analyze(source);
        if self.is_sufficient(&analysis) {
            info!(
                sufficient = analysis.sufficient_pages,
                total = analysis.total_pages,
                "text layer deemed sufficient"
            );
            Some(analysis.render())
        } else {
            info!(
                sufficient = analysis.sufficient_pages,
                total = analysis.total_pages,
                "text layer insufficient, falling back to OCR"
            );
            None
        }
    }
}
