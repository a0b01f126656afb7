// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR service: owns the recognition engine for the lifetime of the process.
//
// The engine is expensive to build (model loading), so it is constructed at
// most once, on first use, behind a `OnceLock`. The first caller blocks every
// other caller until construction finishes. If construction fails the failure
// is cached: every later call returns `EngineUnavailable` immediately and the
// factory is never invoked again.
//
// Recognition calls go through a mutex, so at most one page is being
// recognized at any time regardless of how many documents are in flight.

use std::path::Path;
use std::sync::{Mutex, OnceLock, PoisonError};

use insuredocs_core::error::{InsureDocsError, Result};
use insuredocs_core::TextSource;
use tracing::{debug, error, info, instrument, warn};

use super::raster::{RasterDocument, Rasterizer};
use crate::report::{PageReport, render_pages};

/// Default rasterization resolution for OCR.
pub const DEFAULT_DPI: u32 = 300;

/// A text recognizer fed with lossless page images.
pub trait RecognitionEngine: Send {
    /// Recognize an encoded (PNG) image, returning paragraph-grouped fragments
    /// in reading order.
    fn recognize(&self, image: &[u8]) -> Result<Vec<String>>;
}

/// Builds the engine on first use.
pub type EngineFactory = Box<dyn Fn() -> Result<Box<dyn RecognitionEngine>> + Send + Sync>;

type EngineSlot = std::result::Result<Mutex<Box<dyn RecognitionEngine>>, String>;

/// Lazily initialised, single-lane OCR service.
pub struct OcrService {
    factory: EngineFactory,
    engine: OnceLock<EngineSlot>,
    dpi: u32,
}

impl OcrService {
    /// Create a service that will build its engine with `factory` on first use.
    pub fn new(factory: EngineFactory) -> Self {
        Self {
            factory,
            engine: OnceLock::new(),
            dpi: DEFAULT_DPI,
        }
    }

    /// Override the rasterization resolution.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    /// `None` until the first initialisation attempt, then whether it worked.
    pub fn is_available(&self) -> Option<bool> {
        self.engine.get().map(|slot| slot.is_ok())
    }

    /// Get the engine, constructing it on the first call.
    fn engine(&self) -> Result<&Mutex<Box<dyn RecognitionEngine>>> {
        let slot = self.engine.get_or_init(|| {
            info!("initialising OCR engine (lang=en, cpu)");
            match (self.factory)() {
                Ok(engine) => {
                    info!("OCR engine initialised");
                    Ok(Mutex::new(engine))
                }
                Err(err) => {
                    error!(critical = true, error = %err, "OCR engine failed to initialise");
                    Err(err.to_string())
                }
            }
        });

        slot.as_ref()
            .map_err(|msg| InsureDocsError::EngineUnavailable(msg.clone()))
    }

    /// Recognize a single encoded image.
    pub fn recognize_image(&self, image: &[u8]) -> Result<Vec<String>> {
        let engine = self.engine()?;
        let guard = engine.lock().unwrap_or_else(PoisonError::into_inner);
        guard.recognize(image)
    }

    /// Rasterize and recognize every page of an open document.
    ///
    /// A failing page becomes an inline error report; only an unavailable
    /// engine fails the whole call.
    #[instrument(skip_all, fields(pages = document.page_count(), dpi = self.dpi))]
    pub fn recognize_document<D: RasterDocument + ?Sized>(
        &self,
        document: &D,
    ) -> Result<Vec<PageReport>> {
        let engine = self.engine()?;
        let total = document.page_count();
        info!(total, "starting OCR");

        let mut reports = Vec::with_capacity(total);
        for page_number in (1..=total).map(|n| n as u32) {
            debug!(page_number, total, "rendering page");
            let outcome = document
                .render_page_png(page_number, self.dpi)
                .and_then(|png| {
                    let guard = engine.lock().unwrap_or_else(PoisonError::into_inner);
                    guard.recognize(&png)
                });

            match outcome {
                Ok(fragments) => {
                    debug!(page_number, fragments = fragments.len(), "page recognized");
                    reports.push(PageReport::text(page_number, TextSource::Ocr, fragments.join("\n")));
                }
                Err(err) => {
                    warn!(page_number, error = %err, "OCR failed for page");
                    reports.push(PageReport::failed(page_number, TextSource::Ocr, err.to_string()));
                }
            }
        }

        Ok(reports)
    }

    /// Open `path` with `rasterizer` and return the aggregate OCR text.
    ///
    /// Fails only when the engine is unavailable or the document cannot be
    /// opened.
    #[instrument(skip(self, rasterizer), fields(path = %path.display()))]
    pub fn recognize(&self, rasterizer: &dyn Rasterizer, path: &Path) -> Result<String> {
        // Fail fast on a dead engine before paying for the document open.
        self.engine()?;
        let document = rasterizer.open(path)?;
        let reports = self.recognize_document(document.as_ref())?;
        Ok(render_pages(&reports))
    }
}
