// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterization: render PDF pages to lossless PNG images for OCR.
//
// The PDFium-backed implementation is only available with the `render`
// feature:
//
// ```toml
// insuredocs-document = { path = "crates/insuredocs-document", features = ["render"] }
// ```
//
// PDFium is loaded dynamically: first from the working directory, then from
// the system library path.

use std::path::Path;

use insuredocs_core::error::{InsureDocsError, Result};

/// An opened document whose pages can be rendered.
pub trait RasterDocument {
    fn page_count(&self) -> usize;

    /// Render a 1-indexed page at `dpi` and encode it as PNG.
    fn render_page_png(&self, page_number: u32, dpi: u32) -> Result<Vec<u8>>;
}

/// Opens documents for rendering.
pub trait Rasterizer: Send + Sync {
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn RasterDocument + 'a>>;
}

/// Stand-in used when the crate is built without a rendering backend.
///
/// Every open fails, so documents without a usable text layer end in
/// `ocr_failed` with a message naming the missing feature.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableRasterizer;

impl Rasterizer for UnavailableRasterizer {
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn RasterDocument + 'a>> {
        Err(InsureDocsError::EngineUnavailable(format!(
            "cannot rasterize {}: built without the `render` feature",
            path.display()
        )))
    }
}

#[cfg(feature = "render")]
pub use pdfium::PdfiumRasterizer;

#[cfg(feature = "render")]
mod pdfium {
    use std::io::Cursor;
    use std::path::Path;

    use image::ImageFormat;
    use insuredocs_core::error::{InsureDocsError, Result};
    use pdfium_render::prelude::*;
    use tracing::{debug, info, instrument};

    use super::{RasterDocument, Rasterizer};

    /// PDF points per inch.
    const POINTS_PER_INCH: f32 = 72.0;

    /// Rasterizer backed by a dynamically bound PDFium library.
    pub struct PdfiumRasterizer {
        pdfium: Pdfium,
    }

    impl PdfiumRasterizer {
        /// Bind to PDFium in `./`, falling back to the system library.
        pub fn new() -> Result<Self> {
            let bindings =
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                    .or_else(|_| Pdfium::bind_to_system_library())
                    .map_err(|err| {
                        InsureDocsError::EngineUnavailable(format!(
                            "failed to load PDFium library: {err:?}"
                        ))
                    })?;

            info!("PDFium bound");
            Ok(Self {
                pdfium: Pdfium::new(bindings),
            })
        }
    }

    struct PdfiumDocument<'a> {
        document: PdfDocument<'a>,
    }

    impl RasterDocument for PdfiumDocument<'_> {
        fn page_count(&self) -> usize {
            self.document.pages().len() as usize
        }

        fn render_page_png(&self, page_number: u32, dpi: u32) -> Result<Vec<u8>> {
            let index = page_number
                .checked_sub(1)
                .and_then(|i| u16::try_from(i).ok())
                .ok_or_else(|| {
                    InsureDocsError::PdfError(format!("page {page_number} out of range"))
                })?;

            let page = self.document.pages().get(index).map_err(|err| {
                InsureDocsError::PdfError(format!("cannot load page {page_number}: {err:?}"))
            })?;

            let scale = dpi as f32 / POINTS_PER_INCH;
            let image = page
                .render_with_config(&PdfRenderConfig::new().scale_page_by_factor(scale))
                .map(|bitmap| bitmap.as_image())
                .map_err(|err| {
                    InsureDocsError::ImageError(format!(
                        "failed to render page {page_number}: {err:?}"
                    ))
                })?;

            let mut png = Vec::new();
            image
                .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
                .map_err(|err| {
                    InsureDocsError::ImageError(format!(
                        "failed to encode page {page_number} as PNG: {err}"
                    ))
                })?;

            debug!(
                page_number,
                width = image.width(),
                height = image.height(),
                png_bytes = png.len(),
                "page rasterized"
            );
            Ok(png)
        }
    }

    impl Rasterizer for PdfiumRasterizer {
        #[instrument(skip(self), fields(path = %path.display()))]
        fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn RasterDocument + 'a>> {
            if !path.exists() {
                return Err(InsureDocsError::InputMissing(path.display().to_string()));
            }

            let document = self.pdfium.load_pdf_from_file(path, None).map_err(|err| {
                InsureDocsError::PdfError(format!(
                    "PDFium failed to open {}: {err:?}",
                    path.display()
                ))
            })?;

            Ok(Box::new(PdfiumDocument { document }))
        }
    }
}
