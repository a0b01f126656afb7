// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer: builds the storage, text extraction and pipeline
// objects once from the effective configuration.
//
// The SQLite connection used here is for the foreground commands only.
// Pipeline runs open their own sessions through `SqliteSessionSource`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use insuredocs_core::config::{ExtractionProfile, OcrSettings};
use insuredocs_core::error::{InsureDocsError, Result};
use insuredocs_core::{AppConfig, Document, DocumentId, ExtractedFields};
use insuredocs_document::{EngineFactory, HybridTextExtractor, OcrService, Rasterizer, UnavailableRasterizer};
use insuredocs_extract::{Extractor, FieldExtractor};
use insuredocs_pipeline::{
    Decision, Dispatcher, DocumentQuery, DocumentRepository, FsBlobStore, Orchestrator, RunOutcome,
    SqliteRepository, SqliteSessionSource, delete_document, ingest, record_decision,
};
use tracing::{info, instrument, warn};

use super::data_dir;

pub const CONFIG_FILE: &str = "config.json";

/// Everything a subcommand needs, built from one [`AppConfig`].
pub struct AppServices {
    config: AppConfig,
    repo: SqliteRepository,
    blobs: FsBlobStore,
    orchestrator: Arc<Orchestrator>,
}

impl AppServices {
    /// Open the database, the blob store and the pipeline under `data_dir`.
    ///
    /// The OCR engine is not loaded here; the first document that needs it
    /// pays for construction.
    pub fn init(data_dir: PathBuf, config: AppConfig) -> Result<Self> {
        info!(path = %data_dir.display(), "initialising app services");

        let db_path = data_dir::resolve(&data_dir, &config.storage.database_path);
        let sessions = SqliteSessionSource::new(db_path)?;
        let repo = sessions.open()?;
        let blobs = FsBlobStore::from_config(&data_dir, &config.storage)?;

        let text = HybridTextExtractor::from_config(
            &config,
            Arc::new(ocr_service(&config.ocr)),
            rasterizer(),
        );
        let extractor = FieldExtractor::new(config.extraction.profile)?;

        let orchestrator = Orchestrator::new(
            Arc::new(sessions.clone()),
            Arc::new(blobs.clone()),
            Arc::new(text),
            Arc::new(extractor),
        );

        info!(
            database = %sessions.path().display(),
            uploads = %blobs.root().display(),
            profile = ?config.extraction.profile,
            "app services initialised"
        );
        Ok(Self {
            config,
            repo,
            blobs,
            orchestrator: Arc::new(orchestrator),
        })
    }

    // -- Intake --------------------------------------------------------------

    /// Store the PDF at `path` and queue it for OCR.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn ingest_file(&self, path: &Path) -> Result<Document> {
        if !path.is_file() {
            return Err(InsureDocsError::InputMissing(path.display().to_string()));
        }
        let data = std::fs::read(path)?;
        let original_filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        ingest(&self.repo, &self.blobs, &original_filename, &data)
    }

    // -- Pipeline ------------------------------------------------------------

    /// Run the pipeline for `id` on the calling thread.
    pub fn process_now(&self, id: &DocumentId) -> Result<RunOutcome> {
        self.orchestrator.process(id)
    }

    /// A dispatcher sized by `workers.max_concurrent`.
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(Arc::clone(&self.orchestrator), self.config.workers.max_concurrent)
    }

    // -- Records -------------------------------------------------------------

    pub fn show(&self, id: &DocumentId) -> Result<Option<Document>> {
        self.repo.get(id)
    }

    pub fn list(&self, query: &DocumentQuery) -> Result<Vec<Document>> {
        self.repo.list(query)
    }

    /// Remove the record and its stored files.
    pub fn delete(&self, id: &DocumentId) -> Result<bool> {
        delete_document(&self.repo, &self.blobs, id)
    }

    pub fn decide(&self, id: &DocumentId, decision: Decision) -> Result<Document> {
        record_decision(&self.repo, id, decision)
    }
}

/// Run field extraction alone over `text`.
pub fn extract_fields(text: &str, profile: ExtractionProfile) -> Result<ExtractedFields> {
    FieldExtractor::new(profile)?.extract(text)
}

/// Load the effective configuration.
///
/// An explicit `path` must exist. Without one, `config.json` in the data dir
/// is used when present and defaults otherwise.
pub fn load_config(path: Option<&Path>, data_dir: &Path) -> Result<AppConfig> {
    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (data_dir.join(CONFIG_FILE), false),
    };

    if !path.is_file() {
        if required {
            return Err(InsureDocsError::Config(format!(
                "config file {} does not exist",
                path.display()
            )));
        }
        let config = AppConfig::default();
        config.validate()?;
        return Ok(config);
    }

    let json = std::fs::read_to_string(&path)?;
    let config = AppConfig::from_json(&json)
        .map_err(|err| InsureDocsError::Config(format!("{}: {err}", path.display())))?;
    info!(path = %path.display(), "configuration loaded");
    Ok(config)
}

#[cfg_attr(not(feature = "ocr"), allow(unused_variables))]
fn ocr_service(settings: &OcrSettings) -> OcrService {
    #[cfg(feature = "ocr")]
    let factory: EngineFactory = insuredocs_document::OcrsRecognizer::factory(settings);

    #[cfg(not(feature = "ocr"))]
    let factory: EngineFactory = Box::new(|| {
        Err(InsureDocsError::EngineUnavailable(
            "built without the `ocr` feature".into(),
        ))
    });

    OcrService::new(factory).with_dpi(settings.dpi)
}

fn rasterizer() -> Arc<dyn Rasterizer> {
    #[cfg(feature = "render")]
    match insuredocs_document::PdfiumRasterizer::new() {
        Ok(rasterizer) => return Arc::new(rasterizer),
        Err(err) => warn!(error = %err, "PDFium unavailable; scanned documents will fail OCR"),
    }

    #[cfg(not(feature = "render"))]
    warn!("built without the `render` feature; scanned documents will fail OCR");

    Arc::new(UnavailableRasterizer)
}
