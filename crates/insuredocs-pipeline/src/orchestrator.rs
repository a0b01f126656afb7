// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline orchestrator: drives one document from a retryable status to a
// terminal one.
//
// Run shape:
//
//   guard (status must be retryable) -> ocr_processing
//   -> text layer or OCR -> write artifact -> ocr_completed (+ artifact ref)
//   -> extract_processing -> extract -> final commit
//
// Every run restarts at the OCR phase, including retries after
// `extract_failed`. Any error or panic inside the phases is caught once here
// and resolved to `ocr_failed` or `extract_failed` depending on whether
// `ocr_completed` had been committed. The final write goes through the
// result assembler on every exit path past the guard.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, instrument, warn};

use insuredocs_core::error::{ErrorKind, InsureDocsError, Result};
use insuredocs_core::{Document, DocumentId, DocumentStatus, ExtractedFields, TextSource};
use insuredocs_document::{ExtractedText, HybridTextExtractor};
use insuredocs_extract::Extractor;

use crate::assembler::{Commit, FinalState, ResultAssembler};
use crate::blob::BlobStore;
use crate::repository::{DocumentRepository, SessionSource};

/// Produces the text of a stored PDF.
pub trait DocumentText: Send + Sync {
    fn extract_text(&self, path: &Path) -> Result<ExtractedText>;
}

impl DocumentText for HybridTextExtractor {
    fn extract_text(&self, path: &Path) -> Result<ExtractedText> {
        self.extract(path)
    }
}

/// Why a run failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunFailure {
    #[serde(skip)]
    pub kind: ErrorKind,
    pub message: String,
}

/// Summary of a run that got past the retry guard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// Status the run resolved to (committed or not, see `commit`).
    pub final_status: DocumentStatus,
    pub commit: Commit,
    pub source: Option<TextSource>,
    pub text_artifact_ref: Option<String>,
    pub failure: Option<RunFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    NotFound,
    /// Already processing or terminal; nothing was written.
    Skipped { status: DocumentStatus },
    Finished(RunReport),
}

/// Successful phase results handed to the assembler.
struct PhaseOutput {
    fields: ExtractedFields,
    source: TextSource,
    artifact_ref: String,
}

/// Per-run status bookkeeping over one repository session.
struct Run<'a> {
    repo: &'a dyn DocumentRepository,
    id: DocumentId,
    status: DocumentStatus,
    ocr_completed: bool,
    source: Option<TextSource>,
    artifact_ref: Option<String>,
}

impl Run<'_> {
    fn check(&self, next: DocumentStatus) -> Result<()> {
        if self.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(InsureDocsError::InvalidTransition {
                from: self.status,
                to: next,
            })
        }
    }

    fn advance(&mut self, next: DocumentStatus) -> Result<()> {
        self.check(next)?;
        self.repo.update_status(&self.id, next)?;
        info!(from = %self.status, to = %next, "status transition");
        self.status = next;
        Ok(())
    }

    fn complete_ocr(&mut self, artifact_ref: &str) -> Result<()> {
        let next = DocumentStatus::OcrCompleted;
        self.check(next)?;
        self.repo.update_ocr_result(&self.id, artifact_ref, next)?;
        info!(from = %self.status, to = %next, artifact_ref, "status transition");
        self.status = next;
        self.ocr_completed = true;
        self.artifact_ref = Some(artifact_ref.to_owned());
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic with non-string payload".to_owned()
    }
}

/// Sequences text extraction, field extraction and the final commit.
#[derive(Clone)]
pub struct Orchestrator {
    sessions: Arc<dyn SessionSource>,
    blobs: Arc<dyn BlobStore>,
    text: Arc<dyn DocumentText>,
    extractor: Arc<dyn Extractor>,
    assembler: ResultAssembler,
}

impl Orchestrator {
    pub fn new(
        sessions: Arc<dyn SessionSource>,
        blobs: Arc<dyn BlobStore>,
        text: Arc<dyn DocumentText>,
        extractor: Arc<dyn Extractor>,
    ) -> Self {
        Self {
            sessions,
            blobs,
            text,
            extractor,
            assembler: ResultAssembler,
        }
    }

    /// Run the pipeline for `id`.
    ///
    /// Returns `Err` only when the session cannot be opened or the document
    /// cannot be read before anything has been written.
    #[instrument(skip(self), fields(document_id = %id))]
    pub fn process(&self, id: &DocumentId) -> Result<RunOutcome> {
        let repo = self.sessions.open_session()?;

        let Some(document) = repo.get(id)? else {
            warn!("document not found");
            return Ok(RunOutcome::NotFound);
        };

        if !document.status.is_retryable() {
            if document.status.is_terminal() {
                info!(status = %document.status, "already finished; skipping");
            } else {
                info!(status = %document.status, "already processing; skipping");
            }
            return Ok(RunOutcome::Skipped {
                status: document.status,
            });
        }

        let mut run = Run {
            repo: repo.as_ref(),
            id: *id,
            status: document.status,
            ocr_completed: false,
            source: None,
            artifact_ref: None,
        };

        let result = panic::catch_unwind(AssertUnwindSafe(|| self.run_phases(&mut run, &document)))
            .unwrap_or_else(|payload| Err(InsureDocsError::Unhandled(panic_message(&*payload))));

        let (state, failure) = match result {
            Ok(output) => {
                info!(
                    source = ?output.source,
                    labels = output.fields.len(),
                    artifact_ref = %output.artifact_ref,
                    "pipeline phases complete"
                );
                (FinalState::Extracted(output.fields), None)
            }
            Err(err) => {
                let kind = err.kind();
                let status = kind.failure_status(run.ocr_completed);
                if kind.is_critical() {
                    error!(critical = true, ?kind, error = %err, %status, "pipeline run failed");
                } else {
                    error!(?kind, error = %err, %status, "pipeline run failed");
                }
                let failure = RunFailure {
                    kind,
                    message: err.to_string(),
                };
                (FinalState::Failed(status), Some(failure))
            }
        };

        let final_status = state.status();
        let commit = self.assembler.commit(repo.as_ref(), id, state);

        Ok(RunOutcome::Finished(RunReport {
            final_status,
            commit,
            source: run.source,
            text_artifact_ref: run.artifact_ref,
            failure,
        }))
    }

    fn run_phases(&self, run: &mut Run<'_>, document: &Document) -> Result<PhaseOutput> {
        // -- OCR phase --------------------------------------------------------
        run.advance(DocumentStatus::OcrProcessing)?;

        let path = self.blobs.resolve_source(&document.stored_filename)?;
        let extracted = self.text.extract_text(&path)?;
        run.source = Some(extracted.source);
        info!(source = ?extracted.source, chars = extracted.text.len(), "document text produced");

        let artifact_ref = self.blobs.artifact_ref_for(&document.stored_filename);
        self.blobs.write_text(&artifact_ref, &extracted.text)?;
        run.complete_ocr(&artifact_ref)?;

        // -- Extraction phase -------------------------------------------------
        run.advance(DocumentStatus::ExtractProcessing)?;
        let fields = self.extractor.extract(&extracted.text)?;
        run.check(DocumentStatus::ExtractCompleted)?;

        Ok(PhaseOutput {
            fields,
            source: extracted.source,
            artifact_ref,
        })
    }
}
