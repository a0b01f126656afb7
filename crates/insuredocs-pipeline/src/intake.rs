// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Intake, reviewer decisions and deletion: the changes made outside a
// pipeline run.

use tracing::{info, instrument};

use insuredocs_core::error::{InsureDocsError, Result};
use insuredocs_core::{Document, DocumentId, DocumentStatus};

use crate::blob::FsBlobStore;
use crate::repository::{DocumentRepository, SqliteRepository};

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Store `data`, create its record and queue it for OCR.
///
/// The record is created as `uploaded` and moved to `ocr_pending`.
#[instrument(skip(repo, blobs, data), fields(bytes = data.len()))]
pub fn ingest(
    repo: &SqliteRepository,
    blobs: &FsBlobStore,
    original_filename: &str,
    data: &[u8],
) -> Result<Document> {
    if !data.starts_with(PDF_MAGIC) {
        return Err(InsureDocsError::PdfError(format!(
            "{original_filename} is not a PDF"
        )));
    }

    let mut document = Document::new(original_filename.to_owned(), String::new());
    document.stored_filename = blobs.store_pdf(&document.id, data)?;
    if let Err(err) = repo.insert(&document) {
        blobs.remove(&document.stored_filename, None)?;
        return Err(err);
    }
    transition(repo, &document.id, DocumentStatus::OcrPending)?;

    info!(document_id = %document.id, "document ingested");
    repo.get(&document.id)?
        .ok_or_else(|| InsureDocsError::Database(format!("document {} vanished", document.id)))
}

/// A reviewer's verdict on a completed extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn status(self) -> DocumentStatus {
        match self {
            Self::Approve => DocumentStatus::Approved,
            Self::Reject => DocumentStatus::Rejected,
        }
    }
}

/// Record a reviewer decision. Only accepted from `extract_completed`.
#[instrument(skip(repo), fields(document_id = %id))]
pub fn record_decision(
    repo: &dyn DocumentRepository,
    id: &DocumentId,
    decision: Decision,
) -> Result<Document> {
    transition(repo, id, decision.status())?;
    repo.get(id)?
        .ok_or_else(|| InsureDocsError::Database(format!("document {id} vanished")))
}

/// Remove the record for `id` together with its stored PDF and text
/// artifact. Returns `false` when there was no such record.
#[instrument(skip(repo, blobs), fields(document_id = %id))]
pub fn delete_document(repo: &SqliteRepository, blobs: &FsBlobStore, id: &DocumentId) -> Result<bool> {
    let Some(document) = repo.get(id)? else {
        info!("nothing to delete");
        return Ok(false);
    };

    // Record first: a leftover file is harmless, a record pointing at a
    // deleted file is not.
    let deleted = repo.delete(id)?;
    blobs.remove(&document.stored_filename, document.text_artifact_ref.as_deref())?;
    info!(status = %document.status, "document deleted");
    Ok(deleted)
}

/// Move `id` to `next` if the transition table allows it.
fn transition(repo: &dyn DocumentRepository, id: &DocumentId, next: DocumentStatus) -> Result<()> {
    let current = repo
        .get(id)?
        .ok_or_else(|| InsureDocsError::Database(format!("document {id} not found")))?
        .status;

    if !current.can_transition_to(next) {
        return Err(InsureDocsError::InvalidTransition {
            from: current,
            to: next,
        });
    }

    repo.update_status(id, next)?;
    info!(from = %current, to = %next, "status transition");
    Ok(())
}
