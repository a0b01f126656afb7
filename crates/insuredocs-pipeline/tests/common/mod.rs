// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared fixtures: a recording in-memory repository and scripted text and
// field extractors.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};

use insuredocs_core::error::{InsureDocsError, Result};
use insuredocs_core::{Document, DocumentId, DocumentStatus, ExtractedFields, TextSource};
use insuredocs_document::ExtractedText;
use insuredocs_extract::Extractor;
use insuredocs_pipeline::{DocumentRepository, DocumentText, FsBlobStore, SessionSource};

pub const CLAIM_TEXT: &str =
    "\n--- Page 1 (Text Layer) ---\nPolicy Number: ABC-123456 filed 2023-04-01 amount $1,234.56\n";

#[derive(Default)]
struct State {
    documents: HashMap<DocumentId, Document>,
    history: Vec<DocumentStatus>,
    fail_writes_to: Option<DocumentStatus>,
    delete_after: Option<DocumentStatus>,
    sessions_opened: usize,
}

/// In-memory repository that records every status it is asked to write.
#[derive(Clone, Default)]
pub struct RecordingRepository {
    state: Arc<Mutex<State>>,
}

impl RecordingRepository {
    pub fn with_document(status: DocumentStatus, stored_filename: &str) -> (Self, DocumentId) {
        let repo = Self::default();
        let (_, id) = repo.add_document(status, stored_filename);
        (repo, id)
    }

    pub fn add_document(&self, status: DocumentStatus, stored_filename: &str) -> (Self, DocumentId) {
        let mut document = Document::new("claim.pdf".into(), stored_filename.into());
        document.status = status;
        let id = document.id;
        self.state.lock().expect("lock").documents.insert(id, document);
        (self.clone(), id)
    }

    pub fn history(&self) -> Vec<DocumentStatus> {
        self.state.lock().expect("lock").history.clone()
    }

    pub fn clear_history(&self) {
        self.state.lock().expect("lock").history.clear();
    }

    pub fn document(&self, id: &DocumentId) -> Option<Document> {
        self.state.lock().expect("lock").documents.get(id).cloned()
    }

    /// Writes of this status fail with a database error.
    pub fn fail_writes_to(&self, status: DocumentStatus) {
        self.state.lock().expect("lock").fail_writes_to = Some(status);
    }

    /// The record disappears right after this status is written.
    pub fn delete_after(&self, status: DocumentStatus) {
        self.state.lock().expect("lock").delete_after = Some(status);
    }

    pub fn set_status(&self, id: &DocumentId, status: DocumentStatus) {
        let mut state = self.state.lock().expect("lock");
        if let Some(document) = state.documents.get_mut(id) {
            document.status = status;
            if !status.implies_extraction() {
                document.extracted_fields = None;
            }
        }
    }

    pub fn sessions_opened(&self) -> usize {
        self.state.lock().expect("lock").sessions_opened
    }

    fn write(
        &self,
        id: &DocumentId,
        status: DocumentStatus,
        apply: impl FnOnce(&mut Document),
    ) -> Result<()> {
        let mut state = self.state.lock().expect("lock");
        if state.fail_writes_to == Some(status) {
            return Err(InsureDocsError::Database(format!("disk full writing {status}")));
        }
        let document = state
            .documents
            .get_mut(id)
            .ok_or_else(|| InsureDocsError::Database(format!("document {id} not found")))?;
        document.status = status;
        if !status.implies_extraction() {
            document.extracted_fields = None;
        }
        apply(document);
        state.history.push(status);
        if state.delete_after == Some(status) {
            state.documents.remove(id);
        }
        Ok(())
    }
}

impl DocumentRepository for RecordingRepository {
    fn get(&self, id: &DocumentId) -> Result<Option<Document>> {
        Ok(self.document(id))
    }

    fn update_status(&self, id: &DocumentId, status: DocumentStatus) -> Result<()> {
        self.write(id, status, |_| {})
    }

    fn update_ocr_result(&self, id: &DocumentId, text_ref: &str, status: DocumentStatus) -> Result<()> {
        self.write(id, status, |doc| doc.text_artifact_ref = Some(text_ref.to_owned()))
    }

    fn update_extraction_result(
        &self,
        id: &DocumentId,
        fields: &ExtractedFields,
        status: DocumentStatus,
    ) -> Result<()> {
        let keep = status.implies_extraction();
        self.write(id, status, |doc| {
            doc.extracted_fields = keep.then(|| fields.clone());
        })
    }
}

impl SessionSource for RecordingRepository {
    fn open_session(&self) -> Result<Box<dyn DocumentRepository>> {
        self.state.lock().expect("lock").sessions_opened += 1;
        Ok(Box::new(self.clone()))
    }
}

/// Assert every step of `history` is a legal transition starting at `from`.
pub fn assert_legal_path(from: DocumentStatus, history: &[DocumentStatus]) {
    let mut current = from;
    for &next in history {
        assert!(
            current.can_transition_to(next),
            "illegal transition {current} -> {next} in {history:?}"
        );
        current = next;
    }
}

/// One-shot gate a test opens to let a blocked extractor continue.
#[derive(Clone, Default)]
pub struct Gate(Arc<(Mutex<bool>, Condvar)>);

impl Gate {
    pub fn open(&self) {
        let (lock, cvar) = &*self.0;
        *lock.lock().expect("lock") = true;
        cvar.notify_all();
    }

    pub fn wait(&self) {
        let (lock, cvar) = &*self.0;
        let mut open = lock.lock().expect("lock");
        while !*open {
            open = cvar.wait(open).expect("wait");
        }
    }
}

pub enum TextBehavior {
    Produce(TextSource),
    /// Text names the run number, starting at 0.
    Numbered,
    Fail(fn() -> InsureDocsError),
    WaitFor(Gate),
}

/// Text extractor that returns [`CLAIM_TEXT`] or a scripted failure.
pub struct ScriptedText {
    behavior: TextBehavior,
    calls: AtomicUsize,
}

impl ScriptedText {
    pub fn new(behavior: TextBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DocumentText for ScriptedText {
    fn extract_text(&self, path: &Path) -> Result<ExtractedText> {
        let run = self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(path.is_file(), "orchestrator resolved a missing source");
        match &self.behavior {
            TextBehavior::Produce(source) => Ok(ExtractedText {
                text: CLAIM_TEXT.to_owned(),
                source: *source,
            }),
            TextBehavior::Numbered => Ok(ExtractedText {
                text: format!("run {run}: Policy Number: ABC-12345{run}\n"),
                source: TextSource::TextLayer,
            }),
            TextBehavior::Fail(make) => Err(make()),
            TextBehavior::WaitFor(gate) => {
                gate.wait();
                Ok(ExtractedText {
                    text: CLAIM_TEXT.to_owned(),
                    source: TextSource::TextLayer,
                })
            }
        }
    }
}

pub struct FailingExtractor;

impl Extractor for FailingExtractor {
    fn extract(&self, _text: &str) -> Result<ExtractedFields> {
        Err(InsureDocsError::Extraction("model crashed".into()))
    }
}

pub struct PanickingExtractor;

impl Extractor for PanickingExtractor {
    fn extract(&self, _text: &str) -> Result<ExtractedFields> {
        panic!("inference backend aborted")
    }
}

/// Blob store in a temp dir holding one stored PDF.
pub fn blob_store_with_pdf() -> (tempfile::TempDir, FsBlobStore, String) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FsBlobStore::new(dir.path().join("uploads"), "extracted_text").expect("store");
    let stored = store
        .store_pdf(&DocumentId::new(), b"%PDF-1.5 claim")
        .expect("store pdf");
    (dir, store, stored)
}
