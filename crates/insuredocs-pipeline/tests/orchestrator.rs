// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// State machine behaviour of a pipeline run against a recording repository.

mod common;

use std::sync::Arc;

use insuredocs_core::config::ExtractionProfile;
use insuredocs_core::error::{ErrorKind, InsureDocsError};
use insuredocs_core::{DocumentStatus, TextSource};
use insuredocs_extract::{Extractor, FieldExtractor};
use insuredocs_pipeline::{BlobStore, Commit, FsBlobStore, Orchestrator, RunOutcome, RunReport};

use common::*;

use DocumentStatus::*;

fn orchestrator(
    repo: &RecordingRepository,
    blobs: &FsBlobStore,
    text: Arc<ScriptedText>,
    extractor: Arc<dyn Extractor>,
) -> Orchestrator {
    Orchestrator::new(Arc::new(repo.clone()), Arc::new(blobs.clone()), text, extractor)
}

fn combined() -> Arc<dyn Extractor> {
    Arc::new(FieldExtractor::new(ExtractionProfile::Combined).expect("extractor"))
}

fn finished(outcome: RunOutcome) -> RunReport {
    match outcome {
        RunOutcome::Finished(report) => report,
        other => panic!("expected a finished run, got {other:?}"),
    }
}

#[test]
fn text_layer_run_completes_extraction() {
    let (_dir, blobs, stored) = blob_store_with_pdf();
    let (repo, id) = RecordingRepository::with_document(OcrPending, &stored);
    let text = Arc::new(ScriptedText::new(TextBehavior::Produce(TextSource::TextLayer)));

    let report = finished(
        orchestrator(&repo, &blobs, Arc::clone(&text), combined())
            .process(&id)
            .expect("process"),
    );

    assert_eq!(report.final_status, ExtractCompleted);
    assert_eq!(report.commit, Commit::Written);
    assert_eq!(report.source, Some(TextSource::TextLayer));
    assert!(report.failure.is_none());

    let history = repo.history();
    assert_eq!(history, vec![OcrProcessing, OcrCompleted, ExtractProcessing, ExtractCompleted]);
    assert_legal_path(OcrPending, &history);

    let document = repo.document(&id).expect("document");
    let artifact = document.text_artifact_ref.expect("artifact ref");
    assert_eq!(artifact, blobs.artifact_ref_for(&stored));
    assert_eq!(blobs.read_text(&artifact).expect("artifact"), CLAIM_TEXT);

    let fields = document.extracted_fields.expect("fields");
    assert_eq!(fields.texts("policy_numbers"), vec!["ABC-123456"]);
    assert!(fields.texts("dates").contains(&"2023-04-01"));
    assert!(fields.numbers("amounts").contains(&1234.56));
    assert_eq!(repo.sessions_opened(), 1);
}

#[test]
fn missing_source_fails_ocr() {
    let (_dir, blobs, _stored) = blob_store_with_pdf();
    let (repo, id) = RecordingRepository::with_document(Uploaded, "0000.pdf");
    let text = Arc::new(ScriptedText::new(TextBehavior::Produce(TextSource::Ocr)));

    let report = finished(
        orchestrator(&repo, &blobs, Arc::clone(&text), combined())
            .process(&id)
            .expect("process"),
    );

    assert_eq!(report.final_status, OcrFailed);
    assert_eq!(report.failure.expect("failure").kind, ErrorKind::InputMissing);
    assert_eq!(repo.history(), vec![OcrProcessing, OcrFailed]);
    assert_eq!(text.calls(), 0);
}

#[test]
fn unavailable_engine_fails_ocr() {
    let (_dir, blobs, stored) = blob_store_with_pdf();
    let (repo, id) = RecordingRepository::with_document(OcrFailed, &stored);
    let text = Arc::new(ScriptedText::new(TextBehavior::Fail(|| {
        InsureDocsError::EngineUnavailable("model files missing".into())
    })));

    let report = finished(
        orchestrator(&repo, &blobs, text, combined())
            .process(&id)
            .expect("process"),
    );

    assert_eq!(report.final_status, OcrFailed);
    assert_eq!(report.failure.expect("failure").kind, ErrorKind::EngineUnavailable);
    assert_legal_path(OcrFailed, &repo.history());
    assert!(repo.document(&id).expect("document").text_artifact_ref.is_none());
}

#[test]
fn extraction_failure_then_retry_restarts_ocr() {
    let (_dir, blobs, stored) = blob_store_with_pdf();
    let (repo, id) = RecordingRepository::with_document(OcrPending, &stored);
    let text = Arc::new(ScriptedText::new(TextBehavior::Produce(TextSource::Ocr)));

    let report = finished(
        orchestrator(&repo, &blobs, Arc::clone(&text), Arc::new(FailingExtractor))
            .process(&id)
            .expect("first run"),
    );
    assert_eq!(report.final_status, ExtractFailed);
    assert_eq!(report.failure.as_ref().map(|f| f.kind), Some(ErrorKind::Unhandled));
    assert_eq!(
        repo.history(),
        vec![OcrProcessing, OcrCompleted, ExtractProcessing, ExtractFailed]
    );
    assert!(repo.document(&id).expect("document").extracted_fields.is_none());

    repo.clear_history();
    let retry = finished(
        orchestrator(&repo, &blobs, Arc::clone(&text), combined())
            .process(&id)
            .expect("retry"),
    );

    assert_eq!(retry.final_status, ExtractCompleted);
    let history = repo.history();
    assert_eq!(history.first(), Some(&OcrProcessing));
    assert_legal_path(ExtractFailed, &history);
    assert_eq!(text.calls(), 2);
}

#[test]
fn panic_during_extraction_is_contained() {
    let (_dir, blobs, stored) = blob_store_with_pdf();
    let (repo, id) = RecordingRepository::with_document(OcrPending, &stored);
    let text = Arc::new(ScriptedText::new(TextBehavior::Produce(TextSource::TextLayer)));

    let report = finished(
        orchestrator(&repo, &blobs, text, Arc::new(PanickingExtractor))
            .process(&id)
            .expect("process"),
    );

    assert_eq!(report.final_status, ExtractFailed);
    assert_eq!(report.commit, Commit::Written);
    let failure = report.failure.expect("failure");
    assert_eq!(failure.kind, ErrorKind::Unhandled);
    assert!(failure.message.contains("inference backend aborted"));
    assert_eq!(repo.document(&id).expect("document").status, ExtractFailed);
}

#[test]
fn non_retryable_statuses_are_skipped() {
    let (_dir, blobs, stored) = blob_store_with_pdf();
    for status in [OcrProcessing, OcrCompleted, ExtractProcessing, ExtractCompleted, Approved] {
        let (repo, id) = RecordingRepository::with_document(status, &stored);
        let text = Arc::new(ScriptedText::new(TextBehavior::Produce(TextSource::TextLayer)));

        let outcome = orchestrator(&repo, &blobs, Arc::clone(&text), combined())
            .process(&id)
            .expect("process");

        assert_eq!(outcome, RunOutcome::Skipped { status });
        assert!(repo.history().is_empty());
        assert_eq!(text.calls(), 0);
    }
}

#[test]
fn unknown_document_is_not_found() {
    let (_dir, blobs, _stored) = blob_store_with_pdf();
    let repo = RecordingRepository::default();
    let text = Arc::new(ScriptedText::new(TextBehavior::Produce(TextSource::TextLayer)));

    let outcome = orchestrator(&repo, &blobs, text, combined())
        .process(&insuredocs_core::DocumentId::new())
        .expect("process");
    assert_eq!(outcome, RunOutcome::NotFound);
}

#[test]
fn document_deleted_mid_run_skips_final_update() {
    let (_dir, blobs, stored) = blob_store_with_pdf();
    let (repo, id) = RecordingRepository::with_document(OcrPending, &stored);
    repo.delete_after(ExtractProcessing);
    let text = Arc::new(ScriptedText::new(TextBehavior::Produce(TextSource::TextLayer)));

    let report = finished(
        orchestrator(&repo, &blobs, text, combined())
            .process(&id)
            .expect("process"),
    );

    assert_eq!(report.commit, Commit::DocumentGone);
    assert_eq!(repo.history(), vec![OcrProcessing, OcrCompleted, ExtractProcessing]);
    assert!(repo.document(&id).is_none());
}

#[test]
fn failed_final_write_leaves_last_committed_status() {
    let (_dir, blobs, stored) = blob_store_with_pdf();
    let (repo, id) = RecordingRepository::with_document(OcrPending, &stored);
    repo.fail_writes_to(ExtractCompleted);
    let text = Arc::new(ScriptedText::new(TextBehavior::Produce(TextSource::TextLayer)));

    let report = finished(
        orchestrator(&repo, &blobs, text, combined())
            .process(&id)
            .expect("process"),
    );

    assert_eq!(report.final_status, ExtractCompleted);
    assert!(matches!(report.commit, Commit::Failed { .. }));
    let document = repo.document(&id).expect("document");
    assert_eq!(document.status, ExtractProcessing);
    assert!(document.extracted_fields.is_none());
}

#[test]
fn failed_first_write_is_not_followed_by_an_illegal_one() {
    let (_dir, blobs, stored) = blob_store_with_pdf();
    let (repo, id) = RecordingRepository::with_document(Uploaded, &stored);
    repo.fail_writes_to(OcrProcessing);
    let text = Arc::new(ScriptedText::new(TextBehavior::Produce(TextSource::TextLayer)));

    let report = finished(
        orchestrator(&repo, &blobs, text, combined())
            .process(&id)
            .expect("process"),
    );

    assert_eq!(report.final_status, OcrFailed);
    assert_eq!(report.failure.expect("failure").kind, ErrorKind::Persistence);
    assert_eq!(report.commit, Commit::Refused { current: Uploaded });
    assert!(repo.history().is_empty());
}

#[test]
fn reextraction_replaces_fields_without_accumulating() {
    let (_dir, blobs, stored) = blob_store_with_pdf();
    let (repo, id) = RecordingRepository::with_document(OcrPending, &stored);
    let text = Arc::new(ScriptedText::new(TextBehavior::Produce(TextSource::TextLayer)));
    let pipeline = orchestrator(&repo, &blobs, text, combined());

    finished(pipeline.process(&id).expect("first run"));
    let first = repo.document(&id).expect("document").extracted_fields.expect("fields");

    repo.set_status(&id, ExtractFailed);
    finished(pipeline.process(&id).expect("second run"));
    let second = repo.document(&id).expect("document").extracted_fields.expect("fields");

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).expect("serialize"),
        serde_json::to_string(&second).expect("serialize")
    );
    assert_eq!(second.texts("policy_numbers"), vec!["ABC-123456"]);
}

#[test]
fn extract_completed_is_never_recorded_without_ocr_completed() {
    let (_dir, blobs, stored) = blob_store_with_pdf();
    let (repo, id) = RecordingRepository::with_document(OcrPending, &stored);
    repo.fail_writes_to(OcrCompleted);
    let text = Arc::new(ScriptedText::new(TextBehavior::Produce(TextSource::Ocr)));

    let report = finished(
        orchestrator(&repo, &blobs, text, combined())
            .process(&id)
            .expect("process"),
    );

    assert_eq!(report.final_status, OcrFailed);
    let history = repo.history();
    assert!(!history.contains(&ExtractCompleted));
    assert_eq!(history, vec![OcrProcessing, OcrFailed]);
}
