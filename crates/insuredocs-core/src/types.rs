// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the InsureDocs document pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::InsureDocsError;
use crate::fields::ExtractedFields;

/// Unique identifier for an ingested document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DocumentId {
    type Err = InsureDocsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| InsureDocsError::Config(format!("invalid document id '{s}': {e}")))
    }
}

/// Lifecycle states of a document.
///
/// The serialized form is the wire-stable snake_case string (`ocr_pending`,
/// `extract_completed`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Stored, record created, nothing queued yet.
    Uploaded,
    /// Queued for the OCR phase.
    OcrPending,
    /// Text layer analysis / OCR running.
    OcrProcessing,
    /// Text artifact written; ready for extraction.
    OcrCompleted,
    /// OCR phase failed: retryable.
    OcrFailed,
    /// Explicitly queued for extraction.
    ExtractPending,
    /// Field extraction running.
    ExtractProcessing,
    /// Fields extracted and persisted.
    ExtractCompleted,
    /// Extraction phase failed: retryable.
    ExtractFailed,
    /// Accepted by a reviewer.
    Approved,
    /// Rejected by a reviewer.
    Rejected,
}

impl DocumentStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [DocumentStatus; 11] = [
        Self::Uploaded,
        Self::OcrPending,
        Self::OcrProcessing,
        Self::OcrCompleted,
        Self::OcrFailed,
        Self::ExtractPending,
        Self::ExtractProcessing,
        Self::ExtractCompleted,
        Self::ExtractFailed,
        Self::Approved,
        Self::Rejected,
    ];

    /// Wire string for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::OcrPending => "ocr_pending",
            Self::OcrProcessing => "ocr_processing",
            Self::OcrCompleted => "ocr_completed",
            Self::OcrFailed => "ocr_failed",
            Self::ExtractPending => "extract_pending",
            Self::ExtractProcessing => "extract_processing",
            Self::ExtractCompleted => "extract_completed",
            Self::ExtractFailed => "extract_failed",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Statuses reachable from `self` in one step.
    ///
    /// The match is exhaustive, so adding a status forces its row to be
    /// written here.
    pub fn successors(&self) -> &'static [DocumentStatus] {
        use DocumentStatus::*;
        match self {
            Uploaded => &[OcrPending, OcrProcessing],
            OcrPending => &[OcrProcessing],
            OcrProcessing => &[OcrCompleted, OcrFailed],
            // `ExtractFailed` here and on `ExtractPending` lets a run whose
            // `extract_processing` write failed still record its failure.
            OcrCompleted => &[ExtractPending, ExtractProcessing, ExtractFailed],
            OcrFailed => &[OcrProcessing],
            ExtractPending => &[ExtractProcessing, ExtractFailed],
            ExtractProcessing => &[ExtractCompleted, ExtractFailed],
            ExtractCompleted => &[Approved, Rejected],
            ExtractFailed => &[OcrProcessing],
            Approved => &[],
            Rejected => &[],
        }
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(&self, next: DocumentStatus) -> bool {
        self.successors().contains(&next)
    }

    /// Statuses from which the pipeline may be (re)started.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Uploaded | Self::OcrPending | Self::OcrFailed | Self::ExtractFailed
        )
    }

    /// Statuses that imply a completed extraction (and thus a field mapping).
    pub fn implies_extraction(&self) -> bool {
        matches!(self, Self::ExtractCompleted | Self::Approved | Self::Rejected)
    }

    /// Statuses from which the pipeline does not continue on its own.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::OcrFailed
                | Self::ExtractCompleted
                | Self::ExtractFailed
                | Self::Approved
                | Self::Rejected
        )
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentStatus {
    type Err = InsureDocsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| InsureDocsError::Config(format!("unknown document status '{s}'")))
    }
}

/// Where the text of a document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    /// Embedded PDF text layer was sufficient.
    TextLayer,
    /// Pages were rasterized and recognized.
    Ocr,
}

/// A document record as persisted by the repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    /// Filename supplied at upload time.
    pub original_filename: String,
    /// Filename of the stored PDF, relative to the upload root.
    pub stored_filename: String,
    pub status: DocumentStatus,
    /// Relative reference to the derived text artifact.
    pub text_artifact_ref: Option<String>,
    /// Field mapping; only present once an extraction has completed.
    pub extracted_fields: Option<ExtractedFields>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(original_filename: String, stored_filename: String) -> Self {
        let now = Utc::now();
        Self {
            id: DocumentId::new(),
            original_filename,
            stored_filename,
            status: DocumentStatus::Uploaded,
            text_artifact_ref: None,
            extracted_fields: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_strings_round_trip_through_serde() {
        for status in DocumentStatus::ALL {
            let json = serde_json::to_string(&status).expect("serialize");
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            let parsed: DocumentStatus = status.as_str().parse().expect("parse");
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!("ocr_done".parse::<DocumentStatus>().is_err());
    }

    #[test]
    fn happy_path_is_legal() {
        use DocumentStatus::*;
        let path = [
            Uploaded,
            OcrPending,
            OcrProcessing,
            OcrCompleted,
            ExtractProcessing,
            ExtractCompleted,
            Approved,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn extract_completed_requires_prior_ocr() {
        use DocumentStatus::*;
        for status in DocumentStatus::ALL {
            if status.can_transition_to(ExtractCompleted) {
                assert!(matches!(status, ExtractProcessing));
            }
        }
        assert!(!OcrProcessing.can_transition_to(ExtractCompleted));
    }

    #[test]
    fn review_decisions_only_after_extraction() {
        for status in DocumentStatus::ALL {
            let reaches_review = status.can_transition_to(DocumentStatus::Approved)
                || status.can_transition_to(DocumentStatus::Rejected);
            assert_eq!(reaches_review, status == DocumentStatus::ExtractCompleted);
        }
    }

    #[test]
    fn retryable_set_matches_restart_edges() {
        for status in DocumentStatus::ALL {
            assert_eq!(
                status.is_retryable(),
                status.can_transition_to(DocumentStatus::OcrProcessing),
                "{status}"
            );
        }
    }

    #[test]
    fn failure_after_ocr_is_recordable_before_extraction_starts() {
        use DocumentStatus::*;
        assert!(OcrCompleted.can_transition_to(ExtractFailed));
        assert!(ExtractPending.can_transition_to(ExtractFailed));
        assert!(!OcrCompleted.can_transition_to(OcrFailed));
    }

    #[test]
    fn terminal_statuses() {
        use DocumentStatus::*;
        let terminal: Vec<_> = DocumentStatus::ALL
            .iter()
            .copied()
            .filter(DocumentStatus::is_terminal)
            .collect();
        assert_eq!(
            terminal,
            vec![OcrFailed, ExtractCompleted, ExtractFailed, Approved, Rejected]
        );
        for status in [Approved, Rejected] {
            assert!(status.successors().is_empty());
        }
    }

    #[test]
    fn new_document_starts_uploaded_without_fields() {
        let doc = Document::new("claim.pdf".into(), "abc.pdf".into());
        assert_eq!(doc.status, DocumentStatus::Uploaded);
        assert!(doc.extracted_fields.is_none());
        assert!(doc.text_artifact_ref.is_none());
    }
}
