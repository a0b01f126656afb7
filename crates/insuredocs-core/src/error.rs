// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for InsureDocs, plus the failure taxonomy the pipeline
// uses to decide which status to commit.

use thiserror::Error;

use crate::types::DocumentStatus;

/// Top-level error type for all InsureDocs operations.
#[derive(Debug, Error)]
pub enum InsureDocsError {
    // -- Input / engine --
    #[error("source document not found: {0}")]
    InputMissing(String),

    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),

    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("OCR failed: {0}")]
    OcrError(String),

    #[error("page {page} failed: {message}")]
    PageFailure { page: u32, message: String },

    // -- Extraction --
    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("invalid pattern for '{label}': {reason}")]
    InvalidPattern { label: String, reason: String },

    // -- Lifecycle --
    #[error("illegal status transition {from} -> {to}")]
    InvalidTransition {
        from: DocumentStatus,
        to: DocumentStatus,
    },

    // -- Storage / persistence --
    #[error("database error: {0}")]
    Database(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unhandled failure: {0}")]
    Unhandled(String),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, InsureDocsError>;

/// Failure classes the pipeline distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Source PDF absent on the blob store.
    InputMissing,
    /// The OCR engine could not be constructed; fatal until restart.
    EngineUnavailable,
    /// One page failed; recorded inline, never fatal to the document.
    PartialPageFailure,
    /// Anything else raised during a phase.
    Unhandled,
    /// A repository write failed.
    Persistence,
}

impl ErrorKind {
    /// Status to commit for a run that failed with this kind of error.
    ///
    /// `ocr_completed` says whether the OCR phase had already been committed.
    /// Input and engine failures can only surface before that point, so every
    /// class resolves by phase.
    pub fn failure_status(&self, ocr_completed: bool) -> DocumentStatus {
        if ocr_completed {
            DocumentStatus::ExtractFailed
        } else {
            DocumentStatus::OcrFailed
        }
    }

    /// Whether this failure needs operator attention rather than a resubmit.
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::EngineUnavailable | Self::Persistence)
    }
}

impl InsureDocsError {
    /// Classify this error into the pipeline failure taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InputMissing(_) => ErrorKind::InputMissing,
            Self::EngineUnavailable(_) => ErrorKind::EngineUnavailable,
            Self::PageFailure { .. } => ErrorKind::PartialPageFailure,
            Self::Database(_) => ErrorKind::Persistence,
            Self::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                ErrorKind::InputMissing
            }
            Self::PdfError(_)
            | Self::ImageError(_)
            | Self::OcrError(_)
            | Self::Extraction(_)
            | Self::InvalidPattern { .. }
            | Self::InvalidTransition { .. }
            | Self::Config(_)
            | Self::Io(_)
            | Self::Serialization(_)
            | Self::Unhandled(_) => ErrorKind::Unhandled,
        }
    }
}
