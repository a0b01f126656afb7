// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Result assembler: the final write of a pipeline run.

use insuredocs_core::{DocumentId, DocumentStatus, ExtractedFields};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::repository::DocumentRepository;

/// What a run resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum FinalState {
    /// Extraction completed with this mapping.
    Extracted(ExtractedFields),
    /// The run failed; commit this status.
    Failed(DocumentStatus),
}

impl FinalState {
    pub fn status(&self) -> DocumentStatus {
        match self {
            Self::Extracted(_) => DocumentStatus::ExtractCompleted,
            Self::Failed(status) => *status,
        }
    }
}

/// Whether the final write landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "commit", rename_all = "snake_case")]
pub enum Commit {
    Written,
    /// The record vanished during the run; nothing was written.
    DocumentGone,
    /// The stored status cannot move to the final one; left untouched.
    Refused { current: DocumentStatus },
    /// The write itself failed; the document keeps its last committed status.
    Failed { message: String },
}

/// Writes the terminal status and field mapping in a single update.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResultAssembler;

impl ResultAssembler {
    #[instrument(skip(self, repo, state), fields(document_id = %id, status = %state.status()))]
    pub fn commit(
        &self,
        repo: &dyn DocumentRepository,
        id: &DocumentId,
        state: FinalState,
    ) -> Commit {
        let target = state.status();

        let current = match repo.get(id) {
            Ok(Some(document)) => document.status,
            Ok(None) => {
                warn!("document deleted before final update; skipping");
                return Commit::DocumentGone;
            }
            Err(err) => {
                error!(critical = true, error = %err, "could not read document before final update");
                return Commit::Failed {
                    message: err.to_string(),
                };
            }
        };

        if !current.can_transition_to(target) {
            error!(from = %current, to = %target, "final status not reachable; leaving document as is");
            return Commit::Refused { current };
        }

        let write = match state {
            FinalState::Extracted(fields) => repo.update_extraction_result(id, &fields, target),
            FinalState::Failed(status) => repo.update_status(id, status),
        };

        match write {
            Ok(()) => {
                info!(from = %current, "final status committed");
                Commit::Written
            }
            Err(err) => {
                error!(
                    critical = true,
                    error = %err,
                    last_committed = %current,
                    "final status write failed; document left at its last committed status"
                );
                Commit::Failed {
                    message: err.to_string(),
                }
            }
        }
    }
}
